use std::path::PathBuf;
use tracing::{info, instrument};
use url::Url;

use super::fetcher::{projects_filename, ProjectsFetcher};
use super::projects::read_projects;
use super::stateaid::StateAidRegister;
use super::transform::{derive_candidates, join_schemes};
use super::BgError;
use crate::importers::downloader::{ensure_dir, Downloader};
use crate::output::write_csv;
use crate::summary::ExportReport;
use crate::utils::{validate_url, validate_year, ValidationError};

/// Validated arguments of `bg export`
#[derive(Debug, Clone)]
pub struct BgExportOptions {
    pub year: i32,
    pub local_path: PathBuf,
    pub stateaid_url: Url,
    pub program_start_year: i32,
}

impl BgExportOptions {
    pub fn new(
        year: &str,
        local_path: impl Into<PathBuf>,
        stateaid_url: &str,
        program_start_year: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            year: validate_year(year)?,
            local_path: local_path.into(),
            stateaid_url: validate_url(stateaid_url)?,
            program_start_year: validate_year(program_start_year)?,
        })
    }

    pub fn output_path(&self) -> PathBuf {
        self.local_path.join(format!("{}.csv", self.year))
    }
}

/// The Bulgaria export pipeline
#[derive(Clone, Default)]
pub struct BgExporter {
    fetcher: ProjectsFetcher,
    downloader: Downloader,
}

impl BgExporter {
    pub fn new(fetcher: ProjectsFetcher) -> Self {
        Self {
            fetcher,
            downloader: Downloader::new(),
        }
    }

    /// Read `projects_<year>.xlsx` (fetching it first when absent), keep the
    /// projects that match a state aid scheme and write them to `<year>.csv`.
    ///
    /// Nothing is written when no project matches.
    #[instrument(skip(self, options), fields(year = options.year))]
    pub async fn export(&self, options: &BgExportOptions) -> Result<ExportReport, BgError> {
        let year = options.year;
        ensure_dir(&options.local_path)?;

        let projects_path = options.local_path.join(projects_filename(year));
        if !projects_path.exists() {
            info!("{} not found locally", projects_path.display());
            self.fetcher.fetch(year, &options.local_path).await?;
        }

        info!("Reading EU data for year: {year}");
        let projects = read_projects(&projects_path)?;
        let candidates = derive_candidates(&projects, year, options.program_start_year);

        let register = StateAidRegister::fetch(&self.downloader, options.stateaid_url.as_str()).await?;
        let aids = join_schemes(candidates, &register);

        info!("{} matches found.", aids.len());
        if aids.is_empty() {
            return Ok(ExportReport::default());
        }

        let csv_path = options.output_path();
        info!("Writing results to {}", csv_path.display());
        write_csv(&csv_path, &aids)?;

        Ok(ExportReport {
            rows: aids.len(),
            output: Some(csv_path),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_validate_before_io() {
        assert!(matches!(
            BgExportOptions::new("2009", "./data/bg", "https://example.com/x.xlsx", "2014"),
            Err(ValidationError::Year(_))
        ));
        assert!(matches!(
            BgExportOptions::new("2015", "./data/bg", "not a url", "2014"),
            Err(ValidationError::Url { .. })
        ));
        assert!(matches!(
            BgExportOptions::new("2015", "./data/bg", "https://example.com/x.xlsx", "14"),
            Err(ValidationError::Year(_))
        ));
    }

    #[test]
    fn test_output_path() {
        let options =
            BgExportOptions::new("2015", "data/bg", "https://example.com/x.xlsx", "2014").unwrap();
        assert_eq!(options.output_path(), PathBuf::from("data/bg/2015.csv"));
    }
}

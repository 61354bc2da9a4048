use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use super::BgError;
use crate::importers::downloader::{ensure_dir, Downloader};
use crate::utils::ValidationError;

pub const DEFAULT_PROJECTS_URL: &str = "http://2020.eufunds.bg/en/0/0/Project/ExportToExcel";

// The portal filters by year with opaque, already URL-encoded tokens
const YEAR_TOKENS: [(i32, &str); 10] = [
    (2014, "3xRCSNcrgNc%3D"),
    (2015, "8U%2BIPGXBzzM%3D"),
    (2016, "L35Wg8m16s0%3D"),
    (2017, "wxlx7atW%2FuQ%3D"),
    (2018, "DrjrB6YmlCo%3D"),
    (2019, "c3E0NC9D3EE%3D"),
    (2020, "ip23bQ8hOOQ%3D"),
    (2021, "mwei5Zc2UEA%3D"),
    (2022, "2Q0LfOC9lQ4%3D"),
    (2023, "VuK356PVlaY%3D"),
];

pub fn year_token(year: i32) -> Option<&'static str> {
    YEAR_TOKENS
        .iter()
        .find(|(y, _)| *y == year)
        .map(|(_, token)| *token)
}

/// Local file name of a yearly project export
pub fn projects_filename(year: i32) -> String {
    format!("projects_{year}.xlsx")
}

/// Downloader for the eufunds.bg yearly project exports
#[derive(Clone)]
pub struct ProjectsFetcher {
    downloader: Downloader,
    base_url: String,
}

impl ProjectsFetcher {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_PROJECTS_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            downloader: Downloader::new(),
            base_url: base_url.into(),
        }
    }

    /// Export URL for a year; years without a published token are rejected
    pub fn projects_url(&self, year: i32) -> Result<String, ValidationError> {
        let token = year_token(year).ok_or(ValidationError::UnsupportedYear(year))?;
        Ok(format!(
            "{}?StFrom={token}&StTo={token}&ShowRes=True&IsProgrammeSelected=False&IsRegionSelected=False",
            self.base_url
        ))
    }

    /// Download the export for `year` into `local_path/projects_<year>.xlsx`,
    /// overwriting any previous copy
    #[instrument(skip(self, local_path), fields(local_path = %local_path.display()))]
    pub async fn fetch(&self, year: i32, local_path: &Path) -> Result<PathBuf, BgError> {
        let url = self.projects_url(year)?;
        ensure_dir(local_path)?;

        info!("Fetching EU data for year: {year}");
        let dest = local_path.join(projects_filename(year));
        Ok(self.downloader.download_to(&url, &dest).await?)
    }
}

impl Default for ProjectsFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_tokens_cover_2014_to_2023() {
        for year in 2014..=2023 {
            assert!(year_token(year).is_some(), "missing token for {year}");
        }
        assert_eq!(year_token(2013), None);
        assert_eq!(year_token(2024), None);
    }

    #[test]
    fn test_projects_url() {
        let fetcher = ProjectsFetcher::new();
        assert_eq!(
            fetcher.projects_url(2015).unwrap(),
            "http://2020.eufunds.bg/en/0/0/Project/ExportToExcel?StFrom=8U%2BIPGXBzzM%3D&\
             StTo=8U%2BIPGXBzzM%3D&ShowRes=True&IsProgrammeSelected=False&IsRegionSelected=False"
        );
    }

    #[test]
    fn test_projects_url_unsupported_year() {
        let fetcher = ProjectsFetcher::new();
        assert_eq!(
            fetcher.projects_url(2030),
            Err(ValidationError::UnsupportedYear(2030))
        );
    }

    #[test]
    fn test_projects_filename() {
        assert_eq!(projects_filename(2019), "projects_2019.xlsx");
    }
}

use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::fetch_error::FetchError;
use crate::importers::downloader::{ensure_dir, Downloader};
use crate::period::YearMonth;

pub const DEFAULT_AIDS_BASE_URL: &str =
    "http://eu-state-aids.s3-eu-west-1.amazonaws.com/it/rna_mirror/OpenDataAiuti/";
pub const DEFAULT_MEASURES_BASE_URL: &str =
    "http://eu-state-aids.s3-eu-west-1.amazonaws.com/it/rna_mirror/OpenDataMisure/";

/// Local file name of a monthly aids archive
pub fn aids_archive_name(period: YearMonth) -> String {
    format!("aiuti_{period}.xml.zip")
}

fn with_trailing_slash(url: impl Into<String>) -> String {
    let mut url = url.into();
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Downloader for the RNA monthly open data archives
#[derive(Clone)]
pub struct RnaFetcher {
    downloader: Downloader,
    aids_base_url: String,
    measures_base_url: String,
}

impl RnaFetcher {
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_AIDS_BASE_URL, DEFAULT_MEASURES_BASE_URL)
    }

    pub fn with_base_urls(
        aids_base_url: impl Into<String>,
        measures_base_url: impl Into<String>,
    ) -> Self {
        Self {
            downloader: Downloader::new(),
            aids_base_url: with_trailing_slash(aids_base_url),
            measures_base_url: with_trailing_slash(measures_base_url),
        }
    }

    pub fn aids_url(&self, period: YearMonth) -> String {
        format!("{}OpenData_Aiuti_{period}.xml.zip", self.aids_base_url)
    }

    pub fn measures_url(&self, period: YearMonth) -> String {
        format!("{}OpenData_Misura_{period}.xml.zip", self.measures_base_url)
    }

    /// Download the aids archive of a month into
    /// `local_path/aiuti_<YYYY>_<MM>.xml.zip`.
    ///
    /// Returns `Ok(None)` when the server has no file for that month; in
    /// that case nothing is written.
    #[instrument(skip(self, local_path), fields(period = %period))]
    pub async fn fetch_aids(
        &self,
        period: YearMonth,
        local_path: &Path,
    ) -> Result<Option<PathBuf>, FetchError> {
        ensure_dir(local_path)?;

        info!(
            "Fetching Aiuti data for year: {}, month: {:02}",
            period.year, period.month
        );
        let dest = local_path.join(aids_archive_name(period));

        match self.downloader.download_to(&self.aids_url(period), &dest).await {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.is_unavailable() => {
                warn!("File not found: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Download the measures archive of a month into memory
    pub async fn download_measures(&self, period: YearMonth) -> Result<Vec<u8>, FetchError> {
        let url = self.measures_url(period);
        info!("Processing {url}");
        self.downloader.download(&url).await
    }
}

impl Default for RnaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

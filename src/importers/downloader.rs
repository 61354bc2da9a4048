use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::fetch_error::FetchError;

/// Plain HTTP GET downloader shared by the country fetchers
///
/// No timeout, retry or backoff: a slow server blocks the run and a
/// transport failure is returned to the caller.
#[derive(Clone, Default)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Download a file into memory
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;

        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            debug!("Downloaded {url} ({} bytes)", bytes.len());
            Ok(bytes.to_vec())
        } else if status.as_u16() == 404 {
            Err(FetchError::NotFound(format!("{url} not found on server")))
        } else if status.is_server_error() {
            Err(FetchError::ServerError(format!(
                "Server error {status} while downloading {url}"
            )))
        } else {
            Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }

    /// Download a file and store it unchanged at `dest`, creating the parent
    /// directory when needed
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<PathBuf, FetchError> {
        let bytes = self.download(url).await?;

        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }
        std::fs::write(dest, &bytes).map_err(|source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

        info!("File saved to {}", dest.display());
        Ok(dest.to_path_buf())
    }
}

/// Create a local data directory (and its parents) if it does not exist
pub fn ensure_dir(path: &Path) -> Result<(), FetchError> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

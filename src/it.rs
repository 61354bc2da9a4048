// Italy: RNA (Registro Nazionale degli Aiuti) open data
//
// - fetcher: monthly OpenData_Aiuti / OpenData_Misura zipped XML files
// - code: SA.<digits> measure code normalisation
// - measures: the measure code -> fund description table (misure.csv)
// - aids: aid records flattened out of the monthly XML
// - export: the per-period join and aggregation

pub mod aids;
pub mod code;
pub mod export;
pub mod fetcher;
pub mod measures;

use std::path::PathBuf;

use crate::fetch_error::FetchError;
use crate::importers::ArchiveError;
use crate::output::OutputError;
use crate::utils::ValidationError;

/// Error types for the Italy commands
#[derive(Debug, thiserror::Error)]
pub enum ItError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Failed to read measures table {path}: {source}")]
    Measures {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid aid amount: {0}")]
    InvalidAmount(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

pub use code::normalize_code;
pub use export::{ItExportOptions, ItExporter};
pub use fetcher::RnaFetcher;
pub use measures::{MeasuresGenerator, MeasuresTable};

// Bulgaria: eufunds.bg project exports crossed with the minfin.bg state aid register
//
// - fetcher: downloads the yearly project export (projects_<year>.xlsx)
// - projects / stateaid: spreadsheet readers for the two sources
// - transform: beneficiary, program and scheme derivations
// - export: the fetch -> parse -> transform -> join -> write pipeline

pub mod export;
pub mod fetcher;
pub mod projects;
pub mod stateaid;
pub mod transform;

use crate::fetch_error::FetchError;
use crate::importers::SpreadsheetError;
use crate::output::OutputError;
use crate::utils::ValidationError;

/// Error types for the Bulgaria commands
#[derive(Debug, thiserror::Error)]
pub enum BgError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] SpreadsheetError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

pub use export::{BgExportOptions, BgExporter};
pub use fetcher::ProjectsFetcher;
pub use stateaid::StateAidRegister;
pub use transform::ProjectAid;

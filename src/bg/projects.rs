use std::path::Path;
use tracing::info;

use crate::importers::excel_importer::{cell_f64, cell_text, SheetTable, SpreadsheetError};

/// The export starts with three title rows; the header is the fourth row
pub const PROJECTS_HEADER_ROW: u32 = 3;

/// The export ends with notes, not projects
pub const FOOTER_NOTE_ROWS: usize = 6;

const BENEFICIARY: &str = "Beneficiary";
const PROPOSAL_NUMBER: &str = "Project proposal number";
const TOTAL: &str = "Total";

/// The columns of a project row the export pipeline uses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectRow {
    /// Identifier and name, e.g. `"121 Alpha Ltd"`
    pub beneficiary: Option<String>,
    /// Hyphen delimited, e.g. `"BG16RFOP002-2.001-0001"`
    pub proposal_number: Option<String>,
    pub total: Option<f64>,
}

/// Read the projects of a `projects_<year>.xlsx` export, footer notes removed
pub fn read_projects(path: &Path) -> Result<Vec<ProjectRow>, SpreadsheetError> {
    let mut table = SheetTable::open(path, PROJECTS_HEADER_ROW)?;
    table.drop_tail(FOOTER_NOTE_ROWS);

    let projects = projects_from_table(&table)?;
    info!(
        "{} project rows read from {}",
        projects.len(),
        path.display()
    );
    Ok(projects)
}

pub fn projects_from_table(table: &SheetTable) -> Result<Vec<ProjectRow>, SpreadsheetError> {
    let beneficiary = table.column(BENEFICIARY)?;
    let proposal_number = table.column(PROPOSAL_NUMBER)?;
    let total = table.column(TOTAL)?;

    Ok(table
        .rows()
        .iter()
        .map(|row| ProjectRow {
            beneficiary: row.get(beneficiary).and_then(cell_text),
            proposal_number: row.get(proposal_number).and_then(cell_text),
            total: row.get(total).and_then(cell_f64),
        })
        .collect())
}

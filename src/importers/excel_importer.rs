use calamine::{open_workbook, open_workbook_from_rs, Data, Range, Reader, Xlsx};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Workbook has no worksheet")]
    NoWorksheet,

    #[error("Failed to read worksheet: {0}")]
    SheetRead(String),

    #[error("Header row {0} not found in worksheet")]
    MissingHeader(u32),

    #[error("Missing column: {0}")]
    MissingColumn(String),
}

/// First worksheet of a workbook, split into a header row and the data rows
/// below it.
///
/// Row and column positions are absolute sheet positions (row 0 is the first
/// row of the sheet even if it is blank), so a header configured at row 3
/// stays at row 3 whatever the used range of the sheet is.
#[derive(Debug, Clone)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<Vec<Data>>,
}

impl SheetTable {
    /// Open an `.xlsx` file and read its first worksheet
    pub fn open(path: &Path, header_row: u32) -> Result<Self, SpreadsheetError> {
        let mut workbook: Xlsx<BufReader<File>> = match open_workbook(path) {
            Ok(wb) => wb,
            Err(e) => return Err(SpreadsheetError::WorkbookOpen(e.to_string())),
        };
        let range = first_sheet(&mut workbook)?;
        Self::from_range(&range, header_row)
    }

    /// Read the first worksheet of an in-memory `.xlsx` payload
    pub fn from_bytes(bytes: Vec<u8>, header_row: u32) -> Result<Self, SpreadsheetError> {
        let mut workbook: Xlsx<Cursor<Vec<u8>>> = match open_workbook_from_rs(Cursor::new(bytes)) {
            Ok(wb) => wb,
            Err(e) => return Err(SpreadsheetError::WorkbookOpen(e.to_string())),
        };
        let range = first_sheet(&mut workbook)?;
        Self::from_range(&range, header_row)
    }

    pub fn from_range(range: &Range<Data>, header_row: u32) -> Result<Self, SpreadsheetError> {
        let (start_row, start_col) = range
            .start()
            .ok_or(SpreadsheetError::MissingHeader(header_row))?;

        if header_row < start_row {
            return Err(SpreadsheetError::MissingHeader(header_row));
        }
        let header_offset = (header_row - start_row) as usize;

        // pad on the left so that column indices are absolute
        let pad = start_col as usize;
        let mut rows = range.rows().skip(header_offset).map(|row| {
            let mut cells = vec![Data::Empty; pad];
            cells.extend(row.iter().cloned());
            cells
        });

        let header = rows
            .next()
            .ok_or(SpreadsheetError::MissingHeader(header_row))?;
        let headers: Vec<String> = header
            .iter()
            .map(|cell| cell_text(cell).unwrap_or_default().trim().to_string())
            .collect();
        let rows: Vec<Vec<Data>> = rows.collect();

        debug!(
            "Read {} columns and {} data rows below header row {}",
            headers.len(),
            rows.len(),
            header_row
        );
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Data>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column with the given header text
    pub fn column(&self, name: &str) -> Result<usize, SpreadsheetError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SpreadsheetError::MissingColumn(name.to_string()))
    }

    /// Drop the last `n` data rows (footer notes)
    pub fn drop_tail(&mut self, n: usize) {
        let keep = self.rows.len().saturating_sub(n);
        self.rows.truncate(keep);
    }

    /// Keep only the first `n` columns
    pub fn keep_columns(&mut self, n: usize) {
        self.headers.truncate(n);
        for row in &mut self.rows {
            row.truncate(n);
        }
    }
}

fn first_sheet<R: Reader<RS>, RS>(workbook: &mut R) -> Result<Range<Data>, SpreadsheetError>
where
    RS: std::io::Read + std::io::Seek,
    R::Error: std::fmt::Display,
{
    match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => Ok(range),
        Some(Err(e)) => Err(SpreadsheetError::SheetRead(e.to_string())),
        None => Err(SpreadsheetError::NoWorksheet),
    }
}

/// Text of a cell; empty and error cells have no text
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Error(_) | Data::Empty => None,
    }
}

/// Numeric value of a cell, parsing numeric text
pub fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

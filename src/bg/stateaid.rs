use tracing::{debug, info};

use super::BgError;
use crate::importers::excel_importer::{cell_text, SheetTable, SpreadsheetError};
use crate::importers::Downloader;

pub const DEFAULT_STATEAID_URL: &str = "https://stateaid.minfin.bg/document/860";

/// The register has one title row above its header
pub const STATEAID_HEADER_ROW: u32 = 1;

/// Columns past the tenth are free-form annotations
pub const STATEAID_COLUMNS: usize = 10;

/// One row of the state aid register
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateAidScheme {
    /// First column, e.g. `"SA.41234, Support for innovation"`
    pub label: Option<String>,
    /// Second column: free text naming the operational program procedures
    pub reference: Option<String>,
}

/// The minfin.bg state aid register, in sheet order
#[derive(Debug, Clone, Default)]
pub struct StateAidRegister {
    schemes: Vec<StateAidScheme>,
}

impl StateAidRegister {
    pub fn new(schemes: Vec<StateAidScheme>) -> Self {
        Self { schemes }
    }

    pub fn from_table(table: &SheetTable) -> Self {
        let schemes = table
            .rows()
            .iter()
            .map(|row| StateAidScheme {
                label: row.first().and_then(cell_text),
                reference: row.get(1).and_then(cell_text),
            })
            .collect();
        Self { schemes }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SpreadsheetError> {
        let mut table = SheetTable::from_bytes(bytes, STATEAID_HEADER_ROW)?;
        table.keep_columns(STATEAID_COLUMNS);
        Ok(Self::from_table(&table))
    }

    /// Download and parse the register
    pub async fn fetch(downloader: &Downloader, url: &str) -> Result<Self, BgError> {
        info!("Fetching stateaid data at {url}");
        let bytes = downloader.download(url).await?;
        let register = Self::from_bytes(bytes)?;
        debug!("State aid register has {} rows", register.len());
        Ok(register)
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    /// Scheme code for a program key.
    ///
    /// The first row whose reference text contains `key` wins (plain,
    /// case-sensitive substring); the result is its label up to the first
    /// comma. Later matching rows are never consulted, even when the first
    /// match has no label.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let scheme = self
            .schemes
            .iter()
            .find(|s| s.reference.as_deref().is_some_and(|r| r.contains(key)))?;

        scheme
            .label
            .as_deref()
            .and_then(|label| label.split(',').next())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme(label: Option<&str>, reference: Option<&str>) -> StateAidScheme {
        StateAidScheme {
            label: label.map(String::from),
            reference: reference.map(String::from),
        }
    }

    fn register() -> StateAidRegister {
        StateAidRegister::new(vec![
            scheme(Some("SA.10000, unrelated"), None),
            scheme(
                Some("SA.41234, Innovation support"),
                Some("Procedure BG16RFOP002-2.001 Innovation"),
            ),
            scheme(Some("SA.40000, later duplicate"), Some("BG16RFOP002-2.001")),
            scheme(Some("SA.39999"), Some("bg06rdnp001-4.001 lower case")),
            scheme(None, Some("BG05M9OP001-1.002 no label")),
            scheme(Some("SA.55555"), Some("BG05M9OP001-1.002 second")),
        ])
    }

    #[test]
    fn test_lookup_first_match_wins() {
        assert_eq!(
            register().lookup("BG16RFOP002-2.001"),
            Some("SA.41234".to_string())
        );
    }

    #[test]
    fn test_lookup_substring_not_exact() {
        assert_eq!(register().lookup("RFOP002-2"), Some("SA.41234".to_string()));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(register().lookup("BG06RDNP001-4.001"), None);
        assert_eq!(
            register().lookup("bg06rdnp001-4.001"),
            Some("SA.39999".to_string())
        );
    }

    #[test]
    fn test_lookup_dot_is_literal() {
        assert_eq!(register().lookup("BG16RFOP002-2X001"), None);
    }

    #[test]
    fn test_lookup_first_match_without_label() {
        assert_eq!(register().lookup("BG05M9OP001-1.002"), None);
    }

    #[test]
    fn test_lookup_no_match() {
        assert_eq!(register().lookup("BG14MFOP001-3.003"), None);
        assert_eq!(StateAidRegister::default().lookup("anything"), None);
    }
}

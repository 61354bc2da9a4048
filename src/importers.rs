// ! Raw source readers: HTTP downloads, Excel workbooks and zipped XML archives

pub mod downloader;
pub mod excel_importer;
pub mod xml_archive;

// Re-export commonly used items
pub use downloader::Downloader;
pub use excel_importer::{SheetTable, SpreadsheetError};
pub use xml_archive::{ArchiveError, XmlArchive};

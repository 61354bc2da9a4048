use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write `rows` as a CSV file with a header line.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// failed or interrupted write never leaves a truncated CSV behind.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), OutputError> {
    let io_error = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;

    {
        let mut writer = csv::Writer::from_writer(temp.as_file_mut());
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(io_error)?;
    }

    temp.persist(path).map_err(|e| io_error(e.error))?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Serialize a decimal amount with two fractional digits
pub fn serialize_amount<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.2}"))
}

/// Like [`serialize_amount`], with missing amounts as empty fields
pub fn serialize_optional_amount<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.is_finite() => serialize_amount(v, serializer),
        _ => serializer.serialize_none(),
    }
}

//! Financials from CSV files, uploads and the bundled sample.
//!
//! Column types are inferred from the whole file: a column is numeric when
//! every non-empty cell parses as a number, otherwise it is read as text.

use crate::error::{DataError, Result};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// Sample peer set shipped with the crate (six tickers, two with history).
pub const SAMPLE_FINANCIALS_CSV: &str = include_str!("../data/sample_financials.csv");

fn csv_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
}

/// Read a financials CSV from disk.
pub fn read_financials_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let frame = csv_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .map_err(|e| parse_error(&path.display().to_string(), &e))?;
    tracing::debug!(path = %path.display(), rows = frame.height(), "read financials csv");
    Ok(frame)
}

/// Read a financials CSV from an in-memory upload.
pub fn read_financials_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let frame = csv_options()
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| parse_error("upload", &e))?;
    tracing::debug!(rows = frame.height(), "read uploaded financials");
    Ok(frame)
}

fn parse_error(source: &str, error: &PolarsError) -> DataError {
    DataError::Parse(format!("cannot read financials CSV from {source}: {error}"))
}

/// The bundled sample peer set.
pub fn sample_financials() -> Result<DataFrame> {
    read_financials_csv_bytes(SAMPLE_FINANCIALS_CSV.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_shape() {
        let sample = sample_financials().unwrap();
        assert_eq!(sample.height(), 8);
        assert!(sample.column("ticker").unwrap().dtype().is_string());
        assert!(sample.column("revenue").unwrap().dtype().is_integer());
        assert!(sample.column("price").unwrap().dtype().is_float());
        // ACME 2023 leaves ebitda blank
        assert_eq!(sample.column("ebitda").unwrap().null_count(), 1);
    }

    #[test]
    fn test_mixed_column_is_text() {
        let csv = b"ticker,revenue,note\nAAA,100,\nBBB,n/a,late filer\n";
        let frame = read_financials_csv_bytes(csv).unwrap();
        assert!(frame.column("revenue").unwrap().dtype().is_string());
        assert!(frame.column("note").unwrap().dtype().is_string());
    }

    #[test]
    fn test_empty_cells_are_null() {
        let csv = b"ticker,revenue,ebit\nAAA,100,\nBBB,,5\n";
        let frame = read_financials_csv_bytes(csv).unwrap();
        assert_eq!(frame.column("revenue").unwrap().null_count(), 1);
        assert_eq!(frame.column("ebit").unwrap().null_count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let result = read_financials_csv("/definitely/not/here.csv");
        assert!(matches!(
            result,
            Err(DataError::Polars(_) | DataError::Io(_) | DataError::Parse(_))
        ));
    }

    #[test]
    fn test_unreadable_upload_is_a_parse_error() {
        let result = read_financials_csv_bytes(b"");
        assert!(matches!(result, Err(DataError::Parse(msg)) if msg.contains("upload")));
    }
}

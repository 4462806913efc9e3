//! Export of scored batches.
//!
//! Report cards carry the headline score, the display ratios and the size
//! measures; the metrics table carries every column of the scored frame.

use crate::table::Table;
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Spreadsheet writer error.
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// A required column is absent.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,

    /// Excel workbook with a single sheet. Binary; use
    /// [`Exporter::export_to_bytes`] or [`Exporter::export_to_file`].
    Xlsx,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
            Self::Xlsx => "xlsx",
        }
    }

    /// Whether the format can be produced as a string.
    pub const fn is_text(&self) -> bool {
        !matches!(self, Self::Xlsx)
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data as raw bytes; the only way to get binary formats.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the format is unsupported.
    fn export_to_bytes(&self, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        Ok(self.export_to_string(format)?.into_bytes())
    }

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_bytes(format)?;
        let mut file = File::create(path)?;
        file.write_all(&content)?;
        Ok(())
    }
}

/// Error for a binary format requested as text.
pub(crate) fn not_text(format: ExportFormat) -> ExportError {
    ExportError::InvalidFormat(format!(
        "{} is a binary format; export it as bytes",
        format.extension()
    ))
}

/// Sheet name of the report card workbook.
pub const REPORT_CARD_SHEET: &str = "Scores";

/// Sheet name of the metrics table workbook.
pub const METRICS_SHEET: &str = "Metrics";

/// Columns of a report card, in output order.
pub const REPORT_CARD_COLUMNS: [&str; 15] = [
    "ticker",
    "score_0_100",
    "ebit_margin",
    "ebitda_margin",
    "roa",
    "roe",
    "current_ratio",
    "quick_ratio",
    "debt_to_equity",
    "net_debt_to_ebitda",
    "ocf_margin",
    "fcf_margin",
    "ev_ebitda",
    "market_cap",
    "enterprise_value",
];

/// Compact per-company summary of a scored batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportCards {
    table: Table,
}

impl ReportCards {
    /// Select the report card columns present in `scored`.
    ///
    /// Absent columns are skipped; row order is kept.
    pub fn from_scored(scored: &DataFrame) -> Result<Self, ExportError> {
        let present: Vec<&str> = REPORT_CARD_COLUMNS
            .iter()
            .copied()
            .filter(|name| scored.column(name).is_ok())
            .collect();
        Ok(Self {
            table: Table::from_frame(scored, &present)?,
        })
    }

    /// Underlying table.
    pub const fn table(&self) -> &Table {
        &self.table
    }
}

impl Exporter for ReportCards {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        self.table.export_to_string(format)
    }

    fn export_to_bytes(&self, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        match format {
            ExportFormat::Xlsx => self.table.to_xlsx(REPORT_CARD_SHEET),
            other => self.table.export_to_bytes(other),
        }
    }
}

/// Every column of a scored (or metrics) frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsTable {
    table: Table,
}

impl MetricsTable {
    /// Copy the whole frame.
    pub fn from_frame(frame: &DataFrame) -> Result<Self, ExportError> {
        Ok(Self {
            table: Table::from_frame_all(frame)?,
        })
    }

    /// Underlying table.
    pub const fn table(&self) -> &Table {
        &self.table
    }
}

impl Exporter for MetricsTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        self.table.export_to_string(format)
    }

    fn export_to_bytes(&self, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        match format {
            ExportFormat::Xlsx => self.table.to_xlsx(METRICS_SHEET),
            other => self.table.export_to_bytes(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn scored() -> DataFrame {
        df! {
            "ticker" => ["BBB", "AAA"],
            "score_0_100" => [99.9, 0.0],
            "roe" => [Some(0.12), None],
            "market_cap" => [200.0, 50.0],
            "z_roe" => [1.0, -1.0],
            "error" => [None::<&str>, Some("SEC CIK not found for ticker 'aaa'")],
        }
        .unwrap()
    }

    #[test]
    fn test_report_cards_select_present_columns() {
        let cards = ReportCards::from_scored(&scored()).unwrap();
        assert_eq!(
            cards.table().columns(),
            ["ticker", "score_0_100", "roe", "market_cap"]
        );
        assert_eq!(cards.table().len(), 2);
        assert_eq!(cards.table().get(0, "ticker"), Some(&Cell::Text("BBB".into())));
    }

    #[test]
    fn test_report_cards_csv() {
        let cards = ReportCards::from_scored(&scored()).unwrap();
        let csv = cards.export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("ticker,score_0_100,roe,market_cap"));
        assert_eq!(lines.next(), Some("BBB,99.9,0.12,200"));
        assert_eq!(lines.next(), Some("AAA,0,,50"));
    }

    #[test]
    fn test_empty_frame_exports_header_only() {
        let cards = ReportCards::from_scored(&scored().head(Some(0))).unwrap();
        let csv = cards.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv, "ticker,score_0_100,roe,market_cap\n");
    }

    #[test]
    fn test_metrics_table_keeps_everything() {
        let table = MetricsTable::from_frame(&scored()).unwrap();
        assert_eq!(table.table().columns().len(), 6);
        let json = table.export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(json.contains("\"z_roe\": -1.0"));
        assert!(json.contains("\"error\": null"));
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
        assert_eq!(ExportFormat::Xlsx.extension(), "xlsx");
        assert!(!ExportFormat::Xlsx.is_text());
    }

    #[test]
    fn test_xlsx_is_bytes_only() {
        let cards = ReportCards::from_scored(&scored()).unwrap();
        assert!(matches!(
            cards.export_to_string(ExportFormat::Xlsx),
            Err(ExportError::InvalidFormat(_))
        ));
        let bytes = cards.export_to_bytes(ExportFormat::Xlsx).unwrap();
        // xlsx is a zip container
        assert!(bytes.starts_with(b"PK"));
    }
}

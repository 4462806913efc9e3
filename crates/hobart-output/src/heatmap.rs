//! Peer heatmap: tickers against the key ratios.
//!
//! The matrix is what a chart would plot. Undefined and absent cells are
//! shown as `0.0`, so a company with no data sits at zero rather than
//! disappearing.

use crate::export::{ExportError, ExportFormat, Exporter, not_text};
use crate::table::{Cell, Table};
use polars::prelude::*;
use serde::Serialize;

/// Ratio columns of the heatmap, in display order.
pub const HEATMAP_COLUMNS: [&str; 10] = [
    "ebit_margin",
    "ebitda_margin",
    "roa",
    "roe",
    "current_ratio",
    "quick_ratio",
    "debt_to_equity",
    "ocf_margin",
    "fcf_margin",
    "ev_ebitda",
];

/// Sheet name of the heatmap workbook.
pub const HEATMAP_SHEET: &str = "Heatmap";

/// Glyphs from lowest to highest within a column.
const SHADES: [char; 5] = ['·', '░', '▒', '▓', '█'];

/// Tickers by ratio matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerHeatmap {
    tickers: Vec<String>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl PeerHeatmap {
    /// Build the matrix from a scored frame, keeping its row order.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::MissingColumn`] if there is no `ticker` column.
    pub fn from_scored(scored: &DataFrame) -> Result<Self, ExportError> {
        let tickers: Vec<String> = scored
            .column("ticker")
            .map_err(|_| ExportError::MissingColumn("ticker".to_string()))?
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|t| t.unwrap_or_default().to_string())
            .collect();

        let mut by_column = Vec::with_capacity(HEATMAP_COLUMNS.len());
        for name in HEATMAP_COLUMNS {
            let values = match scored.column(name) {
                Ok(column) => column
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
                    .collect(),
                Err(_) => vec![0.0; tickers.len()],
            };
            by_column.push(values);
        }

        let values = (0..tickers.len())
            .map(|i| by_column.iter().map(|column: &Vec<f64>| column[i]).collect())
            .collect();

        Ok(Self {
            tickers,
            columns: HEATMAP_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            values,
        })
    }

    /// Row labels.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Column labels.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row-major values.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Value for a ticker and column.
    pub fn value(&self, ticker: &str, column: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == ticker)?;
        let j = self.columns.iter().position(|c| c == column)?;
        Some(self.values[i][j])
    }

    /// `(min, max)` of each column; `None` for an empty heatmap.
    pub fn column_ranges(&self) -> Vec<Option<(f64, f64)>> {
        (0..self.columns.len())
            .map(|j| {
                self.values.iter().map(|row| row[j]).fold(None, |acc, v| match acc {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
                })
            })
            .collect()
    }

    /// Text rendering, shading each cell relative to its column.
    pub fn render_text(&self) -> String {
        let ranges = self.column_ranges();
        let label_width = self
            .tickers
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("Ticker".len());

        let mut output = String::new();
        output.push_str(&format!("{:<label_width$}", "Ticker"));
        for (j, _) in self.columns.iter().enumerate() {
            output.push_str(&format!(" {:>2}", j + 1));
        }
        output.push('\n');
        output.push_str(&"-".repeat(label_width + 3 * self.columns.len()));
        output.push('\n');

        for (ticker, row) in self.tickers.iter().zip(&self.values) {
            output.push_str(&format!("{ticker:<label_width$}"));
            for (value, range) in row.iter().zip(&ranges) {
                output.push_str(&format!("  {}", shade(*value, *range)));
            }
            output.push('\n');
        }

        output.push('\n');
        for (j, column) in self.columns.iter().enumerate() {
            output.push_str(&format!("{:>2} {column}", j + 1));
            if let Some(Some((lo, hi))) = ranges.get(j) {
                output.push_str(&format!(" [{lo:.3} .. {hi:.3}]"));
            }
            output.push('\n');
        }
        output
    }

    fn to_table(&self) -> Table {
        let columns = std::iter::once("ticker".to_string())
            .chain(self.columns.iter().cloned())
            .collect();
        let rows = self
            .tickers
            .iter()
            .zip(&self.values)
            .map(|(ticker, row)| {
                std::iter::once(Cell::Text(ticker.clone()))
                    .chain(row.iter().map(|v| Cell::Number(*v)))
                    .collect()
            })
            .collect();
        Table::from_parts(columns, rows)
    }

    fn to_csv(&self) -> Result<String, ExportError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(std::iter::once("ticker").chain(self.columns.iter().map(String::as_str)))?;
        for (ticker, row) in self.tickers.iter().zip(&self.values) {
            wtr.write_record(
                std::iter::once(ticker.clone()).chain(row.iter().map(f64::to_string)),
            )?;
        }
        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
    }
}

fn shade(value: f64, range: Option<(f64, f64)>) -> char {
    let Some((lo, hi)) = range else {
        return SHADES[0];
    };
    if hi - lo <= f64::EPSILON {
        return SHADES[0];
    }
    let position = (value - lo) / (hi - lo);
    let last = SHADES.len() - 1;
    let index = (position * last as f64).round().clamp(0.0, last as f64) as usize;
    SHADES[index]
}

impl Exporter for PeerHeatmap {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
            ExportFormat::Xlsx => Err(not_text(format)),
        }
    }

    fn export_to_bytes(&self, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        match format {
            ExportFormat::Xlsx => self.to_table().to_xlsx(HEATMAP_SHEET),
            other => Ok(self.export_to_string(other)?.into_bytes()),
        }
    }
}

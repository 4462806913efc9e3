//! Column-ordered tables lifted out of a DataFrame for export.

use crate::export::{ExportError, ExportFormat, Exporter, not_text};
use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

const DEFAULT_SHEET: &str = "Sheet1";

/// One exported value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Finite float value
    Number(f64),
    /// Undefined (null or non-finite)
    Missing,
}

impl Cell {
    fn from_any(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Self::Missing,
            AnyValue::Float64(v) => Self::number(v),
            AnyValue::Float32(v) => Self::number(f64::from(v)),
            AnyValue::Int64(v) => Self::Integer(v),
            AnyValue::Int32(v) => Self::Integer(i64::from(v)),
            AnyValue::Int16(v) => Self::Integer(i64::from(v)),
            AnyValue::Int8(v) => Self::Integer(i64::from(v)),
            AnyValue::UInt16(v) => Self::Integer(i64::from(v)),
            AnyValue::UInt8(v) => Self::Integer(i64::from(v)),
            AnyValue::UInt32(v) => Self::Integer(i64::from(v)),
            AnyValue::String(v) => Self::Text(v.to_string()),
            AnyValue::StringOwned(v) => Self::Text(v.to_string()),
            other => Self::Text(other.to_string()),
        }
    }

    fn number(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::Missing
        }
    }

    /// Numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::Text(_) | Self::Missing => None,
        }
    }

    /// CSV field text; undefined cells are empty.
    pub fn to_field(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(v) => v.to_string(),
            Self::Number(v) => v.to_string(),
            Self::Missing => String::new(),
        }
    }
}

/// Rows of cells under a fixed column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Copy the given columns of `frame`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::MissingColumn`] if a column does not exist.
    pub fn from_frame(frame: &DataFrame, columns: &[&str]) -> Result<Self, ExportError> {
        let mut by_column = Vec::with_capacity(columns.len());
        for name in columns {
            let column = frame
                .column(name)
                .map_err(|_| ExportError::MissingColumn((*name).to_string()))?;
            let cells: Vec<Cell> = column
                .as_materialized_series()
                .iter()
                .map(Cell::from_any)
                .collect();
            by_column.push(cells);
        }

        let rows = (0..frame.height())
            .map(|i| by_column.iter().map(|cells| cells[i].clone()).collect())
            .collect();

        Ok(Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows,
        })
    }

    /// Table from column names and row-major cells.
    pub(crate) const fn from_parts(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Copy every column of `frame`.
    pub fn from_frame_all(frame: &DataFrame) -> Result<Self, ExportError> {
        let names: Vec<&str> = frame
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect();
        Self::from_frame(frame, &names)
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows of cells.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` in the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let j = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(j)
    }

    fn to_csv(&self) -> Result<String, ExportError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(Cell::to_field))?;
        }
        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
    }

    /// Write the table as a one-sheet workbook: a bold header row, then one
    /// row per record. Undefined cells are left blank.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Xlsx`] if the workbook cannot be built and
    /// [`ExportError::InvalidFormat`] if the table exceeds sheet limits.
    pub fn to_xlsx(&self, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
        let too_large = || ExportError::InvalidFormat("table exceeds worksheet limits".into());
        let header = Format::new().set_bold();

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;

        for (j, name) in self.columns.iter().enumerate() {
            let col = u16::try_from(j).map_err(|_| too_large())?;
            sheet.write_string_with_format(0, col, name.as_str(), &header)?;
        }
        for (i, row) in self.rows.iter().enumerate() {
            let r = u32::try_from(i + 1).map_err(|_| too_large())?;
            for (j, cell) in row.iter().enumerate() {
                let col = u16::try_from(j).map_err(|_| too_large())?;
                match cell {
                    Cell::Text(text) => {
                        sheet.write_string(r, col, text.as_str())?;
                    }
                    Cell::Integer(v) => {
                        sheet.write_number(r, col, *v as f64)?;
                    }
                    Cell::Number(v) => {
                        sheet.write_number(r, col, *v)?;
                    }
                    Cell::Missing => {}
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// Serializes as an array of objects keyed by column name, in column order.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&Record {
                columns: &self.columns,
                cells: row,
            })?;
        }
        seq.end()
    }
}

struct Record<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

impl Exporter for Table {
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
            ExportFormat::Xlsx => self.to_xlsx(DEFAULT_SHEET),
            other => Ok(self.export_to_string(other)?.into_bytes()),
        }
    }
}

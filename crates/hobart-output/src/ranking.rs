//! Ranking tables for terminals and documents.

use crate::export::ExportError;
use crate::table::{Cell, Table};
use polars::prelude::*;

/// Ranking columns with their display labels.
pub const RANKING_COLUMNS: [(&str, &str); 13] = [
    ("ticker", "Ticker"),
    ("score_0_100", "Score"),
    ("ebit_margin", "EBIT m"),
    ("ebitda_margin", "EBITDA m"),
    ("roa", "ROA"),
    ("roe", "ROE"),
    ("current_ratio", "Current"),
    ("quick_ratio", "Quick"),
    ("debt_to_equity", "D/E"),
    ("net_debt_to_ebitda", "ND/EBITDA"),
    ("ocf_margin", "OCF m"),
    ("fcf_margin", "FCF m"),
    ("ev_ebitda", "EV/EBITDA"),
];

const TICKER_WIDTH: usize = 8;
const VALUE_WIDTH: usize = 10;

/// Scored companies in rank order with their display ratios.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    table: Table,
}

impl Ranking {
    /// Take the ranking columns present in `scored`, keeping its row order.
    pub fn from_scored(scored: &DataFrame) -> Result<Self, ExportError> {
        let present: Vec<&str> = RANKING_COLUMNS
            .iter()
            .map(|(name, _)| *name)
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

    fn labels(&self) -> Vec<&'static str> {
        self.table
            .columns()
            .iter()
            .map(|name| {
                RANKING_COLUMNS
                    .iter()
                    .find(|(column, _)| name.as_str() == *column)
                    .map_or("?", |(_, label)| *label)
            })
            .collect()
    }

    /// Format as an ASCII table.
    pub fn to_ascii_table(&self, title: &str) -> String {
        let labels = self.labels();
        let width = TICKER_WIDTH + 1 + (VALUE_WIDTH + 1) * labels.len().saturating_sub(1);
        let mut output = String::new();

        output.push_str(&format!("\n{title}\n"));
        output.push_str(&format!("Companies: {}\n", self.table.len()));
        output.push_str(&"=".repeat(width));
        output.push('\n');

        for (j, label) in labels.iter().enumerate() {
            if j == 0 {
                output.push_str(&format!("{label:<TICKER_WIDTH$}"));
            } else {
                output.push_str(&format!(" {label:>VALUE_WIDTH$}"));
            }
        }
        output.push('\n');
        output.push_str(&"-".repeat(width));
        output.push('\n');

        for row in self.table.rows() {
            for (j, (cell, name)) in row.iter().zip(self.table.columns()).enumerate() {
                if j == 0 {
                    output.push_str(&format!("{:<TICKER_WIDTH$}", cell.to_field()));
                } else {
                    output.push_str(&format!(" {:>VALUE_WIDTH$}", format_value(cell, name)));
                }
            }
            output.push('\n');
        }

        output.push_str(&"=".repeat(width));
        output.push('\n');
        output
    }

    /// Format as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let labels = self.labels();
        let mut output = String::new();

        output.push_str(&format!("| {} |\n", labels.join(" | ")));
        output.push_str(&format!("|{}\n", "---|".repeat(labels.len())));
        for row in self.table.rows() {
            let cells: Vec<String> = row
                .iter()
                .zip(self.table.columns())
                .map(|(cell, name)| match cell {
                    Cell::Text(text) => text.clone(),
                    _ => format_value(cell, name),
                })
                .collect();
            output.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        output
    }
}

fn format_value(cell: &Cell, column: &str) -> String {
    match cell.as_f64() {
        Some(v) if column == "score_0_100" => format!("{v:.1}"),
        Some(v) => format!("{v:.3}"),
        None => match cell {
            Cell::Text(text) => text.clone(),
            _ => "n/a".to_string(),
        },
    }
}

//! Terminal and file output of a scored batch.

use super::CliError;
use hobart_output::{ExportFormat, Exporter, MetricsTable, PeerHeatmap, Ranking, ReportCards};
use hobart_scoring::ScoreWeights;
use polars::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Report card export file stem.
pub(crate) const REPORT_CARDS_STEM: &str = "company_report_cards";
/// Full metrics table file name.
pub(crate) const METRICS_FILE: &str = "metrics_long.csv";
/// Heatmap matrix file name.
pub(crate) const HEATMAP_FILE: &str = "peer_heatmap.csv";

/// How the ranking is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Plain-text table
    Text,
    /// Markdown table
    Markdown,
    /// JSON document
    Json,
}

/// Render the scored batch for the terminal.
pub(crate) fn render(
    scored: &DataFrame,
    weights: &ScoreWeights,
    source: &str,
    format: OutputFormat,
    heatmap: bool,
) -> Result<String, CliError> {
    let ranking = Ranking::from_scored(scored)?;
    let heatmap = if heatmap {
        Some(PeerHeatmap::from_scored(scored)?)
    } else {
        None
    };

    let output = match format {
        OutputFormat::Text => {
            let mut out = ranking.to_ascii_table("Corporate Health Ranking");
            out.push_str(&format!("Source: {source}\n"));
            out.push_str(&format_weights(weights));
            if let Some(heatmap) = &heatmap {
                out.push_str("\nPeer heatmap (shade by column range)\n");
                out.push_str(&heatmap.render_text());
            }
            out
        }
        OutputFormat::Markdown => {
            let mut out = format!("## Corporate Health Ranking\n\n{}", ranking.to_markdown());
            if let Some(heatmap) = &heatmap {
                out.push_str(&format!("\n```text\n{}```\n", heatmap.render_text()));
            }
            out
        }
        OutputFormat::Json => {
            let document = json!({
                "source": source,
                "weights": weights,
                "ranking": ranking.table(),
                "heatmap": heatmap,
            });
            serde_json::to_string_pretty(&document)?
        }
    };
    Ok(output)
}

fn format_weights(weights: &ScoreWeights) -> String {
    format!(
        "Weights: profitability {:.2}, liquidity {:.2}, leverage {:.2}, cash generation {:.2}\n",
        weights.profitability, weights.liquidity, weights.leverage, weights.cash_gen
    )
}

/// Write report cards (CSV, JSON and a workbook), the full metrics table and
/// optionally the heatmap.
///
/// Returns the paths written.
pub(crate) fn write_reports(
    scored: &DataFrame,
    dir: &Path,
    heatmap: bool,
) -> Result<Vec<PathBuf>, CliError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let cards = ReportCards::from_scored(scored)?;
    for format in [ExportFormat::Csv, ExportFormat::PrettyJson, ExportFormat::Xlsx] {
        let path = dir.join(format!("{REPORT_CARDS_STEM}.{}", format.extension()));
        cards.export_to_file(&path, format)?;
        written.push(path);
    }

    let path = dir.join(METRICS_FILE);
    MetricsTable::from_frame(scored)?.export_to_file(&path, ExportFormat::Csv)?;
    written.push(path);

    if heatmap {
        let path = dir.join(HEATMAP_FILE);
        PeerHeatmap::from_scored(scored)?.export_to_file(&path, ExportFormat::Csv)?;
        written.push(path);
    }

    tracing::debug!(files = written.len(), dir = %dir.display(), "wrote reports");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart::HealthPipeline;
    use hobart_data::sample_financials;

    fn scored() -> DataFrame {
        HealthPipeline::default().run(&sample_financials().unwrap()).unwrap()
    }

    #[test]
    fn test_text_report_lists_every_company() {
        let text = render(&scored(), &ScoreWeights::default(), "sample", OutputFormat::Text, true)
            .unwrap();
        for ticker in ["ACME", "GLOBX", "INITK", "UMBRL", "WAYNE", "STARK"] {
            assert!(text.contains(ticker), "{ticker} missing");
        }
        assert!(text.contains("Peer heatmap"));
        assert!(text.contains("Weights: profitability 0.35"));
    }

    #[test]
    fn test_json_report_parses() {
        let text = render(&scored(), &ScoreWeights::default(), "sample", OutputFormat::Json, false)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["ranking"].as_array().unwrap().len(), 6);
        assert!(value["heatmap"].is_null());
        assert_eq!(value["weights"]["leverage"], 0.2);
    }

    #[test]
    fn test_reports_written() {
        let dir = std::env::temp_dir().join(format!("hobart-reports-{}", std::process::id()));
        let written = write_reports(&scored(), &dir, true).unwrap();
        assert_eq!(written.len(), 5);
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }
        assert!(dir.join("company_report_cards.csv").exists());
        let workbook = std::fs::metadata(dir.join("company_report_cards.xlsx")).unwrap();
        assert!(workbook.len() > 0);
        assert!(dir.join("metrics_long.csv").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod heatmap;
pub mod ranking;
pub mod table;

pub use export::{
    ExportError, ExportFormat, Exporter, METRICS_SHEET, MetricsTable, REPORT_CARD_COLUMNS,
    REPORT_CARD_SHEET, ReportCards,
};
pub use heatmap::{HEATMAP_COLUMNS, HEATMAP_SHEET, PeerHeatmap};
pub use ranking::{RANKING_COLUMNS, Ranking};
pub use table::{Cell, Table};

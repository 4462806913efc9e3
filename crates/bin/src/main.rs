//! Hobart CLI binary.
//!
//! Scores a batch of companies on financial health relative to each other.

mod integration;

use clap::{Args, Parser, Subcommand};
use hobart::HealthPipeline;
use hobart_data::DEFAULT_CONCURRENCY;
use hobart_metrics::DerivedMetric;
use hobart_scoring::{MetricCategory, ScoreWeights, get_metric_info, metrics_by_category};
use integration::CliError;
use integration::reports::{OutputFormat, render, write_reports};
use integration::sources::{InputSource, load_batch};
use integration::weights::{WeightOverrides, resolve_weights};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: peer-relative corporate financial health scoring", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score and rank a batch of companies
    Score(ScoreArgs),

    /// List the derived metrics and how they are scored
    Metrics,
}

#[derive(Args)]
struct ScoreArgs {
    /// Read raw financials from a CSV file
    #[arg(long, conflicts_with_all = ["sample", "tickers"])]
    csv: Option<PathBuf>,

    /// Use the bundled sample financials (default)
    #[arg(long, conflicts_with = "tickers")]
    sample: bool,

    /// Fetch financials for these tickers from SEC EDGAR and Yahoo Finance
    #[arg(long, value_delimiter = ',')]
    tickers: Vec<String>,

    /// Weight of the profitability category
    #[arg(long)]
    profitability: Option<f64>,

    /// Weight of the liquidity category
    #[arg(long)]
    liquidity: Option<f64>,

    /// Weight of the leverage category
    #[arg(long)]
    leverage: Option<f64>,

    /// Weight of the cash generation category
    #[arg(long)]
    cash_gen: Option<f64>,

    /// JSON file with category weights
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Write report cards and the metrics table into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Include the peer heatmap
    #[arg(long)]
    heatmap: bool,

    /// Number of tickers fetched concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score(args) => score(args).await?,
        Commands::Metrics => list_metrics(),
    }

    Ok(())
}

async fn score(args: ScoreArgs) -> Result<(), CliError> {
    let overrides = WeightOverrides {
        profitability: args.profitability,
        liquidity: args.liquidity,
        leverage: args.leverage,
        cash_gen: args.cash_gen,
    };
    let weights = resolve_weights(args.weights.as_deref(), overrides)?;

    let source = if args.sample {
        InputSource::Sample
    } else {
        InputSource::from_flags(args.csv, args.tickers)
    };
    let raw = load_batch(&source, args.concurrency).await?;
    let scored = HealthPipeline::new(weights).run(&raw)?;

    println!(
        "{}",
        render(&scored, &weights, &source.describe(), args.format, args.heatmap)?
    );

    if let Some(dir) = args.out_dir {
        for path in write_reports(&scored, &dir, args.heatmap)? {
            eprintln!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn list_metrics() {
    let defaults = ScoreWeights::default();

    println!("Scored Metrics");
    println!("==============\n");
    for category in MetricCategory::ALL {
        println!(
            "{} (default weight {:.2})",
            category,
            defaults.weight_for(category)
        );
        for metric in metrics_by_category(category) {
            println!("  {:<16} {:?}  {}", metric.name, metric.direction, metric.description);
        }
        println!();
    }

    println!("Reported Only");
    println!("=============\n");
    for metric in DerivedMetric::ALL
        .iter()
        .filter(|m| get_metric_info(m.name()).is_none())
    {
        println!("  {}", metric);
    }
}

//! Hobart CLI binary.
//!
//! Provides the command-line interface for portfolio analysis and the seeded
//! simulation.

mod integration;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use hobart::{AnalysisConfig, AnalysisReport, PortfolioAnalysis, analyze_simulation};
use hobart_data::SimulationConfig;
use hobart_data::yahoo::YahooQuoteProvider;
use hobart_output::{ExportFormat, Exporter};
use hobart_returns::RebalanceFrequency;
use indicatif::{ProgressBar, ProgressStyle};
use integration::data_pipeline::{MarketData, fetch_market_data, load_csv_market_data};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration as StdDuration;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: portfolio risk and return analytics", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a weighted portfolio against its benchmarks
    Analyze {
        /// TOML configuration file (defaults to the built-in portfolio)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Wide price CSV (date column plus one column per ticker); fetched from Yahoo when omitted
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Separate wide price CSV for benchmarks
        #[arg(long, requires = "prices")]
        benchmark_prices: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "outputs")]
        output: PathBuf,

        /// Hold initial weights instead of rebalancing
        #[arg(long)]
        no_rebalance: bool,

        /// Rebalancing frequency (monthly, quarterly, semiannual, annual)
        #[arg(long)]
        frequency: Option<RebalanceFrequency>,

        /// Rolling Sharpe window in trading days
        #[arg(long)]
        window: Option<usize>,

        /// Console output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Analyze a seeded simulated portfolio
    Simulate {
        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Simulated years of trading days
        #[arg(long, default_value = "3")]
        years: usize,

        /// Portfolio document path
        #[arg(long, default_value = "data/portfolio.json")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Metrics and horizon tables
    Text,
    /// The portfolio document as JSON
    Json,
}

fn init_logging(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Analyze {
            config,
            prices,
            benchmark_prices,
            output,
            no_rebalance,
            frequency,
            window,
            format,
        } => {
            let mut config = match config {
                Some(path) => AnalysisConfig::load(path)?,
                None => AnalysisConfig::default(),
            };
            if no_rebalance {
                config.rebalance = false;
            }
            if let Some(frequency) = frequency {
                config.rebalance_frequency = frequency;
            }
            if let Some(window) = window {
                config.rolling_window = window;
            }

            run_analyze(config, prices.as_deref(), benchmark_prices.as_deref(), &output, format).await
        }
        Commands::Simulate {
            seed,
            years,
            output,
        } => run_simulate(seed, years, &output),
    }
}

async fn run_analyze(
    config: AnalysisConfig,
    prices: Option<&Path>,
    benchmark_prices: Option<&Path>,
    output: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let analysis = PortfolioAnalysis::new(config)?;
    let config = analysis.config();

    let market = match prices {
        Some(path) => {
            info!("Loading prices from {}", path.display());
            load_csv_market_data(path, benchmark_prices)?
        }
        None => {
            let provider = YahooQuoteProvider::new()?;
            let pb = ProgressBar::new(config.all_tickers().len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("█▓░"),
            );
            pb.enable_steady_tick(StdDuration::from_millis(100));

            let market = fetch_market_data(&provider, config, Some(&pb)).await?;
            pb.finish_with_message("Prices downloaded");
            market
        }
    };
    let MarketData {
        portfolio,
        benchmarks,
    } = market;
    if !portfolio.dropped.is_empty() {
        info!(dropped = ?portfolio.dropped, "tickers without full price history");
    }

    let as_of = Utc::now().date_naive().min(config.end_date);
    let report = analysis.run(&portfolio.matrix, benchmarks.as_ref().map(|b| &b.matrix), as_of)?;

    match format {
        OutputFormat::Text => println!("{}", report.summary().to_ascii_table()),
        OutputFormat::Json => println!(
            "{}",
            report.document(Utc::now()).export_to_string(ExportFormat::PrettyJson)?
        ),
    }

    write_outputs(&report, output)?;
    println!("Results saved in {}", output.display());
    Ok(())
}

fn run_simulate(seed: u64, years: usize, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let simulation = SimulationConfig::with_years(seed, years);
    let report = analyze_simulation(&simulation)?;

    println!("{}", report.summary().to_ascii_table());
    report
        .document(Utc::now())
        .export_to_file(output, ExportFormat::PrettyJson)?;
    println!("Portfolio data saved to {}", output.display());
    Ok(())
}

fn write_outputs(report: &AnalysisReport, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    report
        .document(Utc::now())
        .export_to_file(&dir.join("portfolio.json"), ExportFormat::PrettyJson)?;
    report
        .metrics_export()
        .export_to_file(&dir.join("metrics.csv"), ExportFormat::Csv)?;
    report
        .series_export()
        .export_to_file(&dir.join("series.csv"), ExportFormat::Csv)?;
    info!(dir = %dir.display(), "wrote portfolio.json, metrics.csv, series.csv");
    Ok(())
}

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod config;
mod dashboard;
mod error;
mod extract;
mod library;
mod pipeline;
mod recommend;
mod scraper;
mod utils;

use config::{ScrapeConfig, DASHBOARD_LOG, DEFAULT_LISTING_URL, DEFAULT_OUTPUT};
use pipeline::ScrapeReport;
use scraper::HttpSource;

/// Scrape a ranked movie chart into a CSV library and get recommendations from it
#[derive(Parser)]
#[command(name = "movie-master")]
#[command(about = "Movie chart scraper and recommender", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the chart and export it to CSV
    Scrape {
        /// Listing page to scrape
        #[arg(long, default_value = DEFAULT_LISTING_URL)]
        url: String,
        /// Only scrape the first N movies of the chart
        #[arg(short, long)]
        limit: Option<usize>,
        /// Where to write the library
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },
    /// Browse recommendations from an exported library
    Dashboard {
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape { url, limit, output } => {
            init_logging(None);
            scrape(ScrapeConfig { listing_url: url, limit, output })
        }
        Commands::Dashboard { input } => {
            init_logging(Some(DASHBOARD_LOG));
            dashboard::run_dashboard(&input, StdRng::from_entropy())
        }
    }
}

/// Log to stderr, or append to `log_file` when the terminal is taken by the dashboard.
fn init_logging(log_file: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file.map(|path| OpenOptions::new().create(true).append(true).open(path)) {
        Some(Ok(file)) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Some(Err(e)) => {
            eprintln!("Could not open log file: {e}");
            builder.with_writer(std::io::sink).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
}

fn scrape(config: ScrapeConfig) -> anyhow::Result<()> {
    println!("Scraping {}...", config.listing_url);

    let source = HttpSource::new()?;
    let report = pipeline::run(&source, &config.listing_url, config.limit);
    print_failures(&report);

    if report.listing_error.is_some() {
        eprintln!("Error fetching or parsing main page data; nothing to export.");
    }

    match library::write_library(&config.output, &report.records) {
        Ok(()) => {
            println!("Data has been exported to {}.", config.output.display());
            println!("Number of movies found: {}", report.records.len());
            if report.is_empty() {
                println!("The library is empty.");
            }
        }
        Err(e) => {
            error!(path = %config.output.display(), error = %e, "export failed");
            eprintln!("Error exporting data to CSV: {e:#}");
        }
    }

    let elapsed = report.finished_at - report.started_at;
    println!("Finished in {}s.", elapsed.num_seconds());
    Ok(())
}

fn print_failures(report: &ScrapeReport) {
    if report.failures.is_empty() {
        return;
    }
    let unreadable = report.failures.iter().filter(|f| f.error.is_parse()).count();
    eprintln!(
        "Skipped {} of {} movies ({} unreachable, {} without usable data):",
        report.failures.len(),
        report.attempted,
        report.failures.len() - unreadable,
        unreadable
    );
    for failure in &report.failures {
        eprintln!("  #{} {}: {}", failure.rank, failure.url, failure.error);
    }
}

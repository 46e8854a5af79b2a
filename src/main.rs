use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bora_analysis::config::Config;
use bora_analysis::export;
use bora_analysis::importers::CsvImporter;
use bora_analysis::services::ReportService;

#[derive(Parser)]
#[command(name = "bora-analysis")]
#[command(about = "Bora event statistics from yearly hourly station exports", long_about = None)]
struct Cli {
    /// Directory holding one CSV export per year (year taken from the file name)
    #[arg(long, env = "BORA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Write the JSON report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write every output table as CSV into this directory
    #[arg(long)]
    tables_dir: Option<PathBuf>,

    /// Emit compact JSON
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bora_analysis=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let data_dir = cli
        .data_dir
        .or_else(|| config.data_dir.clone())
        .ok_or("--data-dir (or BORA_DATA_DIR) is required")?;

    info!("Reading station exports from {}", data_dir.display());
    let files = CsvImporter::discover_files(&data_dir)?;

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let tables = CsvImporter::import_files(&files, config.csv_delimiter, |path| {
        progress.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        progress.inc(1);
    })?;
    progress.finish_with_message("import complete");

    let service = ReportService::from_config(&config)?;
    let report = service.run(&tables)?;

    let json = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };

    match cli.output {
        Some(path) => {
            std::fs::write(&path, json)?;
            info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(dir) = cli.tables_dir {
        export::write_tables(&dir, &report)?;
    }

    Ok(())
}

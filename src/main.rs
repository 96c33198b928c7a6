use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use egg_report::{batch, export, Config};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "egg-report")]
#[command(author, version, about = "Normalize weekly egg-grading HTML reports into one dataset")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a report file (.html/.htm) or archive (.zip) and write the
    /// Excel and CSV artifacts
    Parse {
        /// Report file or archive to parse
        path: PathBuf,

        /// Output directory for parsed_data.xlsx / parsed_data.csv
        /// (defaults to the configured upload directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include the source-file column in the artifacts
        #[arg(long)]
        include_source: bool,
    },

    /// Start the upload form server
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("egg_report=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::load();

    match args.command {
        Command::Parse {
            path,
            output,
            include_source,
        } => {
            if let Some(output) = output {
                config.server.upload_dir = output;
            }
            if include_source {
                config.export.include_source = true;
            }
            run_parse(&path, &config)
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            egg_report::serve::start(&config).context("upload server failed")
        }
    }
}

fn run_parse(path: &Path, config: &Config) -> anyhow::Result<()> {
    let dataset = batch::process_upload(path)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    if dataset.is_empty() {
        bail!("no valid table data found in {}", path.display());
    }

    std::fs::create_dir_all(&config.server.upload_dir)?;
    let xlsx_path = config.xlsx_artifact();
    let csv_path = config.csv_artifact();
    export::write_xlsx(&dataset, &xlsx_path, config.export.include_source)?;
    export::write_csv(&dataset, &csv_path, config.export.include_source)?;

    println!(
        "{} {} rows from {}",
        "Parsed".green().bold(),
        dataset.len(),
        path.display()
    );
    if dataset.fallback_window {
        println!(
            "{} report header had no date range; week labels are placeholders",
            "Warning:".yellow().bold()
        );
    }
    println!("  {} {}", "Excel:".bold(), xlsx_path.display());
    println!("  {} {}", "CSV:  ".bold(), csv_path.display());

    Ok(())
}

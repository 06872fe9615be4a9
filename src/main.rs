use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod compliance;
mod config;
mod engine;
mod error;
mod intent;
mod models;
mod render;
mod report;
mod response;
mod scope;
mod search;
mod store;

use crate::config::Config;
use crate::engine::ReportRequest;
use crate::error::ReportError;
use crate::render::OutputFormat;
use crate::store::postgres::PgStore;

#[derive(Parser)]
#[command(name = "training-compliance")]
#[command(about = "Role-scoped training compliance reports from plain-language prompts", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a reporting prompt for an authenticated caller
    Ask {
        #[arg(long)]
        prompt: String,
        /// Caller profile id or net id (defaults to COMPLIANCE_CALLER)
        #[arg(long)]
        caller: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Write the report to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Evaluate due dates as of this RFC 3339 timestamp
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Show how a prompt is classified, without touching the database
    Classify {
        #[arg(long)]
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ReportError>() {
            Some(report_err) => {
                eprintln!("error ({}): {err:#}", report_err.status_code());
                ExitCode::from(report_err.exit_code() as u8)
            }
            None => {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn execute(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Classify { prompt } => {
            let query = intent::classify(&prompt);
            println!("{}", serde_json::to_string_pretty(&query)?);
        }
        Commands::Ask {
            prompt,
            caller,
            format,
            out,
            now,
        } => {
            let config = Config::from_env()?;
            let store = PgStore::connect(config.database_url()?, config.max_connections).await?;

            let request = ReportRequest {
                credential: caller.or(config.default_caller),
                prompt,
            };
            let response = engine::run(&store, &request, now.unwrap_or_else(Utc::now)).await?;
            let rendered = render::render(&response, format)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Report written to {}.", path.display());
                }
                None => println!("{rendered}"),
            }
        }
    }

    Ok(())
}

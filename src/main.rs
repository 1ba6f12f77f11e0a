//! DriveSense CLI
//!
//! Driver behavior monitoring service and dataset tools.

use clap::{Parser, Subcommand};
use drivesense::config::Config;
use drivesense::sampler::{build_corpus, CorpusError};
use drivesense::server::{self, ServerConfig};
use drivesense::VERSION;
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "drivesense")]
#[command(version = VERSION)]
#[command(about = "Driver behavior monitoring service and dataset tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitoring web service
    Serve {
        /// Address to bind (overrides the config file)
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port to bind (overrides the config file)
        #[arg(long)]
        port: Option<u16>,

        /// Behavior classifier bundle path
        #[arg(long)]
        behavior_model: Option<PathBuf>,

        /// Accident severity model bundle path
        #[arg(long)]
        severity_model: Option<PathBuf>,

        /// Directory for the account database
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Build the labeled training corpus from raw sensor logs
    Sample {
        /// Directory containing risky/ and safe/ session trees
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output CSV path
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Keep every N-th row of each sensor log
        #[arg(long)]
        stride: Option<usize>,

        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            behavior_model,
            severity_model,
            data_dir,
        } => {
            cmd_serve(host, port, behavior_model, severity_model, data_dir).await;
        }
        Commands::Sample {
            input,
            output,
            stride,
            seed,
        } => {
            cmd_sample(input, output, stride, seed);
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

async fn cmd_serve(
    host: Option<IpAddr>,
    port: Option<u16>,
    behavior_model: Option<PathBuf>,
    severity_model: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) {
    let mut config = Config::load().unwrap_or_default();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(path) = behavior_model {
        config.models.behavior = path;
    }
    if let Some(path) = severity_model {
        config.models.severity = path;
    }
    if let Some(dir) = data_dir {
        config.data_path = dir;
    }

    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let server_config = ServerConfig {
        host: config.server.host,
        port: config.server.port,
        database_path: config.database_path(),
        model_paths: config.models.clone(),
    };

    let (addr, shutdown_tx) = match server::run(server_config).await {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Error starting server: {e}");
            std::process::exit(1);
        }
    };

    println!("DriveSense v{VERSION}");
    println!("Listening on http://{addr}");
    println!("Press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error waiting for shutdown signal: {e}");
    }

    println!();
    println!("Stopping server...");
    let _ = shutdown_tx.send(());
}

fn cmd_sample(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    stride: Option<usize>,
    seed: Option<u64>,
) {
    let config = Config::load().unwrap_or_default();
    let mut settings = config.sampler;
    if let Some(input) = input {
        settings.base_dir = input;
    }
    if let Some(output) = output {
        settings.output_file = output;
    }
    if let Some(stride) = stride {
        settings.stride = stride;
    }
    if let Some(seed) = seed {
        settings.shuffle_seed = seed;
    }

    println!("{}", "=".repeat(60));
    println!("Driver Behavior Data Sampling");
    println!("Base directory: {}", settings.base_dir.display());
    println!("Stride: {} | Shuffle seed: {}", settings.stride, settings.shuffle_seed);
    println!("{}", "=".repeat(60));

    match build_corpus(&settings) {
        Ok(report) => {
            println!();
            println!("{}", "=".repeat(60));
            println!(
                "Final dataset shape: {} rows x {} columns",
                report.total_rows, report.columns
            );
            println!(
                "Sessions merged: {} ({} skipped)",
                report.sessions_merged, report.sessions_skipped
            );
            println!("Behavior distribution:");
            println!("  risky (1): {}", report.risky_rows);
            println!("  safe  (0): {}", report.safe_rows);
            println!("Saved to: {}", report.output_path.display());
            println!(
                "File size: {:.2} MB",
                report.file_size_bytes as f64 / (1024.0 * 1024.0)
            );
            println!("{}", "=".repeat(60));
        }
        Err(CorpusError::NoData) => {
            eprintln!();
            eprintln!("No data was processed; nothing written.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!();
            eprintln!("Error building corpus: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

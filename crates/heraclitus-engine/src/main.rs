//! Heraclitus maintenance worker
//!
//! Decays claim confidence and backfills embeddings on a schedule.

use anyhow::Context;
use heraclitus_batch::CancellationToken;
use heraclitus_engine::{DynEngine, EngineConfig, MaintenanceWorker};
use std::env;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Log to stderr, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut config_path = None;
    let mut once = false;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config requires a path")?;
                config_path = Some(path.clone());
            }
            "--once" => once = true,
            "--help" => {
                print_help();
                return Ok(());
            }
            other => anyhow::bail!("Unknown argument: {} (see --help)", other),
        }
    }

    let config = match config_path {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => {
            eprintln!("Warning: No config file specified, using default configuration");
            eprintln!("Usage: heraclitus-worker --config <path-to-config.toml>");
            eprintln!();
            EngineConfig::default()
        }
    };

    let engine = Arc::new(DynEngine::open(&config).context("Failed to open engine")?);
    let mut worker = MaintenanceWorker::new(engine, config.worker.clone());

    if once {
        worker.run_cycles(1, &CancellationToken::new()).await;
        if worker.metrics().cycles_failed > 0 {
            anyhow::bail!("Maintenance cycle failed");
        }
    } else {
        worker.run().await;
    }

    Ok(())
}

fn print_help() {
    println!("Heraclitus Worker - Scheduled knowledge maintenance");
    println!();
    println!("USAGE:");
    println!("    heraclitus-worker --config <path-to-config.toml> [--once]");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --once             Run a single maintenance cycle and exit");
    println!("    --help             Print this help message");
    println!();
    println!("EXAMPLE:");
    println!("    heraclitus-worker --config config/heraclitus.toml");
    println!();
    println!("CONFIGURATION:");
    println!("    Sections: [temporal], [temporal.half_lives], [temporal.paradigm],");
    println!("    [semantic], [batch], [worker], [store]");
    println!("    Log level is taken from RUST_LOG (default: info)");
    println!();
}

//! desklink daemon - bridges MPRIS media players to the device platform.
//!
//! The platform transport itself lives outside this process: instructions
//! arrive as JSON lines on stdin, events and acknowledgments leave as JSON
//! lines on stdout.

use std::{error::Error, fs, path::PathBuf};

use clap::Parser;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, instrument, warn};

use desklink::{
    config::{Config, ConfigPaths},
    platform::Instruction,
    services::mpris::MediaEngine,
    tracing_config,
};

#[derive(Parser)]
#[command(name = "desklink", version, about = "Bridge MPRIS players to the device platform")]
struct Cli {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write logs to the desklink log directory
    #[arg(long)]
    log_file: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.log_file {
        tracing_config::init_with_file()?;
    } else {
        tracing_config::init()?;
    }

    ensure_desklink_directories()?;

    let config = Config::load(cli.config.as_deref())?;
    info!("Starting desklink media bridge");

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let engine = MediaEngine::spawn(config.media, events_tx).await?;

    // Outbound: one JSON line per platform event.
    let writer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!("Unencodable platform event: {e}"),
            }
        }
    });

    // Inbound: one JSON instruction per stdin line, acknowledged inline.
    let instruction_engine = engine.clone();
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<Instruction>(line) {
                Ok(instruction) => {
                    let ack = instruction_engine.dispatch(instruction).await;
                    match serde_json::to_string(&ack) {
                        Ok(line) => println!("{line}"),
                        Err(e) => warn!("Unencodable acknowledgment: {e}"),
                    }
                }
                Err(e) => warn!("Ignoring malformed instruction: {e}"),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down desklink");

    engine.shutdown();
    reader.abort();
    writer.abort();

    Ok(())
}

#[instrument]
fn ensure_desklink_directories() -> Result<(), Box<dyn Error>> {
    let config_dir = ConfigPaths::config_dir()?;
    if !config_dir.exists() {
        info!("Creating config directory: {}", config_dir.display());
        fs::create_dir_all(&config_dir)?;
    }
    Ok(())
}

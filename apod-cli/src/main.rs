mod picker;

use anyhow::{Context, Result};
use apod_relay::{FixedSaveDir, Relay, RelayConfig, SaveDirPicker, lan_ip};
use clap::{Parser, Subcommand};
use colored::*;
use picker::PromptSaveDir;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apod", version, about = "A-Pod conferencing relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the signaling relay and the fragment upload endpoint.
    Relay {
        #[arg(long, env = "APOD_BIND", default_value = "0.0.0.0:8080")]
        bind: SocketAddr,

        #[arg(long, env = "APOD_SAVE_DIR", default_value = RelayConfig::DEFAULT_SAVE_DIR)]
        save_dir: PathBuf,

        #[arg(long, env = "APOD_MAX_FRAGMENT_BYTES", default_value_t = RelayConfig::DEFAULT_MAX_FRAGMENT_BYTES)]
        max_fragment_bytes: usize,

        /// Prompt on the terminal when a client asks for a new save directory.
        #[arg(short, long)]
        interactive: bool,
    },

    /// Print the address clients on the LAN should connect to.
    LanIp,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Relay {
            bind,
            save_dir,
            max_fragment_bytes,
            interactive,
        } => {
            let config = RelayConfig {
                bind,
                save_dir,
                max_fragment_bytes,
            };
            run_relay(config, interactive).await?;
        }

        Commands::LanIp => println!("{}", lan_ip()),
    }

    Ok(())
}

async fn run_relay(config: RelayConfig, interactive: bool) -> Result<()> {
    let picker: Arc<dyn SaveDirPicker> = if interactive {
        Arc::new(PromptSaveDir)
    } else {
        Arc::new(FixedSaveDir)
    };

    let relay = Relay::bind(config, picker)
        .await
        .context("Failed to start relay")?;
    let addr = relay.local_addr().context("Relay has no local address")?;

    println!("{}", "📡 A-Pod relay is up".green().bold());
    println!("   🔌 Signaling: ws://{}:{}/ws", relay.service().lan_ip(), addr.port());
    println!(
        "   📂 Saving to: {}",
        relay.service().store().save_dir().display()
    );

    relay
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for ctrl-c: {}", e);
                return;
            }
            info!("Ctrl-C received, shutting down");
        })
        .await
        .context("Relay failed")?;

    println!("{}", "👋 Relay stopped".cyan());
    Ok(())
}

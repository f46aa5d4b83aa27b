//! SunMonLok client entry point.
//!
//! Connects to a SunMonLok server and presses the configured hotkey chord
//! every time the server reports a new monitor index.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ ClientConfig::load()         -- TOML file + CLI overrides
//!  └─ select_emitter()             -- xtest, then log
//!  └─ InjectHotkeyUseCase          -- index -> chord -> key events
//!  └─ MonitorReceiver::spawn()     -- connect / receive / reconnect task
//!  └─ wait for signal, stop receiver
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sunmonlok_client::application::inject_hotkey::InjectHotkeyUseCase;
use sunmonlok_client::infrastructure::hotkey::select_emitter;
use sunmonlok_client::infrastructure::network::{MonitorReceiver, TcpConnector};
use sunmonlok_client::infrastructure::storage::config::ClientConfig;

/// Upper bound on waiting for the receive task during shutdown.
const RECEIVER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "sunmonlok-client")]
#[command(about = "Press a per-monitor hotkey whenever the SunMonLok server switches monitors")]
#[command(version)]
struct Cli {
    /// Server host name or IP address
    #[arg(long, env = "SUNMONLOK_HOST")]
    host: String,

    /// Server TCP port (overrides `client.port`)
    #[arg(short, long, env = "SUNMONLOK_PORT")]
    port: Option<u16>,

    /// Path to the configuration file
    #[arg(short, long, env = "SUNMONLOK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.client.port = port;
    }
    config.validate().context("invalid command-line override")?;

    let default_level = if cli.debug || config.debug_logging() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    info!("SunMonLok client starting");

    let table = config.hotkey_table()?;
    let emitter = select_emitter(&config.hotkey.backends).context("no key injection backend available")?;
    let injector = Arc::new(InjectHotkeyUseCase::new(table, emitter));

    let connector = Arc::new(TcpConnector::new(&cli.host, config.client.port));
    info!(server = %format!("{}:{}", cli.host, config.client.port), "connecting");
    let receiver = Arc::new(MonitorReceiver::new(connector, injector, config.receiver_config()));
    let task = receiver.spawn();

    info!("SunMonLok client running.  Press Ctrl-C to exit.");
    wait_for_shutdown().await;
    info!("shutdown signal received");

    receiver.stop();
    if tokio::time::timeout(RECEIVER_JOIN_TIMEOUT, task).await.is_err() {
        warn!("receiver did not stop in time");
    }

    info!("SunMonLok client stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => warn!("cannot install SIGTERM handler: {e}"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C: {e}");
    }
}

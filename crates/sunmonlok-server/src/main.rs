//! SunMonLok server entry point.
//!
//! Wires the display backends, the monitor mapper, the poller and the TCP
//! broadcast server together, then runs until Ctrl-C or SIGTERM.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ ServerConfig::load()            -- TOML file + CLI overrides
//!  └─ select backends                 -- cursor chain, layout chain (probe once)
//!  └─ MonitorMapper                   -- positional, or override via Sunshine
//!  └─ BroadcastServer::start()        -- accept task
//!  └─ MonitorPoller::spawn()          -- poll task -> BroadcastSwitchAction
//!  └─ wait for signal, stop poller, stop server
//! ```

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sunmonlok_core::{MonitorIndexResolver, SystemClock};
use sunmonlok_server::application::poll_monitor::MonitorPoller;
use sunmonlok_server::application::resolve_monitor::{MappingMode, MonitorMapper};
use sunmonlok_server::infrastructure::display::{select_cursor_provider, select_layout_provider};
use sunmonlok_server::infrastructure::network::{BroadcastServer, BroadcastSwitchAction};
use sunmonlok_server::infrastructure::storage::config::ServerConfig;
use sunmonlok_server::infrastructure::sunshine::SunshineIndexSource;

/// Upper bound on waiting for the poll task during shutdown.
const POLLER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "sunmonlok-server")]
#[command(about = "Broadcast the monitor under the cursor to SunMonLok clients")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "SUNMONLOK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind (overrides `server.bind`)
    #[arg(long, env = "SUNMONLOK_BIND")]
    bind: Option<IpAddr>,

    /// TCP port (overrides `server.port`)
    #[arg(short, long, env = "SUNMONLOK_PORT")]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind.to_string();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate().context("invalid command-line override")?;

    // Level is overridden by `RUST_LOG`.
    let default_level = if cli.debug || config.debug_logging() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    info!("SunMonLok server starting");

    // ── Backends ──────────────────────────────────────────────────────────────
    let cursor = select_cursor_provider(&config.backends.cursor)
        .await
        .context("no cursor backend available")?;
    let layout = select_layout_provider(&config.backends.layout, &config.layout.monitors)
        .await
        .context("no layout backend available")?;

    // ── Mapper ────────────────────────────────────────────────────────────────
    let mapper = match config.mapping_mode() {
        MappingMode::Positional => MonitorMapper::new(layout),
        MappingMode::Override => {
            let mut resolver = MonitorIndexResolver::with_cooldown(
                Arc::new(SunshineIndexSource::new()),
                Arc::new(SystemClock),
                config.refresh_cooldown(),
            );
            if resolver.initialize().await {
                info!(monitors = resolver.len(), "override index loaded");
            } else {
                warn!("override index unavailable; using positional indices");
            }
            MonitorMapper::with_resolver(layout, resolver)
        }
    };
    mapper.log_layout().await;

    // ── Broadcast server ──────────────────────────────────────────────────────
    let bind = config.bind_addr()?;
    let server = Arc::new(BroadcastServer::default());
    server
        .start(bind, config.server.port)
        .await
        .context("failed to start broadcast server")?;

    // ── Poller ────────────────────────────────────────────────────────────────
    let action = Arc::new(BroadcastSwitchAction::new(Arc::clone(&server)));
    let poller = MonitorPoller::new(cursor, mapper, action, config.poller_config());
    let handle = poller.spawn();

    info!("SunMonLok server ready.  Press Ctrl-C to exit.");
    wait_for_shutdown().await;
    info!("shutdown signal received");

    handle.stop();
    handle.join(POLLER_JOIN_TIMEOUT).await;
    server.stop().await;

    info!("SunMonLok server stopped");
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

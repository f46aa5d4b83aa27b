//! Network infrastructure for the client application.
//!
//! The [`MonitorReceiver`] keeps one TCP connection to the server open,
//! decodes each one-byte monitor switch and hands it to a
//! [`HotkeyInjector`]. When the connection drops it waits and reconnects,
//! forever, until [`MonitorReceiver::stop`] is called.
//!
//! ```text
//!            connect ok                 EOF / I/O error / bad byte
//! Connecting ─────────► Connected ─────────────────────────────► Disconnected
//!     ▲                                                               │
//!     └──────────────────── wait reconnect_delay ◄────────────────────┘
//! ```
//!
//! A failed connect also goes to `Disconnected` and waits. Receive timeouts
//! are not errors; they only give the loop a chance to notice `stop()`.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sunmonlok_core::decode_monitor_switch;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::inject_hotkey::HotkeyInjector;

/// Default upper bound on one receive before re-checking the stop flag.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(1);
/// Default pause between a disconnect and the next connect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Default upper bound on one TCP connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur in the client network layer.
#[derive(Debug, Error)]
pub enum ClientNetworkError {
    /// TCP connection to the server failed.
    #[error("failed to connect to server at {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A byte could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The connection was closed by the remote side.
    #[error("connection closed by server")]
    Closed,
}

pub type ServerStream = Box<dyn AsyncRead + Send + Unpin>;

/// Opens a fresh stream to the server.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<ServerStream, ClientNetworkError>;

    /// Where the connector points, for logs.
    fn describe(&self) -> String;
}

/// Connects over TCP with a bounded connect time.
pub struct TcpConnector {
    addr: String,
    timeout: Duration,
}

impl TcpConnector {
    /// `host` may be a name or an address literal.
    pub fn new(host: &str, port: u16) -> Self {
        Self::with_timeout(host, port, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_timeout(host: &str, port: u16, timeout: Duration) -> Self {
        let addr = if host.contains(':') && !host.starts_with('[') {
            // Bare IPv6 literal.
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };
        Self { addr, timeout }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> Result<ServerStream, ClientNetworkError> {
        let connect = TcpStream::connect(self.addr.as_str());
        let stream = match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ClientNetworkError::ConnectFailed {
                    addr: self.addr.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(ClientNetworkError::ConnectFailed {
                    addr: self.addr.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("no answer within {:?}", self.timeout),
                    ),
                })
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay failed: {e}");
        }
        Ok(Box::new(stream))
    }

    fn describe(&self) -> String {
        self.addr.clone()
    }
}

// ── Receiver ──────────────────────────────────────────────────────────────────

/// Connection state of the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Disconnected,
    Connecting,
    Connected,
}

impl ReceiverState {
    fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

/// Timing for the receive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverConfig {
    pub recv_timeout: Duration,
    pub reconnect_delay: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            recv_timeout: DEFAULT_RECV_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// Reconnecting receiver of monitor switches.
pub struct MonitorReceiver {
    connector: Arc<dyn Connector>,
    injector: Arc<dyn HotkeyInjector>,
    config: ReceiverConfig,
    state: AtomicU8,
    attempts: AtomicU64,
    stopped: AtomicBool,
    wake: Notify,
}

impl MonitorReceiver {
    pub fn new(
        connector: Arc<dyn Connector>,
        injector: Arc<dyn HotkeyInjector>,
        config: ReceiverConfig,
    ) -> Self {
        Self {
            connector,
            injector,
            config,
            state: AtomicU8::new(ReceiverState::Disconnected.as_u8()),
            attempts: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
            wake: Notify::new(),
        }
    }

    pub fn state(&self) -> ReceiverState {
        ReceiverState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Number of connect attempts so far, successful or not.
    pub fn connect_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Asks the loop to exit at its next wait point. Idempotent.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.wake.notify_waiters();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Starts [`run`](Self::run) on a Tokio task.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run())
    }

    /// The connect / receive / reconnect loop. Returns only after [`stop`](Self::stop).
    pub async fn run(self: Arc<Self>) {
        let target = self.connector.describe();

        while !self.is_stopped() {
            self.set_state(ReceiverState::Connecting);
            self.attempts.fetch_add(1, Ordering::SeqCst);

            let connected = {
                let stopped = self.wake.notified();
                tokio::pin!(stopped);
                stopped.as_mut().enable();
                if self.is_stopped() {
                    break;
                }
                tokio::select! {
                    r = self.connector.connect() => r,
                    _ = &mut stopped => break,
                }
            };

            match connected {
                Ok(stream) => {
                    self.set_state(ReceiverState::Connected);
                    info!(server = %target, "connected");
                    let reason = self.receive(stream).await;
                    self.set_state(ReceiverState::Disconnected);
                    match reason {
                        Some(e) => info!(
                            server = %target,
                            "disconnected: {e}; reconnecting in {:?}",
                            self.config.reconnect_delay
                        ),
                        None => break,
                    }
                }
                Err(e) => {
                    self.set_state(ReceiverState::Disconnected);
                    warn!("{e}; retrying in {:?}", self.config.reconnect_delay);
                }
            }

            // Register for the wake-up before checking the flag, so a stop()
            // landing in between still ends the wait.
            let stopped = self.wake.notified();
            tokio::pin!(stopped);
            stopped.as_mut().enable();
            if self.is_stopped() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = &mut stopped => {}
            }
        }

        self.set_state(ReceiverState::Disconnected);
        debug!("receiver stopped");
    }

    /// Reads bytes until the connection fails (returns the reason) or the
    /// receiver is stopped (returns `None`).
    async fn receive(&self, mut stream: ServerStream) -> Option<ClientNetworkError> {
        let mut buf = [0u8; 1];
        loop {
            let stopped = self.wake.notified();
            tokio::pin!(stopped);
            stopped.as_mut().enable();
            if self.is_stopped() {
                return None;
            }

            let read = tokio::select! {
                r = tokio::time::timeout(self.config.recv_timeout, stream.read(&mut buf)) => r,
                _ = &mut stopped => return None,
            };

            match read {
                // Idle; loop to re-check the stop flag.
                Err(_) => continue,
                Ok(Ok(0)) => return Some(ClientNetworkError::Closed),
                Ok(Ok(n)) => match decode_monitor_switch(&buf[..n]) {
                    Ok(monitor) => {
                        debug!(monitor = monitor.get(), "monitor switch received");
                        if let Err(e) = self.injector.inject(monitor) {
                            warn!(monitor = monitor.get(), "hotkey injection failed: {e}");
                        }
                    }
                    Err(e) => return Some(ClientNetworkError::Protocol(e.to_string())),
                },
                Ok(Err(e)) => return Some(ClientNetworkError::Io(e)),
            }
        }
    }

    fn set_state(&self, state: ReceiverState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

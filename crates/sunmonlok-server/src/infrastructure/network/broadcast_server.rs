//! BroadcastServer: fans the active monitor index out to every TCP client.
//!
//! # Wire behaviour
//!
//! Clients connect and only ever *read*. Each switch is one byte (see
//! [`sunmonlok_core::protocol::codec`]). A client that connects after at least
//! one broadcast immediately receives the current index so it does not have to
//! wait for the next mouse movement.
//!
//! # Ordering
//!
//! Every client must observe a prefix of the broadcast sequence, in order,
//! with the resync byte first. Two locks make that hold:
//!
//! - the **registry lock** (`std::sync::Mutex`) guards the client map *and*
//!   the current index. `broadcast` updates the index and snapshots the
//!   clients in one critical section; `accept` reads the index and inserts the
//!   client in one critical section. It is never held across an `.await`.
//! - each client's **stream lock** (`tokio::sync::Mutex`). The accept path
//!   takes it *before* publishing the client and keeps it until the resync
//!   byte is written, so a concurrent broadcast that already sees the client
//!   queues behind the resync.
//!
//! Sends happen outside the registry lock with a per-send timeout. A client
//! whose send fails or times out is removed and shut down; the others are
//! unaffected.
//!
//! Each accepted connection is registered on its own task, so a client that
//! stalls its resync never delays the next `accept()`. The accept task owns
//! those registrations and cancels any still running when it exits.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use sunmonlok_core::{encode_monitor_switch, MonitorId, ProtocolError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::poll_monitor::{SwitchAction, SwitchError};

use super::NetworkError;

/// Default upper bound on one `accept()` wait before re-checking the running flag.
pub const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(1);
/// Default upper bound on one write to one client.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);
/// Default upper bound on waiting for the accept task in [`BroadcastServer::stop`].
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause after a failed `accept()` (e.g. too many open files).
const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// Timeouts for the broadcast server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastConfig {
    pub accept_timeout: Duration,
    pub send_timeout: Duration,
    pub join_timeout: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }
}

/// Outcome of one [`BroadcastServer::broadcast`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients the byte was written to.
    pub delivered: usize,
    /// Clients removed because the write failed or timed out.
    pub dropped: usize,
}

type ClientStream = Box<dyn AsyncWrite + Send + Unpin>;

/// One registered client.
#[derive(Clone)]
struct ClientConnection {
    id: Uuid,
    peer: SocketAddr,
    stream: Arc<tokio::sync::Mutex<ClientStream>>,
}

#[derive(Default)]
struct Registry {
    clients: HashMap<Uuid, ClientConnection>,
    current: Option<MonitorId>,
}

/// State shared between the server handle and its accept task.
struct Shared {
    registry: Mutex<Registry>,
    running: AtomicBool,
    shutdown: Notify,
    config: BroadcastConfig,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes a new client and sends it the current index.
    async fn register(&self, stream: ClientStream, peer: SocketAddr) {
        let id = Uuid::new_v4();
        let stream = Arc::new(tokio::sync::Mutex::new(stream));

        // Take the stream lock before the client becomes visible to broadcasts.
        let mut writer = stream.lock().await;

        let (current, count) = {
            let mut registry = self.registry();
            registry.clients.insert(
                id,
                ClientConnection {
                    id,
                    peer,
                    stream: Arc::clone(&stream),
                },
            );
            (registry.current, registry.clients.len())
        };
        info!(%peer, clients = count, "client connected");

        let Some(monitor) = current else {
            return;
        };

        let resync = match encode_monitor_switch(monitor) {
            Ok(bytes) => write_bounded(&mut writer, &bytes, self.config.send_timeout).await,
            Err(e) => Err(e.to_string()),
        };

        if let Err(reason) = resync {
            self.registry().clients.remove(&id);
            let _ = tokio::time::timeout(self.config.send_timeout, writer.shutdown()).await;
            debug!(%peer, "resync failed, client dropped: {reason}");
        } else {
            debug!(%peer, monitor = monitor.get(), "resync sent");
        }
    }

    /// Removes `client` (if still registered) and closes its stream.
    async fn drop_client(&self, client: &ClientConnection) {
        let removed = self.registry().clients.remove(&client.id).is_some();
        close_stream(client, self.config.send_timeout).await;
        if removed {
            info!(peer = %client.peer, "client disconnected");
        }
    }
}

/// TCP server that broadcasts monitor switches.
pub struct BroadcastServer {
    shared: Arc<Shared>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
    /// Serialises `start` and `stop`.
    lifecycle: tokio::sync::Mutex<()>,
    /// Serialises broadcasts so their sends cannot interleave per client.
    send_order: tokio::sync::Mutex<()>,
}

impl BroadcastServer {
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry::default()),
                running: AtomicBool::new(false),
                shutdown: Notify::new(),
                config,
            }),
            accept_task: Mutex::new(None),
            local_addr: Mutex::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
            send_order: tokio::sync::Mutex::new(()),
        }
    }

    /// Binds `bind_addr:port` and starts accepting clients.
    ///
    /// Returns the bound address (useful with port 0). Calling `start` while
    /// already running logs a warning and returns the existing address;
    /// concurrent calls bind at most one listener.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::BindFailed`] if the listener cannot be bound.
    /// The server is left stopped and `start` may be retried.
    pub async fn start(&self, bind_addr: IpAddr, port: u16) -> Result<SocketAddr, NetworkError> {
        let _lifecycle = self.lifecycle.lock().await;

        let claimed = self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst);
        if claimed.is_err() {
            warn!("broadcast server already running");
            return self.local_addr().ok_or(NetworkError::NotRunning);
        }

        let addr = SocketAddr::new(bind_addr, port);
        let bound = match TcpListener::bind(addr).await {
            Ok(listener) => listener.local_addr().map(|local| (listener, local)),
            Err(e) => Err(e),
        };
        let (listener, local) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                self.shared.running.store(false, Ordering::SeqCst);
                return Err(NetworkError::BindFailed { addr, source });
            }
        };

        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner) = Some(local);

        let task = tokio::spawn(accept_loop(listener, Arc::clone(&self.shared)));
        *self.accept_task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);

        info!(addr = %local, "broadcast server listening");
        Ok(local)
    }

    /// Stops accepting, closes every client and waits (bounded) for the
    /// accept task. Idempotent and safe to call before [`start`](Self::start).
    pub async fn stop(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        let was_running = self.shared.running.swap(false, Ordering::SeqCst);
        self.shared.shutdown.notify_waiters();

        // Join first so no accept can register a client after the drain.
        let task = self
            .accept_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut task) = task {
            let join_timeout = self.shared.config.join_timeout;
            if tokio::time::timeout(join_timeout, &mut task).await.is_err() {
                warn!("accept loop did not exit within {join_timeout:?}; aborting");
                task.abort();
            }
        }
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner) = None;

        let clients: Vec<ClientConnection> = self
            .shared
            .registry()
            .clients
            .drain()
            .map(|(_, client)| client)
            .collect();
        for client in &clients {
            close_stream(client, self.shared.config.send_timeout).await;
        }

        if was_running {
            info!(closed = clients.len(), "broadcast server stopped");
        }
    }

    /// Records `monitor` as current and sends it to every client.
    ///
    /// The current index is updated even with zero clients, so later
    /// connections are resynchronised.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::OutOfRange`] if `monitor` does not fit the wire
    /// format; nothing is recorded or sent in that case.
    pub async fn broadcast(&self, monitor: MonitorId) -> Result<BroadcastReport, ProtocolError> {
        let bytes = encode_monitor_switch(monitor)?;
        let _order = self.send_order.lock().await;

        let targets: Vec<ClientConnection> = {
            let mut registry = self.shared.registry();
            registry.current = Some(monitor);
            registry.clients.values().cloned().collect()
        };

        let send_timeout = self.shared.config.send_timeout;
        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();
        for client in targets {
            let result = {
                let stream = Arc::clone(&client.stream);
                tokio::time::timeout(send_timeout, async move {
                    let mut writer = stream.lock().await;
                    writer.write_all(&bytes).await?;
                    writer.flush().await
                })
                .await
            };
            match result {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    debug!(peer = %client.peer, "send failed: {e}");
                    failed.push(client);
                }
                Err(_) => {
                    debug!(peer = %client.peer, "send timed out after {send_timeout:?}");
                    failed.push(client);
                }
            }
        }

        report.dropped = failed.len();
        for client in &failed {
            self.shared.drop_client(client).await;
        }

        debug!(
            monitor = monitor.get(),
            delivered = report.delivered,
            dropped = report.dropped,
            "broadcast"
        );
        Ok(report)
    }

    /// Registers an already-connected stream as a client, exactly as if it had
    /// been accepted by the listener (including the resync byte).
    pub async fn attach<S>(&self, stream: S, peer: SocketAddr)
    where
        S: AsyncWrite + Send + Unpin + 'static,
    {
        self.shared.register(Box::new(stream), peer).await;
    }

    /// Number of registered clients.
    pub fn client_count(&self) -> usize {
        self.shared.registry().clients.len()
    }

    /// The last broadcast index, if any.
    pub fn current_monitor(&self) -> Option<MonitorId> {
        self.shared.registry().current
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// The bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BroadcastServer {
    fn default() -> Self {
        Self::new(BroadcastConfig::default())
    }
}

// ── Accept loop ───────────────────────────────────────────────────────────────

/// Source of incoming client connections.
#[async_trait]
trait ClientListener: Send + Sync + 'static {
    async fn accept(&self) -> std::io::Result<(ClientStream, SocketAddr)>;
}

#[async_trait]
impl ClientListener for TcpListener {
    async fn accept(&self) -> std::io::Result<(ClientStream, SocketAddr)> {
        let (stream, peer) = TcpListener::accept(self).await?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%peer, "set_nodelay failed: {e}");
        }
        Ok((Box::new(stream), peer))
    }
}

async fn accept_loop<L: ClientListener>(listener: L, shared: Arc<Shared>) {
    let accept_timeout = shared.config.accept_timeout;
    let mut registrations = JoinSet::new();

    while shared.running.load(Ordering::SeqCst) {
        let accepted = tokio::select! {
            result = tokio::time::timeout(accept_timeout, listener.accept()) => result,
            _ = shared.shutdown.notified() => break,
        };

        // Reap finished registrations.
        while registrations.try_join_next().is_some() {}

        match accepted {
            Err(_) => continue,
            Ok(Ok((stream, peer))) => {
                if !shared.running.load(Ordering::SeqCst) {
                    break;
                }
                let shared = Arc::clone(&shared);
                registrations.spawn(async move { shared.register(stream, peer).await });
            }
            Ok(Err(e)) => {
                warn!("accept failed: {e}");
                tokio::time::sleep(ACCEPT_ERROR_PAUSE).await;
            }
        }
    }

    // stop() drains the registry only after this task ends, so nothing may
    // register past this point.
    registrations.shutdown().await;
    debug!("accept loop exited");
}

async fn write_bounded(
    writer: &mut ClientStream,
    bytes: &[u8],
    limit: Duration,
) -> Result<(), String> {
    let write = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    };
    match tokio::time::timeout(limit, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {limit:?}")),
    }
}

async fn close_stream(client: &ClientConnection, limit: Duration) {
    let stream = Arc::clone(&client.stream);
    let close = async move {
        let mut writer = stream.lock().await;
        writer.shutdown().await
    };
    if let Ok(Err(e)) = tokio::time::timeout(limit, close).await {
        debug!(peer = %client.peer, "shutdown failed: {e}");
    }
}

// ── SwitchAction adapter ──────────────────────────────────────────────────────

/// Broadcasts every accepted switch.
pub struct BroadcastSwitchAction {
    server: Arc<BroadcastServer>,
}

impl BroadcastSwitchAction {
    pub fn new(server: Arc<BroadcastServer>) -> Self {
        Self { server }
    }
}

#[async_trait]
impl SwitchAction for BroadcastSwitchAction {
    async fn on_switch(&self, monitor: MonitorId) -> Result<(), SwitchError> {
        let report = self.server.broadcast(monitor).await?;
        if report.delivered == 0 && report.dropped == 0 {
            debug!(monitor = monitor.get(), "no clients connected; index recorded for resync");
        } else {
            info!(
                monitor = monitor.get(),
                delivered = report.delivered,
                dropped = report.dropped,
                "monitor index broadcast"
            );
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

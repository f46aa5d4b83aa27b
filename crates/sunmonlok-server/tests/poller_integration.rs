//! End-to-end: a mock cursor moves across a mock layout and a TCP client
//! receives the resulting monitor indices.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sunmonlok_core::{
    IndexSourceError, ManualClock, MonitorId, MonitorIndexResolver, MonitorIndexSource, MonitorRect,
};
use sunmonlok_server::application::poll_monitor::{MonitorPoller, PollerConfig};
use sunmonlok_server::application::resolve_monitor::{MappingMode, MonitorMapper};
use sunmonlok_server::infrastructure::display::mock::{MockCursorProvider, MockLayoutProvider};
use sunmonlok_server::infrastructure::network::{BroadcastServer, BroadcastSwitchAction};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

fn three_monitors() -> Vec<MonitorRect> {
    vec![
        MonitorRect::new("DP-1", 0, 0, 1920, 1080),
        MonitorRect::new("HDMI-A-1", 1920, 0, 1920, 1080),
        MonitorRect::new("DP-2", 3840, 0, 1920, 1080),
    ]
}

fn fast_config() -> PollerConfig {
    PollerConfig {
        poll_interval: Duration::from_millis(5),
        debounce: Duration::ZERO,
        move_threshold: 1.0,
        error_backoff: Duration::from_millis(5),
    }
}

async fn next_byte(stream: &mut TcpStream) -> u8 {
    let mut buf = [0u8; 1];
    tokio::time::timeout(Duration::from_secs(2), stream.read_exact(&mut buf))
        .await
        .expect("byte arrives")
        .expect("read ok");
    buf[0]
}

struct FixedIndex(HashMap<String, MonitorId>);

#[async_trait]
impl MonitorIndexSource for FixedIndex {
    async fn load_index_map(&self) -> Result<HashMap<String, MonitorId>, IndexSourceError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn test_cursor_moves_are_broadcast_to_clients_positionally() {
    // Arrange
    let server = Arc::new(BroadcastServer::default());
    let addr = server.start(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await.unwrap();
    let mut client = TcpStream::connect(addr).await.unwrap();

    let cursor = Arc::new(MockCursorProvider::at(100, 100));
    let layout = Arc::new(MockLayoutProvider::new(three_monitors()));
    let poller = MonitorPoller::new(
        cursor.clone(),
        MonitorMapper::new(layout),
        Arc::new(BroadcastSwitchAction::new(Arc::clone(&server))),
        fast_config(),
    );

    // Act
    let handle = poller.spawn();
    let first = next_byte(&mut client).await;
    cursor.move_to(4000, 500);
    let second = next_byte(&mut client).await;

    // Assert
    assert_eq!(first, 0);
    assert_eq!(second, 2);
    assert_eq!(server.current_monitor(), Some(MonitorId::new(2)));

    handle.stop();
    assert!(handle.join(Duration::from_secs(2)).await);
    server.stop().await;
}

#[tokio::test]
async fn test_override_indices_reach_clients() {
    // Arrange: the streaming host numbers monitors differently from x order
    let index = FixedIndex(HashMap::from([
        ("DP-1".to_string(), MonitorId::new(2)),
        ("HDMI-A-1".to_string(), MonitorId::new(0)),
        ("DP-2".to_string(), MonitorId::new(1)),
    ]));
    let mut resolver = MonitorIndexResolver::new(Arc::new(index), Arc::new(ManualClock::new()));
    assert!(resolver.initialize().await);

    let server = Arc::new(BroadcastServer::default());
    let addr = server.start(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await.unwrap();
    let mut client = TcpStream::connect(addr).await.unwrap();

    let cursor = Arc::new(MockCursorProvider::at(10, 10));
    let mapper = MonitorMapper::with_resolver(Arc::new(MockLayoutProvider::new(three_monitors())), resolver);
    let poller = MonitorPoller::new(
        cursor.clone(),
        mapper,
        Arc::new(BroadcastSwitchAction::new(Arc::clone(&server))),
        fast_config(),
    );
    assert_eq!(poller.mode(), MappingMode::Override);

    // Act
    let handle = poller.spawn();
    let first = next_byte(&mut client).await;
    cursor.move_to(2000, 10);
    let second = next_byte(&mut client).await;

    // Assert
    assert_eq!((first, second), (2, 0));

    handle.stop();
    handle.join(Duration::from_secs(2)).await;
    server.stop().await;
}

use apod_client::{ChannelError, ChannelState, SignalingChannel, SignalingOutput};
use apod_core::{ClientIdentity, IceCandidate, SideEvent, SignalEnvelope};
use apod_relay::{FixedSaveDir, Relay, RelayConfig};
use axum::Router;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::integration::{eventually, init_tracing};

async fn start_relay() -> SocketAddr {
    let config = RelayConfig {
        bind: SocketAddr::from(([127, 0, 0, 1], 0)),
        save_dir: std::env::temp_dir().join("apod-channel-tests"),
        ..RelayConfig::default()
    };
    let relay = Relay::bind(config, Arc::new(FixedSaveDir))
        .await
        .expect("Failed to bind relay");
    let addr = relay.local_addr().expect("Relay has no local address");
    tokio::spawn(relay.run(std::future::pending()));
    addr
}

async fn recv(rx: &mut mpsc::Receiver<SignalEnvelope>) -> SignalEnvelope {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("Timed out waiting for an envelope")
        .expect("Inbound channel closed")
}

#[tokio::test]
async fn test_envelopes_round_trip_through_relay() {
    init_tracing();
    let addr = start_relay().await;
    let url = format!("ws://{addr}/ws");

    let (a_tx, mut a_rx) = mpsc::channel(16);
    let (b_tx, mut b_rx) = mpsc::channel(16);
    let a = SignalingChannel::connect(url.clone(), a_tx).await.unwrap();
    let _b = SignalingChannel::connect(url, b_tx).await.unwrap();
    a.ready().await;
    assert_eq!(a.state(), ChannelState::Open);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let envelope = SignalEnvelope::candidate(
        ClientIdentity::from("alice"),
        IceCandidate::new("candidate:1 1 udp 1 10.0.0.1 5000 typ host"),
    );
    a.send(envelope.clone()).await.unwrap();

    assert_eq!(recv(&mut a_rx).await, envelope);
    assert_eq!(recv(&mut b_rx).await, envelope);
}

#[tokio::test]
async fn test_leader_gets_relay_details() {
    init_tracing();
    let addr = start_relay().await;

    let (tx, mut rx) = mpsc::channel(16);
    let channel = SignalingChannel::connect(format!("ws://{addr}/ws"), tx)
        .await
        .unwrap();
    channel
        .send(SignalEnvelope::event(SideEvent::LeaderJoined))
        .await
        .unwrap();

    assert_eq!(recv(&mut rx).await.side_event(), Some(&SideEvent::LeaderJoined));
    assert!(matches!(
        recv(&mut rx).await.side_event(),
        Some(SideEvent::LanIp { .. })
    ));
    assert!(matches!(
        recv(&mut rx).await.side_event(),
        Some(SideEvent::SetSaveDir { .. })
    ));
}

#[tokio::test]
async fn test_connect_failure_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (tx, _rx) = mpsc::channel(1);
    let result = SignalingChannel::connect(format!("ws://{addr}/ws"), tx).await;
    assert!(matches!(result, Err(ChannelError::Connect { .. })));
}

/// Closes the first socket right away and echoes on every later one.
async fn start_flaky_server() -> (SocketAddr, Arc<AtomicUsize>) {
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    let app = Router::new().route(
        "/ws",
        get(move |ws: WebSocketUpgrade| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { ws.on_upgrade(move |socket| serve_flaky(socket, n)) }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, connections)
}

async fn serve_flaky(mut socket: WebSocket, n: usize) {
    if n == 0 {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }
    while let Some(Ok(msg)) = socket.recv().await {
        if let Message::Text(text) = msg {
            if socket.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    }
}

#[tokio::test]
async fn test_send_reconnects_after_server_close() {
    init_tracing();
    let (addr, connections) = start_flaky_server().await;

    let (tx, mut rx) = mpsc::channel(16);
    let channel = SignalingChannel::connect(format!("ws://{addr}/ws"), tx)
        .await
        .unwrap();

    assert!(eventually(|| channel.state().is_closed(), 5000).await);

    let envelope = SignalEnvelope::event(SideEvent::PickSaveDir);
    channel.send(envelope.clone()).await.unwrap();

    assert_eq!(connections.load(Ordering::SeqCst), 2);
    assert_eq!(channel.state(), ChannelState::Open);
    assert_eq!(recv(&mut rx).await, envelope);
}

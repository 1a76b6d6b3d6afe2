use crate::signaling::{ChannelError, ChannelState, SignalingOutput};
use apod_core::SignalEnvelope;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// State shared with the reader task of the current socket.
struct ChannelStatus {
    state_tx: watch::Sender<ChannelState>,
    /// Bumped on every reconnect so a stale reader cannot mark the new
    /// socket as closed.
    generation: AtomicU64,
}

impl ChannelStatus {
    fn mark(&self, generation: u64, state: ChannelState) {
        self.state_tx.send_if_modified(|current| {
            if self.generation.load(Ordering::Acquire) != generation || *current == state {
                return false;
            }
            *current = state;
            true
        });
    }
}

struct ChannelInner {
    url: String,
    sink: Mutex<Option<WsSink>>,
    status: Arc<ChannelStatus>,
    inbound_tx: mpsc::Sender<SignalEnvelope>,
    reader: StdMutex<Option<JoinHandle<()>>>,
}

impl Drop for ChannelInner {
    fn drop(&mut self) {
        if let Ok(mut reader) = self.reader.lock() {
            if let Some(handle) = reader.take() {
                handle.abort();
            }
        }
    }
}

/// Reconnecting WebSocket connection to the relay.
///
/// Parsed inbound envelopes are pushed into the `inbound_tx` given to
/// [`SignalingChannel::connect`], in receive order. The same sender is
/// reattached to every replacement socket. Nothing sent while the socket is
/// down is queued.
#[derive(Clone)]
pub struct SignalingChannel {
    inner: Arc<ChannelInner>,
}

impl SignalingChannel {
    pub async fn connect(
        url: impl Into<String>,
        inbound_tx: mpsc::Sender<SignalEnvelope>,
    ) -> Result<Self, ChannelError> {
        let (state_tx, _) = watch::channel(ChannelState::Connecting);
        let channel = Self {
            inner: Arc::new(ChannelInner {
                url: url.into(),
                sink: Mutex::new(None),
                status: Arc::new(ChannelStatus {
                    state_tx,
                    generation: AtomicU64::new(0),
                }),
                inbound_tx,
                reader: StdMutex::new(None),
            }),
        };

        let mut sink = channel.inner.sink.lock().await;
        channel.open_socket(&mut sink).await?;
        drop(sink);

        Ok(channel)
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Replace the current socket (if any) with a freshly connected one.
    async fn open_socket(&self, sink: &mut Option<WsSink>) -> Result<(), ChannelError> {
        let status = &self.inner.status;
        let generation = status.generation.fetch_add(1, Ordering::AcqRel) + 1;
        status.state_tx.send_replace(ChannelState::Connecting);

        if let Some(mut old) = sink.take() {
            let _ = old.close().await;
        }
        if let Ok(mut reader) = self.inner.reader.lock() {
            if let Some(handle) = reader.take() {
                handle.abort();
            }
        }

        let (ws, _) = match tokio_tungstenite::connect_async(self.inner.url.as_str()).await {
            Ok(connected) => connected,
            Err(source) => {
                status.mark(generation, ChannelState::Closed);
                return Err(ChannelError::Connect {
                    url: self.inner.url.clone(),
                    source,
                });
            }
        };
        info!("Signaling channel connected to {}", self.inner.url);

        let (tx, rx) = ws.split();
        *sink = Some(tx);
        status.mark(generation, ChannelState::Open);

        let handle = tokio::spawn(read_loop(
            rx,
            status.clone(),
            self.inner.inbound_tx.clone(),
            generation,
        ));
        if let Ok(mut reader) = self.inner.reader.lock() {
            *reader = Some(handle);
        }

        Ok(())
    }

    async fn reopen_if_closed(&self, sink: &mut Option<WsSink>) -> Result<(), ChannelError> {
        let state = self.state();
        if state.is_closed() || sink.is_none() {
            info!("Re-opening signaling channel (state={:?})", state);
            self.open_socket(sink).await?;
        }
        Ok(())
    }
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    status: Arc<ChannelStatus>,
    inbound_tx: mpsc::Sender<SignalEnvelope>,
    generation: u64,
) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<SignalEnvelope>(&text) {
                Ok(envelope) => {
                    if inbound_tx.send(envelope).await.is_err() {
                        debug!("Inbound envelope handler dropped, stopping reader");
                        break;
                    }
                }
                Err(e) => warn!("Invalid signaling message: {}. Text: {}", e, text),
            },
            Ok(Message::Close(_)) => {
                status.mark(generation, ChannelState::Closing);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Signaling socket error: {}", e);
                break;
            }
        }
    }

    status.mark(generation, ChannelState::Closed);
    debug!("Signaling reader for generation {} finished", generation);
}

#[async_trait]
impl SignalingOutput for SignalingChannel {
    async fn send(&self, envelope: SignalEnvelope) -> Result<(), ChannelError> {
        let text = serde_json::to_string(&envelope)?;

        let mut sink = self.inner.sink.lock().await;
        self.reopen_if_closed(&mut sink).await?;

        let Some(ws) = sink.as_mut() else {
            return Err(ChannelError::NotConnected);
        };
        if let Err(e) = ws.send(Message::Text(text)).await {
            let generation = self.inner.status.generation.load(Ordering::Acquire);
            self.inner.status.mark(generation, ChannelState::Closed);
            return Err(ChannelError::Send(e));
        }
        Ok(())
    }

    async fn ensure_open(&self) -> Result<(), ChannelError> {
        let mut sink = self.inner.sink.lock().await;
        self.reopen_if_closed(&mut sink).await
    }

    async fn ready(&self) {
        let mut rx = self.inner.status.state_tx.subscribe();
        let _ = rx.wait_for(|state| *state == ChannelState::Open).await;
    }

    fn state(&self) -> ChannelState {
        *self.inner.status.state_tx.borrow()
    }
}

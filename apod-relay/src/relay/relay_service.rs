use crate::relay::RelayConfig;
use crate::storage::{FragmentStore, SaveDirPicker};
use apod_core::{SideEvent, SignalEnvelope};
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Relay-local handle of one WebSocket connection.
pub type ConnectionId = u64;

struct RelayInner {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    next_id: AtomicU64,
    lan_ip: IpAddr,
    store: FragmentStore,
    picker: Arc<dyn SaveDirPicker>,
}

/// Shared state of the relay: connected sockets, fragment storage and the
/// save-directory picker.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new(config: &RelayConfig, lan_ip: IpAddr, picker: Arc<dyn SaveDirPicker>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
                next_id: AtomicU64::new(0),
                lan_ip,
                store: FragmentStore::new(config.save_dir.clone()),
                picker,
            }),
        }
    }

    pub fn lan_ip(&self) -> IpAddr {
        self.inner.lan_ip
    }

    pub fn store(&self) -> &FragmentStore {
        &self.inner.store
    }

    pub fn add_peer(&self, tx: mpsc::UnboundedSender<Message>) -> ConnectionId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.peers.insert(id, tx);
        id
    }

    pub fn remove_peer(&self, id: ConnectionId) {
        self.inner.peers.remove(&id);
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    /// Send a frame to every connection, the sender included.
    pub fn broadcast(&self, text: &str) {
        for peer in self.inner.peers.iter() {
            if let Err(e) = peer.value().send(Message::Text(text.to_owned().into())) {
                warn!("Failed to relay to connection {}: {:?}", peer.key(), e);
            }
        }
    }

    pub fn send_envelope(&self, id: ConnectionId, envelope: SignalEnvelope) {
        let Some(peer) = self.inner.peers.get(&id) else {
            warn!("Attempted to send to disconnected connection {}", id);
            return;
        };

        match serde_json::to_string(&envelope) {
            Ok(json) => {
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    error!("Failed to send WS message to {}: {:?}", id, e);
                }
            }
            Err(e) => error!("Failed to serialize envelope: {}", e),
        }
    }

    /// Relay a text frame and answer the side-channel events addressed to
    /// the relay itself.
    pub async fn handle_text(&self, from: ConnectionId, text: &str) {
        self.broadcast(text);

        let envelope = match serde_json::from_str::<SignalEnvelope>(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Relayed unparsed frame from {}: {}", from, e);
                return;
            }
        };

        match envelope.side_event() {
            Some(SideEvent::LeaderJoined) => {
                info!("Leader joined on connection {}", from);
                self.send_envelope(
                    from,
                    SignalEnvelope::event(SideEvent::LanIp {
                        ip: self.lan_ip().to_string(),
                    }),
                );
                self.send_save_dir(from);
            }

            Some(SideEvent::PickSaveDir) => {
                let current = self.store().save_dir();
                if let Some(dir) = self.inner.picker.pick(&current).await {
                    self.store().set_save_dir(dir);
                }
                self.send_save_dir(from);
            }

            _ => {}
        }
    }

    fn send_save_dir(&self, to: ConnectionId) {
        let save_dir = self.store().save_dir().display().to_string();
        self.send_envelope(to, SignalEnvelope::event(SideEvent::SetSaveDir { save_dir }));
    }
}

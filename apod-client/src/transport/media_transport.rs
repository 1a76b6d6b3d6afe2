use crate::transport::TransportEvent;
use apod_core::{IceCandidate, SessionDescription, SessionId};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Factory for media sessions. ICE, DTLS and media flow live behind it.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Open a session whose callbacks are posted to `events`, tagged with `id`.
    async fn open_session(
        &self,
        id: SessionId,
        events: mpsc::Sender<TransportEvent>,
    ) -> anyhow::Result<Box<dyn MediaSession>>;
}

/// One peer connection. Descriptions and candidates pass through verbatim.
#[async_trait]
pub trait MediaSession: Send + Sync {
    async fn create_offer(&self) -> anyhow::Result<SessionDescription>;

    async fn create_answer(&self) -> anyhow::Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> anyhow::Result<()>;

    async fn set_remote_description(&self, description: SessionDescription)
    -> anyhow::Result<()>;

    /// The description currently applied locally, once gathering has
    /// amended it.
    async fn local_description(&self) -> Option<SessionDescription>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> anyhow::Result<()>;

    async fn close(&self) -> anyhow::Result<()>;
}

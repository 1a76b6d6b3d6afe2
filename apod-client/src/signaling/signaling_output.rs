use crate::signaling::ChannelError;
use apod_core::SignalEnvelope;
use async_trait::async_trait;

/// Lifecycle of the socket underneath a signaling channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ChannelState {
    pub fn is_closed(self) -> bool {
        matches!(self, ChannelState::Closing | ChannelState::Closed)
    }
}

/// Outbound half of the relay connection, as seen by the negotiator,
/// the uploader and the conference loop.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Send one envelope, reconnecting first if the socket is closing or closed.
    async fn send(&self, envelope: SignalEnvelope) -> Result<(), ChannelError>;

    /// Reconnect if the socket is closing or closed; no-op otherwise.
    async fn ensure_open(&self) -> Result<(), ChannelError>;

    /// Resolves once the channel reports `Open`.
    async fn ready(&self);

    fn state(&self) -> ChannelState;
}

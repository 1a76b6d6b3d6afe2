use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to connect to {url}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("failed to write to signaling socket")]
    Send(#[source] tungstenite::Error),

    #[error("failed to encode envelope")]
    Encode(#[from] serde_json::Error),

    #[error("signaling channel is not connected")]
    NotConnected,
}

use apod_core::{IceCandidate, SessionId};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Handle of a remote track, opaque to the conference loop. The transport
/// creates it and the recorder factory downcasts it to whatever the
/// transport actually delivers.
#[derive(Clone)]
pub struct RemoteTrack(pub Arc<dyn Any + Send + Sync>);

impl RemoteTrack {
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.0.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RemoteTrack(..)")
    }
}

/// Callbacks of a media session, delivered to the conference loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// A local candidate was gathered. `None` marks the end of gathering.
    CandidateGenerated(SessionId, Option<IceCandidate>),
    TrackArrived(SessionId, RemoteTrack),
    Disconnected(SessionId),
}

impl TransportEvent {
    pub fn session(&self) -> SessionId {
        match self {
            TransportEvent::CandidateGenerated(id, _)
            | TransportEvent::TrackArrived(id, _)
            | TransportEvent::Disconnected(id) => *id,
        }
    }
}

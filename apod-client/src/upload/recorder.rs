use crate::transport::RemoteTrack;
use apod_core::{SessionId, TrackIndex};
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Inactive,
    Recording,
    Paused,
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("recorder source is not active")]
    InactiveSource,
    #[error("recorder failed: {0}")]
    Failed(String),
}

/// Data-ready callback of a recorder.
///
/// Remote recorders are tagged with the session they record, so data that
/// arrives after the session left its slot can be told apart from the data
/// of the slot's next occupant.
#[derive(Debug)]
pub struct RecorderEvent {
    pub track: TrackIndex,
    pub session: Option<SessionId>,
    pub chunk: Bytes,
}

/// A container-producing recorder for one track. Every `start` begins a new
/// independently decodable container; data is delivered asynchronously as
/// [`RecorderEvent`]s.
pub trait Recorder: Send {
    fn state(&self) -> RecorderState;

    fn start(&mut self) -> Result<(), RecorderError>;

    fn stop(&mut self) -> Result<(), RecorderError>;

    /// Ask for whatever has been recorded so far to be delivered.
    fn request_data(&mut self) -> Result<(), RecorderError>;
}

/// What a recorder records from.
#[derive(Debug, Clone)]
pub enum TrackSource {
    Local,
    Remote(RemoteTrack),
}

pub trait RecorderFactory: Send + Sync {
    fn create(
        &self,
        track: TrackIndex,
        session: Option<SessionId>,
        source: TrackSource,
        events: mpsc::UnboundedSender<RecorderEvent>,
    ) -> Result<Box<dyn Recorder>, RecorderError>;
}

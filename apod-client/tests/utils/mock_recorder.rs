use apod_client::{Recorder, RecorderError, RecorderEvent, RecorderFactory, RecorderState, TrackSource};
use apod_core::{SessionId, TrackIndex};
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderCall {
    Start,
    Stop,
    RequestData,
}

#[derive(Default)]
struct RecorderLog {
    calls: Mutex<Vec<RecorderCall>>,
    recording: Mutex<bool>,
}

pub struct MockRecorder {
    log: Arc<RecorderLog>,
}

impl MockRecorder {
    fn new(log: Arc<RecorderLog>) -> Self {
        Self { log }
    }

    fn record(&self, call: RecorderCall) {
        self.log.calls.lock().unwrap().push(call);
    }
}

impl Recorder for MockRecorder {
    fn state(&self) -> RecorderState {
        if *self.log.recording.lock().unwrap() {
            RecorderState::Recording
        } else {
            RecorderState::Inactive
        }
    }

    fn start(&mut self) -> Result<(), RecorderError> {
        self.record(RecorderCall::Start);
        *self.log.recording.lock().unwrap() = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.record(RecorderCall::Stop);
        *self.log.recording.lock().unwrap() = false;
        Ok(())
    }

    fn request_data(&mut self) -> Result<(), RecorderError> {
        self.record(RecorderCall::RequestData);
        Ok(())
    }
}

/// Test-side view of a recorder: its call log and its data-ready channel.
#[derive(Clone)]
pub struct MockRecorderHandle {
    pub track: TrackIndex,
    pub session: Option<SessionId>,
    pub local: bool,
    log: Arc<RecorderLog>,
    events: mpsc::UnboundedSender<RecorderEvent>,
}

impl MockRecorderHandle {
    pub fn calls(&self) -> Vec<RecorderCall> {
        self.log.calls.lock().unwrap().clone()
    }

    pub fn is_recording(&self) -> bool {
        *self.log.recording.lock().unwrap()
    }

    /// Deliver a chunk as the recorder's data-ready callback would.
    pub fn push_chunk(&self, data: &'static [u8]) {
        let _ = self.events.send(RecorderEvent {
            track: self.track,
            session: self.session,
            chunk: Bytes::from_static(data),
        });
    }
}

#[derive(Clone, Default)]
pub struct MockRecorderFactory {
    created: Arc<Mutex<Vec<MockRecorderHandle>>>,
}

impl MockRecorderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<MockRecorderHandle> {
        self.created.lock().unwrap().clone()
    }

    pub fn for_track(&self, track: TrackIndex) -> Option<MockRecorderHandle> {
        self.created().into_iter().find(|r| r.track == track)
    }

    /// A standalone recorder plus its handle, for driving the uploader
    /// without a conference.
    pub fn standalone(track: TrackIndex) -> (Box<dyn Recorder>, MockRecorderHandle) {
        let (events, _rx) = mpsc::unbounded_channel();
        let log = Arc::new(RecorderLog::default());
        let handle = MockRecorderHandle {
            track,
            session: None,
            local: track.is_local(),
            log: log.clone(),
            events,
        };
        (Box::new(MockRecorder::new(log)), handle)
    }
}

impl RecorderFactory for MockRecorderFactory {
    fn create(
        &self,
        track: TrackIndex,
        session: Option<SessionId>,
        source: TrackSource,
        events: mpsc::UnboundedSender<RecorderEvent>,
    ) -> Result<Box<dyn Recorder>, RecorderError> {
        let log = Arc::new(RecorderLog::default());
        self.created.lock().unwrap().push(MockRecorderHandle {
            track,
            session,
            local: matches!(source, TrackSource::Local),
            log: log.clone(),
            events,
        });
        Ok(Box::new(MockRecorder::new(log)))
    }
}

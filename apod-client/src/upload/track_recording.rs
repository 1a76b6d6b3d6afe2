use crate::upload::{FragmentBuffer, Recorder};
use apod_core::TrackIndex;

/// Buffer plus recorder of one uploaded track.
pub struct TrackRecording {
    track: TrackIndex,
    pub buffer: FragmentBuffer,
    recorder: Option<Box<dyn Recorder>>,
    armed: bool,
}

impl TrackRecording {
    pub fn new(track: TrackIndex) -> Self {
        Self {
            track,
            buffer: FragmentBuffer::new(),
            recorder: None,
            armed: false,
        }
    }

    pub fn track(&self) -> TrackIndex {
        self.track
    }

    pub fn has_recorder(&self) -> bool {
        self.recorder.is_some()
    }

    /// Install a recorder. It stays untouched until [`arm`](Self::arm).
    pub fn attach(&mut self, recorder: Box<dyn Recorder>) {
        self.recorder = Some(recorder);
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Mark the startup delay as elapsed and hand out the recorder to start.
    pub fn arm(&mut self) -> Option<&mut (dyn Recorder + 'static)> {
        self.armed = self.recorder.is_some();
        self.recorder.as_deref_mut()
    }

    /// The recorder, once armed.
    pub fn armed_recorder(&mut self) -> Option<&mut (dyn Recorder + 'static)> {
        if !self.armed {
            return None;
        }
        self.recorder.as_deref_mut()
    }

    pub fn detach(&mut self) -> Option<Box<dyn Recorder>> {
        self.armed = false;
        self.recorder.take()
    }
}

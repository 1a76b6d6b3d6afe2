use crate::signaling::SignalingOutput;
use crate::upload::{FragmentSink, Recorder, RecorderError, RecorderState, TrackRecording};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was buffered; no request was made.
    Idle,
    Uploaded { bytes: usize },
}

/// Turns buffered chunks into independently playable upload units.
///
/// A flush is synchronous: when it returns the buffer is empty, the upload
/// has been handed to the sink and the recorder has been cut over to a new
/// container.
#[derive(Clone)]
pub struct FragmentUploader {
    sink: Arc<dyn FragmentSink>,
    signaling: Arc<dyn SignalingOutput>,
}

impl FragmentUploader {
    pub fn new(sink: Arc<dyn FragmentSink>, signaling: Arc<dyn SignalingOutput>) -> Self {
        Self { sink, signaling }
    }

    pub fn flush(&self, recording: &mut TrackRecording) -> FlushOutcome {
        let outcome = self.upload_buffered(recording);

        if let Some(recorder) = recording.armed_recorder() {
            if outcome != FlushOutcome::Idle {
                // each start() opens a new container
                log_failure(recorder.stop(), "stop");
                log_failure(recorder.start(), "restart");
            }
            keep_recording(recorder);
        }

        outcome
    }

    /// Upload what is left and stop the recorder for good.
    pub fn drain(&self, recording: &mut TrackRecording) -> FlushOutcome {
        let outcome = self.upload_buffered(recording);

        if let Some(mut recorder) = recording.detach() {
            if recorder.state() != RecorderState::Inactive {
                log_failure(recorder.stop(), "stop");
            }
        }

        outcome
    }

    fn upload_buffered(&self, recording: &mut TrackRecording) -> FlushOutcome {
        let track = recording.track();
        let blob = recording.buffer.take();
        if blob.is_empty() {
            return FlushOutcome::Idle;
        }

        self.reopen_signaling();

        let bytes = blob.len();
        debug!("Uploading {} bytes for track {}", bytes, track);
        self.sink.submit(track, blob);

        FlushOutcome::Uploaded { bytes }
    }

    /// Reconnect a dropped relay socket without holding up the upload, which
    /// travels over its own HTTP request.
    fn reopen_signaling(&self) {
        let state = self.signaling.state();
        if !state.is_closed() {
            return;
        }

        info!("Re-opening signaling channel before upload (state={:?})", state);
        let signaling = self.signaling.clone();
        tokio::spawn(async move {
            if let Err(e) = signaling.ensure_open().await {
                warn!("Failed to re-open signaling channel: {}", e);
            }
        });
    }
}

/// Idle recorders are started, running ones asked for their pending data so
/// the next tick has something to upload.
fn keep_recording(recorder: &mut dyn Recorder) {
    match recorder.state() {
        RecorderState::Recording => log_failure(recorder.request_data(), "request data from"),
        _ => log_failure(recorder.start(), "start"),
    }
}

fn log_failure(result: Result<(), RecorderError>, action: &str) {
    if let Err(e) = result {
        warn!("Failed to {} recorder: {}", action, e);
    }
}

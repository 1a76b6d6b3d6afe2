use apod_client::{ChannelState, FlushOutcome, FragmentUploader, SignalingOutput, TrackRecording};
use apod_core::TrackIndex;
use bytes::Bytes;
use std::sync::Arc;

use crate::integration::{eventually, init_tracing};
use crate::utils::{MockRecorderFactory, MockSignaling, MockSink, RecorderCall};

fn uploader(signaling: &MockSignaling, sink: &MockSink) -> FragmentUploader {
    FragmentUploader::new(Arc::new(sink.clone()), Arc::new(signaling.clone()))
}

#[tokio::test]
async fn test_empty_flush_uploads_nothing() {
    init_tracing();
    let (signaling, _out) = MockSignaling::new();
    let sink = MockSink::new();
    let uploader = uploader(&signaling, &sink);

    let mut recording = TrackRecording::new(TrackIndex::LOCAL);
    let (recorder, handle) = MockRecorderFactory::standalone(TrackIndex::LOCAL);
    recording.attach(recorder);
    recording.arm();

    assert_eq!(uploader.flush(&mut recording), FlushOutcome::Idle);
    assert_eq!(handle.calls(), vec![RecorderCall::Start]);

    assert_eq!(uploader.flush(&mut recording), FlushOutcome::Idle);
    assert_eq!(
        handle.calls(),
        vec![RecorderCall::Start, RecorderCall::RequestData]
    );
    assert!(sink.uploads().is_empty());
}

#[tokio::test]
async fn test_flush_uploads_concatenation_and_restarts_recorder() {
    init_tracing();
    let (signaling, _out) = MockSignaling::new();
    let sink = MockSink::new();
    let uploader = uploader(&signaling, &sink);

    let mut recording = TrackRecording::new(TrackIndex(2));
    let (recorder, handle) = MockRecorderFactory::standalone(TrackIndex(2));
    recording.attach(recorder);
    recording.arm();
    uploader.flush(&mut recording);

    recording.buffer.push(Bytes::from_static(b"head"));
    recording.buffer.push(Bytes::from_static(b"-tail"));

    assert_eq!(
        uploader.flush(&mut recording),
        FlushOutcome::Uploaded { bytes: 9 }
    );
    assert!(recording.buffer.is_empty());
    assert_eq!(sink.uploads(), vec![(TrackIndex(2), Bytes::from_static(b"head-tail"))]);
    assert_eq!(
        handle.calls(),
        vec![
            RecorderCall::Start,
            RecorderCall::Stop,
            RecorderCall::Start,
            RecorderCall::RequestData,
        ]
    );
}

#[tokio::test]
async fn test_unarmed_recorder_is_left_alone() {
    let (signaling, _out) = MockSignaling::new();
    let sink = MockSink::new();
    let uploader = uploader(&signaling, &sink);

    let mut recording = TrackRecording::new(TrackIndex::LOCAL);
    let (recorder, handle) = MockRecorderFactory::standalone(TrackIndex::LOCAL);
    recording.attach(recorder);
    recording.buffer.push(Bytes::from_static(b"early"));

    assert_eq!(
        uploader.flush(&mut recording),
        FlushOutcome::Uploaded { bytes: 5 }
    );
    assert!(handle.calls().is_empty());
}

#[tokio::test]
async fn test_upload_reopens_closed_channel() {
    init_tracing();
    let (signaling, _out) = MockSignaling::with_state(ChannelState::Closed);
    let sink = MockSink::new();
    let uploader = uploader(&signaling, &sink);

    let mut recording = TrackRecording::new(TrackIndex::LOCAL);
    recording.buffer.push(Bytes::from_static(b"x"));
    uploader.flush(&mut recording);

    assert_eq!(sink.uploads().len(), 1);
    assert!(eventually(|| signaling.reopen_calls() == 1, 1000).await);
    assert_eq!(signaling.state(), ChannelState::Open);

    // an open channel is left alone, an empty buffer never reopens
    recording.buffer.push(Bytes::from_static(b"y"));
    uploader.flush(&mut recording);
    signaling.set_state(ChannelState::Closed);
    uploader.flush(&mut recording);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(signaling.reopen_calls(), 1);
}

#[tokio::test]
async fn test_drain_uploads_and_stops() {
    let (signaling, _out) = MockSignaling::new();
    let sink = MockSink::new();
    let uploader = uploader(&signaling, &sink);

    let mut recording = TrackRecording::new(TrackIndex(1));
    let (recorder, handle) = MockRecorderFactory::standalone(TrackIndex(1));
    recording.attach(recorder);
    recording.arm();
    uploader.flush(&mut recording);
    recording.buffer.push(Bytes::from_static(b"last"));

    assert_eq!(
        uploader.drain(&mut recording),
        FlushOutcome::Uploaded { bytes: 4 }
    );
    assert!(!recording.has_recorder());
    assert_eq!(handle.calls().last(), Some(&RecorderCall::Stop));
    assert!(!handle.is_recording());
}

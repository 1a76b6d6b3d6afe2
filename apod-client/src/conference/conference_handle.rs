use crate::conference::{Collaborators, Conference, ConferenceCommand, ConferenceEvent};
use crate::config::ClientConfig;
use crate::signaling::{ChannelError, SignalingChannel};
use crate::transport::MediaTransport;
use crate::upload::{HttpFragmentSink, RecorderFactory};
use apod_core::{ClientIdentity, SignalEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Connect to the relay under a fresh identity and start the conference
/// loop.
pub async fn join(
    config: ClientConfig,
    transport: Arc<dyn MediaTransport>,
    recorders: Arc<dyn RecorderFactory>,
) -> Result<ConferenceHandle, ChannelError> {
    let identity = ClientIdentity::generate();
    let (signal_tx, signal_rx) = mpsc::channel::<SignalEnvelope>(256);

    let signaling = SignalingChannel::connect(config.signaling_url.clone(), signal_tx).await?;
    let sink = HttpFragmentSink::new(config.upload_base_url.clone());

    let collaborators = Collaborators {
        signaling: Arc::new(signaling),
        transport,
        recorders,
        sink: Arc::new(sink),
    };

    Ok(ConferenceHandle::spawn(
        config,
        identity,
        collaborators,
        signal_rx,
    ))
}

/// Owner-side view of a running [`Conference`].
pub struct ConferenceHandle {
    identity: ClientIdentity,
    commands: mpsc::Sender<ConferenceCommand>,
    events: mpsc::UnboundedReceiver<ConferenceEvent>,
    task: JoinHandle<()>,
}

impl ConferenceHandle {
    pub fn spawn(
        config: ClientConfig,
        identity: ClientIdentity,
        collaborators: Collaborators,
        signal_rx: mpsc::Receiver<SignalEnvelope>,
    ) -> Self {
        let (commands, command_rx) = mpsc::channel(32);
        let (conference, events) =
            Conference::new(config, identity.clone(), collaborators, signal_rx, command_rx);
        let task = tokio::spawn(conference.run());

        Self {
            identity,
            commands,
            events,
            task,
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub async fn local_media_ready(&self) {
        self.send(ConferenceCommand::LocalMediaReady).await;
    }

    pub async fn capture_failed(&self, reason: impl Into<String>) {
        self.send(ConferenceCommand::CaptureFailed {
            reason: reason.into(),
        })
        .await;
    }

    pub async fn call(&self) {
        self.send(ConferenceCommand::Call).await;
    }

    pub async fn pick_save_dir(&self) {
        self.send(ConferenceCommand::PickSaveDir).await;
    }

    pub async fn next_event(&mut self) -> Option<ConferenceEvent> {
        self.events.recv().await
    }

    /// Stop the loop after it has uploaded whatever is still buffered.
    pub async fn shutdown(self) {
        self.send(ConferenceCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!("Conference task ended abnormally: {}", e);
        }
    }

    async fn send(&self, cmd: ConferenceCommand) {
        if self.commands.send(cmd).await.is_err() {
            warn!("Conference loop is no longer running");
        }
    }
}

use crate::conference::{ConferenceCommand, ConferenceEvent};
use crate::config::{ClientConfig, PeerMode, RenegotiationPolicy};
use crate::negotiation::{
    Inbound, NegotiationSignal, NegotiationState, Role, forward_local_candidate, route_inbound,
};
use crate::signaling::SignalingOutput;
use crate::slots::{PeerSession, SessionRegistry};
use crate::transport::{MediaTransport, TransportEvent};
use crate::upload::{
    FlushOutcome, FragmentSink, FragmentUploader, RecorderEvent, RecorderFactory, RecorderState,
    TrackRecording, TrackSource,
};
use apod_core::{
    ClientIdentity, IceCandidate, SdpKind, SessionDescription, SessionId, SideEvent,
    SignalEnvelope, SlotIndex, TrackIndex,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// External systems the conference loop drives.
#[derive(Clone)]
pub struct Collaborators {
    pub signaling: Arc<dyn SignalingOutput>,
    pub transport: Arc<dyn MediaTransport>,
    pub recorders: Arc<dyn RecorderFactory>,
    pub sink: Arc<dyn FragmentSink>,
}

/// Work that a timer or readiness wait hands back to the loop.
#[derive(Debug)]
enum Deferred {
    AnnounceLeader,
    StartRecorder {
        track: TrackIndex,
        session: Option<SessionId>,
    },
}

/// Single owner of all per-client state.
///
/// Relay envelopes, transport callbacks, recorder data, timers and
/// commands are all serialized through [`Conference::run`], so handlers
/// never race each other.
pub struct Conference {
    config: ClientConfig,
    identity: ClientIdentity,
    signaling: Arc<dyn SignalingOutput>,
    transport: Arc<dyn MediaTransport>,
    recorders: Arc<dyn RecorderFactory>,
    uploader: FragmentUploader,
    registry: SessionRegistry,
    local: TrackRecording,
    capture_failed: bool,

    signal_rx: mpsc::Receiver<SignalEnvelope>,
    command_rx: mpsc::Receiver<ConferenceCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    recorder_rx: mpsc::UnboundedReceiver<RecorderEvent>,
    recorder_tx: mpsc::UnboundedSender<RecorderEvent>,
    deferred_rx: mpsc::UnboundedReceiver<Deferred>,
    deferred_tx: mpsc::UnboundedSender<Deferred>,
    events_tx: mpsc::UnboundedSender<ConferenceEvent>,
}

impl Conference {
    pub fn new(
        config: ClientConfig,
        identity: ClientIdentity,
        collaborators: Collaborators,
        signal_rx: mpsc::Receiver<SignalEnvelope>,
        command_rx: mpsc::Receiver<ConferenceCommand>,
    ) -> (Self, mpsc::UnboundedReceiver<ConferenceEvent>) {
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (recorder_tx, recorder_rx) = mpsc::unbounded_channel();
        let (deferred_tx, deferred_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let Collaborators {
            signaling,
            transport,
            recorders,
            sink,
        } = collaborators;

        let conference = Self {
            registry: SessionRegistry::new(config.peer_mode),
            uploader: FragmentUploader::new(sink, signaling.clone()),
            local: TrackRecording::new(TrackIndex::LOCAL),
            capture_failed: false,
            config,
            identity,
            signaling,
            transport,
            recorders,
            signal_rx,
            command_rx,
            transport_rx,
            transport_tx,
            recorder_rx,
            recorder_tx,
            deferred_rx,
            deferred_tx,
            events_tx,
        };

        (conference, events_rx)
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub async fn run(mut self) {
        info!("Conference loop started as {}", self.identity);

        if self.config.leader {
            self.schedule_leader_announce();
        }

        let period = self.config.flush_interval;
        let mut flush = tokio::time::interval_at(Instant::now() + period, period);
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut signals_open = true;

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(ConferenceCommand::Shutdown) => {
                            info!("Shutdown requested");
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down conference.");
                            break;
                        }
                    }
                }

                envelope = self.signal_rx.recv(), if signals_open => {
                    match envelope {
                        Some(e) => self.handle_envelope(e).await,
                        None => {
                            warn!("Signaling inbound channel closed");
                            signals_open = false;
                        }
                    }
                }

                Some(evt) = self.transport_rx.recv() => self.handle_transport_event(evt).await,

                Some(evt) = self.recorder_rx.recv() => self.handle_recorder_event(evt),

                Some(work) = self.deferred_rx.recv() => self.handle_deferred(work).await,

                _ = flush.tick() => self.flush_all(),
            }
        }

        self.shutdown().await;
        info!("Conference loop finished");
    }

    async fn handle_command(&mut self, cmd: ConferenceCommand) {
        match cmd {
            ConferenceCommand::LocalMediaReady => {
                if self.local.has_recorder() {
                    debug!("Local recorder already attached");
                    return;
                }

                match self.recorders.create(
                    TrackIndex::LOCAL,
                    None,
                    TrackSource::Local,
                    self.recorder_tx.clone(),
                ) {
                    Ok(recorder) => {
                        self.local.attach(recorder);
                        self.schedule_recorder_start(TrackIndex::LOCAL, None);
                    }
                    Err(e) => error!("Failed to create local recorder: {}", e),
                }
            }

            ConferenceCommand::CaptureFailed { reason } => {
                error!("Local capture failed: {}", reason);
                if !self.capture_failed {
                    self.capture_failed = true;
                    self.emit(ConferenceEvent::CaptureFailed(reason));
                }
            }

            ConferenceCommand::Call => self.call().await,

            ConferenceCommand::PickSaveDir => {
                if let Err(e) = self
                    .signaling
                    .send(SignalEnvelope::event(SideEvent::PickSaveDir))
                    .await
                {
                    warn!("Failed to request save directory: {}", e);
                }
            }

            ConferenceCommand::Shutdown => {}
        }
    }

    async fn call(&mut self) {
        if self.registry.mode() == PeerMode::Single && self.registry.get(SlotIndex(0)).is_some() {
            warn!("Already in a session, ignoring call");
            return;
        }

        let slot = self.registry.reserve_slot();
        let Some(slot) = self.open_session(slot, Role::Initiator, None).await else {
            return;
        };
        let Some(session) = self.registry.get_mut(slot) else {
            return;
        };

        match session
            .negotiator
            .initiate(session.media.as_ref(), self.signaling.as_ref(), &self.identity)
            .await
        {
            Ok(_) => info!("Offer sent from slot {}", slot),
            Err(e) => warn!("Failed to initiate on slot {}: {}", slot, e),
        }
    }

    async fn handle_envelope(&mut self, envelope: SignalEnvelope) {
        let Inbound {
            sender,
            event,
            signal,
        } = route_inbound(envelope, &self.identity);

        if let Some(event) = event {
            self.handle_side_event(event);
        }

        match signal {
            Some(NegotiationSignal::Description(description)) => {
                self.handle_remote_description(sender, description).await
            }
            Some(NegotiationSignal::Candidate(candidate)) => {
                self.handle_remote_candidate(sender, candidate).await
            }
            None => {}
        }
    }

    fn handle_side_event(&mut self, event: SideEvent) {
        match event {
            SideEvent::LanIp { ip } => {
                info!("Relay LAN address: {}", ip);
                self.emit(ConferenceEvent::LanAddress(ip));
            }
            SideEvent::SetSaveDir { save_dir } => {
                info!("Relay saves to {}", save_dir);
                self.emit(ConferenceEvent::SaveDirectory(save_dir));
            }
            other => debug!("Ignoring side event {}", other.name()),
        }
    }

    async fn handle_remote_description(
        &mut self,
        sender: Option<ClientIdentity>,
        description: SessionDescription,
    ) {
        let kind = description.kind;
        let slot = match kind {
            SdpKind::Offer => self.session_for_offer(sender.as_ref()).await,
            _ => self.session_for_answer(sender.as_ref()),
        };
        let Some(slot) = slot else {
            warn!("No session for {:?} from {:?}", kind, sender);
            return;
        };
        let Some(session) = self.registry.get_mut(slot) else {
            return;
        };

        let was_connected = session.negotiator.state() == NegotiationState::Connected;
        let result = session
            .negotiator
            .on_remote_description(
                description,
                session.media.as_ref(),
                self.signaling.as_ref(),
                &self.identity,
            )
            .await;

        match result {
            Ok(NegotiationState::Connected) if !was_connected => {
                let remote = session.remote.clone();
                info!("Slot {} connected to {:?}", slot, remote);
                self.emit(ConferenceEvent::PeerConnected { slot, remote });
            }
            Ok(state) => debug!("Slot {} negotiation state {:?}", slot, state),
            Err(e) => warn!("Negotiation failed on slot {}: {}", slot, e),
        }
    }

    async fn session_for_offer(&mut self, sender: Option<&ClientIdentity>) -> Option<SlotIndex> {
        if matches!(self.registry.mode(), PeerMode::Multi { .. }) && sender.is_none() {
            warn!("Offer without sender identity ignored in multi-peer mode");
            return None;
        }

        let Some(slot) = self.registry.lookup(sender) else {
            let slot = self.registry.reserve_slot();
            return self.open_session(slot, Role::Responder, sender.cloned()).await;
        };

        let session = self.registry.get_mut(slot)?;
        if !session.negotiator.has_local_description() {
            if session.remote.is_none() {
                session.remote = sender.cloned();
            }
            return Some(slot);
        }

        // glare: our unanswered offer still occupies the media session
        let glare = session.negotiator.state() == NegotiationState::OfferSent;
        match self.config.renegotiation {
            RenegotiationPolicy::Reuse if !glare => {
                info!("Renegotiating slot {} on its existing media session", slot);
                session.negotiator.restart();
                session.remote = sender.cloned();
                Some(slot)
            }
            _ => {
                info!("Replacing media session of slot {} for a new offer", slot);
                if let Some(old) = self.registry.remove(slot) {
                    self.retire(old).await;
                }
                self.open_session(slot, Role::Responder, sender.cloned()).await
            }
        }
    }

    /// Answers go to the known session of the sender, or bind the sender to
    /// our unanswered offer.
    fn session_for_answer(&mut self, sender: Option<&ClientIdentity>) -> Option<SlotIndex> {
        let slot = match self.registry.lookup(sender) {
            Some(slot) => slot,
            None => self.registry.pending_initiator()?,
        };

        if let Some(session) = self.registry.get_mut(slot) {
            if session.remote.is_none() {
                session.remote = sender.cloned();
            }
        }
        Some(slot)
    }

    async fn handle_remote_candidate(
        &mut self,
        sender: Option<ClientIdentity>,
        candidate: IceCandidate,
    ) {
        let slot = match self.registry.lookup(sender.as_ref()) {
            Some(slot) => Some(slot),
            None => match self.registry.mode() {
                PeerMode::Single => {
                    let slot = self.registry.reserve_slot();
                    self.open_session(slot, Role::Responder, sender.clone()).await
                }
                PeerMode::Multi { .. } => {
                    debug!("Dropping candidate from unknown peer {:?}", sender);
                    None
                }
            },
        };
        let Some(slot) = slot else {
            return;
        };
        let Some(session) = self.registry.get_mut(slot) else {
            return;
        };
        if session.remote.is_none() {
            session.remote = sender;
        }

        if let Err(e) = session
            .negotiator
            .on_remote_candidate(candidate, session.media.as_ref())
            .await
        {
            warn!("Failed to add ICE candidate on slot {}: {}", slot, e);
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let id = event.session();
        if self.registry.slot_of(id).is_none() {
            debug!("Ignoring event from retired session {}", id);
            return;
        }

        match event {
            TransportEvent::CandidateGenerated(_, candidate) => {
                match forward_local_candidate(candidate, self.signaling.as_ref(), &self.identity)
                    .await
                {
                    Ok(true) => debug!("Forwarded local candidate of session {}", id),
                    Ok(false) => debug!("Candidate gathering finished for session {}", id),
                    Err(e) => warn!("Failed to forward candidate of session {}: {}", id, e),
                }
            }

            TransportEvent::TrackArrived(_, track) => {
                let Some(session) = self.registry.get_by_id_mut(id) else {
                    return;
                };
                if session.recording.has_recorder() {
                    debug!("Session {} already records a track", id);
                    return;
                }

                let track_index = session.track();
                match self.recorders.create(
                    track_index,
                    Some(id),
                    TrackSource::Remote(track),
                    self.recorder_tx.clone(),
                ) {
                    Ok(recorder) => {
                        session.recording.attach(recorder);
                        self.schedule_recorder_start(track_index, Some(id));
                    }
                    Err(e) => warn!("Failed to create recorder for track {}: {}", track_index, e),
                }
            }

            TransportEvent::Disconnected(_) => {
                let Some(session) = self.registry.remove_by_id(id) else {
                    return;
                };
                info!("Session {} in slot {} disconnected", id, session.slot);

                let slot = session.slot;
                let remote = session.remote.clone();
                self.retire(session).await;
                self.emit(ConferenceEvent::PeerDisconnected { slot, remote });
            }
        }
    }

    fn handle_recorder_event(&mut self, event: RecorderEvent) {
        let RecorderEvent {
            track,
            session,
            chunk,
        } = event;
        let recording = match session {
            None => &mut self.local,
            Some(id) => match self.registry.get_by_id_mut(id) {
                Some(session) => &mut session.recording,
                None => {
                    debug!("Dropping chunk of retired session {} for track {}", id, track);
                    return;
                }
            },
        };
        recording.buffer.push(chunk);
    }

    async fn handle_deferred(&mut self, work: Deferred) {
        match work {
            Deferred::AnnounceLeader => {
                match self
                    .signaling
                    .send(SignalEnvelope::event(SideEvent::LeaderJoined))
                    .await
                {
                    Ok(()) => {
                        info!("Announced leader");
                        self.emit(ConferenceEvent::LeaderAnnounced);
                    }
                    Err(e) => warn!("Failed to announce leader: {}", e),
                }
            }

            Deferred::StartRecorder { track, session } => {
                let recording = match session {
                    None => &mut self.local,
                    Some(id) => match self.registry.get_by_id_mut(id) {
                        Some(session) => &mut session.recording,
                        None => {
                            debug!("Session {} gone before its recorder started", id);
                            return;
                        }
                    },
                };

                let Some(recorder) = recording.arm() else {
                    return;
                };
                if recorder.state() == RecorderState::Inactive {
                    match recorder.start() {
                        Ok(()) => info!("Recording track {}", track),
                        Err(e) => warn!("Failed to start recorder for track {}: {}", track, e),
                    }
                }
            }
        }
    }

    fn flush_all(&mut self) {
        let outcome = self.uploader.flush(&mut self.local);
        report_upload(&self.events_tx, TrackIndex::LOCAL, outcome);

        for session in self.registry.iter_mut() {
            let outcome = self.uploader.flush(&mut session.recording);
            report_upload(&self.events_tx, session.track(), outcome);
        }
    }

    async fn open_session(
        &mut self,
        slot: SlotIndex,
        role: Role,
        remote: Option<ClientIdentity>,
    ) -> Option<SlotIndex> {
        let id = self.registry.next_session_id();
        let media = match self
            .transport
            .open_session(id, self.transport_tx.clone())
            .await
        {
            Ok(media) => media,
            Err(e) => {
                error!("Failed to open media session for slot {}: {:?}", slot, e);
                return None;
            }
        };
        info!("Session {} opened in slot {} as {:?}", id, slot, role);

        let session = PeerSession::new(id, slot, role, remote, media);
        if let Some(evicted) = self.registry.insert(session) {
            warn!(
                "Slot {} reused while occupied, evicting session {}",
                slot, evicted.id
            );
            let remote = evicted.remote.clone();
            self.retire(evicted).await;
            self.emit(ConferenceEvent::SlotEvicted { slot, remote });
        }

        Some(slot)
    }

    /// Upload what the session still buffers and close its media.
    async fn retire(&mut self, mut session: PeerSession) {
        let outcome = self.uploader.drain(&mut session.recording);
        report_upload(&self.events_tx, session.track(), outcome);

        if let Err(e) = session.media.close().await {
            warn!("Failed to close session {}: {:?}", session.id, e);
        }
    }

    async fn shutdown(&mut self) {
        let outcome = self.uploader.drain(&mut self.local);
        report_upload(&self.events_tx, TrackIndex::LOCAL, outcome);

        for session in self.registry.drain() {
            self.retire(session).await;
        }
    }

    fn schedule_leader_announce(&self) {
        let signaling = self.signaling.clone();
        let deferred = self.deferred_tx.clone();
        let limit = self.config.leader_announce_timeout;

        tokio::spawn(async move {
            if tokio::time::timeout(limit, signaling.ready()).await.is_err() {
                warn!("Signaling not open after {:?}, announcing anyway", limit);
            }
            let _ = deferred.send(Deferred::AnnounceLeader);
        });
    }

    fn schedule_recorder_start(&self, track: TrackIndex, session: Option<SessionId>) {
        let deferred = self.deferred_tx.clone();
        let delay = self.config.recorder_start_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = deferred.send(Deferred::StartRecorder { track, session });
        });
    }

    fn emit(&self, event: ConferenceEvent) {
        let _ = self.events_tx.send(event);
    }
}

fn report_upload(
    events: &mpsc::UnboundedSender<ConferenceEvent>,
    track: TrackIndex,
    outcome: FlushOutcome,
) {
    if let FlushOutcome::Uploaded { bytes } = outcome {
        let _ = events.send(ConferenceEvent::FragmentUploaded { track, bytes });
    }
}

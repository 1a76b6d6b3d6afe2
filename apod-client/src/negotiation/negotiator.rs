use crate::negotiation::NegotiationError;
use crate::signaling::{ChannelError, SignalingOutput};
use crate::transport::MediaSession;
use apod_core::{
    ClientIdentity, IceCandidate, SdpKind, SessionDescription, SideEvent, SignalEnvelope,
    SignalPayload,
};
use tracing::debug;

/// Which side creates the offer. Fixed when the session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    New,
    OfferSent,
    Connected,
}

/// Negotiation part of an inbound envelope, after self-echo filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationSignal {
    Description(SessionDescription),
    Candidate(IceCandidate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub sender: Option<ClientIdentity>,
    pub event: Option<SideEvent>,
    pub signal: Option<NegotiationSignal>,
}

/// Split an envelope into its side-channel event and negotiation signal.
///
/// Events are extracted before the self-echo check, so a client still sees
/// the events it relayed to itself. Negotiation signals sent by `local` are
/// dropped.
pub fn route_inbound(envelope: SignalEnvelope, local: &ClientIdentity) -> Inbound {
    let from_self = envelope.is_from(local);
    let (event, signal) = match envelope.payload {
        SignalPayload::Event(event) => (Some(event), None),
        SignalPayload::Description(sdp) => (None, Some(NegotiationSignal::Description(sdp))),
        SignalPayload::Candidate(ice) => (None, Some(NegotiationSignal::Candidate(ice))),
    };

    let signal = if from_self {
        if signal.is_some() {
            debug!("Dropping self-echoed negotiation envelope");
        }
        None
    } else {
        signal
    };

    Inbound {
        sender: envelope.sender,
        event,
        signal,
    }
}

/// Offer/answer state machine of one peer session.
///
/// The negotiator never owns the media session or the channel; both are
/// lent to each call so the conference loop stays the single owner.
#[derive(Debug)]
pub struct Negotiator {
    role: Role,
    state: NegotiationState,
    local_description_set: bool,
}

impl Negotiator {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            state: NegotiationState::New,
            local_description_set: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn has_local_description(&self) -> bool {
        self.local_description_set
    }

    /// Forget the previous exchange so an offer on the same media session is
    /// answered again. The role is kept.
    pub fn restart(&mut self) {
        self.state = NegotiationState::New;
        self.local_description_set = false;
    }

    /// Create and send the offer. Valid once, for an initiator in `New`.
    pub async fn initiate(
        &mut self,
        media: &dyn MediaSession,
        out: &dyn SignalingOutput,
        identity: &ClientIdentity,
    ) -> Result<NegotiationState, NegotiationError> {
        if self.role != Role::Initiator || self.state != NegotiationState::New {
            return Err(NegotiationError::CannotInitiate { state: self.state });
        }

        let offer = media
            .create_offer()
            .await
            .map_err(NegotiationError::Transport)?;
        let local = self.apply_local_description(media, offer).await?;

        out.send(SignalEnvelope::description(identity.clone(), local))
            .await?;
        self.state = NegotiationState::OfferSent;
        Ok(self.state)
    }

    pub async fn on_remote_description(
        &mut self,
        description: SessionDescription,
        media: &dyn MediaSession,
        out: &dyn SignalingOutput,
        identity: &ClientIdentity,
    ) -> Result<NegotiationState, NegotiationError> {
        match description.kind {
            SdpKind::Offer => {
                if self.local_description_set {
                    return Err(NegotiationError::LocalDescriptionAlreadySet { state: self.state });
                }

                media
                    .set_remote_description(description)
                    .await
                    .map_err(NegotiationError::Transport)?;
                let answer = media
                    .create_answer()
                    .await
                    .map_err(NegotiationError::Transport)?;
                let local = self.apply_local_description(media, answer).await?;

                out.send(SignalEnvelope::description(identity.clone(), local))
                    .await?;
                self.state = NegotiationState::Connected;
            }

            SdpKind::Answer => {
                if self.state != NegotiationState::OfferSent {
                    return Err(NegotiationError::UnexpectedAnswer { state: self.state });
                }

                media
                    .set_remote_description(description)
                    .await
                    .map_err(NegotiationError::Transport)?;
                self.state = NegotiationState::Connected;
            }

            other => return Err(NegotiationError::UnsupportedDescription(other)),
        }

        Ok(self.state)
    }

    /// Hand a remote candidate to the transport. Never changes state.
    pub async fn on_remote_candidate(
        &self,
        candidate: IceCandidate,
        media: &dyn MediaSession,
    ) -> Result<(), NegotiationError> {
        media
            .add_ice_candidate(candidate)
            .await
            .map_err(NegotiationError::Transport)
    }

    async fn apply_local_description(
        &mut self,
        media: &dyn MediaSession,
        description: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        media
            .set_local_description(description.clone())
            .await
            .map_err(NegotiationError::Transport)?;
        self.local_description_set = true;

        Ok(media.local_description().await.unwrap_or(description))
    }
}

/// Send a locally gathered candidate to the peer. The end-of-candidates
/// sentinel (`None`) is not forwarded. Returns whether anything was sent.
pub async fn forward_local_candidate(
    candidate: Option<IceCandidate>,
    out: &dyn SignalingOutput,
    identity: &ClientIdentity,
) -> Result<bool, ChannelError> {
    let Some(candidate) = candidate else {
        return Ok(false);
    };
    out.send(SignalEnvelope::candidate(identity.clone(), candidate))
        .await?;
    Ok(true)
}

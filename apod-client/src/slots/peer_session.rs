use crate::negotiation::{Negotiator, Role};
use crate::transport::MediaSession;
use crate::upload::TrackRecording;
use apod_core::{ClientIdentity, SessionId, SlotIndex, TrackIndex};

/// Everything the client holds for one remote participant.
pub struct PeerSession {
    pub id: SessionId,
    pub slot: SlotIndex,
    /// Bound on the first envelope seen from the peer. Initiator sessions
    /// start unbound until an answer arrives.
    pub remote: Option<ClientIdentity>,
    pub negotiator: Negotiator,
    pub media: Box<dyn MediaSession>,
    pub recording: TrackRecording,
}

impl PeerSession {
    pub fn new(
        id: SessionId,
        slot: SlotIndex,
        role: Role,
        remote: Option<ClientIdentity>,
        media: Box<dyn MediaSession>,
    ) -> Self {
        Self {
            id,
            slot,
            remote,
            negotiator: Negotiator::new(role),
            media,
            recording: TrackRecording::new(TrackIndex::remote(slot)),
        }
    }

    pub fn track(&self) -> TrackIndex {
        self.recording.track()
    }
}

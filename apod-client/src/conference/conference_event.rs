use apod_core::{ClientIdentity, SlotIndex, TrackIndex};

/// Notifications for whatever presents the conference to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConferenceEvent {
    LanAddress(String),
    SaveDirectory(String),
    CaptureFailed(String),
    LeaderAnnounced,
    PeerConnected {
        slot: SlotIndex,
        remote: Option<ClientIdentity>,
    },
    /// A new session took over a slot that was still occupied.
    SlotEvicted {
        slot: SlotIndex,
        remote: Option<ClientIdentity>,
    },
    PeerDisconnected {
        slot: SlotIndex,
        remote: Option<ClientIdentity>,
    },
    FragmentUploaded {
        track: TrackIndex,
        bytes: usize,
    },
}

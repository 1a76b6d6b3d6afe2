use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-index bucket holding one remote participant.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SlotIndex(pub usize);

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index used on the upload endpoint: `0` is the local capture, `slot + 1`
/// is a remote slot.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TrackIndex(pub u32);

impl TrackIndex {
    pub const LOCAL: TrackIndex = TrackIndex(0);

    pub fn remote(slot: SlotIndex) -> Self {
        Self(slot.0 as u32 + 1)
    }

    pub fn is_local(self) -> bool {
        self == Self::LOCAL
    }

    /// The remote slot this track belongs to, `None` for the local track.
    pub fn slot(self) -> Option<SlotIndex> {
        self.0.checked_sub(1).map(|s| SlotIndex(s as usize))
    }
}

impl fmt::Display for TrackIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id of a peer session. Slots are reused, session ids never are.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

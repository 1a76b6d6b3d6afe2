mod description;
mod envelope;
mod identity;
mod track;

pub use description::{IceCandidate, SdpKind, SessionDescription};
pub use envelope::{EnvelopeError, SideEvent, SignalEnvelope, SignalPayload};
pub use identity::ClientIdentity;
pub use track::{SessionId, SlotIndex, TrackIndex};

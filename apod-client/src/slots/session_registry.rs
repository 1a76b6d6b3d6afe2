use crate::config::PeerMode;
use crate::negotiation::{NegotiationState, Role};
use crate::slots::{PeerSession, SlotAllocator};
use apod_core::{ClientIdentity, SessionId, SlotIndex};

/// Slot table of live peer sessions, owned by the conference loop.
pub struct SessionRegistry {
    mode: PeerMode,
    allocator: SlotAllocator,
    slots: Vec<Option<PeerSession>>,
    next_id: u64,
}

impl SessionRegistry {
    pub fn new(mode: PeerMode) -> Self {
        let capacity = mode.capacity();
        Self {
            mode,
            allocator: SlotAllocator::new(capacity),
            slots: (0..capacity).map(|_| None).collect(),
            next_id: 0,
        }
    }

    pub fn mode(&self) -> PeerMode {
        self.mode
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next_session_id(&mut self) -> SessionId {
        self.next_id += 1;
        SessionId(self.next_id)
    }

    /// Slot for a new session. Single-peer mode always uses slot 0.
    pub fn reserve_slot(&mut self) -> SlotIndex {
        match self.mode {
            PeerMode::Single => SlotIndex(0),
            PeerMode::Multi { .. } => self.allocator.allocate(),
        }
    }

    /// Put a session into its slot, returning whoever occupied it before.
    pub fn insert(&mut self, session: PeerSession) -> Option<PeerSession> {
        let slot = session.slot.0;
        self.slots.get_mut(slot)?.replace(session)
    }

    pub fn get(&self, slot: SlotIndex) -> Option<&PeerSession> {
        self.slots.get(slot.0)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: SlotIndex) -> Option<&mut PeerSession> {
        self.slots.get_mut(slot.0)?.as_mut()
    }

    pub fn slot_of(&self, id: SessionId) -> Option<SlotIndex> {
        self.iter().find(|s| s.id == id).map(|s| s.slot)
    }

    pub fn get_by_id_mut(&mut self, id: SessionId) -> Option<&mut PeerSession> {
        self.iter_mut().find(|s| s.id == id)
    }

    pub fn remove(&mut self, slot: SlotIndex) -> Option<PeerSession> {
        self.slots.get_mut(slot.0)?.take()
    }

    pub fn remove_by_id(&mut self, id: SessionId) -> Option<PeerSession> {
        let slot = self.slot_of(id)?;
        self.remove(slot)
    }

    /// The session that envelopes from `remote` belong to.
    ///
    /// In single-peer mode every remote maps to slot 0.
    pub fn lookup(&self, remote: Option<&ClientIdentity>) -> Option<SlotIndex> {
        match self.mode {
            PeerMode::Single => self.get(SlotIndex(0)).map(|s| s.slot),
            PeerMode::Multi { .. } => {
                let remote = remote?;
                self.iter()
                    .find(|s| s.remote.as_ref() == Some(remote))
                    .map(|s| s.slot)
            }
        }
    }

    /// An offer we sent that nobody has answered yet.
    pub fn pending_initiator(&self) -> Option<SlotIndex> {
        self.iter()
            .find(|s| {
                s.remote.is_none()
                    && s.negotiator.role() == Role::Initiator
                    && s.negotiator.state() == NegotiationState::OfferSent
            })
            .map(|s| s.slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerSession> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PeerSession> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    pub fn drain(&mut self) -> Vec<PeerSession> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}

use apod_core::SlotIndex;

/// Round-robin slot assignment.
///
/// There is no occupancy check: once more than `capacity` peers have been
/// allocated, the next allocation lands on a slot that may still be in use.
/// The caller is told about the displaced session by
/// [`SessionRegistry::insert`](crate::SessionRegistry::insert).
#[derive(Debug)]
pub struct SlotAllocator {
    capacity: usize,
    next: usize,
}

impl SlotAllocator {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn allocate(&mut self) -> SlotIndex {
        if self.next >= self.capacity {
            self.next = 0;
        }
        let slot = SlotIndex(self.next);
        self.next += 1;
        slot
    }
}

mod peer_session;
mod session_registry;
mod slot_allocator;

pub use peer_session::*;
pub use session_registry::*;
pub use slot_allocator::*;

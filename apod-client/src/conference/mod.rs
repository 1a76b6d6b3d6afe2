mod conference;
mod conference_command;
mod conference_event;
mod conference_handle;

pub use conference::*;
pub use conference_command::*;
pub use conference_event::*;
pub use conference_handle::*;

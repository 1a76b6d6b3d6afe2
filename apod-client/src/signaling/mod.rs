mod channel_error;
mod signaling_channel;
mod signaling_output;

pub use channel_error::*;
pub use signaling_channel::*;
pub use signaling_output::*;

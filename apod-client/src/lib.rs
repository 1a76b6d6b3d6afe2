pub mod conference;
pub mod config;
pub mod negotiation;
pub mod signaling;
pub mod slots;
pub mod transport;
pub mod upload;

pub use conference::*;
pub use config::*;
pub use negotiation::*;
pub use signaling::*;
pub use slots::*;
pub use transport::*;
pub use upload::*;

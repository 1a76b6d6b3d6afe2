pub use apod_core::model::{ClientIdentity, SignalEnvelope, TrackIndex};

pub mod model {
    pub use apod_core::model::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use apod_client::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use apod_relay::*;
}

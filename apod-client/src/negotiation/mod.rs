mod negotiation_error;
mod negotiator;

pub use negotiation_error::*;
pub use negotiator::*;

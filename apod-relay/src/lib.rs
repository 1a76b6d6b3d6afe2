pub mod relay;
pub mod storage;

pub use relay::*;
pub use storage::*;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Directory fragments are written to until a picker replaces it.
    pub save_dir: PathBuf,
    /// Upper bound on a single uploaded fragment.
    pub max_fragment_bytes: usize,
}

impl RelayConfig {
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_SAVE_DIR: &'static str = "apod-recordings";
    pub const DEFAULT_MAX_FRAGMENT_BYTES: usize = 64 * 1024 * 1024;
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, Self::DEFAULT_PORT)),
            save_dir: PathBuf::from(Self::DEFAULT_SAVE_DIR),
            max_fragment_bytes: Self::DEFAULT_MAX_FRAGMENT_BYTES,
        }
    }
}

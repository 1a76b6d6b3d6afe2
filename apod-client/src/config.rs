use std::time::Duration;

/// How many remote participants a client records at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerMode {
    /// One remote peer in the implicit slot 0; the slot allocator is bypassed.
    Single,
    /// Remote peers are spread over `capacity` slots with wraparound reuse.
    Multi { capacity: usize },
}

impl PeerMode {
    pub const DEFAULT_MULTI_CAPACITY: usize = 5;

    pub fn multi() -> Self {
        PeerMode::Multi {
            capacity: Self::DEFAULT_MULTI_CAPACITY,
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            PeerMode::Single => 1,
            PeerMode::Multi { capacity } => (*capacity).max(1),
        }
    }
}

/// What to do when an offer arrives for a peer whose session already has a
/// local description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenegotiationPolicy {
    /// Keep the existing media session and negotiate on it again.
    Reuse,
    /// Close the existing media session and answer on a fresh one.
    Reset,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay, e.g. `wss://host:8080/ws`.
    pub signaling_url: String,
    /// Base URL fragments are posted under (`{base}/save/{track}`).
    pub upload_base_url: String,
    /// Leaders announce themselves with `leader-joined` after connecting.
    pub leader: bool,
    pub peer_mode: PeerMode,
    pub renegotiation: RenegotiationPolicy,
    pub flush_interval: Duration,
    /// Delay between a track becoming available and its recorder starting.
    /// Recorders started against a stream that is not active yet fail.
    pub recorder_start_delay: Duration,
    /// Upper bound on waiting for channel readiness before `leader-joined`
    /// is sent regardless.
    pub leader_announce_timeout: Duration,
}

impl ClientConfig {
    pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(8000);
    pub const DEFAULT_RECORDER_START_DELAY: Duration = Duration::from_millis(512);
    pub const DEFAULT_LEADER_ANNOUNCE_TIMEOUT: Duration = Duration::from_millis(2400);

    /// Derive both endpoints from a relay `host:port`.
    pub fn for_relay(authority: &str, secure: bool) -> Self {
        let (ws, http) = if secure { ("wss", "https") } else { ("ws", "http") };
        Self {
            signaling_url: format!("{ws}://{authority}/ws"),
            upload_base_url: format!("{http}://{authority}"),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: "wss://127.0.0.1:8080/ws".to_owned(),
            upload_base_url: "https://127.0.0.1:8080".to_owned(),
            leader: false,
            peer_mode: PeerMode::Single,
            renegotiation: RenegotiationPolicy::Reuse,
            flush_interval: Self::DEFAULT_FLUSH_INTERVAL,
            recorder_start_delay: Self::DEFAULT_RECORDER_START_DELAY,
            leader_announce_timeout: Self::DEFAULT_LEADER_ANNOUNCE_TIMEOUT,
        }
    }
}

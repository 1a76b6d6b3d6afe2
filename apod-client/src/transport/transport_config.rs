/// ICE configuration of the WebRTC transport.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub ice_servers: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                "stun:stun.stunprotocol.org:3478".to_owned(),
                "stun:stun.l.google.com:19302".to_owned(),
            ],
        }
    }
}

impl TransportConfig {
    /// Host candidates only. Used on a LAN and in tests.
    pub fn local_only() -> Self {
        Self {
            ice_servers: vec![],
        }
    }
}

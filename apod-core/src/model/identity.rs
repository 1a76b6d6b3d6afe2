use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Per-process token stamped on every outbound negotiation envelope.
///
/// Peers may use any string format, so received identities are kept verbatim
/// rather than parsed as UUIDs.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientIdentity {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ClientIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

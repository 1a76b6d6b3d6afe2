use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Pranswer,
    Answer,
    Rollback,
}

/// Negotiated media parameters. Only `type` is interpreted here; every other
/// field is carried through to the media transport untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl SessionDescription {
    pub fn new(kind: SdpKind, sdp: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("sdp".to_owned(), Value::String(sdp.into()));
        Self { kind, body }
    }

    pub fn sdp(&self) -> Option<&str> {
        self.body.get("sdp").and_then(Value::as_str)
    }
}

/// Opaque network-reachability descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IceCandidate(pub Map<String, Value>);

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("candidate".to_owned(), Value::String(candidate.into()));
        Self(fields)
    }

    pub fn candidate(&self) -> Option<&str> {
        self.0.get("candidate").and_then(Value::as_str)
    }
}

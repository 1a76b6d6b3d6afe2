use crate::model::description::{IceCandidate, SessionDescription};
use crate::model::identity::ClientIdentity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("envelope carries none of `event`, `sdp` or `ice`")]
    Empty,
    #[error("event `{event}` is missing field `{field}`")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },
}

/// Side-channel notifications that travel next to negotiation messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEvent {
    LeaderJoined,
    PickSaveDir,
    LanIp { ip: String },
    SetSaveDir { save_dir: String },
    Other(String),
}

impl SideEvent {
    pub fn name(&self) -> &str {
        match self {
            SideEvent::LeaderJoined => "leader-joined",
            SideEvent::PickSaveDir => "pick-savedir",
            SideEvent::LanIp { .. } => "lan-ip",
            SideEvent::SetSaveDir { .. } => "set-save-dir",
            SideEvent::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalPayload {
    Description(SessionDescription),
    Candidate(IceCandidate),
    Event(SideEvent),
}

/// One JSON message on the relay.
///
/// `sender` is the `uuid` field. Negotiation envelopes always carry it,
/// side-channel events usually don't.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub struct SignalEnvelope {
    pub sender: Option<ClientIdentity>,
    pub payload: SignalPayload,
}

impl SignalEnvelope {
    pub fn description(sender: ClientIdentity, sdp: SessionDescription) -> Self {
        Self {
            sender: Some(sender),
            payload: SignalPayload::Description(sdp),
        }
    }

    pub fn candidate(sender: ClientIdentity, ice: IceCandidate) -> Self {
        Self {
            sender: Some(sender),
            payload: SignalPayload::Candidate(ice),
        }
    }

    pub fn event(event: SideEvent) -> Self {
        Self {
            sender: None,
            payload: SignalPayload::Event(event),
        }
    }

    pub fn is_from(&self, identity: &ClientIdentity) -> bool {
        self.sender.as_ref() == Some(identity)
    }

    pub fn side_event(&self) -> Option<&SideEvent> {
        match &self.payload {
            SignalPayload::Event(event) => Some(event),
            _ => None,
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
struct WireEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
    #[serde(default, rename = "save-dir", skip_serializing_if = "Option::is_none")]
    save_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sdp: Option<SessionDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ice: Option<IceCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uuid: Option<ClientIdentity>,
}

impl TryFrom<WireEnvelope> for SignalEnvelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        let payload = if let Some(event) = wire.event {
            let event = match event.as_str() {
                "leader-joined" => SideEvent::LeaderJoined,
                "pick-savedir" => SideEvent::PickSaveDir,
                "lan-ip" => SideEvent::LanIp {
                    ip: wire.ip.ok_or(EnvelopeError::MissingField {
                        event: "lan-ip",
                        field: "ip",
                    })?,
                },
                "set-save-dir" => SideEvent::SetSaveDir {
                    save_dir: wire.save_dir.ok_or(EnvelopeError::MissingField {
                        event: "set-save-dir",
                        field: "save-dir",
                    })?,
                },
                _ => SideEvent::Other(event),
            };
            SignalPayload::Event(event)
        } else if let Some(sdp) = wire.sdp {
            SignalPayload::Description(sdp)
        } else if let Some(ice) = wire.ice {
            SignalPayload::Candidate(ice)
        } else {
            return Err(EnvelopeError::Empty);
        };

        Ok(Self {
            sender: wire.uuid,
            payload,
        })
    }
}

impl From<SignalEnvelope> for WireEnvelope {
    fn from(envelope: SignalEnvelope) -> Self {
        let mut wire = WireEnvelope {
            uuid: envelope.sender,
            ..Default::default()
        };
        match envelope.payload {
            SignalPayload::Description(sdp) => wire.sdp = Some(sdp),
            SignalPayload::Candidate(ice) => wire.ice = Some(ice),
            SignalPayload::Event(event) => {
                wire.event = Some(event.name().to_owned());
                match event {
                    SideEvent::LanIp { ip } => wire.ip = Some(ip),
                    SideEvent::SetSaveDir { save_dir } => wire.save_dir = Some(save_dir),
                    _ => {}
                }
            }
        }
        wire
    }
}

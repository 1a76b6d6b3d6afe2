use crate::transport::{MediaSession, MediaTransport, RemoteTrack, TransportConfig, TransportEvent};
use anyhow::{Context, Result, bail};
use apod_core::{IceCandidate, SdpKind, SessionDescription, SessionId};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// [`MediaTransport`] backed by webrtc-rs peer connections.
///
/// Local capture is attached through [`WebRtcTransport::with_local_track`];
/// without local tracks, offers ask for receive-only audio and video.
#[derive(Clone)]
pub struct WebRtcTransport {
    config: TransportConfig,
    local_tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl WebRtcTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            local_tracks: Vec::new(),
        }
    }

    pub fn with_local_track(mut self, track: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        self.local_tracks.push(track);
        self
    }
}

#[async_trait]
impl MediaTransport for WebRtcTransport {
    async fn open_session(
        &self,
        id: SessionId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn MediaSession>> {
        let session = WebRtcSession::new(id, &self.config, events).await?;

        for track in &self.local_tracks {
            session
                .peer_connection
                .add_track(track.clone())
                .await
                .context("Failed to attach local track")?;
        }

        Ok(Box::new(session))
    }
}

pub struct WebRtcSession {
    pub id: SessionId,
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcSession {
    pub async fn new(
        id: SessionId,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if config.ice_servers.is_empty() {
            vec![]
        } else {
            vec![RTCIceServer {
                urls: config.ice_servers.clone(),
                ..Default::default()
            }]
        };
        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed for session {}: {:?}", id, s);
                    if is_terminal(s) {
                        let _ = tx.send(TransportEvent::Disconnected(id)).await;
                    }
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let candidate = match c {
                    Some(candidate) => match candidate_to_core(&candidate) {
                        Ok(candidate) => Some(candidate),
                        Err(e) => {
                            debug!("Skipping unserializable candidate: {:?}", e);
                            return;
                        }
                    },
                    None => None,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(id, candidate))
                    .await;
            })
        }));

        let track_tx = event_tx;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();

                Box::pin(async move {
                    info!("Remote {:?} track arrived on session {}", track.kind(), id);
                    let _ = tx
                        .send(TransportEvent::TrackArrived(id, RemoteTrack(track)))
                        .await;
                })
            },
        ));

        Ok(Self {
            id,
            peer_connection,
        })
    }

    async fn ensure_media_sections(&self) -> Result<()> {
        if !self.peer_connection.get_transceivers().await.is_empty() {
            return Ok(());
        }

        for kind in [RTPCodecType::Video, RTPCodecType::Audio] {
            self.peer_connection
                .add_transceiver_from_kind(
                    kind,
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await
                .context("Failed to add receive-only transceiver")?;
        }
        Ok(())
    }
}

#[async_trait]
impl MediaSession for WebRtcSession {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.ensure_media_sections().await?;
        let offer = self.peer_connection.create_offer(None).await?;
        description_to_core(&offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        description_to_core(&answer)
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let desc = description_to_rtc(&description)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = description_to_rtc(&description)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        let desc = self.peer_connection.local_description().await?;
        description_to_core(&desc).ok()
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init: RTCIceCandidateInit = serde_json::from_value(Value::Object(candidate.0))
            .context("Failed to parse ICE candidate JSON")?;
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn description_to_rtc(description: &SessionDescription) -> Result<RTCSessionDescription> {
    let sdp = description
        .sdp()
        .context("Session description has no `sdp` field")?
        .to_owned();

    let desc = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(sdp)?,
        SdpKind::Pranswer => RTCSessionDescription::pranswer(sdp)?,
        SdpKind::Rollback => bail!("Rollback descriptions are not supported"),
    };
    Ok(desc)
}

fn description_to_core(desc: &RTCSessionDescription) -> Result<SessionDescription> {
    let kind = match desc.sdp_type {
        RTCSdpType::Offer => SdpKind::Offer,
        RTCSdpType::Answer => SdpKind::Answer,
        RTCSdpType::Pranswer => SdpKind::Pranswer,
        RTCSdpType::Rollback => SdpKind::Rollback,
        other => bail!("Unexpected SDP type {:?}", other),
    };
    Ok(SessionDescription::new(kind, desc.sdp.clone()))
}

fn candidate_to_core(candidate: &RTCIceCandidate) -> Result<IceCandidate> {
    let init = candidate.to_json()?;
    match serde_json::to_value(init)? {
        Value::Object(fields) => Ok(IceCandidate(fields)),
        other => bail!("Candidate serialized to non-object {}", other),
    }
}

/// `Disconnected` may still recover to `Connected`; only these end a session.
fn is_terminal(state: RTCPeerConnectionState) -> bool {
    matches!(
        state,
        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed
    )
}

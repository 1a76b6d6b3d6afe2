use apod_client::{MediaTransport, TransportConfig, TransportEvent, WebRtcTransport};
use apod_core::{SdpKind, SessionId};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::integration::init_tracing;

/// Wait for the end-of-candidates marker, collecting what came before it.
async fn gather(rx: &mut mpsc::Receiver<TransportEvent>) -> Vec<apod_core::IceCandidate> {
    let mut candidates = Vec::new();
    let wait = async {
        while let Some(event) = rx.recv().await {
            if let TransportEvent::CandidateGenerated(_, candidate) = event {
                match candidate {
                    Some(c) => candidates.push(c),
                    None => return true,
                }
            }
        }
        false
    };
    let finished = tokio::time::timeout(Duration::from_secs(10), wait)
        .await
        .unwrap_or(false);
    assert!(finished, "ICE gathering did not finish");
    candidates
}

#[tokio::test]
async fn test_offer_answer_between_two_sessions() {
    init_tracing();
    let transport = WebRtcTransport::new(TransportConfig::local_only());

    let (a_tx, mut a_rx) = mpsc::channel(64);
    let (b_tx, mut b_rx) = mpsc::channel(64);
    let a = transport.open_session(SessionId(1), a_tx).await.unwrap();
    let b = transport.open_session(SessionId(2), b_tx).await.unwrap();

    let offer = a.create_offer().await.unwrap();
    assert_eq!(offer.kind, SdpKind::Offer);
    assert!(offer.sdp().is_some_and(|sdp| sdp.contains("m=video")));
    a.set_local_description(offer.clone()).await.unwrap();

    b.set_remote_description(offer).await.unwrap();
    let answer = b.create_answer().await.unwrap();
    assert_eq!(answer.kind, SdpKind::Answer);
    b.set_local_description(answer.clone()).await.unwrap();
    a.set_remote_description(answer).await.unwrap();

    let a_local = a.local_description().await.expect("offer applied");
    assert_eq!(a_local.kind, SdpKind::Offer);

    let a_candidates = gather(&mut a_rx).await;
    let b_candidates = gather(&mut b_rx).await;
    for candidate in a_candidates {
        assert!(candidate.candidate().is_some());
        b.add_ice_candidate(candidate).await.unwrap();
    }
    for candidate in b_candidates {
        a.add_ice_candidate(candidate).await.unwrap();
    }

    a.close().await.unwrap();
    b.close().await.unwrap();
}

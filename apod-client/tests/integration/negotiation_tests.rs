use apod_client::{
    MediaSession, MediaTransport, NegotiationError, NegotiationState, Negotiator, Role,
    forward_local_candidate,
};
use apod_core::{ClientIdentity, IceCandidate, SdpKind, SessionDescription, SessionId};
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::{MediaCall, MockSessionHandle, MockSignaling, MockTransport};

async fn open_session() -> (Box<dyn MediaSession>, MockSessionHandle) {
    let transport = MockTransport::new();
    let (events, _rx) = mpsc::channel(16);
    let media = transport
        .open_session(SessionId(1), events)
        .await
        .expect("mock transport never fails");
    let handle = transport.sessions().remove(0);
    (media, handle)
}

fn me() -> ClientIdentity {
    ClientIdentity::from("me")
}

#[tokio::test]
async fn test_responder_answers_offer_exactly_once() {
    init_tracing();
    let (media, handle) = open_session().await;
    let (signaling, _out) = MockSignaling::new();
    let mut negotiator = Negotiator::new(Role::Responder);

    let state = negotiator
        .on_remote_description(
            SessionDescription::new(SdpKind::Offer, "remote-offer"),
            media.as_ref(),
            &signaling,
            &me(),
        )
        .await
        .unwrap();

    assert_eq!(state, NegotiationState::Connected);
    assert!(negotiator.has_local_description());
    assert_eq!(signaling.descriptions(SdpKind::Answer), 1);
    assert_eq!(signaling.descriptions(SdpKind::Offer), 0);
    assert_eq!(
        handle.calls(),
        vec![
            MediaCall::SetRemote(SdpKind::Offer),
            MediaCall::CreateAnswer,
            MediaCall::SetLocal(SdpKind::Answer),
        ]
    );

    let second = negotiator
        .on_remote_description(
            SessionDescription::new(SdpKind::Offer, "again"),
            media.as_ref(),
            &signaling,
            &me(),
        )
        .await;
    assert!(matches!(
        second,
        Err(NegotiationError::LocalDescriptionAlreadySet { .. })
    ));
    assert_eq!(signaling.descriptions(SdpKind::Answer), 1);
}

#[tokio::test]
async fn test_initiator_offers_once_and_rejects_early_answer() {
    init_tracing();
    let (media, handle) = open_session().await;
    let (signaling, _out) = MockSignaling::new();
    let mut negotiator = Negotiator::new(Role::Initiator);

    let early = negotiator
        .on_remote_description(
            SessionDescription::new(SdpKind::Answer, "too-early"),
            media.as_ref(),
            &signaling,
            &me(),
        )
        .await;
    assert!(matches!(
        early,
        Err(NegotiationError::UnexpectedAnswer {
            state: NegotiationState::New
        })
    ));
    assert!(handle.calls().is_empty());

    let state = negotiator
        .initiate(media.as_ref(), &signaling, &me())
        .await
        .unwrap();
    assert_eq!(state, NegotiationState::OfferSent);

    let again = negotiator.initiate(media.as_ref(), &signaling, &me()).await;
    assert!(matches!(again, Err(NegotiationError::CannotInitiate { .. })));
    assert_eq!(signaling.descriptions(SdpKind::Offer), 1);

    let state = negotiator
        .on_remote_description(
            SessionDescription::new(SdpKind::Answer, "remote-answer"),
            media.as_ref(),
            &signaling,
            &me(),
        )
        .await
        .unwrap();
    assert_eq!(state, NegotiationState::Connected);
    assert_eq!(signaling.sent().len(), 1);
}

#[tokio::test]
async fn test_responder_cannot_initiate() {
    let (media, _handle) = open_session().await;
    let (signaling, _out) = MockSignaling::new();
    let mut negotiator = Negotiator::new(Role::Responder);

    let result = negotiator.initiate(media.as_ref(), &signaling, &me()).await;
    assert!(matches!(result, Err(NegotiationError::CannotInitiate { .. })));
    assert!(signaling.sent().is_empty());
}

#[tokio::test]
async fn test_candidates_never_change_state() {
    let (media, handle) = open_session().await;
    let (signaling, _out) = MockSignaling::new();
    let negotiator = Negotiator::new(Role::Responder);

    negotiator
        .on_remote_candidate(IceCandidate::new("candidate:1"), media.as_ref())
        .await
        .unwrap();
    assert_eq!(negotiator.state(), NegotiationState::New);
    assert_eq!(
        handle.calls(),
        vec![MediaCall::AddCandidate(IceCandidate::new("candidate:1"))]
    );

    let sent = forward_local_candidate(Some(IceCandidate::new("candidate:2")), &signaling, &me())
        .await
        .unwrap();
    assert!(sent);
    let sent = forward_local_candidate(None, &signaling, &me()).await.unwrap();
    assert!(!sent);
    assert_eq!(signaling.candidates(), 1);
    assert_eq!(signaling.sent()[0].sender, Some(me()));
}

#[tokio::test]
async fn test_unsupported_description_is_rejected() {
    let (media, _handle) = open_session().await;
    let (signaling, _out) = MockSignaling::new();
    let mut negotiator = Negotiator::new(Role::Responder);

    let result = negotiator
        .on_remote_description(
            SessionDescription::new(SdpKind::Rollback, ""),
            media.as_ref(),
            &signaling,
            &me(),
        )
        .await;
    assert!(matches!(
        result,
        Err(NegotiationError::UnsupportedDescription(SdpKind::Rollback))
    ));
    assert_eq!(negotiator.state(), NegotiationState::New);
}

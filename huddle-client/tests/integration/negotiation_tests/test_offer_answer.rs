use huddle_client::{CallError, GlarePolicy, NegotiationState};
use huddle_core::{InboundSignal, SdpType};

use crate::integration::{create_test_peer, create_test_peer_with, init_tracing};
use crate::utils::{MOCK_STREAM_ID, MockCapture, PeerCall, answer_json, offer_json, pid};

#[tokio::test]
async fn test_start_call_sends_single_offer() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-42"), GlarePolicy::default());
    let remote = pid("p-99");

    peer.orchestrator.start_call_with(&remote).await.unwrap();

    assert_eq!(
        peer.orchestrator.session_state(&remote),
        Some(NegotiationState::HaveLocalOffer)
    );
    assert_eq!(peer.signaling.offers_for(&remote).await.len(), 1);

    let conn = peer.factory.latest_for(&remote).unwrap();
    assert_eq!(
        conn.calls(),
        vec![
            PeerCall::AddLocalStream(MOCK_STREAM_ID.to_owned()),
            PeerCall::CreateOffer,
            PeerCall::SetLocal(SdpType::Offer),
        ]
    );

    // A second call while the offer is out does not produce another one.
    peer.orchestrator.start_call_with(&remote).await.unwrap();
    assert_eq!(peer.signaling.offers_for(&remote).await.len(), 1);
}

#[tokio::test]
async fn test_answer_completes_negotiation_silently() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-42"), GlarePolicy::default());
    let remote = pid("p-99");

    peer.orchestrator.start_call_with(&remote).await.unwrap();
    let sent_before = peer.signaling.sent().await.len();

    peer.orchestrator
        .handle_signal(InboundSignal::ReceiveAnswer {
            from: remote.clone(),
            sdp: answer_json("remote"),
        })
        .await;

    assert_eq!(
        peer.orchestrator.session_state(&remote),
        Some(NegotiationState::Stable)
    );
    assert_eq!(peer.signaling.sent().await.len(), sent_before);

    let session = peer.orchestrator.session(&remote).unwrap();
    assert!(session.local_description().is_some());
    assert!(session.remote_description().is_some());
}

#[tokio::test]
async fn test_offer_from_unknown_peer_is_answered() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-42"), GlarePolicy::default());
    let remote = pid("p-7");

    peer.orchestrator
        .handle_signal(InboundSignal::ReceiveOffer {
            from: remote.clone(),
            sdp: offer_json("remote"),
        })
        .await;

    assert_eq!(
        peer.orchestrator.session_state(&remote),
        Some(NegotiationState::Stable)
    );
    assert_eq!(peer.signaling.answers_for(&remote).await.len(), 1);
    assert!(peer.signaling.offers_for(&remote).await.is_empty());

    let conn = peer.factory.latest_for(&remote).unwrap();
    assert_eq!(
        conn.calls(),
        vec![
            PeerCall::SetRemote(SdpType::Offer),
            PeerCall::CreateAnswer,
            PeerCall::SetLocal(SdpType::Answer),
        ]
    );
}

#[tokio::test]
async fn test_bare_sdp_offer_is_accepted() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-42"), GlarePolicy::default());
    let remote = pid("p-7");

    peer.orchestrator
        .handle_signal(InboundSignal::ReceiveOffer {
            from: remote.clone(),
            sdp: crate::utils::sdp("bare"),
        })
        .await;

    assert_eq!(
        peer.orchestrator.session_state(&remote),
        Some(NegotiationState::Stable)
    );
}

#[tokio::test]
async fn test_unsolicited_answer_is_dropped() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-42"), GlarePolicy::default());
    let remote = pid("p-7");

    peer.orchestrator
        .handle_signal(InboundSignal::ReceiveAnswer {
            from: remote.clone(),
            sdp: answer_json("remote"),
        })
        .await;

    assert_eq!(
        peer.orchestrator.session_state(&remote),
        Some(NegotiationState::Idle)
    );
    assert!(peer.signaling.sent().await.is_empty());
}

#[tokio::test]
async fn test_malformed_payload_keeps_session() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-42"), GlarePolicy::default());
    let remote = pid("p-99");

    peer.orchestrator.start_call_with(&remote).await.unwrap();

    for garbage in ["", "not sdp at all", r#"{"type":"offer","sdp":"v=0"}"#] {
        peer.orchestrator
            .handle_signal(InboundSignal::ReceiveAnswer {
                from: remote.clone(),
                sdp: garbage.to_owned(),
            })
            .await;
        assert_eq!(
            peer.orchestrator.session_state(&remote),
            Some(NegotiationState::HaveLocalOffer)
        );
    }

    peer.orchestrator
        .handle_signal(InboundSignal::ReceiveAnswer {
            from: remote.clone(),
            sdp: answer_json("remote"),
        })
        .await;
    assert_eq!(
        peer.orchestrator.session_state(&remote),
        Some(NegotiationState::Stable)
    );
}

#[tokio::test]
async fn test_ensure_session_is_idempotent() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-42"), GlarePolicy::default());
    let remote = pid("p-5");

    let first = peer.orchestrator.ensure_session(&remote).await.unwrap();
    assert_eq!(first.state(), NegotiationState::Idle);
    let first_connection = first.connection_id();

    let second = peer.orchestrator.ensure_session(&remote).await.unwrap();
    assert_eq!(second.connection_id(), first_connection);

    assert_eq!(peer.orchestrator.session_count(), 1);
    assert_eq!(peer.factory.created_count(), 1);
}

#[tokio::test]
async fn test_media_is_attached_retroactively() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-42"), GlarePolicy::default());
    let remote = pid("p-5");

    peer.orchestrator.ensure_session(&remote).await.unwrap();
    assert!(!peer.orchestrator.session(&remote).unwrap().local_media_attached());

    peer.orchestrator.acquire_local_media().await.unwrap();
    assert!(peer.orchestrator.session(&remote).unwrap().local_media_attached());

    // Acquiring again neither re-captures nor re-attaches.
    peer.orchestrator.acquire_local_media().await.unwrap();
    assert_eq!(peer.capture.capture_count(), 1);
    let conn = peer.factory.latest_for(&remote).unwrap();
    assert_eq!(
        conn.calls(),
        vec![PeerCall::AddLocalStream(MOCK_STREAM_ID.to_owned())]
    );

    // Sessions created afterwards get the cached stream at creation.
    let late = pid("p-6");
    peer.orchestrator.ensure_session(&late).await.unwrap();
    assert!(peer.orchestrator.session(&late).unwrap().local_media_attached());
}

#[tokio::test]
async fn test_denied_media_fails_call_start() {
    init_tracing();
    let capture = MockCapture::denying();
    let mut peer = create_test_peer_with(Some("p-42"), GlarePolicy::default(), None, capture);
    let remote = pid("p-99");

    let err = peer.orchestrator.start_call_with(&remote).await.unwrap_err();
    assert!(matches!(err, CallError::MediaAccessDenied(_)));
    assert_eq!(peer.orchestrator.session_count(), 0);
    assert!(peer.signaling.sent().await.is_empty());

    // Not retried behind the caller's back; an explicit retry asks again.
    assert_eq!(peer.capture.capture_count(), 1);
    peer.capture.set_denied(false);
    peer.orchestrator.start_call_with(&remote).await.unwrap();
    assert_eq!(peer.capture.capture_count(), 2);
}

#[tokio::test]
async fn test_cannot_call_self() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-42"), GlarePolicy::default());

    let err = peer
        .orchestrator
        .start_call_with(&pid("p-42"))
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::SelfCall(_)));
    assert_eq!(peer.orchestrator.session_count(), 0);
}

#[tokio::test]
async fn test_late_media_renegotiates_stable_session() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-42"), GlarePolicy::default());
    let remote = pid("p-7");

    // Answered before any capture happened, so no tracks went out.
    peer.orchestrator
        .handle_signal(InboundSignal::ReceiveOffer {
            from: remote.clone(),
            sdp: offer_json("early"),
        })
        .await;
    assert_eq!(
        peer.orchestrator.session_state(&remote),
        Some(NegotiationState::Stable)
    );
    assert!(peer.signaling.offers_for(&remote).await.is_empty());

    peer.orchestrator.acquire_local_media().await.unwrap();

    assert_eq!(peer.signaling.offers_for(&remote).await.len(), 1);
    assert_eq!(
        peer.orchestrator.session_state(&remote),
        Some(NegotiationState::HaveLocalOffer)
    );
    let conn = peer.factory.latest_for(&remote).unwrap();
    assert_eq!(
        conn.calls(),
        vec![
            PeerCall::SetRemote(SdpType::Offer),
            PeerCall::CreateAnswer,
            PeerCall::SetLocal(SdpType::Answer),
            PeerCall::AddLocalStream(MOCK_STREAM_ID.to_owned()),
            PeerCall::CreateOffer,
            PeerCall::SetLocal(SdpType::Offer),
        ]
    );

    peer.orchestrator
        .handle_signal(InboundSignal::ReceiveAnswer {
            from: remote.clone(),
            sdp: answer_json("late"),
        })
        .await;
    assert_eq!(
        peer.orchestrator.session_state(&remote),
        Some(NegotiationState::Stable)
    );
}

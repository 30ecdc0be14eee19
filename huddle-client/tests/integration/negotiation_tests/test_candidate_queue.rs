use huddle_client::{GlarePolicy, NegotiationState};
use huddle_core::{IceCandidate, InboundSignal, ParticipantId, SdpType};

use crate::integration::{TestPeer, create_test_peer, init_tracing};
use crate::utils::{
    PeerCall, answer_json, candidate_json, candidate_line, offer_json, pid,
};

async fn send_candidate(peer: &mut TestPeer, from: &ParticipantId, payload: String) {
    peer.orchestrator
        .handle_signal(InboundSignal::ReceiveIceCandidate {
            from: from.clone(),
            candidate: payload,
        })
        .await;
}

#[tokio::test]
async fn test_early_candidates_drain_in_order_after_offer() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-1"), GlarePolicy::default());
    let remote = pid("p-2");

    for n in 1..=3 {
        send_candidate(&mut peer, &remote, candidate_json(n)).await;
    }

    let session = peer.orchestrator.session(&remote).unwrap();
    assert_eq!(session.state(), NegotiationState::Idle);
    assert_eq!(session.pending_candidates(), 3);

    let conn = peer.factory.latest_for(&remote).unwrap();
    assert!(conn.applied_candidates().is_empty());

    peer.orchestrator
        .handle_signal(InboundSignal::ReceiveOffer {
            from: remote.clone(),
            sdp: offer_json("remote"),
        })
        .await;

    assert_eq!(peer.orchestrator.session(&remote).unwrap().pending_candidates(), 0);
    assert_eq!(
        conn.calls(),
        vec![
            PeerCall::SetRemote(SdpType::Offer),
            PeerCall::AddCandidate(candidate_line(1)),
            PeerCall::AddCandidate(candidate_line(2)),
            PeerCall::AddCandidate(candidate_line(3)),
            PeerCall::CreateAnswer,
            PeerCall::SetLocal(SdpType::Answer),
        ]
    );
}

#[tokio::test]
async fn test_candidates_wait_for_answer_while_offering() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-1"), GlarePolicy::default());
    let remote = pid("p-2");

    peer.orchestrator.start_call_with(&remote).await.unwrap();
    send_candidate(&mut peer, &remote, candidate_json(1)).await;
    send_candidate(&mut peer, &remote, candidate_line(2)).await;

    let conn = peer.factory.latest_for(&remote).unwrap();
    assert!(conn.applied_candidates().is_empty());
    assert_eq!(peer.orchestrator.session(&remote).unwrap().pending_candidates(), 2);

    peer.orchestrator
        .handle_signal(InboundSignal::ReceiveAnswer {
            from: remote.clone(),
            sdp: answer_json("remote"),
        })
        .await;

    assert_eq!(
        conn.applied_candidates(),
        vec![candidate_line(1), candidate_line(2)]
    );

    // Once a remote description exists candidates apply immediately.
    send_candidate(&mut peer, &remote, candidate_json(3)).await;
    assert_eq!(
        conn.applied_candidates(),
        vec![candidate_line(1), candidate_line(2), candidate_line(3)]
    );
    assert_eq!(peer.orchestrator.session(&remote).unwrap().pending_candidates(), 0);
}

#[tokio::test]
async fn test_malformed_candidate_is_dropped_alone() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-1"), GlarePolicy::default());
    let remote = pid("p-2");

    send_candidate(&mut peer, &remote, candidate_json(1)).await;
    send_candidate(&mut peer, &remote, "{not json".to_owned()).await;
    send_candidate(&mut peer, &remote, "hello".to_owned()).await;
    send_candidate(&mut peer, &remote, candidate_json(2)).await;

    assert_eq!(peer.orchestrator.session(&remote).unwrap().pending_candidates(), 2);
}

#[tokio::test]
async fn test_local_candidates_are_signaled_to_peer() {
    init_tracing();
    let mut peer = create_test_peer(Some("p-1"), GlarePolicy::default());
    let remote = pid("p-2");

    peer.orchestrator.start_call_with(&remote).await.unwrap();
    let conn = peer.factory.latest_for(&remote).unwrap();

    conn.events()
        .candidate_generated(IceCandidate::new(candidate_line(9)).with_mid("0", 0))
        .await;
    assert_eq!(peer.pump_transport().await, 1);

    let sent = peer.signaling.candidates_for(&remote).await;
    assert_eq!(sent.len(), 1);
    let candidate = IceCandidate::parse(&sent[0]).unwrap();
    assert_eq!(candidate.candidate, candidate_line(9));
    assert_eq!(candidate.sdp_mid.as_deref(), Some("0"));
}

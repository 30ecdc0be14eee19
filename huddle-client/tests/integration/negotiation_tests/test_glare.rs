use huddle_client::{GlarePolicy, NegotiationState};
use huddle_core::{IceCandidate, OutboundSignal, ParticipantId};

use crate::integration::{TestPeer, create_test_peer, init_tracing};
use crate::utils::{candidate_line, pid, relay};

async fn apply(from_id: &ParticipantId, signals: &[OutboundSignal], to: &mut TestPeer) {
    for signal in signals {
        if let Some(inbound) = relay(from_id, signal) {
            to.orchestrator.handle_signal(inbound).await;
        }
    }
}

/// Deliver everything `from` has sent so far to `to`.
async fn deliver(from: &TestPeer, to: &mut TestPeer) -> Vec<OutboundSignal> {
    let from_id = from.orchestrator.local_id().cloned().unwrap();
    let sent = from.signaling.take_sent().await;
    apply(&from_id, &sent, to).await;
    sent
}

/// Both peers' pending offers cross on the wire.
async fn cross(a: &mut TestPeer, b: &mut TestPeer) -> (Vec<OutboundSignal>, Vec<OutboundSignal>) {
    let from_a = a.signaling.take_sent().await;
    let from_b = b.signaling.take_sent().await;
    apply(&pid("a1"), &from_a, b).await;
    apply(&pid("b2"), &from_b, a).await;
    (from_a, from_b)
}

fn count(signals: &[OutboundSignal], name: &str) -> usize {
    signals.iter().filter(|s| s.name() == name).count()
}

#[tokio::test]
async fn test_concurrent_calls_converge_with_one_offer() {
    init_tracing();
    let mut a = create_test_peer(Some("a1"), GlarePolicy::LowerIdKeepsOffer);
    let mut b = create_test_peer(Some("b2"), GlarePolicy::LowerIdKeepsOffer);

    a.orchestrator.start_call_with(&pid("b2")).await.unwrap();
    b.orchestrator.start_call_with(&pid("a1")).await.unwrap();

    let (from_a, from_b) = cross(&mut a, &mut b).await;
    assert_eq!(count(&from_a, "SendOffer"), 1);
    assert_eq!(count(&from_b, "SendOffer"), 1);

    // a1 keeps its offer and ignored b2's.
    assert_eq!(
        a.orchestrator.session_state(&pid("b2")),
        Some(NegotiationState::HaveLocalOffer)
    );
    assert_eq!(a.factory.connections_for(&pid("b2")).len(), 1);

    // b2 rolled back onto a fresh connection and answered.
    assert_eq!(
        b.orchestrator.session_state(&pid("a1")),
        Some(NegotiationState::Stable)
    );
    let b_connections = b.factory.connections_for(&pid("a1"));
    assert_eq!(b_connections.len(), 2);
    assert_eq!(b_connections[0].close_count(), 1);
    assert!(!b_connections[1].is_closed());

    // b2's answer reaches a1.
    let from_b = deliver(&b, &mut a).await;
    assert_eq!(count(&from_b, "SendAnswer"), 1);
    assert_eq!(count(&from_b, "SendOffer"), 0);
    assert_eq!(
        a.orchestrator.session_state(&pid("b2")),
        Some(NegotiationState::Stable)
    );

    // Nothing left to exchange.
    assert!(a.signaling.sent().await.is_empty());
    assert!(b.signaling.sent().await.is_empty());
}

#[tokio::test]
async fn test_higher_id_policy_mirrors_outcome() {
    init_tracing();
    let mut a = create_test_peer(Some("a1"), GlarePolicy::HigherIdKeepsOffer);
    let mut b = create_test_peer(Some("b2"), GlarePolicy::HigherIdKeepsOffer);

    a.orchestrator.start_call_with(&pid("b2")).await.unwrap();
    b.orchestrator.start_call_with(&pid("a1")).await.unwrap();

    cross(&mut a, &mut b).await;

    assert_eq!(
        b.orchestrator.session_state(&pid("a1")),
        Some(NegotiationState::HaveLocalOffer)
    );
    assert_eq!(
        a.orchestrator.session_state(&pid("b2")),
        Some(NegotiationState::Stable)
    );

    let from_a = deliver(&a, &mut b).await;
    assert_eq!(count(&from_a, "SendAnswer"), 1);
    assert_eq!(
        b.orchestrator.session_state(&pid("a1")),
        Some(NegotiationState::Stable)
    );
}

#[tokio::test]
async fn test_superseded_connection_events_are_ignored() {
    init_tracing();
    let mut a = create_test_peer(Some("a1"), GlarePolicy::LowerIdKeepsOffer);
    let mut b = create_test_peer(Some("b2"), GlarePolicy::LowerIdKeepsOffer);

    a.orchestrator.start_call_with(&pid("b2")).await.unwrap();
    b.orchestrator.start_call_with(&pid("a1")).await.unwrap();
    deliver(&a, &mut b).await;
    b.signaling.take_sent().await;

    let connections = b.factory.connections_for(&pid("a1"));
    let (old, new) = (&connections[0], &connections[1]);
    assert!(old.connection_id < new.connection_id);

    old.events()
        .candidate_generated(IceCandidate::new(candidate_line(1)))
        .await;
    old.events().disconnected().await;
    b.pump_transport().await;

    assert!(b.signaling.candidates_for(&pid("a1")).await.is_empty());
    assert_eq!(
        b.orchestrator.session_state(&pid("a1")),
        Some(NegotiationState::Stable)
    );

    new.events()
        .candidate_generated(IceCandidate::new(candidate_line(2)))
        .await;
    b.pump_transport().await;
    assert_eq!(b.signaling.candidates_for(&pid("a1")).await.len(), 1);
}

#[tokio::test]
async fn test_candidates_from_losing_offer_are_not_applied() {
    init_tracing();
    let mut a = create_test_peer(Some("a1"), GlarePolicy::LowerIdKeepsOffer);
    let mut b = create_test_peer(Some("b2"), GlarePolicy::LowerIdKeepsOffer);

    a.orchestrator.start_call_with(&pid("b2")).await.unwrap();
    b.orchestrator.start_call_with(&pid("a1")).await.unwrap();

    // b2's first connection trickles a candidate right behind its offer.
    let doomed = b.factory.latest_for(&pid("a1")).unwrap();
    doomed
        .events()
        .candidate_generated(IceCandidate::new(candidate_line(7)))
        .await;
    b.pump_transport().await;

    let (_, from_b) = cross(&mut a, &mut b).await;
    assert_eq!(count(&from_b, "SendIceCandidate"), 1);
    let a_session = a.orchestrator.session(&pid("b2")).unwrap();
    assert_eq!(a_session.state(), NegotiationState::HaveLocalOffer);
    assert_eq!(a_session.pending_candidates(), 0);

    // The replacement connection trickles after answering.
    let survivor = b.factory.latest_for(&pid("a1")).unwrap();
    assert_ne!(survivor.connection_id, doomed.connection_id);
    survivor
        .events()
        .candidate_generated(IceCandidate::new(candidate_line(8)))
        .await;
    b.pump_transport().await;

    let from_b = deliver(&b, &mut a).await;
    assert_eq!(count(&from_b, "SendAnswer"), 1);
    assert_eq!(count(&from_b, "SendIceCandidate"), 1);

    assert_eq!(
        a.orchestrator.session_state(&pid("b2")),
        Some(NegotiationState::Stable)
    );
    let a_connection = a.factory.latest_for(&pid("b2")).unwrap();
    assert_eq!(a_connection.applied_candidates(), vec![candidate_line(8)]);
}

/// Where a peer's offer/answer exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Idle,
    HaveLocalOffer,
    HaveRemoteOffer,
    /// Both local and remote descriptions are set.
    Stable,
    Closed,
}

impl NegotiationState {
    /// Whether inbound candidates can be applied instead of queued.
    pub fn has_remote_description(self) -> bool {
        matches!(
            self,
            NegotiationState::HaveRemoteOffer | NegotiationState::Stable
        )
    }

    /// An offer is out and its counterpart has not arrived yet.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            NegotiationState::HaveLocalOffer | NegotiationState::HaveRemoteOffer
        )
    }

    pub fn is_closed(self) -> bool {
        self == NegotiationState::Closed
    }
}

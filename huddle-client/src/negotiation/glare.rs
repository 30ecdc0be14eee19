use huddle_core::ParticipantId;
use std::str::FromStr;

/// Tie-break applied when an offer arrives while our own offer is pending.
///
/// Both peers evaluate the same rule on the same pair of ids, so exactly
/// one of them keeps its offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlarePolicy {
    /// The lexicographically smaller id keeps its offer.
    #[default]
    LowerIdKeepsOffer,
    /// The lexicographically larger id keeps its offer.
    HigherIdKeepsOffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlareOutcome {
    /// Ignore the inbound offer and wait for the answer to ours.
    KeepLocalOffer,
    /// Discard our offer, roll back and answer theirs.
    YieldToRemote,
}

impl GlarePolicy {
    pub fn resolve(self, local: &ParticipantId, remote: &ParticipantId) -> GlareOutcome {
        let local_is_lower = local < remote;
        let keep = match self {
            GlarePolicy::LowerIdKeepsOffer => local_is_lower,
            GlarePolicy::HigherIdKeepsOffer => !local_is_lower && local != remote,
        };
        if keep {
            GlareOutcome::KeepLocalOffer
        } else {
            GlareOutcome::YieldToRemote
        }
    }
}

impl FromStr for GlarePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lower-id" => Ok(GlarePolicy::LowerIdKeepsOffer),
            "higher-id" => Ok(GlarePolicy::HigherIdKeepsOffer),
            other => Err(format!(
                "glare policy must be lower-id or higher-id, got {other}"
            )),
        }
    }
}

use huddle_core::ParticipantId;
use std::collections::BTreeSet;

/// Who is in the meeting, as far as the server has told us.
///
/// Servers that only broadcast a count leave `members` empty.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    count: u32,
    local_id: Option<ParticipantId>,
    members: BTreeSet<ParticipantId>,
}

/// Result of replacing the member list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterChange {
    pub added: Vec<ParticipantId>,
    pub removed: Vec<ParticipantId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn set_count(&mut self, count: u32) {
        self.count = count;
    }

    pub fn set_local_id(&mut self, local_id: ParticipantId) {
        self.members.remove(&local_id);
        self.local_id = Some(local_id);
    }

    /// Remote members in id order.
    pub fn members(&self) -> impl Iterator<Item = &ParticipantId> {
        self.members.iter()
    }

    pub fn contains(&self, peer_id: &ParticipantId) -> bool {
        self.members.contains(peer_id)
    }

    /// Replaces the member list with `ids`, which may include the local id.
    pub fn replace_members(&mut self, ids: Vec<ParticipantId>) -> RosterChange {
        let next: BTreeSet<ParticipantId> = ids
            .into_iter()
            .filter(|id| !id.is_empty() && Some(id) != self.local_id.as_ref())
            .collect();

        let change = RosterChange {
            added: next.difference(&self.members).cloned().collect(),
            removed: self.members.difference(&next).cloned().collect(),
        };

        let local = u32::from(self.local_id.is_some());
        self.count = u32::try_from(next.len()).unwrap_or(u32::MAX).saturating_add(local);
        self.members = next;
        change
    }

    pub fn remove(&mut self, peer_id: &ParticipantId) -> bool {
        let removed = self.members.remove(peer_id);
        if removed {
            self.count = self.count.saturating_sub(1);
        }
        removed
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::participant::Participant;

/// Identity of a room. Room names are descriptive only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(Uuid);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Ordered membership of a room, in join order, keyed by participant name
#[derive(Debug, Default)]
pub(crate) struct Members {
    entries: Vec<Participant>,
}

impl Members {
    /// Find the member holding `name`
    pub(crate) fn find(&self, name: &str) -> Option<&Participant> {
        self.entries.iter().find(|p| p.name() == name)
    }

    /// Check if this exact participant is a member
    pub(crate) fn has_participant(&self, participant: &Participant) -> bool {
        self.find(participant.name())
            .is_some_and(|p| p.id() == participant.id())
    }

    /// Append a participant; the caller checks name uniqueness first
    pub(crate) fn add_participant(&mut self, participant: Participant) {
        self.entries.push(participant);
    }

    /// Remove the first entry with this participant's name, provided it is the
    /// same participant. Returns whether anything was removed.
    pub(crate) fn remove_participant(&mut self, participant: &Participant) -> bool {
        let position = self
            .entries
            .iter()
            .position(|p| p.name() == participant.name());

        match position {
            Some(i) if self.entries[i].id() == participant.id() => {
                self.entries.remove(i);
                true
            }
            _ => false,
        }
    }

    /// Names in join order
    pub(crate) fn names(&self) -> Vec<String> {
        self.entries.iter().map(|p| p.name().to_string()).collect()
    }

    /// Handles in join order, for delivering outside the lock
    pub(crate) fn snapshot(&self) -> Vec<Participant> {
        self.entries.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_ids_are_unique() {
        assert_ne!(RoomId::new(), RoomId::new());
    }

    #[tokio::test]
    async fn test_members_keep_join_order() {
        let mut members = Members::default();
        for name in ["justin", "carl", "connor"] {
            members.add_participant(Participant::new(name));
        }

        assert_eq!(members.names(), vec!["justin", "carl", "connor"]);
        assert_eq!(members.len(), 3);
    }

    #[tokio::test]
    async fn test_remove_participant_by_name_and_identity() {
        let mut members = Members::default();
        let justin = Participant::new("justin");
        let carl = Participant::new("carl");
        let impostor = Participant::new("carl");
        members.add_participant(justin.clone());
        members.add_participant(carl.clone());

        assert!(members.has_participant(&carl));
        assert!(!members.has_participant(&impostor));

        // Same name, different participant: nothing removed
        assert!(!members.remove_participant(&impostor));
        assert_eq!(members.len(), 2);

        assert!(members.remove_participant(&carl));
        assert!(!members.remove_participant(&carl));
        assert_eq!(members.names(), vec!["justin"]);
    }
}

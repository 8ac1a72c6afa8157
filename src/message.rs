use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::room::RoomId;

/// A chat message as delivered to each member of a room.
///
/// Messages are plain values: one copy is built per recipient by the room's
/// broadcast and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Name of the sender, or the room's system sender for announcements
    pub from: String,
    /// Room the message was broadcast in
    pub room: RoomId,
    pub contents: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(from: &str, room: RoomId, contents: &str, sent_at: DateTime<Utc>) -> Self {
        Self {
            from: from.to_string(),
            room,
            contents: contents.to_string(),
            sent_at,
        }
    }

    /// Renders the message as `"<from> > <contents>"`
    pub fn display_string(&self) -> String {
        self.to_string()
    }

    /// Whether this message was authored by the given system sender
    pub fn is_announcement(&self, system_sender: &str) -> bool {
        self.from == system_sender
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} > {}", self.from, self.contents)
    }
}

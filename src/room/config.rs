use std::time::Duration;

/// Configuration for a room's announcements and fan-out
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Sender name used for join and leave announcements
    pub system_sender: String,
    /// Whether join and leave are announced to the room
    pub announce_membership: bool,
    /// How long a broadcast waits on one member's full blocking inbox before
    /// dropping the message for that member. `None` waits indefinitely.
    pub delivery_timeout: Option<Duration>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            system_sender: "admin".to_string(),
            announce_membership: true,
            delivery_timeout: None,
        }
    }
}

impl RoomConfig {
    pub fn with_system_sender(mut self, system_sender: impl Into<String>) -> Self {
        self.system_sender = system_sender.into();
        self
    }

    pub fn with_announcements(mut self, announce_membership: bool) -> Self {
        self.announce_membership = announce_membership;
        self
    }

    pub fn with_delivery_timeout(mut self, delivery_timeout: Duration) -> Self {
        self.delivery_timeout = Some(delivery_timeout);
        self
    }
}

#![allow(dead_code)] // Test utilities may not all be used in every test

use chatroom::{Participant, ParticipantConfig, Room, RoomConfig};

use super::recorder::Recorder;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct ChatSetup {
    pub room: Room,
    pub members: Vec<(Participant, Recorder)>,
}

impl ChatSetup {
    pub fn participant(&self, name: &str) -> &Participant {
        self.members
            .iter()
            .find(|(p, _)| p.name() == name)
            .map(|(p, _)| p)
            .unwrap_or_else(|| panic!("no participant named {}", name))
    }

    pub fn recorder(&mut self, name: &str) -> &mut Recorder {
        self.members
            .iter_mut()
            .find(|(p, _)| p.name() == name)
            .map(|(_, r)| r)
            .unwrap_or_else(|| panic!("no participant named {}", name))
    }

    /// Wait until everything sent so far has been handled, then forget it
    pub async fn settle(&mut self) {
        self.room.flush().await;
        for (_, recorder) in self.members.iter_mut() {
            recorder.drain();
        }
    }
}

pub struct ChatSetupBuilder {
    room_name: String,
    names: Vec<String>,
    room_config: RoomConfig,
    participant_config: ParticipantConfig,
}

impl ChatSetupBuilder {
    pub fn new() -> Self {
        Self {
            room_name: "test".to_string(),
            names: vec![],
            room_config: RoomConfig::default(),
            participant_config: ParticipantConfig::default(),
        }
    }

    pub fn with_members(mut self, names: Vec<&str>) -> Self {
        self.names = names.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_three_members(self) -> Self {
        self.with_members(vec!["justin", "carl", "connor"])
    }

    pub fn with_room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    pub fn with_participant_config(mut self, config: ParticipantConfig) -> Self {
        self.participant_config = config;
        self
    }

    /// Joins every member and discards the join announcements
    pub async fn build(self) -> ChatSetup {
        let room = Room::with_config(self.room_name, self.room_config);

        let mut members = Vec::new();
        for name in self.names {
            let participant = Participant::with_config(name, self.participant_config.clone());
            let recorder = Recorder::attach(&participant);
            participant.join(&room).await.unwrap();
            members.push((participant, recorder));
        }

        let mut setup = ChatSetup { room, members };
        setup.settle().await;
        setup
    }
}

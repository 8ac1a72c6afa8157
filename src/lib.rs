// Library crate for in-process chat rooms
// Participants join rooms and receive every broadcast through their own
// consumption task and replaceable reaction.

pub mod message;
pub mod participant;
pub mod room;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use message::Message;
pub use participant::{DeliveryPolicy, Overflow, Participant, ParticipantConfig};
pub use room::{BroadcastSummary, Room, RoomConfig, RoomId};
pub use shared::ChatError;

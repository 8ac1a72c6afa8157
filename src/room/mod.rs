// Public API - what other modules can use
pub use broadcast::BroadcastSummary;
pub use config::RoomConfig;
pub use models::RoomId;
pub use registry::Room;

pub(crate) use registry::WeakRoom;

// Internal modules
mod broadcast;
mod config;
mod models;
mod registry;

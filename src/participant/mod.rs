// Public API - what other modules can use
pub use inbox::{DeliveryPolicy, Overflow, ParticipantConfig};
pub use handle::Participant;

// Internal modules
pub(crate) mod inbox;
mod handle;
mod worker;

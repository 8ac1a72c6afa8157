pub mod gate;
pub mod recorder;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use gate::{gated, Gate};
#[allow(unused_imports)]
pub use recorder::Recorder;
#[allow(unused_imports)]
pub use setup::{ChatSetup, ChatSetupBuilder};

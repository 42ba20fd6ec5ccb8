//! App logic and orchestration.

pub mod actions;
pub mod audio_input;
pub mod core;
pub mod events;
pub mod loops;

pub use self::core::App;

//! Integration test common infrastructure.
//!
//! Provides a bot built over a capturing transport, a seeded entity cache
//! and an event sink that records every reported error.

pub mod bot;
pub mod events;

#[allow(unused_imports)]
pub use bot::{ALICE, BOB, CAROL, GENERAL, SERVER, TestBot, VOICE, recorder};
#[allow(unused_imports)]
pub use events::{RecordedError, RecordingEvents};

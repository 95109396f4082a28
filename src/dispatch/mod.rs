//! Turning messages into command invocations.

mod client;
mod context;

pub use client::{ClientBuilder, CommandsClient, DispatchOutcome};
pub use context::Context;

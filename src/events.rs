//! Process-wide dispatch events.
//!
//! Commands without their own error handler report failures here, as does
//! the client when no command matches.

use crate::dispatch::Context;
use crate::error::CommandError;
use async_trait::async_trait;
use tracing::{debug, warn};

#[async_trait]
pub trait EventSink: Send + Sync {
    /// An invocation failed and nothing else handled it.
    async fn command_error(&self, ctx: &Context, error: &CommandError);

    /// A handler returned successfully.
    async fn command_completion(&self, _ctx: &Context) {}
}

/// Logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEvents;

#[async_trait]
impl EventSink for LogEvents {
    async fn command_error(&self, ctx: &Context, error: &CommandError) {
        match error {
            CommandError::CommandNotFound(name) => {
                debug!(name = %name, author = %ctx.message.author.id, "no such command");
            }
            _ => warn!(
                command = %ctx.command.as_ref().map(|c| c.qualified_name()).unwrap_or_default(),
                author = %ctx.message.author.id,
                code = error.error_code(),
                error = %error,
                "command error"
            ),
        }
    }
}

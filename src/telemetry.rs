//! Telemetry utilities for command timing and tracing spans.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }

    /// Relabel once subcommand descent has settled on the final command.
    pub fn set_command(&mut self, command: &str) {
        if self.command != command {
            self.command = command.to_string();
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for one command invocation.
    pub fn command(name: &str, author: &str, channel: &str, invoked_with: &str) -> Span {
        if name == invoked_with {
            info_span!("command", name = %name, author = %author, channel = %channel)
        } else {
            info_span!("command", name = %name, alias = %invoked_with, author = %author, channel = %channel)
        }
    }

    /// Create a span for a cooldown prune pass.
    pub fn prune() -> Span {
        info_span!("cooldown_prune")
    }
}

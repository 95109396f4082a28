//! Event sink that keeps what it was told.

use async_trait::async_trait;
use parking_lot::Mutex;
use slirc_commands::{CommandError, Context, EventSink};
use std::time::Duration;

/// A snapshot of one reported error.
#[derive(Debug, Clone)]
pub struct RecordedError {
    pub command: Option<String>,
    pub invoked_with: String,
    pub code: &'static str,
    pub message: String,
    pub retry_after: Option<Duration>,
    pub parameter: Option<String>,
}

#[derive(Debug, Default)]
pub struct RecordingEvents {
    errors: Mutex<Vec<RecordedError>>,
    completions: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingEvents {
    pub fn errors(&self) -> Vec<RecordedError> {
        self.errors.lock().clone()
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.errors.lock().iter().map(|e| e.code).collect()
    }

    pub fn last_error(&self) -> Option<RecordedError> {
        self.errors.lock().last().cloned()
    }

    /// Qualified names of commands whose handlers returned Ok.
    pub fn completions(&self) -> Vec<String> {
        self.completions.lock().clone()
    }

    pub fn clear(&self) {
        self.errors.lock().clear();
        self.completions.lock().clear();
    }
}

#[async_trait]
impl EventSink for RecordingEvents {
    async fn command_error(&self, ctx: &Context, error: &CommandError) {
        self.errors.lock().push(RecordedError {
            command: ctx.command.as_ref().map(|c| c.qualified_name()),
            invoked_with: ctx.invoked_with.clone(),
            code: error.error_code(),
            message: error.to_string(),
            retry_after: error.retry_after(),
            parameter: error.parameter().map(str::to_string),
        });
    }

    async fn command_completion(&self, ctx: &Context) {
        if let Some(command) = &ctx.command {
            self.completions.lock().push(command.qualified_name());
        }
    }
}

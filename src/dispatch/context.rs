//! Per-invocation context and the invocation pipeline.

use super::CommandsClient;
use crate::command::Command;
use crate::error::{CommandError, HandlerResult};
use crate::help;
use crate::middleware::Outgoing;
use crate::model::{Channel, Member, Message, Server, User};
use crate::value::Value;
use slirc_view::Cursor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Everything known about one invocation. Single use.
pub struct Context {
    /// The resolved command; replaced while descending into subcommands.
    /// `None` when nothing matched.
    pub command: Option<Arc<Command>>,
    /// The name or alias as typed.
    pub invoked_with: String,
    pub prefix: String,
    pub message: Message,
    /// Cursor over the arguments, positioned after the command name.
    pub view: Box<dyn Cursor>,
    /// Positional values bound so far.
    pub args: Vec<Value>,
    /// Rest-of-input values, by parameter name.
    pub kwargs: HashMap<String, Value>,
    client: Arc<CommandsClient>,
}

impl Context {
    pub fn new(
        client: Arc<CommandsClient>,
        message: Message,
        prefix: impl Into<String>,
        invoked_with: impl Into<String>,
        command: Option<Arc<Command>>,
        view: Box<dyn Cursor>,
    ) -> Self {
        Self {
            command,
            invoked_with: invoked_with.into(),
            prefix: prefix.into(),
            message,
            view,
            args: Vec::new(),
            kwargs: HashMap::new(),
            client,
        }
    }

    pub fn client(&self) -> &Arc<CommandsClient> {
        &self.client
    }

    pub fn author(&self) -> &User {
        &self.message.author
    }

    pub fn channel_id(&self) -> &str {
        &self.message.channel_id
    }

    pub fn server_id(&self) -> Option<&str> {
        self.message.server_id.as_deref()
    }

    pub fn server(&self) -> Option<Arc<Server>> {
        self.client.state().get_server(self.server_id()?)
    }

    /// The author as a member of the current server.
    pub fn member(&self) -> Option<Member> {
        self.server()?.get_member(&self.message.author.id).cloned()
    }

    pub fn channel(&self) -> Option<Channel> {
        self.client.state().get_channel(&self.message.channel_id)
    }

    /// Reply in the invoking channel.
    pub async fn send(&self, content: impl Into<String>) -> Result<(), CommandError> {
        let message = Outgoing::new(self.message.channel_id.clone(), content);
        self.client.transport().send(message).await?;
        Ok(())
    }

    /// Reply with help for `command`, or the command overview.
    pub async fn send_help(&self, command: Option<&Command>) -> Result<(), CommandError> {
        let text = match command {
            Some(command) => help::render_command(command),
            None => help::render_overview(&self.client),
        };
        self.send(text).await
    }

    /// Whether every local check of `command` passes. Stops at the first
    /// failure.
    pub async fn can_run(&self, command: &Command) -> Result<bool, CommandError> {
        for check in command.checks() {
            if !check.check(self).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run the pipeline: subcommand descent, global check, local checks,
    /// cooldown, argument parsing, handler. Any failure goes to the resolved
    /// command's error handler, whose result is returned.
    ///
    /// Does nothing when no command was resolved.
    pub async fn invoke(&mut self) -> HandlerResult {
        let Some(mut command) = self.command.clone() else {
            return Ok(());
        };

        while command.is_group() {
            let Ok(word) = self.view.next_word() else {
                break;
            };
            match command.get_command(&word) {
                Some(sub) => {
                    debug!(group = %command.name(), subcommand = %sub.name(), "descending");
                    self.command = Some(Arc::clone(&sub));
                    command = sub;
                }
                None => {
                    self.view.undo();
                    break;
                }
            }
        }

        match self.prepare(&command).await {
            Ok(()) => command.invoke(self).await,
            Err(error) => command.dispatch_error(self, error).await,
        }
    }

    async fn prepare(&mut self, command: &Command) -> Result<(), CommandError> {
        if let Some(global) = self.client.global_check().cloned() {
            if !global.check(self).await? {
                return Err(CommandError::CheckFailure(
                    "the global check for the command failed".to_string(),
                ));
            }
        }
        if !self.can_run(command).await? {
            return Err(CommandError::CheckFailure(
                "the check(s) for the command failed".to_string(),
            ));
        }
        command.run_cooldown(self).await?;
        command.parse_arguments(self).await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("command", &self.command.as_ref().map(|c| c.qualified_name()))
            .field("invoked_with", &self.invoked_with)
            .field("prefix", &self.prefix)
            .field("message", &self.message.id)
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .finish_non_exhaustive()
    }
}

//! The commands client: registry, cogs and message dispatch.

use super::Context;
use crate::checks::Check;
use crate::cog::{Cog, same_cog};
use crate::command::{Command, SharedTable, attach};
use crate::config::{ClientConfig, Config, CooldownConfig};
use crate::converters::{BuiltinType, Converter, default_converters};
use crate::error::{CommandError, RegistrationError};
use crate::events::{EventSink, LogEvents};
use crate::help;
use crate::metrics;
use crate::middleware::Transport;
use crate::model::Message;
use crate::state::ClientState;
use crate::telemetry::{CommandTimer, spans};
use dashmap::DashMap;
use parking_lot::RwLock;
use slirc_view::{Cursor, StringView};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Instrument, debug, info, warn};

/// What happened to one incoming message.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Not a command: no prefix, no command word, or a bot author.
    Ignored,
    /// The command word matched nothing.
    NotFound(String),
    /// The pipeline ran and every failure was handled.
    Completed { command: String },
    /// The error handler itself failed.
    Failed { command: String, error: CommandError },
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

pub struct CommandsClient {
    config: ClientConfig,
    cooldowns: CooldownConfig,
    commands: SharedTable,
    cogs: RwLock<HashMap<String, Arc<dyn Cog>>>,
    converters: RwLock<HashMap<BuiltinType, Arc<dyn Converter>>>,
    global_check: Option<Arc<dyn Check>>,
    transport: Arc<dyn Transport>,
    events: Arc<dyn EventSink>,
    state: Arc<ClientState>,
    /// Invocations per qualified command name.
    command_counts: DashMap<String, AtomicU64>,
}

impl CommandsClient {
    pub fn builder(transport: Arc<dyn Transport>) -> ClientBuilder {
        ClientBuilder::new(transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<ClientState> {
        &self.state
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    pub fn global_check(&self) -> Option<&Arc<dyn Check>> {
        self.global_check.as_ref()
    }

    // ========================================================================
    // Registry
    // ========================================================================

    pub fn add_command(&self, command: Arc<Command>) -> Result<(), RegistrationError> {
        attach(&self.commands, &command, None)?;
        info!(command = %command.name(), aliases = ?command.aliases(), "registered command");
        Ok(())
    }

    pub fn get_command(&self, name: &str) -> Option<Arc<Command>> {
        self.commands.read().get(name)
    }

    pub fn remove_command(&self, name: &str) -> Option<Arc<Command>> {
        let removed = self.commands.write().remove_name(name)?;
        removed.clear_scope();
        info!(command = %removed.name(), "removed command");
        Some(removed)
    }

    /// Every top-level name and alias with its command.
    pub fn all_commands(&self) -> Vec<(String, Arc<Command>)> {
        self.commands.read().entries()
    }

    /// Each top-level command once, sorted by name.
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.commands.read().unique()
    }

    /// Every command, groups followed by their subcommands.
    pub fn walk_commands(&self) -> Vec<Arc<Command>> {
        self.commands().iter().flat_map(|c| c.walk()).collect()
    }

    // ========================================================================
    // Cogs
    // ========================================================================

    /// Mark the cog's commands as owned by it, register the top-level ones,
    /// then run `cog_load`.
    pub fn add_cog(&self, cog: Arc<dyn Cog>) -> Result<(), RegistrationError> {
        let name = cog.qualified_name().to_string();
        if self.cogs.read().contains_key(&name) {
            return Err(RegistrationError::Duplicate(name));
        }

        let commands = cog.commands();
        for command in &commands {
            command.set_cog(&cog);
        }
        for command in commands.iter().filter(|c| c.parent().is_none()) {
            if let Err(err) = self.add_command(Arc::clone(command)) {
                self.commands
                    .write()
                    .retain(|c| !c.cog().is_some_and(|owner| same_cog(&owner, &cog)));
                return Err(err);
            }
        }

        self.cogs.write().insert(name.clone(), Arc::clone(&cog));
        cog.cog_load();
        info!(cog = %name, commands = commands.len(), "loaded cog");
        Ok(())
    }

    /// Unregister the cog's commands, then run `cog_unload`.
    pub fn remove_cog(&self, name: &str) -> Option<Arc<dyn Cog>> {
        let cog = self.cogs.write().remove(name)?;
        let removed = self
            .commands
            .write()
            .retain(|c| !c.cog().is_some_and(|owner| same_cog(&owner, &cog)));
        for command in &removed {
            command.clear_scope();
        }
        cog.cog_unload();
        info!(cog = %name, commands = removed.len(), "unloaded cog");
        Some(cog)
    }

    pub fn get_cog(&self, name: &str) -> Option<Arc<dyn Cog>> {
        self.cogs.read().get(name).cloned()
    }

    pub fn cogs(&self) -> Vec<Arc<dyn Cog>> {
        let mut cogs: Vec<_> = self.cogs.read().values().cloned().collect();
        cogs.sort_by(|a, b| a.qualified_name().cmp(b.qualified_name()));
        cogs
    }

    // ========================================================================
    // Converters
    // ========================================================================

    /// Replace the converter used for a built-in type.
    pub fn register_converter(&self, ty: BuiltinType, converter: Arc<dyn Converter>) {
        self.converters.write().insert(ty, converter);
    }

    pub fn converter(&self, ty: BuiltinType) -> Arc<dyn Converter> {
        self.converters
            .read()
            .get(&ty)
            .cloned()
            .unwrap_or_else(|| ty.default_converter())
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Build the context for `message`: strip the longest matching prefix,
    /// read the command word and look it up. `None` when the message is not
    /// a command at all.
    pub fn get_context(self: &Arc<Self>, message: Message) -> Option<Context> {
        let (prefix, rest) = self
            .config
            .sorted_prefixes()
            .into_iter()
            .find_map(|p| message.content.strip_prefix(p).map(|rest| (p.to_string(), rest.to_string())))?;

        let mut view = StringView::new(rest);
        let invoked_with = view.next_word().ok()?;
        let command = self.get_command(&invoked_with);
        Some(Context::new(
            Arc::clone(self),
            message,
            prefix,
            invoked_with,
            command,
            Box::new(view),
        ))
    }

    /// Run one incoming message through the pipeline.
    pub async fn process_commands(self: &Arc<Self>, message: Message) -> DispatchOutcome {
        metrics::record_message();
        if self.config.ignore_bots && message.author.bot {
            return DispatchOutcome::Ignored;
        }
        let Some(mut ctx) = self.get_context(message) else {
            return DispatchOutcome::Ignored;
        };

        let Some(command) = ctx.command.clone() else {
            let error = CommandError::CommandNotFound(ctx.invoked_with.clone());
            debug!(name = %ctx.invoked_with, "command not found");
            metrics::record_command_error("unknown", error.error_code());
            self.events.command_error(&ctx, &error).await;
            return DispatchOutcome::NotFound(ctx.invoked_with);
        };

        let span = spans::command(
            command.name(),
            &ctx.message.author.id,
            &ctx.message.channel_id,
            &ctx.invoked_with,
        );
        let mut timer = CommandTimer::new(command.qualified_name());
        let result = ctx.invoke().instrument(span).await;

        let name = ctx
            .command
            .as_ref()
            .map_or_else(|| command.qualified_name(), |c| c.qualified_name());
        timer.set_command(&name);
        self.command_counts
            .entry(name.clone())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);

        match result {
            Ok(()) => DispatchOutcome::Completed { command: name },
            Err(error) => {
                warn!(command = %name, code = error.error_code(), error = %error, "error handler failed");
                DispatchOutcome::Failed {
                    command: name,
                    error,
                }
            }
        }
    }

    /// Get command usage statistics, most used first.
    pub fn command_stats(&self) -> Vec<(String, u64)> {
        let mut stats: Vec<_> = self
            .command_counts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();
        stats.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        stats
    }

    /// Apply cooldown eviction to every command. Returns buckets removed.
    pub fn prune_cooldowns(&self) -> usize {
        let _span = spans::prune().entered();
        let fallback = self.cooldowns.eviction;
        let removed: usize = self
            .walk_commands()
            .iter()
            .filter_map(|c| c.cooldown())
            .map(|mapping| mapping.prune(fallback))
            .sum();
        if removed > 0 {
            debug!(removed, "cooldown prune pass");
        }
        removed
    }
}

impl std::fmt::Debug for CommandsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandsClient")
            .field("prefixes", &self.config.prefixes)
            .field("commands", &self.commands.read().len())
            .field("cogs", &self.cogs.read().len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`CommandsClient`].
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    config: Config,
    events: Arc<dyn EventSink>,
    global_check: Option<Arc<dyn Check>>,
    state: Arc<ClientState>,
    converters: HashMap<BuiltinType, Arc<dyn Converter>>,
}

impl ClientBuilder {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            config: Config::default(),
            events: Arc::new(LogEvents),
            global_check: None,
            state: Arc::new(ClientState::new()),
            converters: default_converters(),
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// A check every command must pass, before its own checks.
    pub fn global_check(mut self, check: Arc<dyn Check>) -> Self {
        self.global_check = Some(check);
        self
    }

    pub fn state(mut self, state: Arc<ClientState>) -> Self {
        self.state = state;
        self
    }

    pub fn converter(mut self, ty: BuiltinType, converter: Arc<dyn Converter>) -> Self {
        self.converters.insert(ty, converter);
        self
    }

    pub fn build(self) -> Arc<CommandsClient> {
        let Config {
            client, cooldowns, ..
        } = self.config;
        let help_enabled = client.help_command;
        let case_insensitive = client.case_insensitive;

        let commands_client = Arc::new(CommandsClient {
            config: client,
            cooldowns,
            commands: crate::command::CommandTable::shared(case_insensitive),
            cogs: RwLock::new(HashMap::new()),
            converters: RwLock::new(self.converters),
            global_check: self.global_check,
            transport: self.transport,
            events: self.events,
            state: self.state,
            command_counts: DashMap::new(),
        });

        if help_enabled {
            if let Err(err) = commands_client.add_command(help::help_command()) {
                warn!(error = %err, "could not register help command");
            }
        }
        commands_client
    }
}

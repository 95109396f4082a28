//! Commands and groups.
//!
//! A [`Command`] binds a handler to a name, aliases, checks, a cooldown and
//! an error handler. A group is a command that also owns a
//! [`CommandTable`] of subcommands; invocation descends into it while the
//! next word names a subcommand.
//!
//! # Ownership
//!
//! A command is registered in exactly one scope at a time: the client's
//! top-level table or one group's subcommand table. Registering it somewhere
//! else first detaches it from where it was. Scopes hold commands strongly;
//! commands point back at their scope and parent weakly.

mod handler;
mod table;

pub use handler::{Arguments, ErrorHandler, Handler, Owner, error_handler_fn, handler_fn};
pub use table::CommandTable;
pub(crate) use table::SharedTable;

use crate::checks::Check;
use crate::cog::Cog;
use crate::converters::convert_argument;
use crate::cooldown::{Cooldown, CooldownMapping, KeyResolver};
use crate::dispatch::Context;
use crate::error::{CommandError, HandlerResult, RegistrationError};
use crate::metrics;
use crate::parameter::{Parameter, ParameterKind};
use crate::value::Value;
use parking_lot::RwLock;
use slirc_view::{Cursor, ViewError};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

pub struct Command {
    name: String,
    aliases: Vec<String>,
    usage: Option<String>,
    description: Option<String>,
    hidden: bool,
    parameters: Vec<Parameter>,
    checks: Vec<Arc<dyn Check>>,
    cooldown: Option<CooldownMapping>,
    bucket: KeyResolver,
    handler: Arc<dyn Handler>,
    error_handler: RwLock<Option<Arc<dyn ErrorHandler>>>,
    parent: RwLock<Option<Weak<Command>>>,
    scope: RwLock<Option<Weak<RwLock<CommandTable>>>>,
    cog: RwLock<Option<Weak<dyn Cog>>>,
    subcommands: Option<SharedTable>,
}

impl Command {
    pub fn builder(name: impl Into<String>, handler: Arc<dyn Handler>) -> CommandBuilder {
        CommandBuilder::new(name.into(), handler)
    }

    /// A builder for a command that can hold subcommands.
    pub fn group(name: impl Into<String>, handler: Arc<dyn Handler>) -> CommandBuilder {
        let mut builder = CommandBuilder::new(name.into(), handler);
        builder.group = true;
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// First line of the description.
    pub fn short_description(&self) -> Option<&str> {
        self.description.as_deref().and_then(|d| d.lines().next())
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn checks(&self) -> &[Arc<dyn Check>] {
        &self.checks
    }

    pub fn cooldown(&self) -> Option<&CooldownMapping> {
        self.cooldown.as_ref()
    }

    pub fn is_group(&self) -> bool {
        self.subcommands.is_some()
    }

    pub fn parent(&self) -> Option<Arc<Command>> {
        self.parent.read().as_ref().and_then(Weak::upgrade)
    }

    /// Parents from outermost to innermost.
    pub fn parents(&self) -> Vec<Arc<Command>> {
        let mut chain = Vec::new();
        let mut next = self.parent();
        while let Some(parent) = next {
            next = parent.parent();
            chain.push(parent);
        }
        chain.reverse();
        chain
    }

    /// Space-separated path from the top-level command, e.g. `config set`.
    pub fn qualified_name(&self) -> String {
        let mut parts: Vec<String> = self.parents().iter().map(|p| p.name.clone()).collect();
        parts.push(self.name.clone());
        parts.join(" ")
    }

    /// The command's cog, inherited from the parent when not set directly.
    pub fn cog(&self) -> Option<Arc<dyn Cog>> {
        let own = self.cog.read().as_ref().and_then(Weak::upgrade);
        own.or_else(|| self.parent().and_then(|p| p.cog()))
    }

    pub(crate) fn set_cog(&self, cog: &Arc<dyn Cog>) {
        *self.cog.write() = Some(Arc::downgrade(cog));
    }

    pub fn set_error_handler(&self, handler: Arc<dyn ErrorHandler>) {
        *self.error_handler.write() = Some(handler);
    }

    /// Usage line: parent names, own name, then each parameter.
    pub fn usage(&self) -> String {
        if let Some(usage) = &self.usage {
            return usage.clone();
        }
        let mut parts = vec![self.qualified_name()];
        parts.extend(self.parameters.iter().map(Parameter::usage));
        parts.join(" ")
    }

    // ------------------------------------------------------------------
    // Subcommands
    // ------------------------------------------------------------------

    /// Register `command` as a subcommand of this group.
    pub fn add_command(self: &Arc<Self>, command: Arc<Command>) -> Result<(), RegistrationError> {
        let table = self
            .subcommands
            .as_ref()
            .ok_or_else(|| RegistrationError::NotAGroup(self.name.clone()))?;
        attach(table, &command, Some(self))
    }

    pub fn get_command(&self, name: &str) -> Option<Arc<Command>> {
        self.subcommands.as_ref()?.read().get(name)
    }

    pub fn remove_command(&self, name: &str) -> Option<Arc<Command>> {
        let removed = self.subcommands.as_ref()?.write().remove_name(name)?;
        removed.clear_scope();
        Some(removed)
    }

    /// Each subcommand once, sorted by name.
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.subcommands
            .as_ref()
            .map(|t| t.read().unique())
            .unwrap_or_default()
    }

    /// Every subcommand name and alias.
    pub fn all_commands(&self) -> Vec<(String, Arc<Command>)> {
        self.subcommands
            .as_ref()
            .map(|t| t.read().entries())
            .unwrap_or_default()
    }

    /// This command and every command nested below it.
    pub fn walk(self: &Arc<Self>) -> Vec<Arc<Command>> {
        let mut out = vec![Arc::clone(self)];
        for sub in self.commands() {
            out.extend(sub.walk());
        }
        out
    }

    /// Remove from whatever scope currently holds this command.
    pub(crate) fn detach(&self) {
        let scope = self.scope.write().take();
        if let Some(table) = scope.and_then(|weak| weak.upgrade()) {
            table.write().remove(self);
        }
        *self.parent.write() = None;
    }

    pub(crate) fn clear_scope(&self) {
        *self.scope.write() = None;
        *self.parent.write() = None;
    }

    // ------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------

    fn owner(&self, ctx: &Context) -> Owner {
        match self.cog() {
            Some(cog) => Owner::Cog(cog),
            None => Owner::Client(Arc::clone(ctx.client())),
        }
    }

    /// Run the handler with the arguments bound on `ctx`. A handler error is
    /// routed to the error handler, whose result is returned.
    pub async fn invoke(&self, ctx: &Context) -> HandlerResult {
        let args = Arguments::bind(&self.parameters, &ctx.args, &ctx.kwargs);
        match self.handler.call(self.owner(ctx), ctx, args).await {
            Ok(()) => {
                ctx.client().events().command_completion(ctx).await;
                Ok(())
            }
            Err(error) => self.dispatch_error(ctx, error).await,
        }
    }

    /// Hand `error` to this command's error handler, or to the client's
    /// event sink when there is none.
    pub async fn dispatch_error(&self, ctx: &Context, error: CommandError) -> HandlerResult {
        debug!(
            command = %self.qualified_name(),
            code = error.error_code(),
            error = %error,
            "dispatching command error"
        );
        metrics::record_command_error(&self.qualified_name(), error.error_code());

        let handler = self.error_handler.read().clone();
        match handler {
            Some(handler) => handler.on_error(self.owner(ctx), ctx, error).await,
            None => {
                ctx.client().events().command_error(ctx, &error).await;
                Ok(())
            }
        }
    }

    /// Charge the cooldown bucket for this invocation.
    pub async fn run_cooldown(&self, ctx: &Context) -> Result<(), CommandError> {
        let Some(mapping) = &self.cooldown else {
            return Ok(());
        };
        let key = self.bucket.resolve(ctx).await;
        match mapping.update_rate_limit(&key) {
            None => Ok(()),
            Some(retry_after) => {
                metrics::record_cooldown_rejection(&self.qualified_name());
                debug!(command = %self.name, key = %key, ?retry_after, "command on cooldown");
                Err(CommandError::CommandOnCooldown { retry_after })
            }
        }
    }

    /// Read and convert every parameter from the cursor into `ctx.args` and
    /// `ctx.kwargs`.
    pub async fn parse_arguments(&self, ctx: &mut Context) -> Result<(), CommandError> {
        for parameter in &self.parameters {
            match parameter.kind() {
                ParameterKind::Positional => {
                    let value = match ctx.view.next_word() {
                        Ok(word) => {
                            convert_argument(ctx, &word, parameter.ty(), parameter.name()).await?
                        }
                        Err(ViewError::EndOfInput) => default_for(parameter, ctx).await?,
                        Err(err) => return Err(err.into()),
                    };
                    ctx.args.push(value);
                }
                ParameterKind::Rest => {
                    let rest = ctx.view.rest();
                    let value = if rest.is_empty() {
                        default_for(parameter, ctx).await?
                    } else {
                        convert_argument(ctx, &rest, parameter.ty(), parameter.name()).await?
                    };
                    ctx.kwargs.insert(parameter.name().to_string(), value);
                }
                ParameterKind::Variadic => {
                    let mut values = Vec::new();
                    loop {
                        let word = match ctx.view.next_word() {
                            Ok(word) => word,
                            Err(ViewError::EndOfInput) => break,
                            Err(err) => return Err(err.into()),
                        };
                        let value =
                            convert_argument(ctx, &word, parameter.ty(), parameter.name()).await?;
                        // An optional type gave the word back; reading on would loop.
                        if value.is_none() {
                            break;
                        }
                        values.push(value);
                    }
                    ctx.args.push(Value::List(values));
                }
            }
        }
        Ok(())
    }
}

async fn default_for(parameter: &Parameter, ctx: &Context) -> Result<Value, CommandError> {
    match parameter.default_value() {
        Some(default) => default.resolve(ctx).await,
        None => Err(CommandError::MissingRequiredArgument(
            parameter.name().to_string(),
        )),
    }
}

/// Move `command` into `table`, detaching it from any previous scope.
pub(crate) fn attach(
    table: &SharedTable,
    command: &Arc<Command>,
    parent: Option<&Arc<Command>>,
) -> Result<(), RegistrationError> {
    table.read().check_conflicts(command)?;
    command.detach();
    table.write().insert(Arc::clone(command))?;
    *command.scope.write() = Some(Arc::downgrade(table));
    *command.parent.write() = parent.map(Arc::downgrade);
    Ok(())
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("parameters", &self.parameters.len())
            .field("group", &self.is_group())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Command`].
pub struct CommandBuilder {
    name: String,
    handler: Arc<dyn Handler>,
    aliases: Vec<String>,
    usage: Option<String>,
    description: Option<String>,
    hidden: bool,
    parameters: Vec<Parameter>,
    checks: Vec<Arc<dyn Check>>,
    cooldown: Option<CooldownMapping>,
    bucket: KeyResolver,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    group: bool,
    case_insensitive: bool,
}

impl CommandBuilder {
    fn new(name: String, handler: Arc<dyn Handler>) -> Self {
        Self {
            name,
            handler,
            aliases: Vec::new(),
            usage: None,
            description: None,
            hidden: false,
            parameters: Vec::new(),
            checks: Vec::new(),
            cooldown: None,
            bucket: KeyResolver::default(),
            error_handler: None,
            group: false,
            case_insensitive: false,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Replace the generated usage line.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn description(mut self, description: impl AsRef<str>) -> Self {
        let trimmed = description.as_ref().trim();
        self.description = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn params(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Checks run in the order they are added.
    pub fn check(mut self, check: Arc<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    /// Allow `rate` uses per `per` for each bucket key.
    pub fn cooldown(mut self, rate: u32, per: Duration) -> Self {
        self.cooldown = Some(CooldownMapping::new(Cooldown::new(rate, per)));
        self
    }

    pub fn cooldown_mapping(mut self, mapping: CooldownMapping) -> Self {
        self.cooldown = Some(mapping);
        self
    }

    pub fn bucket(mut self, bucket: impl Into<KeyResolver>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Subcommand lookup ignores case. Groups only.
    pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn build(self) -> Arc<Command> {
        Arc::new(Command {
            name: self.name,
            aliases: self.aliases,
            usage: self.usage,
            description: self.description,
            hidden: self.hidden,
            parameters: self.parameters,
            checks: self.checks,
            cooldown: self.cooldown,
            bucket: self.bucket,
            handler: self.handler,
            error_handler: RwLock::new(self.error_handler),
            parent: RwLock::new(None),
            scope: RwLock::new(None),
            cog: RwLock::new(None),
            subcommands: self
                .group
                .then(|| CommandTable::shared(self.case_insensitive)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Arc<dyn Handler> {
        handler_fn(|_, _, _| Box::pin(async { Ok(()) }))
    }

    #[test]
    fn test_usage_includes_parent_chain() {
        let root = Command::group("config", noop()).build();
        let set = Command::group("set", noop()).build();
        let key = Command::builder("key", noop())
            .param(Parameter::positional("name"))
            .param(Parameter::positional("value").default(Value::None))
            .param(Parameter::variadic("tags"))
            .build();
        root.add_command(Arc::clone(&set)).unwrap();
        set.add_command(Arc::clone(&key)).unwrap();

        assert_eq!(key.qualified_name(), "config set key");
        assert_eq!(key.usage(), "config set key <name> [value] [tags...]");
        assert_eq!(root.usage(), "config");
    }

    #[test]
    fn test_usage_override_wins() {
        let cmd = Command::builder("ban", noop()).usage("ban <user> [reason]").build();
        assert_eq!(cmd.usage(), "ban <user> [reason]");
    }

    #[test]
    fn test_short_description_is_first_line() {
        let cmd = Command::builder("x", noop())
            .description("\n  First line.\nMore detail.\n")
            .build();
        assert_eq!(cmd.short_description(), Some("First line."));
        assert_eq!(cmd.description(), Some("First line.\nMore detail."));
    }

    #[test]
    fn test_add_to_plain_command_fails() {
        let plain = Command::builder("plain", noop()).build();
        let err = plain.add_command(Command::builder("sub", noop()).build()).unwrap_err();
        assert_eq!(err, RegistrationError::NotAGroup("plain".into()));
    }

    #[test]
    fn test_moving_between_groups_detaches() {
        let a = Command::group("a", noop()).build();
        let b = Command::group("b", noop()).build();
        let sub = Command::builder("sub", noop()).alias("s").build();

        a.add_command(Arc::clone(&sub)).unwrap();
        assert!(a.get_command("s").is_some());

        b.add_command(Arc::clone(&sub)).unwrap();
        assert!(a.get_command("sub").is_none());
        assert!(a.get_command("s").is_none());
        assert!(b.get_command("s").is_some());
        assert_eq!(sub.qualified_name(), "b sub");
    }

    #[test]
    fn test_conflict_keeps_old_scope() {
        let a = Command::group("a", noop()).build();
        let b = Command::group("b", noop()).build();
        let sub = Command::builder("sub", noop()).build();
        a.add_command(Arc::clone(&sub)).unwrap();
        b.add_command(Command::builder("sub", noop()).build()).unwrap();

        assert!(b.add_command(Arc::clone(&sub)).is_err());
        assert!(Arc::ptr_eq(&a.get_command("sub").unwrap(), &sub));
    }

    #[test]
    fn test_walk_visits_nested() {
        let root = Command::group("root", noop()).build();
        let mid = Command::group("mid", noop()).build();
        mid.add_command(Command::builder("leaf", noop()).build()).unwrap();
        root.add_command(mid).unwrap();
        let names: Vec<String> = root.walk().iter().map(|c| c.qualified_name()).collect();
        assert_eq!(names, vec!["root", "root mid", "root mid leaf"]);
    }
}

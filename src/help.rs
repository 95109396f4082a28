//! The built-in `help` command and its text rendering.

use crate::command::{Arguments, Command, handler_fn};
use crate::dispatch::{CommandsClient, Context};
use crate::error::HandlerResult;
use crate::parameter::Parameter;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

const NO_CATEGORY: &str = "No Category";

/// `help [command...]`: the overview, or one command by path.
pub fn help_command() -> Arc<Command> {
    Command::builder("help", handler_fn(|_, ctx, args| Box::pin(run(ctx, args))))
        .description("Shows this message.")
        .param(Parameter::variadic("command"))
        .build()
}

async fn run(ctx: &Context, args: Arguments) -> HandlerResult {
    let path: Vec<String> = args.list("command").iter().map(|v| v.to_string()).collect();
    if path.is_empty() {
        return ctx.send_help(None).await;
    }

    match resolve_path(ctx.client(), &path) {
        Some(command) => ctx.send_help(Some(&*command)).await,
        None => {
            ctx.send(format!("No command called `{}` found.", path.join(" ")))
                .await
        }
    }
}

/// Follow a space-separated path from the top level through subcommands.
pub fn resolve_path(client: &CommandsClient, path: &[String]) -> Option<Arc<Command>> {
    let (first, rest) = path.split_first()?;
    let mut command = client.get_command(first)?;
    for name in rest {
        command = command.get_command(name)?;
    }
    Some(command)
}

/// Every visible top-level command, grouped by cog.
pub fn render_overview(client: &Arc<CommandsClient>) -> String {
    let mut sections: BTreeMap<String, Vec<Arc<Command>>> = BTreeMap::new();
    for command in client.commands().into_iter().filter(|c| !c.hidden()) {
        let section = command
            .cog()
            .map_or_else(|| NO_CATEGORY.to_string(), |cog| cog.qualified_name().to_string());
        sections.entry(section).or_default().push(command);
    }

    let width = sections
        .values()
        .flatten()
        .map(|c| c.name().len())
        .max()
        .unwrap_or(0);
    let prefix = client
        .config()
        .sorted_prefixes()
        .last()
        .copied()
        .unwrap_or_default()
        .to_string();

    let mut out = String::new();
    for (section, commands) in &sections {
        let _ = writeln!(out, "{section}:");
        for command in commands {
            match command.short_description() {
                Some(short) => {
                    let _ = writeln!(out, "  {:<width$}  {short}", command.name());
                }
                None => {
                    let _ = writeln!(out, "  {}", command.name());
                }
            }
        }
    }
    let _ = write!(
        out,
        "\nType {prefix}help command for more info on a command."
    );
    out
}

/// Usage, aliases, description and visible subcommands of one command.
pub fn render_command(command: &Command) -> String {
    let mut out = command.usage();

    if !command.aliases().is_empty() {
        let _ = write!(out, "\nAliases: {}", command.aliases().join(", "));
    }
    if let Some(description) = command.description() {
        let _ = write!(out, "\n\n{description}");
    }

    let described: Vec<&Parameter> = command
        .parameters()
        .iter()
        .filter(|p| p.describe().is_some())
        .collect();
    if !described.is_empty() {
        out.push_str("\n\nArguments:");
        for parameter in described {
            let _ = write!(
                out,
                "\n  {}  {}",
                parameter.shown_name(),
                parameter.describe().unwrap_or_default()
            );
        }
    }

    let subcommands: Vec<Arc<Command>> = command
        .commands()
        .into_iter()
        .filter(|c| !c.hidden())
        .collect();
    if !subcommands.is_empty() {
        out.push_str("\n\nCommands:");
        for sub in subcommands {
            match sub.short_description() {
                Some(short) => {
                    let _ = write!(out, "\n  {}  {short}", sub.name());
                }
                None => {
                    let _ = write!(out, "\n  {}", sub.name());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Handler;

    fn noop() -> Arc<dyn Handler> {
        handler_fn(|_, _, _| Box::pin(async { Ok(()) }))
    }

    #[test]
    fn test_render_command_lists_subcommands() {
        let config = Command::group("config", noop())
            .alias("cfg")
            .description("Bot settings.\nChanges apply immediately.")
            .build();
        config
            .add_command(
                Command::builder("set", noop())
                    .description("Set a value.")
                    .param(Parameter::positional("key").description("setting name"))
                    .build(),
            )
            .unwrap();
        config
            .add_command(Command::builder("secret", noop()).hidden().build())
            .unwrap();

        let text = render_command(&config);
        assert!(text.starts_with("config"));
        assert!(text.contains("Aliases: cfg"));
        assert!(text.contains("Changes apply immediately."));
        assert!(text.contains("set  Set a value."));
        assert!(!text.contains("secret"));

        let set = config.get_command("set").unwrap();
        let text = render_command(&set);
        assert!(text.starts_with("config set <key>"));
        assert!(text.contains("key  setting name"));
    }
}

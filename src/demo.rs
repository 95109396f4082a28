//! Commands served by the console bot.

use slirc_commands::converters::BuiltinType;
use slirc_commands::model::{Channel, Member, Server, User};
use slirc_commands::state::ClientState;
use slirc_commands::{
    BucketType, Cog, Command, Parameter, TypeDescriptor, Value, handler_fn,
    has_permissions, is_bot_owner,
};
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

pub const CONSOLE_USER: &str = "01HCONSOLE0000000000000000";
pub const DEMO_SERVER: &str = "01HDEMOSERVER0000000000000";
pub const DEMO_CHANNEL: &str = "01HGENERAL0000000000000000";

/// A small server so entity converters have something to find.
pub fn seed_state(state: &ClientState) {
    let console = User::new(CONSOLE_USER, "console").with_display_name("Console");
    let straylight = User::new("01HSTRAYLIGHT0000000000000", "straylight").with_discriminator("0001");

    let server = Server::new(DEMO_SERVER, "Straylight", CONSOLE_USER)
        .with_member(Member::new(console, DEMO_SERVER).with_permissions(["manage_messages"]))
        .with_member(Member::new(straylight, DEMO_SERVER).with_nickname("Wintermute"))
        .with_channel(DEMO_CHANNEL);
    state.insert_server(server);
    state.insert_channel(Channel::text(DEMO_CHANNEL, "general", DEMO_SERVER));
}

#[derive(Debug, Default)]
pub struct Utility {
    pings: AtomicU64,
}

impl Utility {
    fn ping() -> Arc<Command> {
        Command::builder(
            "ping",
            handler_fn(|owner, ctx, _| {
                Box::pin(async move {
                    let count = owner
                        .cog::<Utility>()
                        .map(|u| u.pings.fetch_add(1, Ordering::Relaxed) + 1)
                        .unwrap_or_default();
                    ctx.send(format!("pong ({count})")).await
                })
            }),
        )
        .description("Check the bot is alive.")
        .cooldown(2, Duration::from_secs(10))
        .bucket(BucketType::User)
        .build()
    }

    fn echo() -> Arc<Command> {
        Command::builder(
            "echo",
            handler_fn(|_, ctx, args| {
                Box::pin(async move {
                    let text = args.text("text").unwrap_or_default().to_string();
                    ctx.send(text).await
                })
            }),
        )
        .alias("say")
        .description("Repeat the rest of the message.")
        .param(Parameter::rest("text").description("what to repeat"))
        .build()
    }

    fn add() -> Arc<Command> {
        Command::builder(
            "add",
            handler_fn(|_, ctx, args| {
                Box::pin(async move {
                    let sum: i64 = args.list("numbers").iter().filter_map(Value::as_int).sum();
                    ctx.send(sum.to_string()).await
                })
            }),
        )
        .description("Add whole numbers together.")
        .param(Parameter::variadic("numbers").of_type(BuiltinType::Int))
        .build()
    }

    fn whois() -> Arc<Command> {
        Command::builder(
            "whois",
            handler_fn(|_, ctx, args| {
                Box::pin(async move {
                    let user = match args.get("user").and_then(Value::as_user) {
                        Some(user) => user.clone(),
                        None => ctx.author().clone(),
                    };
                    ctx.send(format!(
                        "{} ({}#{}) id={}",
                        user.shown_name(),
                        user.name,
                        user.discriminator,
                        user.id
                    ))
                    .await
                })
            }),
        )
        .description("Show a user, or yourself.")
        .param(
            Parameter::positional("user")
                .of_type(TypeDescriptor::optional(BuiltinType::User.into()))
                .default(Value::None),
        )
        .build()
    }

    fn mode() -> Arc<Command> {
        Command::builder(
            "mode",
            handler_fn(|_, ctx, args| {
                Box::pin(async move {
                    let mode = args.text("mode").unwrap_or_default().to_string();
                    ctx.send(format!("mode set to {mode}")).await
                })
            }),
        )
        .description("Switch quiet mode.")
        .param(Parameter::positional("mode").of_type(TypeDescriptor::literal(["quiet", "loud"])))
        .check(has_permissions(&["manage_messages"]))
        .build()
    }

    fn stats() -> Arc<Command> {
        let root = Command::group(
            "stats",
            handler_fn(|_, ctx, _| Box::pin(async move { ctx.send_help(ctx.command.as_deref()).await })),
        )
        .description("Bot statistics.")
        .build();

        let commands = Command::builder(
            "commands",
            handler_fn(|_, ctx, _| {
                Box::pin(async move {
                    let lines: Vec<String> = ctx
                        .client()
                        .command_stats()
                        .into_iter()
                        .map(|(name, count)| format!("{name}: {count}"))
                        .collect();
                    ctx.send(lines.join("\n")).await
                })
            }),
        )
        .description("Invocation counts.")
        .build();

        let prune = Command::builder(
            "prune",
            handler_fn(|_, ctx, _| {
                Box::pin(async move {
                    let removed = ctx.client().prune_cooldowns();
                    ctx.send(format!("pruned {removed} cooldown buckets")).await
                })
            }),
        )
        .check(is_bot_owner())
        .hidden()
        .build();

        if let Err(e) = root.add_command(commands) {
            tracing::warn!(error = %e, "stats commands");
        }
        if let Err(e) = root.add_command(prune) {
            tracing::warn!(error = %e, "stats prune");
        }
        root
    }
}

impl Cog for Utility {
    fn qualified_name(&self) -> &str {
        "Utility"
    }

    fn commands(&self) -> Vec<Arc<Command>> {
        let stats = Self::stats();
        let mut commands = vec![
            Self::ping(),
            Self::echo(),
            Self::add(),
            Self::whois(),
            Self::mode(),
        ];
        commands.extend(stats.walk());
        commands
    }

    fn cog_load(&self) {
        info!(cog = self.qualified_name(), "ready");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

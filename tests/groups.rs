//! Integration tests for groups and subcommand descent.

mod common;

use common::{TestBot, recorder};
use parking_lot::Mutex;
use slirc_commands::{Arguments, Command, Parameter, Value, handler_fn};
use std::sync::Arc;

type Calls = Arc<Mutex<Vec<Arguments>>>;

/// `a [first]` with subcommand `b [first]`.
fn group_a_b(bot: &TestBot) -> (Calls, Calls) {
    let (a_handler, a_calls) = recorder();
    let (b_handler, b_calls) = recorder();
    let a = Command::group("a", a_handler)
        .param(Parameter::positional("first").default(Value::None))
        .build();
    let b = Command::builder("b", b_handler)
        .alias("bee")
        .param(Parameter::positional("first").default(Value::None))
        .build();
    a.add_command(b).unwrap();
    bot.client.add_command(a).unwrap();
    (a_calls, b_calls)
}

#[tokio::test]
async fn test_descends_into_subcommand() {
    let bot = TestBot::new();
    let (a_calls, b_calls) = group_a_b(&bot);

    let outcome = bot.send("!a b x").await;

    assert!(outcome.is_completed());
    assert!(a_calls.lock().is_empty());
    assert_eq!(b_calls.lock()[0].text("first"), Some("x"));
    assert_eq!(bot.events.completions(), vec!["a b"]);
}

#[tokio::test]
async fn test_unknown_subcommand_token_goes_to_group() {
    let bot = TestBot::new();
    let (a_calls, b_calls) = group_a_b(&bot);

    bot.send("!a z").await;

    assert!(b_calls.lock().is_empty());
    assert_eq!(a_calls.lock()[0].text("first"), Some("z"));
}

#[tokio::test]
async fn test_group_alone_runs_group_body() {
    let bot = TestBot::new();
    let (a_calls, b_calls) = group_a_b(&bot);

    bot.send("!a").await;

    assert!(b_calls.lock().is_empty());
    assert_eq!(a_calls.lock()[0].get("first"), Some(&Value::None));
}

#[tokio::test]
async fn test_subcommand_alias_resolves() {
    let bot = TestBot::new();
    let (_, b_calls) = group_a_b(&bot);

    bot.send("!a bee y").await;

    assert_eq!(b_calls.lock()[0].text("first"), Some("y"));
}

#[tokio::test]
async fn test_deep_nesting() {
    let bot = TestBot::new();
    let (leaf_handler, leaf_calls) = recorder();
    let (mid_handler, mid_calls) = recorder();
    let root = Command::group("config", handler_fn(|_, _, _| Box::pin(async { Ok(()) }))).build();
    let mid = Command::group("set", mid_handler).build();
    let leaf = Command::builder("prefix", leaf_handler)
        .param(Parameter::positional("value"))
        .build();
    mid.add_command(leaf.clone()).unwrap();
    root.add_command(mid).unwrap();
    bot.client.add_command(root).unwrap();

    bot.send("!config set prefix ?").await;

    assert!(mid_calls.lock().is_empty());
    assert_eq!(leaf_calls.lock()[0].text("value"), Some("?"));
    assert_eq!(leaf.qualified_name(), "config set prefix");
    assert_eq!(bot.client.command_stats(), vec![("config set prefix".to_string(), 1)]);
}

#[tokio::test]
async fn test_subcommand_error_attributed_to_subcommand() {
    let bot = TestBot::new();
    let (handler, _) = recorder();
    let root = Command::group("tag", handler_fn(|_, _, _| Box::pin(async { Ok(()) }))).build();
    root.add_command(
        Command::builder("add", handler)
            .param(Parameter::positional("name"))
            .build(),
    )
    .unwrap();
    bot.client.add_command(root).unwrap();

    bot.send("!tag add").await;

    let error = bot.events.last_error().unwrap();
    assert_eq!(error.command.as_deref(), Some("tag add"));
    assert_eq!(error.code, "missing_required_argument");
    assert_eq!(error.invoked_with, "tag");
}

#[tokio::test]
async fn test_walk_commands_includes_subcommands() {
    let bot = TestBot::new();
    group_a_b(&bot);

    let names: Vec<String> = bot
        .client
        .walk_commands()
        .iter()
        .map(|c| c.qualified_name())
        .collect();

    assert_eq!(names, vec!["a", "a b", "help"]);
}

#[tokio::test]
async fn test_subcommand_lookup_ignores_case_when_asked() {
    let bot = TestBot::new();
    let (handler, calls) = recorder();
    let root = Command::group("mod", handler_fn(|_, _, _| Box::pin(async { Ok(()) })))
        .case_insensitive(true)
        .build();
    root.add_command(Command::builder("Ban", handler).build()).unwrap();
    bot.client.add_command(root).unwrap();

    bot.send("!mod BAN").await;
    bot.send("!mod ban").await;

    assert_eq!(calls.lock().len(), 2);
}

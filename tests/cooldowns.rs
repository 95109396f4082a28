//! Integration tests for cooldown charging and bucket keys.

mod common;

use common::{ALICE, BOB, TestBot, recorder};
use slirc_commands::config::{Config, EvictionPolicy};
use slirc_commands::{
    BucketType, Command, Cooldown, CooldownMapping, check_fn, key_fn,
};
use std::time::Duration;

#[tokio::test]
async fn test_n_plus_one_call_is_rejected_within_window() {
    let bot = TestBot::new();
    let (handler, calls) = recorder();
    bot.client
        .add_command(
            Command::builder("ping", handler)
                .cooldown(2, Duration::from_secs(30))
                .build(),
        )
        .unwrap();

    bot.send("!ping").await;
    bot.send("!ping").await;
    bot.send("!ping").await;

    assert_eq!(calls.lock().len(), 2);
    let error = bot.events.last_error().unwrap();
    assert_eq!(error.code, "command_on_cooldown");
    let retry = error.retry_after.unwrap();
    assert!(retry > Duration::ZERO);
    assert!(retry <= Duration::from_secs(30));
}

#[tokio::test]
async fn test_spaced_calls_still_limited_to_rate_per_window() {
    let bot = TestBot::new();
    let (handler, calls) = recorder();
    bot.client
        .add_command(
            Command::builder("ping", handler)
                .cooldown(3, Duration::from_millis(600))
                .build(),
        )
        .unwrap();

    bot.send("!ping").await;
    bot.send("!ping").await;
    bot.send("!ping").await;
    // Two refill periods of a per / rate limiter, still inside the window.
    tokio::time::sleep(Duration::from_millis(450)).await;
    bot.send("!ping").await;

    assert_eq!(calls.lock().len(), 3);
    let retry = bot.events.last_error().unwrap().retry_after.unwrap();
    assert!(retry <= Duration::from_millis(600));

    tokio::time::sleep(Duration::from_millis(250)).await;
    bot.send("!ping").await;
    assert_eq!(calls.lock().len(), 4);
}

#[tokio::test]
async fn test_call_after_window_succeeds() {
    let bot = TestBot::new();
    let (handler, calls) = recorder();
    bot.client
        .add_command(
            Command::builder("ping", handler)
                .cooldown(1, Duration::from_millis(150))
                .build(),
        )
        .unwrap();

    bot.send("!ping").await;
    bot.send("!ping").await;
    assert_eq!(calls.lock().len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    bot.send("!ping").await;
    assert_eq!(calls.lock().len(), 2);
}

#[tokio::test]
async fn test_rejected_calls_do_not_extend_cooldown() {
    let bot = TestBot::new();
    let (handler, calls) = recorder();
    bot.client
        .add_command(
            Command::builder("ping", handler)
                .cooldown(1, Duration::from_millis(150))
                .build(),
        )
        .unwrap();

    bot.send("!ping").await;
    for _ in 0..5 {
        bot.send("!ping").await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    bot.send("!ping").await;

    assert_eq!(calls.lock().len(), 2);
}

#[tokio::test]
async fn test_failed_check_does_not_charge_cooldown() {
    let bot = TestBot::new();
    let (handler, calls) = recorder();
    let cmd = Command::builder("daily", handler)
        .check(check_fn(|ctx| ctx.author().id != BOB))
        .cooldown(1, Duration::from_secs(60))
        .build();
    bot.client.add_command(cmd.clone()).unwrap();

    for _ in 0..3 {
        bot.send_as(BOB, "!daily").await;
    }

    assert!(cmd.cooldown().unwrap().is_empty());
    assert_eq!(bot.events.codes(), vec!["check_failure"; 3]);

    // The global bucket is still fresh.
    bot.send_as(ALICE, "!daily").await;
    assert_eq!(calls.lock().len(), 1);
}

#[tokio::test]
async fn test_conversion_failure_still_charges() {
    let bot = TestBot::new();
    let (handler, _) = recorder();
    let cmd = Command::builder("roll", handler)
        .param(
            slirc_commands::Parameter::positional("sides")
                .of_type(slirc_commands::converters::BuiltinType::Int),
        )
        .cooldown(1, Duration::from_secs(60))
        .build();
    bot.client.add_command(cmd).unwrap();

    bot.send("!roll many").await;
    bot.send("!roll 6").await;

    assert_eq!(bot.events.codes(), vec!["bad_int", "command_on_cooldown"]);
}

#[tokio::test]
async fn test_user_buckets_are_independent() {
    let bot = TestBot::new();
    let (handler, calls) = recorder();
    bot.client
        .add_command(
            Command::builder("hug", handler)
                .cooldown(1, Duration::from_secs(60))
                .bucket(BucketType::User)
                .build(),
        )
        .unwrap();

    bot.send_as(ALICE, "!hug").await;
    bot.send_as(ALICE, "!hug").await;
    bot.send_as(BOB, "!hug").await;

    assert_eq!(calls.lock().len(), 2);
    assert_eq!(bot.events.codes(), vec!["command_on_cooldown"]);
}

#[tokio::test]
async fn test_server_bucket_falls_back_to_channel_in_dms() {
    let bot = TestBot::new();
    let (handler, calls) = recorder();
    bot.client
        .add_command(
            Command::builder("poll", handler)
                .cooldown(1, Duration::from_secs(60))
                .bucket(BucketType::Server)
                .build(),
        )
        .unwrap();

    bot.send_as(ALICE, "!poll").await;
    bot.send_as(BOB, "!poll").await;
    bot.send_dm(ALICE, "!poll").await;
    bot.send_dm(BOB, "!poll").await;

    // One server bucket plus one per DM channel.
    assert_eq!(calls.lock().len(), 3);
}

#[tokio::test]
async fn test_custom_key_resolver() {
    let bot = TestBot::new();
    let (handler, calls) = recorder();
    let cmd = Command::builder("vote", handler)
        .cooldown(1, Duration::from_secs(60))
        .bucket(key_fn(|ctx| ctx.author().name.chars().take(1).collect()))
        .build();
    bot.client.add_command(cmd.clone()).unwrap();

    bot.send_as(ALICE, "!vote").await;
    bot.send_as(BOB, "!vote").await;
    bot.send_as(BOB, "!vote").await;

    assert_eq!(calls.lock().len(), 2);
    assert_eq!(cmd.cooldown().unwrap().len(), 2);
}

#[tokio::test]
async fn test_idle_buckets_pruned_by_client_policy() {
    let mut config = Config::default();
    config.cooldowns.eviction = EvictionPolicy::Idle { seconds: 0 };
    let bot = TestBot::with_config(config);
    let (handler, _) = recorder();
    let cmd = Command::builder("hug", handler)
        .cooldown(1, Duration::from_millis(50))
        .bucket(BucketType::User)
        .build();
    bot.client.add_command(cmd.clone()).unwrap();

    bot.send_as(ALICE, "!hug").await;
    bot.send_as(BOB, "!hug").await;
    assert_eq!(cmd.cooldown().unwrap().len(), 2);

    // Still inside the window: nothing may go.
    assert_eq!(bot.client.prune_cooldowns(), 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(bot.client.prune_cooldowns(), 2);
    assert!(cmd.cooldown().unwrap().is_empty());
}

#[tokio::test]
async fn test_mapping_policy_overrides_client() {
    let bot = TestBot::new();
    let (handler, _) = recorder();
    let mapping = CooldownMapping::new(Cooldown::new(1, Duration::from_millis(20)))
        .with_eviction(EvictionPolicy::Capacity { max_buckets: 1 });
    let cmd = Command::builder("hug", handler)
        .cooldown_mapping(mapping)
        .bucket(BucketType::User)
        .build();
    bot.client.add_command(cmd.clone()).unwrap();

    bot.send_as(ALICE, "!hug").await;
    bot.send_as(BOB, "!hug").await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(bot.client.prune_cooldowns(), 2);
}

#[tokio::test]
async fn test_never_policy_keeps_buckets() {
    let bot = TestBot::new();
    let (handler, _) = recorder();
    let cmd = Command::builder("hug", handler)
        .cooldown(1, Duration::from_millis(10))
        .bucket(BucketType::User)
        .build();
    bot.client.add_command(cmd.clone()).unwrap();

    bot.send_as(ALICE, "!hug").await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(bot.client.prune_cooldowns(), 0);
    assert_eq!(cmd.cooldown().unwrap().len(), 1);
}

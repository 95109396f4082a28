//! slircmd - console front end for the slirc-commands engine.
//!
//! Reads one message per line from stdin, runs it through the dispatcher and
//! prints replies. Useful for trying commands without a chat connection.

mod demo;

use slirc_commands::config::{Config, LogFormat};
use slirc_commands::model::{Message, User};
use slirc_commands::{CommandsClient, DispatchOutcome, Outgoing, ResponseMiddleware, metrics};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Replies buffered between handlers and the stdout writer.
const REPLY_QUEUE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration; a missing default file means built-in defaults
    let explicit = std::env::args().nth(1);
    let config_path = explicit.clone().unwrap_or_else(|| "slircmd.toml".to_string());
    let config = if explicit.is_none() && !Path::new(&config_path).exists() {
        Config::default()
    } else {
        Config::load(&config_path).map_err(|e| {
            eprintln!("failed to load config {config_path}: {e}");
            e
        })?
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }

    metrics::init();

    info!(
        prefixes = ?config.client.prefixes,
        eviction = ?config.cooldowns.eviction,
        "Starting slircmd"
    );

    let prune_every = Duration::from_secs(config.cooldowns.prune_interval_secs.max(1));

    let (tx, mut rx) = mpsc::channel::<Outgoing>(REPLY_QUEUE);
    let client = CommandsClient::builder(Arc::new(ResponseMiddleware::Direct(tx)))
        .config(config)
        .build();
    demo::seed_state(client.state());
    client.add_cog(Arc::new(demo::Utility::default()))?;

    // Writer task: the only place replies reach stdout
    let writer = tokio::spawn(async move {
        while let Some(reply) = rx.recv().await {
            println!("[{}] {}", reply.channel_id, reply.content);
        }
    });

    // Cooldown eviction
    let pruner = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(prune_every);
            interval.tick().await;
            loop {
                interval.tick().await;
                client.prune_cooldowns();
            }
        })
    };

    let author = User::new(demo::CONSOLE_USER, "console").with_display_name("Console");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_id: u64 = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        next_id += 1;
        let message = Message::new(next_id.to_string(), line, author.clone(), demo::DEMO_CHANNEL)
            .in_server(demo::DEMO_SERVER);

        match client.process_commands(message).await {
            DispatchOutcome::Ignored => debug!("not a command"),
            DispatchOutcome::NotFound(name) => warn!(name = %name, "unknown command"),
            DispatchOutcome::Completed { command } => debug!(command = %command, "done"),
            DispatchOutcome::Failed { command, error } => {
                error!(command = %command, error = %error, "command failed")
            }
        }
    }

    pruner.abort();
    drop(client);
    if let Err(e) = writer.await {
        warn!(error = %e, "writer task ended abnormally");
    }

    let stats = metrics::gather_metrics();
    debug!(bytes = stats.len(), "final metrics snapshot");
    info!("Shutting down");
    Ok(())
}

//! Test bot: a client over a capturing transport and a seeded cache.

use super::events::RecordingEvents;
use parking_lot::Mutex;
use slirc_commands::config::Config;
use slirc_commands::model::{Category, Channel, Member, Message, Role, Server, User};
use slirc_commands::{
    Arguments, ClientBuilder, CommandsClient, DispatchOutcome, Handler, ResponseMiddleware,
    handler_fn,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub const SERVER: &str = "01HSERVER00000000000000000";
pub const GENERAL: &str = "01HGENERAL0000000000000000";
pub const VOICE: &str = "01HVOICE000000000000000000";
pub const ALICE: &str = "01HALICE000000000000000000";
pub const BOB: &str = "01HBOB00000000000000000000";
/// Known user who is not a member of [`SERVER`].
pub const CAROL: &str = "01HCAROL000000000000000000";

pub const MODERATOR_ROLE: &str = "01HROLEMOD0000000000000000";
pub const TOPICS: &str = "01HCATEGORY000000000000000";

pub struct TestBot {
    pub client: Arc<CommandsClient>,
    pub events: Arc<RecordingEvents>,
    transport: ResponseMiddleware,
    next_id: AtomicU64,
}

#[allow(dead_code)]
impl TestBot {
    pub fn new() -> Self {
        Self::with(|b| b)
    }

    pub fn with_config(config: Config) -> Self {
        Self::with(|b| b.config(config))
    }

    /// Customise the builder before the bot is built.
    pub fn with(customise: impl FnOnce(ClientBuilder) -> ClientBuilder) -> Self {
        let transport = ResponseMiddleware::capturing();
        let events = Arc::new(RecordingEvents::default());
        let builder = CommandsClient::builder(Arc::new(transport.clone())).events(events.clone());
        let client = customise(builder).build();
        seed(&client);
        Self {
            client,
            events,
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn user(&self, id: &str) -> User {
        self.client
            .state()
            .get_user(id)
            .unwrap_or_else(|| User::new(id, id))
    }

    fn message(&self, author: User, content: &str) -> Message {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        Message::new(id, content, author, GENERAL)
    }

    /// Alice, in #general.
    pub async fn send(&self, content: &str) -> DispatchOutcome {
        self.send_as(ALICE, content).await
    }

    pub async fn send_as(&self, author: &str, content: &str) -> DispatchOutcome {
        let message = self.message(self.user(author), content).in_server(SERVER);
        self.client.process_commands(message).await
    }

    /// A direct message, outside any server.
    pub async fn send_dm(&self, author: &str, content: &str) -> DispatchOutcome {
        let mut message = self.message(self.user(author), content);
        message.channel_id = format!("dm-{author}");
        self.client.process_commands(message).await
    }

    /// Contents of every reply sent so far, draining the buffer.
    pub async fn replies(&self) -> Vec<String> {
        self.transport
            .take_captured()
            .await
            .into_iter()
            .map(|o| o.content)
            .collect()
    }
}

/// Alice owns the server; Bob moderates it; Carol is only known by id.
fn seed(client: &CommandsClient) {
    let alice = User::new(ALICE, "alice").with_display_name("Alice Liddell");
    let bob = User::new(BOB, "bob").with_discriminator("0042");
    let carol = User::new(CAROL, "carol");

    let server = Server::new(SERVER, "Wonderland", ALICE)
        .with_member(Member::new(alice, SERVER))
        .with_member(
            Member::new(bob, SERVER)
                .with_nickname("Robert")
                .with_permissions(["kick_members", "manage_messages"]),
        )
        .with_channel(GENERAL)
        .with_channel(VOICE)
        .with_role(Role::new(MODERATOR_ROLE, "Moderator"))
        .with_category(Category::new(TOPICS, "Topics"));

    let state = client.state();
    state.insert_server(server);
    state.insert_user(carol);
    state.insert_channel(Channel::text(GENERAL, "general", SERVER));
    state.insert_channel(Channel::voice(VOICE, "lounge", SERVER));
}

/// A handler that stores the arguments of every call.
#[allow(dead_code)]
pub fn recorder() -> (Arc<dyn Handler>, Arc<Mutex<Vec<Arguments>>>) {
    let calls: Arc<Mutex<Vec<Arguments>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let handler = handler_fn(move |_, _, args| {
        sink.lock().push(args);
        Box::pin(async { Ok(()) })
    });
    (handler, calls)
}

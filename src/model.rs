//! Platform entities seen by converters, checks and handlers.
//!
//! The chat transport owns the real object model; these are the plain
//! snapshots the command engine needs to resolve arguments against.

use std::collections::{BTreeSet, HashMap};

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    /// Account name, unique together with the discriminator.
    pub name: String,
    pub display_name: Option<String>,
    pub discriminator: String,
    pub bot: bool,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: None,
            discriminator: "0000".to_string(),
            bot: false,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = discriminator.into();
        self
    }

    pub fn bot(mut self) -> Self {
        self.bot = true;
        self
    }

    /// The display name if set, else the account name.
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// A user's membership in a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: User,
    pub server_id: String,
    pub nickname: Option<String>,
    pub roles: Vec<String>,
    /// Granted permission names (e.g. `manage_messages`).
    pub permissions: BTreeSet<String>,
}

impl Member {
    pub fn new(user: User, server_id: impl Into<String>) -> Self {
        Self {
            user,
            server_id: server_id.into(),
            nickname: None,
            roles: Vec::new(),
            permissions: BTreeSet::new(),
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn id(&self) -> &str {
        &self.user.id
    }

    /// Server nickname, falling back to the user's shown name.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or_else(|| self.user.shown_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Text,
    Voice,
    DirectMessage,
    Group,
    SavedMessages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: Option<String>,
    pub kind: ChannelKind,
    /// Owning server, absent for DMs and groups.
    pub server_id: Option<String>,
}

impl Channel {
    pub fn text(id: impl Into<String>, name: impl Into<String>, server_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            kind: ChannelKind::Text,
            server_id: Some(server_id.into()),
        }
    }

    pub fn voice(id: impl Into<String>, name: impl Into<String>, server_id: impl Into<String>) -> Self {
        Self {
            kind: ChannelKind::Voice,
            ..Self::text(id, name, server_id)
        }
    }

    pub fn direct(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind: ChannelKind::DirectMessage,
            server_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
}

impl Role {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub channel_ids: Vec<String>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            channel_ids: Vec::new(),
        }
    }
}

/// A server snapshot: membership, channel ids, roles and categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub members: HashMap<String, Member>,
    pub channel_ids: Vec<String>,
    pub roles: Vec<Role>,
    pub categories: Vec<Category>,
}

impl Server {
    pub fn new(id: impl Into<String>, name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner_id: owner_id.into(),
            members: HashMap::new(),
            channel_ids: Vec::new(),
            roles: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.insert(member.user.id.clone(), member);
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_ids.push(channel_id.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.push(category);
        self
    }

    pub fn get_member(&self, user_id: &str) -> Option<&Member> {
        self.members.get(user_id)
    }

    pub fn get_role(&self, id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    pub fn get_category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn has_channel(&self, channel_id: &str) -> bool {
        self.channel_ids.iter().any(|c| c == channel_id)
    }
}

/// An incoming message as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub author: User,
    pub channel_id: String,
    pub server_id: Option<String>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        author: User,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            author,
            channel_id: channel_id.into(),
            server_id: None,
        }
    }

    pub fn in_server(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }
}

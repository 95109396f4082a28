//! Concurrent entity cache consulted by converters and checks.
//!
//! Populated by the transport as it learns about users, servers and
//! channels. Reads never block writers for long: each map is a `DashMap`
//! and servers are shared as `Arc` snapshots that are replaced wholesale.

use crate::model::{Channel, Server, User};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ClientState {
    users: DashMap<String, User>,
    servers: DashMap<String, Arc<Server>>,
    channels: DashMap<String, Channel>,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Insert or replace a server. Its members are also cached as users.
    pub fn insert_server(&self, server: Server) {
        for member in server.members.values() {
            self.users
                .entry(member.user.id.clone())
                .or_insert_with(|| member.user.clone());
        }
        self.servers.insert(server.id.clone(), Arc::new(server));
    }

    pub fn insert_channel(&self, channel: Channel) {
        self.channels.insert(channel.id.clone(), channel);
    }

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|u| u.value().clone())
    }

    /// Snapshot of every cached user.
    pub fn users(&self) -> Vec<User> {
        self.users.iter().map(|entry| entry.value().clone()).collect()
    }

    /// First cached user matching `predicate`, in no particular order.
    pub fn find_user(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .iter()
            .find(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
    }

    pub fn get_server(&self, id: &str) -> Option<Arc<Server>> {
        self.servers.get(id).map(|s| Arc::clone(s.value()))
    }

    pub fn get_channel(&self, id: &str) -> Option<Channel> {
        self.channels.get(id).map(|c| c.value().clone())
    }

    /// Channels belonging to `server`, in the server's channel order.
    pub fn server_channels(&self, server: &Server) -> Vec<Channel> {
        server
            .channel_ids
            .iter()
            .filter_map(|id| self.get_channel(id))
            .collect()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

//! Platform entity converters.
//!
//! Ids are 26-character alphanumeric strings and may be written as mentions
//! (`<@ID>` for users, `<#ID>` for channels). Anything else is matched by
//! name. Server-scoped lookups fail with [`ConverterError::ServerOnly`]
//! outside a server.

use super::Converter;
use crate::dispatch::Context;
use crate::error::ConverterError;
use crate::model::{Category, Channel, ChannelKind, Member, Role, Server, User};
use crate::value::Value;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};

static USER_MENTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^<?@?([A-Za-z0-9]{26})>?$").ok());

static CHANNEL_MENTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^<?#?([A-Za-z0-9]{26})>?$").ok());

fn mentioned_id<'a>(pattern: &Option<Regex>, argument: &'a str) -> Option<&'a str> {
    pattern
        .as_ref()?
        .captures(argument)?
        .get(1)
        .map(|m| m.as_str())
}

fn require_server(ctx: &Context, argument: &str) -> Result<Arc<Server>, ConverterError> {
    ctx.server()
        .ok_or_else(|| ConverterError::ServerOnly(argument.to_string()))
}

/// `name` or `name#discriminator`, tried against the account name first and
/// then the display name.
fn find_by_name<'a, T>(
    candidates: impl Iterator<Item = &'a T> + Clone,
    user_of: impl Fn(&T) -> &User,
    argument: &str,
) -> Option<&'a T> {
    let parts: Vec<&str> = argument.split('#').collect();
    let (name, discriminator) = match parts.as_slice() {
        [name] => (*name, None),
        [name, discriminator] => (*name, Some(*discriminator)),
        _ => return None,
    };
    let matches_discriminator =
        |user: &User| discriminator.is_none_or(|d| user.discriminator == d);

    candidates
        .clone()
        .find(|c| {
            let user = user_of(*c);
            user.name == name && matches_discriminator(user)
        })
        .or_else(|| {
            candidates.clone().find(|c| {
                let user = user_of(*c);
                user.display_name.as_deref() == Some(name) && matches_discriminator(user)
            })
        })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserConverter;

#[async_trait]
impl Converter for UserConverter {
    async fn convert(&self, ctx: &Context, argument: &str) -> Result<Value, ConverterError> {
        let state = ctx.client().state();
        if let Some(id) = mentioned_id(&USER_MENTION, argument) {
            return state
                .get_user(id)
                .map(Value::User)
                .ok_or_else(|| ConverterError::User(argument.to_string()));
        }

        let users = state.users();
        find_by_name(users.iter(), |u| u, argument)
            .cloned()
            .map(Value::User)
            .ok_or_else(|| ConverterError::User(argument.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemberConverter;

#[async_trait]
impl Converter for MemberConverter {
    async fn convert(&self, ctx: &Context, argument: &str) -> Result<Value, ConverterError> {
        let server = require_server(ctx, argument)?;
        let found = match mentioned_id(&USER_MENTION, argument) {
            Some(id) => server.get_member(id),
            None => find_by_name(server.members.values(), |m: &Member| &m.user, argument),
        };
        found
            .cloned()
            .map(Value::Member)
            .ok_or_else(|| ConverterError::Member(argument.to_string()))
    }
}

fn find_channel(
    ctx: &Context,
    server: &Server,
    argument: &str,
    accept: impl Fn(&Channel) -> bool,
) -> Option<Channel> {
    let state = ctx.client().state();
    if let Some(id) = mentioned_id(&CHANNEL_MENTION, argument) {
        let by_id = server
            .has_channel(id)
            .then(|| state.get_channel(id))
            .flatten()
            .filter(&accept);
        if by_id.is_some() {
            return by_id;
        }
    }
    state
        .server_channels(server)
        .into_iter()
        .find(|c| c.name.as_deref() == Some(argument) && accept(c))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelConverter;

#[async_trait]
impl Converter for ChannelConverter {
    async fn convert(&self, ctx: &Context, argument: &str) -> Result<Value, ConverterError> {
        let server = require_server(ctx, argument)?;
        find_channel(ctx, &server, argument, |_| true)
            .map(Value::Channel)
            .ok_or_else(|| ConverterError::Channel(argument.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextChannelConverter;

#[async_trait]
impl Converter for TextChannelConverter {
    async fn convert(&self, ctx: &Context, argument: &str) -> Result<Value, ConverterError> {
        let server = require_server(ctx, argument)?;
        find_channel(ctx, &server, argument, |c| c.kind == ChannelKind::Text)
            .map(Value::Channel)
            .ok_or_else(|| ConverterError::TextChannel(argument.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoleConverter;

#[async_trait]
impl Converter for RoleConverter {
    async fn convert(&self, ctx: &Context, argument: &str) -> Result<Value, ConverterError> {
        let server = require_server(ctx, argument)?;
        server
            .get_role(argument)
            .or_else(|| server.roles.iter().find(|r: &&Role| r.name == argument))
            .cloned()
            .map(Value::Role)
            .ok_or_else(|| ConverterError::Role(argument.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryConverter;

#[async_trait]
impl Converter for CategoryConverter {
    async fn convert(&self, ctx: &Context, argument: &str) -> Result<Value, ConverterError> {
        let server = require_server(ctx, argument)?;
        server
            .get_category(argument)
            .or_else(|| server.categories.iter().find(|c: &&Category| c.name == argument))
            .cloned()
            .map(Value::Category)
            .ok_or_else(|| ConverterError::Category(argument.to_string()))
    }
}

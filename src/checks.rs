//! Command checks.
//!
//! A check runs before cooldowns and argument parsing. Returning `Ok(false)`
//! rejects the invocation with a generic [`CommandError::CheckFailure`];
//! returning an error rejects it with that error, which lets built-in checks
//! report exactly why (e.g. [`CommandError::MissingPermissions`]).

use crate::dispatch::Context;
use crate::error::CommandError;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Check: Send + Sync {
    async fn check(&self, ctx: &Context) -> Result<bool, CommandError>;
}

struct CheckFn<F>(F);

#[async_trait]
impl<F> Check for CheckFn<F>
where
    F: Fn(&Context) -> bool + Send + Sync,
{
    async fn check(&self, ctx: &Context) -> Result<bool, CommandError> {
        Ok((self.0)(ctx))
    }
}

/// Wrap a synchronous predicate.
pub fn check_fn<F>(f: F) -> Arc<dyn Check>
where
    F: Fn(&Context) -> bool + Send + Sync + 'static,
{
    Arc::new(CheckFn(f))
}

/// Only usable inside a server.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerOnlyCheck;

#[async_trait]
impl Check for ServerOnlyCheck {
    async fn check(&self, ctx: &Context) -> Result<bool, CommandError> {
        match ctx.message.server_id {
            Some(_) => Ok(true),
            None => Err(CommandError::ServerOnly),
        }
    }
}

/// Only usable by an id listed in `owner_ids`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BotOwnerCheck;

#[async_trait]
impl Check for BotOwnerCheck {
    async fn check(&self, ctx: &Context) -> Result<bool, CommandError> {
        let author = &ctx.message.author.id;
        if ctx.client().config().owner_ids.iter().any(|id| id == author) {
            Ok(true)
        } else {
            Err(CommandError::NotBotOwner)
        }
    }
}

/// Only usable by the owner of the server it is invoked in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerOwnerCheck;

#[async_trait]
impl Check for ServerOwnerCheck {
    async fn check(&self, ctx: &Context) -> Result<bool, CommandError> {
        let server = ctx.server().ok_or(CommandError::ServerOnly)?;
        if server.owner_id == ctx.message.author.id {
            Ok(true)
        } else {
            Err(CommandError::NotServerOwner)
        }
    }
}

/// Requires every listed permission. The server owner has all of them.
#[derive(Debug, Clone, Default)]
pub struct PermissionsCheck {
    required: Vec<String>,
}

#[async_trait]
impl Check for PermissionsCheck {
    async fn check(&self, ctx: &Context) -> Result<bool, CommandError> {
        let server = ctx.server().ok_or(CommandError::ServerOnly)?;
        let author = &ctx.message.author.id;
        if &server.owner_id == author {
            return Ok(true);
        }

        let granted = server.get_member(author).map(|m| &m.permissions);
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|perm| !granted.is_some_and(|g| g.contains(*perm)))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(true)
        } else {
            Err(CommandError::MissingPermissions(missing))
        }
    }
}

pub fn server_only() -> Arc<dyn Check> {
    Arc::new(ServerOnlyCheck)
}

pub fn is_bot_owner() -> Arc<dyn Check> {
    Arc::new(BotOwnerCheck)
}

pub fn is_server_owner() -> Arc<dyn Check> {
    Arc::new(ServerOwnerCheck)
}

pub fn has_permissions(permissions: &[&str]) -> Arc<dyn Check> {
    Arc::new(PermissionsCheck {
        required: permissions.iter().map(|p| p.to_string()).collect(),
    })
}

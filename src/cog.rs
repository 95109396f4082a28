//! Cogs: named bundles of commands that share state.
//!
//! A cog is the handler owner for its commands. Handlers reach their cog
//! through [`Owner::cog`](crate::command::Owner::cog).

use crate::command::Command;
use std::any::Any;
use std::sync::Arc;

pub trait Cog: Any + Send + Sync {
    /// Registry name. Must be unique per client.
    fn qualified_name(&self) -> &str;

    /// Every command the cog defines, subcommands included. Called once,
    /// when the cog is added.
    fn commands(&self) -> Vec<Arc<Command>>;

    fn cog_load(&self) {}

    fn cog_unload(&self) {}

    fn as_any(&self) -> &dyn Any;
}

/// Identity comparison that ignores vtable differences.
pub(crate) fn same_cog(a: &Arc<dyn Cog>, b: &Arc<dyn Cog>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

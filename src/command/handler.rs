//! Handler seams: what a command runs and who it runs as.

use crate::cog::Cog;
use crate::dispatch::{CommandsClient, Context};
use crate::error::{CommandError, HandlerResult};
use crate::parameter::{Parameter, ParameterKind};
use crate::value::Value;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// The receiver of a handler call: the command's cog, else the client.
#[derive(Clone)]
pub enum Owner {
    Cog(Arc<dyn Cog>),
    Client(Arc<CommandsClient>),
}

impl Owner {
    /// The owning cog as its concrete type.
    pub fn cog<T: Cog>(&self) -> Option<&T> {
        match self {
            Self::Cog(cog) => cog.as_any().downcast_ref::<T>(),
            Self::Client(_) => None,
        }
    }

    pub fn is_cog(&self) -> bool {
        matches!(self, Self::Cog(_))
    }
}

impl std::fmt::Debug for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cog(cog) => f.debug_tuple("Cog").field(&cog.qualified_name()).finish(),
            Self::Client(_) => f.write_str("Client"),
        }
    }
}

/// Converted arguments, bound to parameter names.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    positional: Vec<(String, Value)>,
    keyword: HashMap<String, Value>,
}

impl Arguments {
    /// Pair positional values with the positional and variadic parameters
    /// they were parsed for.
    pub(crate) fn bind(
        parameters: &[Parameter],
        args: &[Value],
        kwargs: &HashMap<String, Value>,
    ) -> Self {
        let positional = parameters
            .iter()
            .filter(|p| p.kind() != ParameterKind::Rest)
            .zip(args)
            .map(|(p, v)| (p.name().to_string(), v.clone()))
            .collect();
        Self {
            positional,
            keyword: kwargs.clone(),
        }
    }

    /// Look up by parameter name, positional or keyword.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.positional
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .or_else(|| self.keyword.get(name))
    }

    pub fn at(&self, index: usize) -> Option<&Value> {
        self.positional.get(index).map(|(_, v)| v)
    }

    pub fn args(&self) -> impl Iterator<Item = &Value> {
        self.positional.iter().map(|(_, v)| v)
    }

    pub fn kwargs(&self) -> &HashMap<String, Value> {
        &self.keyword
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_int()
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_float()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    /// A variadic parameter's values; empty if absent.
    pub fn list(&self, name: &str) -> &[Value] {
        self.get(name).and_then(Value::as_list).unwrap_or(&[])
    }
}

#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, owner: Owner, ctx: &Context, args: Arguments) -> HandlerResult;
}

#[async_trait]
pub trait ErrorHandler: Send + Sync {
    /// Whatever this returns is the invocation's final result.
    async fn on_error(&self, owner: Owner, ctx: &Context, error: CommandError) -> HandlerResult;
}

struct HandlerFn<F>(F);

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(Owner, &'a Context, Arguments) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    async fn call(&self, owner: Owner, ctx: &Context, args: Arguments) -> HandlerResult {
        (self.0)(owner, ctx, args).await
    }
}

/// Wrap a closure returning a boxed future as a handler.
///
/// ```ignore
/// let ping = handler_fn(|_, ctx, _| Box::pin(async move { ctx.send("pong").await }));
/// ```
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: for<'a> Fn(Owner, &'a Context, Arguments) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    Arc::new(HandlerFn(f))
}

struct ErrorHandlerFn<F>(F);

#[async_trait]
impl<F> ErrorHandler for ErrorHandlerFn<F>
where
    F: for<'a> Fn(Owner, &'a Context, CommandError) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    async fn on_error(&self, owner: Owner, ctx: &Context, error: CommandError) -> HandlerResult {
        (self.0)(owner, ctx, error).await
    }
}

pub fn error_handler_fn<F>(f: F) -> Arc<dyn ErrorHandler>
where
    F: for<'a> Fn(Owner, &'a Context, CommandError) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    Arc::new(ErrorHandlerFn(f))
}

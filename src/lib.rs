//! slirc-commands - prefix command engine for chat bots.
//!
//! Messages go in through [`CommandsClient::process_commands`]. The client
//! strips a prefix, resolves the command (descending into groups), runs the
//! global and per-command checks, charges the cooldown bucket, converts each
//! argument to its declared type and calls the handler. Failures at any
//! stage are routed to the command's error handler, or to the client's
//! [`EventSink`].

pub mod checks;
pub mod cog;
pub mod command;
pub mod config;
pub mod converters;
pub mod cooldown;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod help;
pub mod metrics;
pub mod middleware;
pub mod model;
pub mod parameter;
pub mod state;
pub mod telemetry;
pub mod value;

pub use checks::{Check, check_fn, has_permissions, is_bot_owner, is_server_owner, server_only};
pub use cog::Cog;
pub use command::{
    Arguments, Command, CommandBuilder, ErrorHandler, Handler, Owner, error_handler_fn, handler_fn,
};
pub use config::Config;
pub use converters::{BuiltinType, Converter, TypeDescriptor, converter_fn};
pub use cooldown::{BucketType, Cooldown, CooldownMapping, KeyResolver, key_fn};
pub use dispatch::{ClientBuilder, CommandsClient, Context, DispatchOutcome};
pub use error::{CommandError, ConverterError, HandlerResult, RegistrationError};
pub use events::{EventSink, LogEvents};
pub use middleware::{Outgoing, ResponseMiddleware, Transport, TransportError};
pub use parameter::{DefaultValue, Parameter, ParameterKind, default_fn, parameter};
pub use value::Value;

pub use slirc_view;

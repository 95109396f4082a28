//! Unified error handling for slirc-commands.
//!
//! Every failure that can happen between reading a prefixed message and
//! returning from a handler is a [`CommandError`]. Converter failures are
//! [`ConverterError`]s, wrapped with the name of the parameter being bound.
//! Registration-time mistakes are [`RegistrationError`]s and never reach the
//! dispatch loop.

use crate::middleware::TransportError;
use slirc_view::ViewError;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Command errors (dispatch pipeline)
// ============================================================================

/// Errors raised while resolving, checking, parsing or running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// A global or command-local check returned false.
    #[error("check failed: {0}")]
    CheckFailure(String),

    #[error("this command can only be used by the bot owner")]
    NotBotOwner,

    #[error("this command can only be used by the server owner")]
    NotServerOwner,

    #[error("this command can only be used in a server")]
    ServerOnly,

    #[error("missing permissions: {}", .0.join(", "))]
    MissingPermissions(Vec<String>),

    #[error("missing required argument: {0}")]
    MissingRequiredArgument(String),

    #[error("could not convert argument for `{parameter}`: {source}")]
    Conversion {
        parameter: String,
        #[source]
        source: ConverterError,
    },

    #[error("command is on cooldown, retry in {:.2}s", .retry_after.as_secs_f64())]
    CommandOnCooldown { retry_after: Duration },

    /// The tokenizer could not read the argument list.
    #[error("malformed arguments: {0}")]
    View(#[from] ViewError),

    #[error("failed to send reply: {0}")]
    Transport(#[from] TransportError),

    /// Anything a handler raised that is not a command error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CommandError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CommandNotFound(_) => "command_not_found",
            Self::CheckFailure(_) => "check_failure",
            Self::NotBotOwner => "not_bot_owner",
            Self::NotServerOwner => "not_server_owner",
            Self::ServerOnly => "server_only",
            Self::MissingPermissions(_) => "missing_permissions",
            Self::MissingRequiredArgument(_) => "missing_required_argument",
            Self::Conversion { source, .. } => source.error_code(),
            Self::CommandOnCooldown { .. } => "command_on_cooldown",
            Self::View(ViewError::NoClosingQuote) => "no_closing_quote",
            Self::View(_) => "malformed_arguments",
            Self::Transport(_) => "transport_error",
            Self::Other(_) => "handler_error",
        }
    }

    /// Whether this is an authorization-class failure.
    pub fn is_check_failure(&self) -> bool {
        matches!(
            self,
            Self::CheckFailure(_)
                | Self::NotBotOwner
                | Self::NotServerOwner
                | Self::ServerOnly
                | Self::MissingPermissions(_)
        )
    }

    /// How long the caller must wait before retrying, for cooldown rejections.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::CommandOnCooldown { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// The parameter a conversion failure is attributed to.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::Conversion { parameter, .. } => Some(parameter),
            Self::MissingRequiredArgument(parameter) => Some(parameter),
            _ => None,
        }
    }
}

/// Result type for handlers and error handlers.
pub type HandlerResult = Result<(), CommandError>;

// ============================================================================
// Converter errors
// ============================================================================

/// Typed converter failures. Every variant carries the argument that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConverterError {
    #[error("`{argument}` is not one of: {}", .allowed.join(", "))]
    InvalidLiteral {
        argument: String,
        allowed: Vec<String>,
    },

    #[error("`{0}` is not a boolean")]
    BadBool(String),

    #[error("`{0}` is not an integer")]
    BadInt(String),

    #[error("`{0}` is not a number")]
    BadFloat(String),

    #[error("user `{0}` not found")]
    User(String),

    #[error("member `{0}` not found")]
    Member(String),

    #[error("channel `{0}` not found")]
    Channel(String),

    #[error("text channel `{0}` not found")]
    TextChannel(String),

    #[error("role `{0}` not found")]
    Role(String),

    #[error("category `{0}` not found")]
    Category(String),

    /// Every member of a non-optional union failed.
    #[error("`{0}` did not match any accepted type")]
    Union(String),

    /// The converter needs a server and the message was not sent in one.
    #[error("`{0}` can only be resolved in a server")]
    ServerOnly(String),

    /// Failure reported by a user-supplied converter.
    #[error("`{argument}`: {reason}")]
    Custom { argument: String, reason: String },
}

impl ConverterError {
    /// Build a failure for a user-supplied converter.
    pub fn custom(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Custom {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// The argument that made the converter fail.
    pub fn argument(&self) -> &str {
        match self {
            Self::InvalidLiteral { argument, .. } | Self::Custom { argument, .. } => argument,
            Self::BadBool(arg)
            | Self::BadInt(arg)
            | Self::BadFloat(arg)
            | Self::User(arg)
            | Self::Member(arg)
            | Self::Channel(arg)
            | Self::TextChannel(arg)
            | Self::Role(arg)
            | Self::Category(arg)
            | Self::Union(arg)
            | Self::ServerOnly(arg) => arg,
        }
    }

    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidLiteral { .. } => "invalid_literal",
            Self::BadBool(_) => "bad_bool",
            Self::BadInt(_) => "bad_int",
            Self::BadFloat(_) => "bad_float",
            Self::User(_) => "user_not_found",
            Self::Member(_) => "member_not_found",
            Self::Channel(_) => "channel_not_found",
            Self::TextChannel(_) => "text_channel_not_found",
            Self::Role(_) => "role_not_found",
            Self::Category(_) => "category_not_found",
            Self::Union(_) => "union_conversion",
            Self::ServerOnly(_) => "server_only",
            Self::Custom { .. } => "converter_error",
        }
    }
}

// ============================================================================
// Registration errors
// ============================================================================

/// Mistakes made while building or registering commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The name or alias is already taken by another command in this scope.
    #[error("`{0}` is already registered in this scope")]
    Duplicate(String),

    #[error("`{0}` is not a group and cannot hold subcommands")]
    NotAGroup(String),

    #[error("parameter `{parameter}` names unknown type `{type_name}`")]
    UnresolvedType {
        parameter: String,
        type_name: String,
    },
}

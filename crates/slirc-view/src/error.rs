//! Tokenizer errors.

use thiserror::Error;

/// Failures raised while reading tokens from a [`crate::StringView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ViewError {
    /// No token remains in the input.
    #[error("end of input")]
    EndOfInput,

    /// A quoted token was opened but never closed.
    #[error("no closing quote")]
    NoClosingQuote,
}

//! # slirc-view
//!
//! A cursor over the argument portion of a command line.
//!
//! Command lines are read one token at a time. A token is either a bare word
//! (a run of non-whitespace) or a double-quoted string that may contain
//! whitespace and the escapes `\"` and `\\`. The remainder of the line can be
//! taken as a single untokenized string, and the most recent read can be
//! undone so callers can look ahead and backtrack.
//!
//! ```
//! use slirc_view::{Cursor, StringView, ViewError};
//!
//! let mut view = StringView::new(r#"ban "some user" spamming links"#);
//! assert_eq!(view.next_word().unwrap(), "ban");
//! assert_eq!(view.next_word().unwrap(), "some user");
//! view.undo();
//! assert_eq!(view.next_word().unwrap(), "some user");
//! assert_eq!(view.rest(), "spamming links");
//! assert_eq!(view.next_word(), Err(ViewError::EndOfInput));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod parse;
mod view;

pub use error::ViewError;
pub use view::{Cursor, StringView};

//! The [`Cursor`] trait and its [`StringView`] implementation.

use crate::{parse, ViewError};

/// Token-at-a-time access to the unconsumed part of a command line.
///
/// Implementations must be cheap to call repeatedly; the command engine reads
/// one token per parameter and backtracks with [`Cursor::undo`] when a token
/// does not belong to the parameter it tried.
pub trait Cursor: Send + Sync {
    /// Consume and return the next word or quoted string.
    ///
    /// Fails with [`ViewError::EndOfInput`] when only whitespace remains. A
    /// failed read never moves the cursor.
    fn next_word(&mut self) -> Result<String, ViewError>;

    /// Consume everything that is left, trimmed. Returns an empty string when
    /// the input is exhausted.
    fn rest(&mut self) -> String;

    /// Push back the most recently consumed token (or rest). Calling it twice,
    /// or before any successful read, does nothing.
    fn undo(&mut self);
}

/// A [`Cursor`] over an owned command line.
#[derive(Debug, Clone)]
pub struct StringView {
    input: String,
    pos: usize,
    last: Option<usize>,
}

impl StringView {
    /// Create a view positioned at the start of `input`.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            pos: 0,
            last: None,
        }
    }

    /// The unconsumed input, untrimmed.
    pub fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }

    /// Whether only whitespace is left.
    pub fn is_exhausted(&self) -> bool {
        self.remaining().trim().is_empty()
    }

    /// Byte offset of the cursor into the original input.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Cursor for StringView {
    fn next_word(&mut self) -> Result<String, ViewError> {
        let (rest, word) = parse::word(self.remaining())?;
        let consumed = self.remaining().len() - rest.len();
        self.last = Some(self.pos);
        self.pos += consumed;
        Ok(word)
    }

    fn rest(&mut self) -> String {
        let rest = self.remaining().trim().to_owned();
        self.last = Some(self.pos);
        self.pos = self.input.len();
        rest
    }

    fn undo(&mut self) {
        if let Some(pos) = self.last.take() {
            self.pos = pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_words_then_end() {
        let mut view = StringView::new("a  b\tc");
        assert_eq!(view.next_word().unwrap(), "a");
        assert_eq!(view.next_word().unwrap(), "b");
        assert_eq!(view.next_word().unwrap(), "c");
        assert_eq!(view.next_word(), Err(ViewError::EndOfInput));
        assert!(view.is_exhausted());
    }

    #[test]
    fn test_position_advances_past_each_token() {
        let mut view = StringView::new(r#"héllo "two words" ünd"#);
        assert_eq!(view.next_word().unwrap(), "héllo");
        assert_eq!(view.position(), "héllo".len());
        assert_eq!(view.next_word().unwrap(), "two words");
        assert_eq!(view.position(), r#"héllo "two words""#.len());
        assert_eq!(view.remaining(), " ünd");
        assert_eq!(view.next_word().unwrap(), "ünd");
        assert_eq!(view.position(), view.input.len());
    }

    #[test]
    fn test_undo_restores_position() {
        let mut view = StringView::new("one two");
        view.next_word().unwrap();
        let before = view.position();
        view.next_word().unwrap();
        view.undo();
        assert_eq!(view.position(), before);
        assert_eq!(view.next_word().unwrap(), "two");
    }

    #[test]
    fn test_undo_is_single_step() {
        let mut view = StringView::new("one two");
        view.next_word().unwrap();
        view.next_word().unwrap();
        view.undo();
        view.undo();
        assert_eq!(view.next_word().unwrap(), "two");
    }

    #[test]
    fn test_undo_before_read_is_noop() {
        let mut view = StringView::new("one");
        view.undo();
        assert_eq!(view.position(), 0);
        assert_eq!(view.next_word().unwrap(), "one");
    }

    #[test]
    fn test_failed_read_does_not_move() {
        let mut view = StringView::new(r#"ok "broken"#);
        view.next_word().unwrap();
        let before = view.position();
        assert_eq!(view.next_word(), Err(ViewError::NoClosingQuote));
        assert_eq!(view.position(), before);
        // the previous token can still be pushed back
        view.undo();
        assert_eq!(view.next_word().unwrap(), "ok");
    }

    #[test]
    fn test_rest_keeps_inner_spacing() {
        let mut view = StringView::new("say  hello   there  ");
        view.next_word().unwrap();
        assert_eq!(view.rest(), "hello   there");
        assert_eq!(view.rest(), "");
    }

    #[test]
    fn test_rest_can_be_undone() {
        let mut view = StringView::new("a b c");
        view.next_word().unwrap();
        assert_eq!(view.rest(), "b c");
        view.undo();
        assert_eq!(view.next_word().unwrap(), "b");
    }

    proptest! {
        #[test]
        fn undo_then_read_yields_same_token(words in prop::collection::vec("[a-z0-9]{1,8}", 1..8)) {
            let mut view = StringView::new(words.join(" "));
            for expected in &words {
                let first = view.next_word().unwrap();
                view.undo();
                let second = view.next_word().unwrap();
                prop_assert_eq!(&first, expected);
                prop_assert_eq!(first, second);
            }
            prop_assert_eq!(view.next_word(), Err(ViewError::EndOfInput));
        }
    }
}

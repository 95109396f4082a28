//! nom parsers for single tokens.

use crate::ViewError;
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_while, take_while1},
    character::complete::char,
    combinator::{map, opt, value},
    sequence::delimited,
    IResult,
};

/// Skip leading whitespace.
fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

/// A double-quoted token. `\"` and `\\` are the only escapes.
fn quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((value("\\", tag("\\")), value("\"", tag("\"")))),
            )),
            |inner: Option<String>| inner.unwrap_or_default(),
        ),
        char('"'),
    )(input)
}

/// A run of non-whitespace characters.
fn bare(input: &str) -> IResult<&str, String> {
    map(take_while1(|c: char| !c.is_whitespace()), str::to_owned)(input)
}

/// Read the next token from `input`, returning the unconsumed remainder.
pub(crate) fn word(input: &str) -> Result<(&str, String), ViewError> {
    let (input, _) = whitespace(input).map_err(|_| ViewError::EndOfInput)?;

    if input.is_empty() {
        return Err(ViewError::EndOfInput);
    }

    if input.starts_with('"') {
        quoted(input).map_err(|_| ViewError::NoClosingQuote)
    } else {
        bare(input).map_err(|_| ViewError::EndOfInput)
    }
}

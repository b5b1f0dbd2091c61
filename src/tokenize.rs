//! Field tokeniser for raw history-log lines.
//!
//! A line is a 21-character header, a command envelope, and a run of
//! caret-delimited data fields:
//!
//! ```text
//! E202310100510083031R ^S01EVFFADMIN^FEEPLRIV^FcNONE^NQ31221112079020^^O00049
//! ```
//!
//! The envelope (`S` + two station digits + two-character command tag +
//! remainder) is the one token that breaks the "two-character tag then
//! value" rule: its remainder is itself a data-coded field (typically the
//! `FF`/`FW`/`FE` station login) concatenated without a separating caret,
//! and must be handed back to the payload stream.

/// A raw line split into header, command envelope, and payload fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields<'a> {
    /// Token 0: the `E<timestamp><station>R ` header.
    pub header: &'a str,
    /// Token 1, if any: the command envelope.
    pub envelope: Option<&'a str>,
    /// Remaining tokens in input order.
    pub payload: Vec<&'a str>,
}

/// Split a raw line on `^` and classify the tokens.
pub fn split_line(line: &str) -> Fields<'_> {
    let mut tokens = line.split('^');
    let header = tokens.next().unwrap_or("");
    let envelope = tokens.next();
    Fields {
        header,
        envelope,
        payload: tokens.collect(),
    }
}

/// Decompose a command envelope into `(command_tag, remainder)`.
///
/// An envelope of at least five characters starting with `S` yields the
/// two-character command tag at positions 3..5 and the concatenated
/// data-code remainder after it. Anything else is treated as a bare command
/// tag with no remainder, which lets the command translator fall back to
/// the raw token.
pub fn split_envelope(token: &str) -> (&str, &str) {
    if token.starts_with('S') && token.len() >= 5 {
        if let (Some(tag), Some(rest)) = (token.get(3..5), token.get(5..)) {
            return (tag, rest);
        }
    }
    (token, "")
}

/// True for the structural `O`-sentinel fields (`O`, `O0`, `O00049`, ...)
/// that terminate transactions and carry no data.
pub fn is_sentinel(token: &str) -> bool {
    token
        .strip_prefix('O')
        .is_some_and(|rest| rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Split a payload token into its two-character data-code tag and value.
///
/// Tokens too short (or badly aligned) to carry a tag come back whole, as
/// the tag, with an empty value.
pub fn split_data(token: &str) -> (&str, &str) {
    match (token.get(..2), token.get(2..)) {
        (Some(tag), Some(value)) => (tag, value),
        _ => (token, ""),
    }
}

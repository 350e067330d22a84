//! Protocol line parsing.
//!
//! A line has the shape:
//!
//! ```text
//! [':' prefix ' '] command (' ' middle){0,14} [' ' [':'] trailing]
//! ```
//!
//! Parsing captures exactly four fields. Optional groups that are absent
//! come back as empty strings, never as missing values, so downstream
//! handler contracts stay stable.

use std::str::FromStr;

use nom::{
    bytes::complete::take_while1,
    character::complete::char,
    combinator::opt,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::validate_prefix;

/// Maximum number of middle parameters per line. Tokens past this
/// bound fold into the trailing parameter.
pub const MAX_MIDDLE_PARAMS: usize = 14;

/// One parsed protocol line.
///
/// All four fields are always present; an absent optional group yields an
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Sender prefix (`nick!user@host` or a server name), without the
    /// leading `:`. Empty when the line carried no prefix.
    pub prefix: String,
    /// The command verb or 3-digit numeric code.
    pub command: String,
    /// The middle-parameter span: tokens joined by single spaces. Empty
    /// when the line carried no middle parameters.
    pub middle: String,
    /// The trailing parameter, without its introducing `:`. May contain
    /// spaces. Empty when absent.
    pub trailing: String,
}

/// Parse the prefix segment (after `:`, up to the first space).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the command token (contiguous non-space characters).
fn parse_command(input: &str) -> IResult<&str, &str> {
    take_while1(|c| c != ' ')(input)
}

/// Collect middle parameters and the trailing parameter from the rest of
/// the line.
///
/// A middle token starts with anything but `:`; at most
/// [`MAX_MIDDLE_PARAMS`] are taken. The first ` :` stops the middle run
/// and introduces the trailing parameter; once the middle run stops for
/// any other reason, a remaining ` rest` also becomes the trailing
/// parameter (with one optional leading `:` stripped), mirroring the
/// lenient grammar this client has always spoken.
fn parse_params(input: &str) -> (SmallVec<[&str; MAX_MIDDLE_PARAMS]>, &str) {
    let mut middles: SmallVec<[&str; MAX_MIDDLE_PARAMS]> = SmallVec::new();
    let mut rest = input;

    while middles.len() < MAX_MIDDLE_PARAMS {
        let Some(after_space) = rest.strip_prefix(' ') else {
            break;
        };
        let first = after_space.as_bytes().first().copied();
        if first.is_none() || first == Some(b':') || first == Some(b' ') {
            break;
        }
        let end = after_space.find(' ').unwrap_or(after_space.len());
        middles.push(&after_space[..end]);
        rest = &after_space[end..];
    }

    let trailing = match rest.strip_prefix(' ') {
        Some(tail) => tail.strip_prefix(':').unwrap_or(tail),
        None => "",
    };

    (middles, trailing)
}

impl Message {
    /// Parse one line (terminator optional) into a [`Message`].
    fn parse(line: &str) -> Result<Self, MessageParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let (rest, prefix) =
            opt(parse_prefix)(line).map_err(|_: nom::Err<nom::error::Error<&str>>| {
                MessageParseError::MissingCommand
            })?;
        let prefix = prefix.unwrap_or("");

        if !validate_prefix(prefix) {
            return Err(MessageParseError::InvalidPrefix(prefix.to_owned()));
        }

        // A prefix must be followed by a space and a command
        let rest = if prefix.is_empty() {
            rest
        } else {
            rest.strip_prefix(' ')
                .ok_or(MessageParseError::MissingCommand)?
        };

        let (rest, command) = parse_command(rest)
            .map_err(|_: nom::Err<nom::error::Error<&str>>| MessageParseError::MissingCommand)?;

        let (middles, trailing) = parse_params(rest);

        Ok(Message {
            prefix: prefix.to_owned(),
            command: command.to_owned(),
            middle: middles.join(" "),
            trailing: trailing.to_owned(),
        })
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        Message::parse(s).map_err(|cause| ProtocolError::InvalidMessage {
            string: s.trim_end_matches(['\r', '\n']).to_owned(),
            cause,
        })
    }
}

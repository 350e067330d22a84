//! # corvid-proto
//!
//! Protocol support for the corvid IRC client: CRLF line framing and
//! message parsing.
//!
//! ## Features
//!
//! - Single-pass parsing of protocol lines into prefix, command, middle
//!   parameters, and trailing text
//! - Prefix (`nick!user@host`) validation and nickname extraction
//! - Line-oriented tokio codec with the standard 512-byte limit
//!
//! ## Quick Start
//!
//! ```rust
//! use corvid_proto::Message;
//!
//! let msg: Message = ":nick!user@host PRIVMSG #chan :hello".parse().unwrap();
//! assert_eq!(msg.prefix, "nick!user@host");
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.middle, "#chan");
//! assert_eq!(msg.trailing, "hello");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod line;
pub mod message;
pub mod prefix;

pub use self::error::{MessageParseError, ProtocolError};
pub use self::line::{LineCodec, MAX_LINE_LEN};
pub use self::message::Message;
pub use self::prefix::nickname;

//! Line-based codec for tokio.
//!
//! Frames CRLF-terminated lines out of a byte stream. Decoding yields
//! one complete line at a time with the terminator stripped, so exactly
//! one line is ever in flight for processing.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::error::{self, ProtocolError};

/// Maximum line length in bytes, terminator included (IRC standard).
pub const MAX_LINE_LEN: usize = 512;

/// Codec that frames newline-terminated lines.
///
/// Lines are limited to [`MAX_LINE_LEN`] bytes by default. A bare `\n`
/// terminator is accepted on decode; an optional preceding `\r` is
/// stripped along with it.
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
}

impl LineCodec {
    /// Create a new codec with the standard line limit.
    pub fn new() -> Self {
        Self {
            next_index: 0,
            max_len: MAX_LINE_LEN,
        }
    }

    /// Create a new codec with a custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        // Look for a newline starting from where the last scan stopped
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let text = std::str::from_utf8(&line).map_err(|e| ProtocolError::InvalidUtf8 {
                byte_pos: e.valid_up_to(),
            })?;

            Ok(Some(text.trim_end_matches(['\r', '\n']).to_owned()))
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();

            // A partial line past the limit will never become valid
            if src.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

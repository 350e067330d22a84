//! Error types surfaced by the client.
//!
//! Transport-level failures (connect, read, write, queue overflow) are
//! handled internally by reconnecting and never appear here; this module
//! covers the conditions the owner of a [`crate::Client`] must decide on.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by [`crate::Client::run`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Hostname resolution produced zero candidate addresses.
    ///
    /// Unlike transient transport failures this does not trigger a
    /// retry; the owner decides whether to treat it as fatal.
    #[error("no addresses resolved for {host}:{port}")]
    Resolve {
        /// Hostname that failed to resolve.
        host: String,
        /// Port used for resolution.
        port: u16,
    },

    /// The reconnect ceiling was reached without a successful connect.
    #[error("giving up after {attempts} failed connection attempts")]
    RetriesExhausted {
        /// Number of consecutive failed attempts.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last: std::io::Error,
    },

    /// Invalid settings.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

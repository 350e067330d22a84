//! Per-connection event loop.
//!
//! One cooperative loop drives everything for an established connection:
//! the framed read side (exactly one line in flight, parsed and
//! dispatched before the next read is armed) and the write side (only
//! the front buffer of the outbox is ever submitted, partial writes
//! trimmed as they complete). Both directions funnel every failure into
//! [`SessionEnd::Transport`] for the connection manager to act on.

use std::io;

use corvid_proto::{LineCodec, Message, ProtocolError};
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::FramedRead;
use tracing::{debug, trace, warn};

use super::dispatch::{Context, Registry};
use super::outbox::Outbox;
use crate::config::Settings;

/// Why a session ended.
pub(crate) enum SessionEnd {
    /// A handler requested a deliberate stop; no reconnect.
    Shutdown,
    /// The transport failed; the connection manager restarts from
    /// resolution.
    Transport(io::Error),
}

/// Mutable per-connection state shared between the event loop and the
/// handler context. Reset wholesale on reconnect.
pub(crate) struct SessionState {
    pub(crate) outbox: Outbox,
    pub(crate) shutdown: bool,
}

impl SessionState {
    pub(crate) fn new(max_pending: usize) -> Self {
        Self {
            outbox: Outbox::new(max_pending),
            shutdown: false,
        }
    }
}

/// Drive one established connection until it fails or a handler asks to
/// stop.
///
/// The caller has already enqueued the identification lines and run the
/// on-connect callbacks; this loop transmits whatever is pending and
/// processes inbound lines one at a time.
pub(crate) async fn run_session<S>(
    stream: S,
    registry: &mut Registry,
    settings: &Settings,
    state: &mut SessionState,
) -> SessionEnd
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut lines = FramedRead::new(read_half, LineCodec::new());

    loop {
        if state.shutdown {
            flush_pending(&mut write_half, state).await;
            return SessionEnd::Shutdown;
        }
        if state.outbox.overflowed() {
            return SessionEnd::Transport(io::Error::other("write queue overflow"));
        }

        match state.outbox.front() {
            Some(chunk) => {
                // The write arm submits only the front buffer; dropping
                // the write future on a read wakeup is safe because a
                // single poll_write either transfers bytes or does
                // nothing.
                tokio::select! {
                    biased;
                    written = write_half.write(&chunk) => match written {
                        Ok(0) => {
                            return SessionEnd::Transport(io::Error::new(
                                io::ErrorKind::WriteZero,
                                "transport closed mid-write",
                            ));
                        }
                        Ok(n) => state.outbox.advance(n),
                        Err(e) => return SessionEnd::Transport(e),
                    },
                    item = lines.next() => {
                        if let Some(end) = on_read(item, registry, settings, state) {
                            return end;
                        }
                    }
                }
            }
            None => {
                let item = lines.next().await;
                if let Some(end) = on_read(item, registry, settings, state) {
                    return end;
                }
            }
        }
    }
}

/// Process one framed read completion. `None` keeps the loop running.
fn on_read(
    item: Option<Result<String, ProtocolError>>,
    registry: &mut Registry,
    settings: &Settings,
    state: &mut SessionState,
) -> Option<SessionEnd> {
    match item {
        Some(Ok(line)) => {
            trace!(line = %line, "recv");
            match line.parse::<Message>() {
                Ok(msg) => {
                    let mut ctx = Context {
                        outbox: &mut state.outbox,
                        nick: &settings.nick,
                        shutdown: &mut state.shutdown,
                    };
                    registry.dispatch(&mut ctx, &msg);
                }
                Err(e) => {
                    // Recoverable: skip the line, keep reading
                    warn!(error = %e, "ignoring unparseable line");
                }
            }
            None
        }
        Some(Err(ProtocolError::InvalidUtf8 { byte_pos })) => {
            warn!(byte_pos, "ignoring non-UTF-8 line");
            None
        }
        Some(Err(ProtocolError::Io(e))) => Some(SessionEnd::Transport(e)),
        Some(Err(e)) => {
            // Framing-level failure (oversized line): the buffer state is
            // unrecoverable, reconnect with fresh buffers
            Some(SessionEnd::Transport(io::Error::other(e.to_string())))
        }
        None => Some(SessionEnd::Transport(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed by server",
        ))),
    }
}

/// Best-effort flush of pending writes before a deliberate shutdown.
async fn flush_pending<W: AsyncWrite + Unpin>(write_half: &mut W, state: &mut SessionState) {
    for buf in state.outbox.drain() {
        if let Err(e) = write_half.write_all(&buf).await {
            debug!(error = %e, "flush on shutdown failed");
            return;
        }
    }
    let _ = write_half.shutdown().await;
}

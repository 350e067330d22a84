//! Outbound write queue.
//!
//! Ordered sequence of CRLF-terminated byte buffers awaiting
//! transmission. The front buffer is the only one ever submitted to the
//! transport; partial writes trim it in place, and a buffer is removed
//! only once fully drained. Order is strictly FIFO.

use bytes::{Buf, Bytes, BytesMut};
use std::collections::VecDeque;
use tracing::{trace, warn};

/// Default bound on pending buffers before the queue reports overflow.
pub(crate) const DEFAULT_MAX_PENDING: usize = 1024;

/// FIFO queue of pending outbound lines.
pub(crate) struct Outbox {
    queue: VecDeque<Bytes>,
    max_pending: usize,
    overflowed: bool,
}

impl Outbox {
    pub(crate) fn new(max_pending: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max_pending,
            overflowed: false,
        }
    }

    /// Append a line, CRLF-terminated, to the back of the queue.
    ///
    /// Past the depth bound the line is dropped and the overflow flag
    /// latches; the session loop turns that into a transport failure.
    pub(crate) fn push(&mut self, line: &str) {
        if self.queue.len() >= self.max_pending {
            warn!(depth = self.queue.len(), "write queue full, dropping line");
            self.overflowed = true;
            return;
        }

        trace!(line = %line, "enqueue");
        let mut buf = BytesMut::with_capacity(line.len() + 2);
        buf.extend_from_slice(line.as_bytes());
        buf.extend_from_slice(b"\r\n");
        self.queue.push_back(buf.freeze());
    }

    /// The buffer currently eligible for transmission. The clone is
    /// zero-copy; only [`advance`](Self::advance) changes queue state.
    pub(crate) fn front(&self) -> Option<Bytes> {
        self.queue.front().cloned()
    }

    /// Trim `n` transmitted bytes from the front buffer, removing it
    /// once fully drained.
    pub(crate) fn advance(&mut self, n: usize) {
        if let Some(front) = self.queue.front_mut() {
            front.advance(n.min(front.len()));
            if front.is_empty() {
                self.queue.pop_front();
            }
        }
    }

    pub(crate) fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Drain every pending buffer, front first. Used for the best-effort
    /// flush on deliberate shutdown.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Bytes> + '_ {
        self.queue.drain(..)
    }
}

//! Command dispatch.
//!
//! Maps a command identifier to an ordered list of handler callbacks and
//! invokes them synchronously on the client's event-loop task. Keys are
//! compared by exact text equality; no case normalization is performed,
//! matching the wire protocol's uppercase verbs and numeric codes.
//!
//! Handlers run to completion before the next line is read; a handler
//! that blocks stalls the entire client, keepalive included. This is a
//! constraint of the single-threaded cooperative model.

use std::collections::HashMap;

use corvid_proto::Message;
use tracing::trace;

use super::outbox::Outbox;

/// Capability handle passed to every handler and on-connect callback.
///
/// Exposes the client's public surface: enqueueing outbound lines and
/// requesting a deliberate shutdown. None of these operations block;
/// they append to the write queue drained by the event loop.
pub struct Context<'a> {
    pub(crate) outbox: &'a mut Outbox,
    pub(crate) nick: &'a str,
    pub(crate) shutdown: &'a mut bool,
}

impl Context<'_> {
    /// The nickname this client identified with.
    pub fn nick(&self) -> &str {
        self.nick
    }

    /// Enqueue a JOIN for `channel`.
    pub fn join(&mut self, channel: &str) {
        self.send_raw(&format!("JOIN {channel}"));
    }

    /// Enqueue a PRIVMSG to `target` (a channel or a nick).
    pub fn say(&mut self, target: &str, message: &str) {
        self.send_raw(&format!("PRIVMSG {target} :{message}"));
    }

    /// Enqueue one raw protocol line (terminator appended by the queue).
    pub fn send_raw(&mut self, line: &str) {
        self.outbox.push(line);
    }

    /// Stop the client deliberately: pending writes are flushed, the
    /// connection is closed, and `run` returns `Ok` instead of
    /// reconnecting.
    pub fn shutdown(&mut self) {
        *self.shutdown = true;
    }
}

/// Callback invoked for a matching inbound message.
pub trait Handler: Send {
    /// Handle one parsed message.
    fn handle(&mut self, ctx: &mut Context<'_>, msg: &Message);
}

impl<F> Handler for F
where
    F: FnMut(&mut Context<'_>, &Message) + Send,
{
    fn handle(&mut self, ctx: &mut Context<'_>, msg: &Message) {
        self(ctx, msg)
    }
}

type ConnectCallback = Box<dyn FnMut(&mut Context<'_>) + Send>;

/// Registry of command handlers and on-connect callbacks.
///
/// Entries are append-only for the lifetime of the client; handlers
/// registered under the same command fire in registration order.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<String, Vec<Box<dyn Handler>>>,
    on_connect: Vec<ConnectCallback>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `command` (exact-case key).
    pub(crate) fn register(&mut self, command: impl Into<String>, handler: impl Handler + 'static) {
        self.handlers
            .entry(command.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Append an on-connect callback.
    pub(crate) fn register_on_connect<F>(&mut self, callback: F)
    where
        F: FnMut(&mut Context<'_>) + Send + 'static,
    {
        self.on_connect.push(Box::new(callback));
    }

    /// Invoke every handler registered for `msg.command`, in
    /// registration order. A command with no handlers is a no-op.
    pub(crate) fn dispatch(&mut self, ctx: &mut Context<'_>, msg: &Message) {
        let Some(handlers) = self.handlers.get_mut(&msg.command) else {
            trace!(command = %msg.command, "no handler registered");
            return;
        };
        for handler in handlers {
            handler.handle(ctx, msg);
        }
    }

    /// Invoke every on-connect callback, in registration order.
    pub(crate) fn run_on_connect(&mut self, ctx: &mut Context<'_>) {
        for callback in &mut self.on_connect {
            callback(ctx);
        }
    }
}

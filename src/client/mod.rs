//! Connection management and the public client surface.
//!
//! [`Client`] owns the handler registry and drives the connection
//! lifecycle: resolve, connect, identify, then hand the stream to the
//! session loop. Transient failures back off and retry under the
//! configured [`ReconnectPolicy`](crate::config::ReconnectPolicy);
//! unresolvable hosts and exhausted retries surface as
//! [`ClientError`](crate::error::ClientError).

mod dispatch;
mod outbox;
mod session;

use std::io;
use std::net::SocketAddr;

use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::ClientError;
use session::{SessionEnd, SessionState};

pub use dispatch::{Context, Handler};

/// Where the client currently is in its lifecycle. Progression is
/// strictly forward through a connection attempt; any failure past
/// `Disconnected` falls back to `Disconnected` before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Disconnected,
    Resolving,
    Connecting,
    Identifying,
    Ready,
}

/// An asynchronous chat client.
///
/// Handlers are registered up front, then [`Client::run`] takes over the
/// task until a handler requests shutdown or reconnection attempts are
/// exhausted.
///
/// ```no_run
/// use corvid::{Client, Config, Context, Message};
///
/// # async fn demo() -> anyhow::Result<()> {
/// let config = Config::load("config.toml")?;
/// let mut client = Client::new(config.client);
/// client.register_handler("PRIVMSG", |_ctx: &mut Context<'_>, msg: &Message| {
///     tracing::info!(from = %msg.prefix, text = %msg.trailing, "message");
/// });
/// client.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    settings: Settings,
    registry: dispatch::Registry,
    state: ConnectionState,
}

impl Client {
    /// Create a client from connection settings. A PONG responder for
    /// server PINGs is pre-registered; everything else is up to the
    /// caller.
    pub fn new(settings: Settings) -> Self {
        let mut registry = dispatch::Registry::new();
        registry.register("PING", |ctx: &mut Context<'_>, msg: &corvid_proto::Message| {
            ctx.send_raw(&format!("PONG :{}", msg.trailing));
        });
        Self {
            settings,
            registry,
            state: ConnectionState::Disconnected,
        }
    }

    /// Connection settings this client was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Register a handler for a command. Commands match exactly as the
    /// server sends them; handlers for the same command run in
    /// registration order.
    pub fn register_handler(&mut self, command: impl Into<String>, handler: impl Handler + 'static) {
        self.registry.register(command, handler);
    }

    /// Register a callback to run each time a connection reaches the
    /// ready state, after the identification lines are queued.
    pub fn register_on_connect<F>(&mut self, callback: F)
    where
        F: FnMut(&mut Context<'_>) + Send + 'static,
    {
        self.registry.register_on_connect(callback);
    }

    /// Run the client until shutdown or until reconnection gives up.
    ///
    /// Each pass resolves the host fresh, connects to the first
    /// candidate address, queues `USER`/`NICK`, runs the on-connect
    /// callbacks, and enters the session loop. A successful connection
    /// resets the failure counter; consecutive failures beyond
    /// `reconnect.max_attempts` end the run with
    /// [`ClientError::RetriesExhausted`].
    pub async fn run(&mut self) -> Result<(), ClientError> {
        let policy = self.settings.reconnect.clone();
        let mut failures: u32 = 0;

        loop {
            let outcome = self.connect_once().await?;
            // A connection that made it all the way up earns a fresh
            // retry budget, even if it dropped later
            if self.state == ConnectionState::Ready {
                failures = 0;
            }
            self.state = ConnectionState::Disconnected;

            let last = match outcome {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            failures += 1;
            if failures > policy.max_attempts {
                return Err(ClientError::RetriesExhausted {
                    attempts: failures,
                    last,
                });
            }

            let delay = policy.delay_for(failures);
            warn!(
                error = %last,
                attempt = failures,
                delay_secs = delay.as_secs(),
                "connection lost, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One resolve-connect-session pass. The outer `Result` carries
    /// fatal errors; the inner one distinguishes a clean shutdown from a
    /// transient failure worth retrying.
    async fn connect_once(&mut self) -> Result<Result<(), io::Error>, ClientError> {
        self.state = ConnectionState::Resolving;
        let host = self.settings.host.as_str();
        let port = self.settings.port;
        let addr = match lookup_host((host, port)).await {
            // An empty result set is fatal: the name is wrong, not the
            // network
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => addr,
                None => {
                    return Err(ClientError::Resolve {
                        host: host.to_owned(),
                        port,
                    })
                }
            },
            // Resolver infrastructure errors are transient; retry like
            // any other connection failure
            Err(e) => return Ok(Err(e)),
        };
        Ok(self.attempt(addr).await)
    }

    /// One connection attempt: connect, identify, run the session.
    /// `Ok(())` means a handler requested shutdown.
    async fn attempt(&mut self, addr: SocketAddr) -> Result<(), io::Error> {
        self.state = ConnectionState::Connecting;
        debug!(%addr, "connecting");
        let stream = TcpStream::connect(addr).await?;
        info!(%addr, nick = %self.settings.nick, "connected");

        self.state = ConnectionState::Identifying;
        let mut state = SessionState::new(outbox::DEFAULT_MAX_PENDING);
        let nick = &self.settings.nick;
        state.outbox.push(&format!("USER {nick} 0 * :{nick}"));
        state.outbox.push(&format!("NICK {nick}"));

        self.state = ConnectionState::Ready;
        {
            let mut ctx = Context {
                outbox: &mut state.outbox,
                nick: &self.settings.nick,
                shutdown: &mut state.shutdown,
            };
            self.registry.run_on_connect(&mut ctx);
        }

        match session::run_session(stream, &mut self.registry, &self.settings, &mut state).await {
            SessionEnd::Shutdown => {
                info!("session shut down");
                Ok(())
            }
            SessionEnd::Transport(e) => Err(e),
        }
    }
}

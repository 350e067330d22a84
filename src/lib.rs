//! corvid is an asynchronous chat client built on tokio.
//!
//! The crate splits into a protocol layer ([`corvid_proto`], re-exported
//! as [`proto`]) that owns framing and message parsing, and a client
//! layer that owns connections: resolve, connect, identify, dispatch,
//! reconnect. Applications register command handlers on a [`Client`],
//! then hand it the task with [`Client::run`].

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;

pub use client::{Client, Context, Handler};
pub use config::{Config, ReconnectPolicy, Settings};
pub use error::ClientError;

pub use corvid_proto as proto;
pub use corvid_proto::Message;

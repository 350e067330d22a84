//! Integration test common infrastructure.
//!
//! Provides a scripted mock server for the client to talk to, and
//! helpers for asserting on the line flow in both directions.

pub mod server;

#[allow(unused_imports)]
pub use server::{ServerConn, TestServer};

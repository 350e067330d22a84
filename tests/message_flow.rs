//! Inbound message flow integration tests.
//!
//! Parsing and dispatch as seen over a real socket: capture grammar,
//! PONG replies, handler ordering, and recovery from garbage lines.

mod common;

use std::sync::{Arc, Mutex};

use common::TestServer;
use corvid::{Client, Context, Message};

#[tokio::test]
async fn test_privmsg_reaches_handler_with_all_captures() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let seen: Arc<Mutex<Vec<(String, String, String)>>> = Arc::new(Mutex::new(Vec::new()));

    let mut client = Client::new(server.settings("raven"));
    let sink = seen.clone();
    client.register_handler("PRIVMSG", move |ctx: &mut Context<'_>, msg: &Message| {
        sink.lock().unwrap().push((
            msg.prefix.clone(),
            msg.middle.clone(),
            msg.trailing.clone(),
        ));
        ctx.shutdown();
    });

    let task = tokio::spawn(async move { client.run().await });

    let mut conn = server.accept().await?;
    conn.expect_registration("raven").await?;
    conn.send_line(":nick!user@host PRIVMSG #chan :hello").await?;

    task.await??;
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            "nick!user@host".to_string(),
            "#chan".to_string(),
            "hello".to_string()
        )]
    );
    Ok(())
}

#[tokio::test]
async fn test_server_ping_answered_with_pong() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let mut client = Client::new(server.settings("raven"));
    client.register_handler("PRIVMSG", |ctx: &mut Context<'_>, _: &Message| {
        ctx.shutdown();
    });

    let task = tokio::spawn(async move { client.run().await });

    let mut conn = server.accept().await?;
    conn.expect_registration("raven").await?;
    conn.send_line("PING :server123").await?;

    assert_eq!(conn.recv_line().await?, "PONG :server123");

    conn.send_line(":x!y@z PRIVMSG raven :done").await?;
    task.await?.map_err(anyhow::Error::from)
}

#[tokio::test]
async fn test_handlers_run_in_registration_order() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let mut client = Client::new(server.settings("raven"));
    for tag in ["first", "second", "third"] {
        let log = order.clone();
        client.register_handler("NOTICE", move |_: &mut Context<'_>, _: &Message| {
            log.lock().unwrap().push(tag);
        });
    }
    client.register_handler("PRIVMSG", |ctx: &mut Context<'_>, _: &Message| {
        ctx.shutdown();
    });

    let task = tokio::spawn(async move { client.run().await });

    let mut conn = server.accept().await?;
    conn.expect_registration("raven").await?;
    conn.send_line(":srv NOTICE raven :probe").await?;
    conn.send_line(":x!y@z PRIVMSG raven :done").await?;

    task.await??;
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    Ok(())
}

#[tokio::test]
async fn test_unparseable_line_does_not_end_session() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut client = Client::new(server.settings("raven"));
    let sink = seen.clone();
    client.register_handler("PRIVMSG", move |ctx: &mut Context<'_>, msg: &Message| {
        sink.lock().unwrap().push(msg.trailing.clone());
        ctx.shutdown();
    });

    let task = tokio::spawn(async move { client.run().await });

    let mut conn = server.accept().await?;
    conn.expect_registration("raven").await?;
    // A prefix with no command after it fails to parse and is skipped
    conn.send_line(":orphan.prefix.only").await?;
    conn.send_line(":x!y@z PRIVMSG raven :still here").await?;

    task.await??;
    assert_eq!(*seen.lock().unwrap(), vec!["still here".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_command_matching_is_exact_case() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let hits = Arc::new(Mutex::new(0u32));

    let mut client = Client::new(server.settings("raven"));
    let counter = hits.clone();
    client.register_handler("NOTICE", move |_: &mut Context<'_>, _: &Message| {
        *counter.lock().unwrap() += 1;
    });
    client.register_handler("PRIVMSG", |ctx: &mut Context<'_>, _: &Message| {
        ctx.shutdown();
    });

    let task = tokio::spawn(async move { client.run().await });

    let mut conn = server.accept().await?;
    conn.expect_registration("raven").await?;
    // Lowercase command: an unknown key, silently ignored
    conn.send_line(":srv notice raven :miss").await?;
    conn.send_line(":srv NOTICE raven :hit").await?;
    conn.send_line(":x!y@z PRIVMSG raven :done").await?;

    task.await??;
    assert_eq!(*hits.lock().unwrap(), 1);
    Ok(())
}

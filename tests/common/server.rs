//! Scripted mock server.
//!
//! Binds an ephemeral local port, accepts the client under test, and
//! lets each test send and assert raw lines.

use std::time::Duration;

use corvid::config::{ReconnectPolicy, Settings};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::time::timeout;

/// A listening mock server.
pub struct TestServer {
    listener: TcpListener,
}

impl TestServer {
    /// Bind to an ephemeral port on loopback.
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    /// Bind to a specific loopback port. Lets a test start listening on
    /// a port the client is already retrying against.
    #[allow(dead_code)]
    pub async fn bind_on(port: u16) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        Ok(Self { listener })
    }

    /// The port the server is listening on.
    pub fn port(&self) -> u16 {
        self.listener
            .local_addr()
            .expect("listener has a local addr")
            .port()
    }

    /// Client settings that point at this server, with a retry policy
    /// short enough for tests.
    pub fn settings(&self, nick: &str) -> Settings {
        Settings {
            host: "127.0.0.1".to_string(),
            port: self.port(),
            nick: nick.to_string(),
            reconnect: ReconnectPolicy {
                max_attempts: 3,
                initial_delay_secs: 0,
                max_delay_secs: 0,
            },
        }
    }

    /// Accept one inbound connection.
    pub async fn accept(&self) -> anyhow::Result<ServerConn> {
        let (stream, _) = timeout(Duration::from_secs(5), self.listener.accept()).await??;
        let (read_half, write_half) = stream.into_split();
        Ok(ServerConn {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }
}

/// One accepted connection, seen from the server side.
pub struct ServerConn {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl ServerConn {
    /// Send one line to the client, appending CRLF if missing.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with("\r\n") {
            self.writer.write_all(b"\r\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one line from the client, CRLF stripped.
    pub async fn recv_line(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(Duration::from_secs(5), self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("client closed the connection");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Receive lines until the predicate matches, returning everything
    /// received including the match.
    #[allow(dead_code)]
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut lines = Vec::new();
        loop {
            let line = self.recv_line().await?;
            let done = predicate(&line);
            lines.push(line);
            if done {
                return Ok(lines);
            }
        }
    }

    /// Drain the registration lines (USER then NICK) the client sends on
    /// every fresh connection.
    #[allow(dead_code)]
    pub async fn expect_registration(&mut self, nick: &str) -> anyhow::Result<()> {
        let user = self.recv_line().await?;
        anyhow::ensure!(
            user == format!("USER {nick} 0 * :{nick}"),
            "unexpected first line: {user}"
        );
        let nick_line = self.recv_line().await?;
        anyhow::ensure!(
            nick_line == format!("NICK {nick}"),
            "unexpected second line: {nick_line}"
        );
        Ok(())
    }
}

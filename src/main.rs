//! corvid - a small asynchronous chat bot.
//!
//! Connects to the configured server, joins a channel, greets arrivals,
//! and answers `!time`.

use corvid::proto::nickname;
use corvid::{Client, Config, Context, Message};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        host = %config.client.host,
        port = config.client.port,
        nick = %config.client.nick,
        channel = %config.channel,
        "Starting corvid"
    );

    let mut client = Client::new(config.client.clone());

    // RPL_WELCOME means registration went through; join the home channel
    let channel = config.channel.clone();
    client.register_handler("001", move |ctx: &mut Context<'_>, _: &Message| {
        ctx.join(&channel);
    });

    client.register_handler("PRIVMSG", say_time);
    client.register_handler("JOIN", greet);

    client.run().await?;
    Ok(())
}

/// Answer `!time` with the local wall clock. Channel requests are
/// answered in the channel, direct messages back to the sender.
fn say_time(ctx: &mut Context<'_>, msg: &Message) {
    if msg.trailing.trim() != "!time" {
        return;
    }
    let target = if msg.middle.starts_with('#') {
        msg.middle.clone()
    } else {
        nickname(&msg.prefix).to_string()
    };
    if target.is_empty() {
        return;
    }
    let now = chrono::Local::now().format("%a %b %e %H:%M:%S %Y");
    let who = nickname(&msg.prefix);
    ctx.say(&target, &format!("{who}: {now}"));
}

/// Welcome anyone joining a channel we are in, except ourselves.
fn greet(ctx: &mut Context<'_>, msg: &Message) {
    let who = nickname(&msg.prefix);
    if who.is_empty() || who == ctx.nick() {
        return;
    }
    // JOIN carries the channel either as a middle param or as trailing
    let channel = if msg.middle.starts_with('#') {
        msg.middle.as_str()
    } else {
        msg.trailing.as_str()
    };
    if channel.starts_with('#') {
        ctx.say(channel, &format!("Hello, {who}!"));
    }
}

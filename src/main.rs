use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use nullchat::client::session::Session;
use nullchat::config;
use nullchat::gateway::protocol::{GatewayEvent, MessageKind};
use nullchat::notify::{Alerter, NullSink};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::load_config()?;
    let alerter = Alerter::new(
        cfg.notifications.clone(),
        Box::new(NullSink),
        Box::new(NullSink),
    );
    let mut session = Session::connect(cfg, alerter)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) if !line.trim().is_empty() => session.submit_line(&line),
                Some(_) => {}
                None => break,
            },
            event = session.next_event() => match event {
                Some(event) => {
                    print_event(&event);
                    session.apply(event);
                }
                None => break,
            },
        }
    }

    session.shutdown();
    Ok(())
}

fn print_event(event: &nullchat::client::event::AppEvent) {
    use nullchat::client::event::AppEvent;
    let AppEvent::Gateway(event) = event else {
        return;
    };
    match event {
        GatewayEvent::Connected { nick } => println!("* Connected as {nick}"),
        GatewayEvent::Disconnected => println!("* Disconnected"),
        GatewayEvent::Error { message } => println!("* Error: {message}"),
        GatewayEvent::Message(m) => match m.kind {
            MessageKind::Action => println!("[{}] * {} {}", m.target, m.nick, m.message),
            _ => println!("[{}] <{}> {}", m.target, m.nick, m.message),
        },
        GatewayEvent::Joined { channel } => println!("* Joined {channel}"),
        GatewayEvent::UserJoin { channel, nick } => println!("[{channel}] --> {nick}"),
        GatewayEvent::UserPart { channel, nick } => println!("[{channel}] <-- {nick}"),
        GatewayEvent::Topic { channel, topic } => println!(
            "[{channel}] Topic: {}",
            topic.as_deref().unwrap_or("(none)")
        ),
        _ => {}
    }
}

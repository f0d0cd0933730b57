mod app;
mod boundary;
mod commands;
mod config;
mod panels;

use std::error::Error;
use std::time::Duration;

use clap::Parser;
use foundation::ids::EventId;
use foundation::time::{Clock, SystemClock};
use streaming::client::FeedClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::ViewerState;
use crate::commands::{Command, CommandError, HELP};
use crate::config::Args;
use crate::panels::Screen;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let clock = SystemClock;
    let feed = FeedClient::http(&args.feed_config());
    let mut state = ViewerState::new(args.filter(), args.playback(), clock.now());
    let mut screen = Screen::new(args.limit);

    info!("fetching {}", feed.endpoint());
    load(&feed, &mut state, &clock, false).await;

    if let Some(id) = &args.select {
        state.apply(&Command::Select(EventId::from(id.as_str())));
    }
    if args.play {
        state.rewind();
        state.play();
    }
    println!("{}", screen.render(&state));

    if !args.once {
        run(&feed, &mut state, &mut screen, &clock).await?;
    }
    state.teardown();
    info!("feed metrics: {}", feed.metrics());
    info!("viewer metrics: {}", state.metrics().snapshot());
    Ok(())
}

async fn load(feed: &FeedClient, state: &mut ViewerState, clock: &dyn Clock, refresh: bool) {
    let result = if refresh {
        feed.refresh().await
    } else {
        feed.fetch().await
    };
    match result {
        Ok(collection) => state.load(collection, clock.now()),
        Err(err) => state.fail(err),
    }
}

/// Real-time loop: wakes for the next scheduled task or the next input line.
/// Ends on `quit`, ctrl-c, or once stdin is closed and nothing is scheduled.
async fn run(
    feed: &FeedClient,
    state: &mut ViewerState,
    screen: &mut Screen,
    clock: &dyn Clock,
) -> Result<(), Box<dyn Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        let wait = state
            .next_deadline()
            .map(|due| Duration::from_millis(due.millis_since(clock.now())));

        tokio::select! {
            _ = sleep_for(wait) => {
                if state.advance(clock.now()) > 0 {
                    println!("{}", screen.render(state));
                }
            }
            line = lines.next_line(), if stdin_open => match line? {
                None => stdin_open = false,
                Some(line) => {
                    state.advance(clock.now());
                    match line.parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(Command::Help) => println!("{HELP}"),
                        Ok(Command::Show) => println!("{}", screen.render(state)),
                        Ok(Command::Refresh) => {
                            load(feed, state, clock, true).await;
                            println!("{}", screen.render(state));
                        }
                        Ok(command) => {
                            if state.apply(&command) {
                                println!("{}", screen.render(state));
                            }
                        }
                        Err(CommandError::Empty) => {}
                        Err(err) => eprintln!("{err}"),
                    }
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }

        if !stdin_open && state.next_deadline().is_none() {
            break;
        }
    }
    Ok(())
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}

//! Client - line-oriented terminal front end for a session

mod commands;
pub mod file_source;
mod input;
mod renderer;

pub use input::{parse_input, ParsedInput};
pub use renderer::{render_event, render_header, render_history, render_message};

use crate::client::commands::{handle_control_command, CommandResult};
use crate::config::Config;
use crate::session::{InvitationLink, SessionEvent, SessionHandle, SessionManager};
use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// Create a new session and chat in it
pub async fn start_new_session(config: &Config) -> Result<()> {
    let mut manager = SessionManager::new(config.session.clone());
    let session = manager.create().context("Failed to create session")?;
    tracing::info!("Starting new session: {}", session.id());

    run_session(session, config).await
}

/// Join a session by link or id and chat in it
pub async fn join_session(config: &Config, reference: &str) -> Result<()> {
    let mut manager = SessionManager::new(config.session.clone());
    let session = manager.join(reference)?;
    tracing::info!("Joining session: {}", session.id());

    run_session(session, config).await
}

async fn run_session(session: SessionHandle, config: &Config) -> Result<()> {
    let link = InvitationLink::new(&config.invitation.origin);
    let mut events = session.subscribe();

    let snapshot = session.snapshot().await?;
    println!("{}", render_header(&snapshot, &link.build(session.id())));
    println!("Type :help for commands.\n");
    for line in render_history(&snapshot) {
        println!("{}", line);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("Input closed");
                    break;
                };
                if let CommandResult::Exit = handle_line(&line, &session, &link).await? {
                    break;
                }
            }

            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(text) = render_event(&event) {
                        println!("{}", text);
                    }
                    if matches!(event, SessionEvent::Expired | SessionEvent::Ended) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Display fell behind by {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    // Leaving discards the session; ending twice is harmless.
    session.end().await?;
    Ok(())
}

async fn handle_line(
    line: &str,
    session: &SessionHandle,
    link: &InvitationLink,
) -> Result<CommandResult> {
    match parse_input(line) {
        ParsedInput::Empty => {}
        ParsedInput::Text(text) => {
            if let Err(e) = session.send_text(text).await {
                println!("Message not sent: {}", e);
            }
        }
        ParsedInput::ControlCommand {
            command,
            args,
            raw_args,
        } => {
            return handle_control_command(&command, args, &raw_args, session, link).await;
        }
    }
    Ok(CommandResult::Continue)
}

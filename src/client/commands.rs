//! Command handling for client control commands (prefixed with `:`)

use crate::client::file_source;
use crate::client::renderer::render_history;
use crate::session::{format_remaining, InvitationLink, SessionHandle};
use anyhow::Result;
use std::path::Path;

pub enum CommandResult {
    Continue,
    Exit,
}

const HELP: &str = "\
Commands:
  :attach <path>   share a file (metadata only)
  :extend <secs>   add time to the session
  :time            show time remaining
  :link            show the invitation link
  :history         show all messages
  :end             end the session for everyone
  :quit            leave (ends the session)
  :help            show this help
Start a message with '::' to send text beginning with ':'.";

/// Handle a parsed control command and return whether to continue or exit.
pub async fn handle_control_command(
    command: &str,
    args: Vec<String>,
    raw_args: &str,
    session: &SessionHandle,
    link: &InvitationLink,
) -> Result<CommandResult> {
    match command {
        "attach" => {
            if raw_args.is_empty() {
                println!("Usage: :attach <path>");
                return Ok(CommandResult::Continue);
            }
            match file_source::probe(Path::new(raw_args)) {
                // The appended message is printed when its event arrives.
                Ok(file) => {
                    if let Err(e) = session
                        .attach_file(file.file_name, file.byte_size, file.mime_type)
                        .await
                    {
                        println!("Could not attach file: {}", e);
                    }
                }
                Err(e) => println!("Could not read file: {:#}", e),
            }
        }
        "extend" => {
            let Some(seconds) = args.first().and_then(|s| s.parse::<u64>().ok()) else {
                println!("Usage: :extend <seconds>");
                return Ok(CommandResult::Continue);
            };
            if let Err(e) = session.extend(seconds).await {
                println!("Could not extend session: {}", e);
            }
        }
        "time" => {
            let snapshot = session.snapshot().await?;
            println!(
                "Session expires in {}",
                format_remaining(snapshot.remaining_seconds)
            );
        }
        "link" => {
            println!("{}", link.build(session.id()));
        }
        "history" => {
            let snapshot = session.snapshot().await?;
            for line in render_history(&snapshot) {
                println!("{}", line);
            }
        }
        "end" => {
            session.end().await?;
            return Ok(CommandResult::Exit);
        }
        "quit" | "q" | "exit" => {
            return Ok(CommandResult::Exit);
        }
        "help" | "h" | "?" => {
            println!("{}", HELP);
        }
        other => {
            println!("Unknown command ':{}'. Type :help for a list.", other);
        }
    }

    Ok(CommandResult::Continue)
}

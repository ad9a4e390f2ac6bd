//! ephemera - temporary, session-scoped chat and file sharing

use anyhow::Result;
use clap::{Parser, Subcommand};
use ephemera::client;
use ephemera::config::{Config, Preferences, Theme};
use ephemera::session::{AttachmentDescriptor, InvitationLink};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ephemera")]
#[command(about = "Temporary chat sessions that vanish when they expire")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session
    New,
    /// Join a session by invitation link or id
    Join {
        /// Invitation link or session id
        reference: String,
    },
    /// Print the invitation link for a session id
    Link {
        /// Session id
        id: String,
    },
    /// Show the attachment metadata for a local file
    Describe {
        /// File to describe
        path: PathBuf,
    },
    /// Show or change the theme preference
    Theme {
        /// light, dark or toggle
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr keeps the transcript on stdout clean)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let prefs = Preferences::init(config.preferences_path());
    let theme = Theme::init(prefs);
    tracing::debug!("Theme: {}", theme.as_str());

    match cli.command {
        Commands::New => client::start_new_session(&config).await,
        Commands::Join { reference } => client::join_session(&config, &reference).await,
        Commands::Link { id } => {
            let id = InvitationLink::resolve(&id)?;
            println!("{}", InvitationLink::new(&config.invitation.origin).build(&id));
            Ok(())
        }
        Commands::Describe { path } => {
            let file = client::file_source::probe(&path)?;
            let descriptor =
                AttachmentDescriptor::describe(&file.file_name, file.byte_size, &file.mime_type)?;
            println!("name:     {}", descriptor.file_name);
            println!(
                "size:     {} ({} bytes)",
                descriptor.human_size, descriptor.byte_size
            );
            println!("type:     {}", descriptor.mime_type);
            println!("category: {}", descriptor.mime_category.label());
            Ok(())
        }
        Commands::Theme { value } => {
            let next = match value.as_deref() {
                None => {
                    println!("{}", theme.as_str());
                    return Ok(());
                }
                Some("toggle") => theme.toggled(),
                Some(other) => other.parse()?,
            };
            Theme::set(prefs, next)?;
            println!("{}", next.as_str());
            Ok(())
        }
    }
}

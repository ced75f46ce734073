//! Chat commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::time::Duration;

use crate::config::build_authed_client;
use crate::handlers::chat as handlers;
use crate::output::{format_time, print_table, OutputFormat};

#[derive(Subcommand)]
pub enum ChatAction {
    /// List conversations, newest first
    #[command(alias = "ls")]
    List,

    /// View the thread with a member, marking it read
    Thread {
        /// Counterpart email address
        email: String,
    },

    /// Send a message to a member
    Send {
        /// Counterpart email address
        email: String,
        /// Message content
        message: String,
    },

    /// Follow incoming messages until interrupted
    Watch,
}

pub async fn handle(action: ChatAction, format: OutputFormat) -> Result<()> {
    match action {
        ChatAction::List => list(format).await,
        ChatAction::Thread { email } => thread(&email, format).await,
        ChatAction::Send { email, message } => send(&email, &message).await,
        ChatAction::Watch => watch().await,
    }
}

async fn list(format: OutputFormat) -> Result<()> {
    let client = build_authed_client()?;
    let conversations = handlers::list_conversations(&client).await?;
    print_table(conversations, format);
    Ok(())
}

async fn thread(email: &str, format: OutputFormat) -> Result<()> {
    let client = build_authed_client()?;
    let (name, lines) = handlers::read_thread(&client, email).await?;

    if matches!(format, OutputFormat::Plain) {
        println!("Conversation with {}\n", name.green());
    }

    print_table(lines, format);
    Ok(())
}

async fn send(email: &str, message: &str) -> Result<()> {
    let client = build_authed_client()?;
    handlers::send_message(&client, email, message).await?;
    println!("{} message sent to {}", "✓".green(), email);
    Ok(())
}

/// Show the unread badge count.
pub async fn unread(format: OutputFormat) -> Result<()> {
    let client = build_authed_client()?;
    let count = handlers::unread_count(&client).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "unread": count })),
        _ => {
            if count > 0 {
                println!("{} unread", count.to_string().red());
            } else {
                println!("No unread messages");
            }
        }
    }
    Ok(())
}

async fn watch() -> Result<()> {
    let client = build_authed_client()?;
    let session = handlers::connect(&client).await?;
    let guard = session.start_polling();

    println!(
        "Watching messages for {} (Ctrl-C to stop)",
        session.current_user().full_name.green()
    );

    let mut seen = session.messages().len();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_secs(2)) => {
                let log = session.messages();
                let roster = session.roster();
                let me = session.current_user().email.clone();

                for message in log.iter().skip(seen) {
                    let from = if message.sender == me {
                        "me".cyan().to_string()
                    } else {
                        roster
                            .iter()
                            .find(|u| u.email == message.sender)
                            .map(|u| u.full_name.clone())
                            .unwrap_or_else(|| message.sender.to_string())
                            .green()
                            .to_string()
                    };
                    println!(
                        "{} {}: {}",
                        format_time(message.created_date).dimmed(),
                        from,
                        message.content
                    );
                }
                seen = log.len();
            }
        }
    }

    guard.shutdown();
    println!("Stopped.");
    Ok(())
}

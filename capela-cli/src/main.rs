//! Capela community chat CLI.

mod commands;
mod config;
mod handlers;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{chat, member};
use config::{load_config, save_config, AuthConfig};

/// Capela community chat CLI
#[derive(Parser)]
#[command(name = "capela")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "plain")]
    format: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage authentication
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// List community members
    #[command(alias = "m")]
    Members {
        /// Filter by display-name substring
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Chat operations
    #[command(alias = "c")]
    Chat {
        #[command(subcommand)]
        action: chat::ChatAction,
    },

    /// Show the unread badge count
    #[command(alias = "u")]
    Unread,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Store an access token (and optionally the app id)
    Set {
        /// Access token
        token: String,
        /// Hosted application id
        #[arg(long, env = "CAPELA_APP_ID")]
        app_id: Option<String>,
        /// Backend base URL override
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Remove stored credentials
    Clear,
    /// Show authentication status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Auth { action } => handle_auth(action),
        Commands::Members { search } => member::handle(search, cli.format).await,
        Commands::Chat { action } => chat::handle(action, cli.format).await,
        Commands::Unread => chat::unread(cli.format).await,
    }
}

fn handle_auth(action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Set {
            token,
            app_id,
            base_url,
        } => {
            let mut config = load_config()?;
            config.auth = Some(AuthConfig { token });
            if app_id.is_some() {
                config.app_id = app_id;
            }
            if base_url.is_some() {
                config.base_url = base_url;
            }
            save_config(&config)?;
            println!("{} credentials saved", "✓".green());
            Ok(())
        }
        AuthAction::Clear => {
            let mut config = load_config()?;
            config.auth = None;
            save_config(&config)?;
            println!("{} credentials cleared", "✓".green());
            Ok(())
        }
        AuthAction::Status => {
            let config = load_config()?;
            match (&config.auth, &config.app_id) {
                (Some(_), Some(app_id)) => {
                    println!("Signed in (app {})", app_id.cyan());
                }
                (Some(_), None) => {
                    println!("Token stored, but no app id configured");
                }
                _ => println!("Not signed in"),
            }
            Ok(())
        }
    }
}

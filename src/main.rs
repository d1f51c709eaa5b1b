mod app;
mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use meetprep_core::Provider;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meetprep")]
#[command(about = "Connect your calendars and read AI-generated briefs before every meeting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password, or through Google or Outlook
    Signin {
        #[arg(short, long)]
        email: Option<String>,

        /// Sign in with this provider's account instead (no calendar access)
        #[arg(long, conflicts_with = "email")]
        provider: Option<Provider>,
    },
    /// Create an account
    Signup {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        username: Option<String>,
    },
    /// Sign out and forget the local session
    Signout,
    /// Show the signed-in account
    Whoami,
    /// Link a Google or Outlook calendar
    Connect {
        /// google or outlook (asks when omitted)
        provider: Option<Provider>,
    },
    /// Unlink a calendar
    Disconnect { provider: Provider },
    /// List linked calendars
    Providers,
    /// Show upcoming and past meetings
    Meetings {
        /// Show past meetings instead of upcoming ones
        #[arg(long)]
        past: bool,

        /// Only show meetings whose title contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Ignore the local cache and fetch again
        #[arg(short, long)]
        refresh: bool,
    },
    /// Fetch fresh meetings from every linked calendar
    Sync,
    /// Show one meeting with its participants and brief
    Meeting {
        id: String,

        /// Write the brief as Markdown to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// View or change preferences
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommand>,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print every setting
    Show,
    /// Change a setting, e.g. `settings set ai.detail concise`
    Set { key: String, value: String },
    /// Delete local data and unlink every calendar
    DeleteData {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MEETPREP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Signin { email, provider } => match provider {
            Some(provider) => commands::auth::signin_with_provider(provider).await,
            None => commands::auth::signin(email).await,
        },
        Commands::Signup { email, username } => commands::auth::signup(email, username).await,
        Commands::Signout => commands::auth::signout().await,
        Commands::Whoami => commands::auth::whoami().await,
        Commands::Connect { provider } => commands::connect::run(provider).await,
        Commands::Disconnect { provider } => commands::connect::disconnect(provider).await,
        Commands::Providers => commands::connect::providers().await,
        Commands::Meetings {
            past,
            search,
            refresh,
        } => commands::meetings::run(past, search.as_deref(), refresh).await,
        Commands::Sync => commands::sync::run().await,
        Commands::Meeting { id, export } => commands::meeting::run(&id, export.as_deref()).await,
        Commands::Settings { command } => match command.unwrap_or(SettingsCommand::Show) {
            SettingsCommand::Show => commands::settings::show(),
            SettingsCommand::Set { key, value } => commands::settings::set(&key, &value),
            SettingsCommand::DeleteData { yes } => commands::settings::delete_data(yes).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signin_accepts_provider() {
        let cli = Cli::try_parse_from(["meetprep", "signin", "--provider", "outlook"]).unwrap();
        match cli.command {
            Commands::Signin { email, provider } => {
                assert_eq!(email, None);
                assert_eq!(provider, Some(Provider::Outlook));
            }
            _ => panic!("expected signin"),
        }
    }

    #[test]
    fn signin_rejects_email_with_provider() {
        assert!(Cli::try_parse_from(["meetprep", "signin", "-e", "a@b.co", "--provider", "google"]).is_err());
    }
}

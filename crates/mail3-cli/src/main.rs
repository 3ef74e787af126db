use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mail3_cli::cli::{execute, print_json, CliCommand};
use mail3_core::tracing_setup::init_tracing_with_service;
use mail3_core::{ClientConfig, Mail3Runtime, ShareTarget};

#[derive(Parser)]
#[command(name = "mail3-cli")]
#[command(about = "Command line client for the mail3 API")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Path to JSON config file (apiUrl, appUrl, jwt, ...)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve avatar images for addresses
    Avatar {
        /// Primitive addresses (0x...) or aliases (name.eth)
        #[arg(required = true)]
        addresses: Vec<String>,
        /// Use this image instead of looking one up (single address only)
        #[arg(long)]
        src: Option<String>,
    },

    /// Load the subscription feed
    Feed {
        /// Maximum number of pages to load
        #[arg(long, short = 'n', default_value_t = 1)]
        pages: usize,
        /// Initial unread counter
        #[arg(long)]
        unread: Option<u32>,
    },

    /// Print the page a push notification opens
    Open {
        /// Notification type (e.g. community_message)
        notification_type: String,
        message_id: String,
    },

    /// Build a share link for an article
    Share {
        article_id: String,
        /// twitter, telegram or copy
        #[arg(default_value = "copy")]
        target: ShareTarget,
        /// Article text; the first 100 characters are shared
        #[arg(long, short = 't', default_value = "")]
        text: String,
    },

    /// Session cookie helpers
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Check a Cookie header against the session gate
    Gate {
        #[arg(long)]
        cookie: Option<String>,
    },
    /// Print the Set-Cookie value for a login
    Cookie {
        #[arg(long)]
        address: String,
        #[arg(long)]
        jwt: String,
        #[arg(long, default_value = "")]
        uuid: String,
    },
    /// Print the Set-Cookie value that clears the login
    Logout,
    /// Where the client-side guard sends a visitor
    Route {
        path: String,
        #[arg(long)]
        authenticated: bool,
    },
}

impl From<Commands> for CliCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Avatar { addresses, src } => CliCommand::Avatar { addresses, src },
            Commands::Feed { pages, unread } => CliCommand::Feed { pages, unread },
            Commands::Open {
                notification_type,
                message_id,
            } => CliCommand::Open {
                notification_type,
                message_id,
            },
            Commands::Share {
                article_id,
                target,
                text,
            } => CliCommand::Share {
                article_id,
                target,
                text,
            },
            Commands::Session { command } => match command {
                SessionCommands::Gate { cookie } => CliCommand::SessionGate { cookie },
                SessionCommands::Cookie { address, jwt, uuid } => {
                    CliCommand::SessionCookie { address, jwt, uuid }
                }
                SessionCommands::Logout => CliCommand::SessionLogout,
                SessionCommands::Route {
                    path,
                    authenticated,
                } => CliCommand::SessionRoute {
                    path,
                    authenticated,
                },
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing_with_service("mail3-cli");

    let config = match ClientConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match Mail3Runtime::new(config) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = execute(&runtime, cli.command.into())
        .await
        .and_then(|value| print_json(&value, cli.pretty));
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

//! Proxy console CLI - manage admins, panels and panel clients.
//!
//! # Usage
//!
//! ```bash
//! # Who am I logged in as?
//! pc-cli whoami
//!
//! # List admins as JSON
//! pc-cli --format json admins list
//!
//! # Create an admin on a 3x-ui panel with 50 GB for 30 days
//! pc-cli admins create --username reseller --password s3cret --panel germany \
//!     --inbound-id 2 --flow xtls-rprx-vision --traffic 50 --expiry 30
//!
//! # Download a database backup
//! pc-cli backup download --dir ./backups
//!
//! # List clients of inbound 2 directly on the panel
//! pc-cli clients --panel-url https://de.example.com:2053/ --panel-username admin \
//!     --panel-password secret --inbound 2 list
//! ```
//!
//! # Environment Variables
//!
//! - `CONSOLE_API_URL` - Console backend base URL
//! - `CONSOLE_USERNAME` / `CONSOLE_PASSWORD` or `CONSOLE_TOKEN` - credentials
//! - `CONSOLE_TIMEOUT_SECS` - Request timeout (default: 30)
//! - `CONSOLE_BACKUP_DIR` - Backup download directory (default: .)
//! - `RUST_LOG` - Log filter (default: info)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::admins::AdminsAction;
use commands::clients::ClientsArgs;
use commands::panels::PanelsAction;
use commands::settings::{BackupAction, NewsAction};
use commands::{CliError, ConnectionArgs, OutputFormat};

#[derive(Parser)]
#[command(name = "pc-cli")]
#[command(author, version, about = "Proxy console CLI")]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Console(ConsoleCommand),
    /// Manage clients directly on a 3x-ui / tx-ui panel
    Clients(ClientsArgs),
}

/// Commands served by the console backend.
#[derive(Subcommand)]
enum ConsoleCommand {
    /// Show the logged-in account
    Whoami,
    /// Show the dashboard
    Dashboard,
    /// Manage admin accounts
    Admins {
        #[command(subcommand)]
        action: AdminsAction,
    },
    /// Manage panel integrations
    Panels {
        #[command(subcommand)]
        action: PanelsAction,
    },
    /// Manage dashboard news
    News {
        #[command(subcommand)]
        action: NewsAction,
    },
    /// Show recent backend logs
    Logs,
    /// Download or restore the database backup
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before parsing so env-backed flags see it
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {}", e.user_message());
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let format = cli.format;

    let command = match cli.command {
        // Panel client management does not talk to the console backend
        Commands::Clients(args) => return commands::clients::run(args, format).await,
        Commands::Console(command) => command,
    };

    let session = cli.connection.connect()?;
    let client = &session.client;

    match command {
        ConsoleCommand::Whoami => commands::account::whoami(client, format).await,
        ConsoleCommand::Dashboard => commands::account::dashboard(client, format).await,
        ConsoleCommand::Admins { action } => commands::admins::run(client, action, format).await,
        ConsoleCommand::Panels { action } => commands::panels::run(client, action, format).await,
        ConsoleCommand::News { action } => commands::settings::news(client, action, format).await,
        ConsoleCommand::Logs => commands::settings::logs(client, format).await,
        ConsoleCommand::Backup { action } => commands::settings::backup(&session, action).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_admin_create() {
        let cli = Cli::try_parse_from([
            "pc-cli",
            "--format",
            "json",
            "--api-url",
            "http://127.0.0.1:8000",
            "admins",
            "create",
            "--username",
            "reseller",
            "--panel",
            "germany",
            "--traffic",
            "1.5",
            "--expiry",
            "30",
            "--inbound",
            "vless:VLESS TCP",
        ])
        .expect("valid arguments");

        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Console(ConsoleCommand::Admins {
                action: AdminsAction::Create(_)
            })
        ));
    }

    #[test]
    fn test_parse_clients_bypasses_console_commands() {
        let cli = Cli::try_parse_from([
            "pc-cli",
            "clients",
            "--panel-url",
            "https://de.example.com:2053/",
            "--panel-username",
            "admin",
            "--panel-password",
            "secret",
            "--inbound",
            "2",
            "test",
        ])
        .expect("valid arguments");
        assert!(matches!(cli.command, Commands::Clients(_)));

        let cli = Cli::try_parse_from(["pc-cli", "logs"]).expect("valid arguments");
        assert!(matches!(cli.command, Commands::Console(ConsoleCommand::Logs)));
    }

    #[test]
    fn test_parse_clients_requires_inbound() {
        let result = Cli::try_parse_from([
            "pc-cli",
            "clients",
            "--panel-url",
            "https://de.example.com:2053/",
            "--panel-username",
            "admin",
            "--panel-password",
            "secret",
            "list",
        ]);
        assert!(result.is_err());
    }
}

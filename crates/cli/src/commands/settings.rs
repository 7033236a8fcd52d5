//! `news`, `logs` and `backup` subcommands.

use std::path::PathBuf;

use clap::Subcommand;
use proxy_console_admin::ConsoleClient;
use proxy_console_admin::pages::SettingsPage;
use proxy_console_core::{NewsId, NewsItem};

use super::output::{Table, emit, message};
use super::{CliError, OutputFormat, Session};

#[derive(Debug, Subcommand)]
pub enum NewsAction {
    /// List news items
    List,
    /// Publish a news item
    Add { message: String },
    /// Delete a news item
    Delete { id: NewsId },
}

#[derive(Debug, Subcommand)]
pub enum BackupAction {
    /// Download the database backup
    Download {
        /// Target directory (default: `CONSOLE_BACKUP_DIR` or `.`)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Replace the backend database with a backup file
    Restore { file: PathBuf },
}

pub async fn news(
    client: &ConsoleClient,
    action: NewsAction,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut page = SettingsPage::new();
    match action {
        NewsAction::List => {
            page.refresh_news(client).await;
            if let Some(error) = page.news_error() {
                return Err(CliError::Failed(error.to_owned()));
            }
            emit(format, page.news(), news_table)
        }
        NewsAction::Add { message: text } => message(&page.add_news(client, &text).await?),
        NewsAction::Delete { id } => message(&page.delete_news(client, id).await?),
    }
}

pub async fn logs(client: &ConsoleClient, format: OutputFormat) -> Result<(), CliError> {
    let mut page = SettingsPage::new();
    let lines = page.load_logs(client).await?;
    match format {
        OutputFormat::Table => message(&lines.join("\n")),
        _ => emit(format, lines, |_| Table::default()),
    }
}

pub async fn backup(session: &Session, action: BackupAction) -> Result<(), CliError> {
    let page = SettingsPage::new();
    match action {
        BackupAction::Download { dir } => {
            let dir = dir.unwrap_or_else(|| session.config.backup_dir.clone());
            let path = page.download_backup(&session.client, &dir).await?;
            message(&format!("Backup saved to {}", path.display()))
        }
        BackupAction::Restore { file } => {
            message(&page.restore_backup(&session.client, &file).await?)
        }
    }
}

fn news_table(items: &[NewsItem]) -> Table {
    let mut table = Table::new(&["ID", "CREATED", "MESSAGE"]);
    for item in items {
        table.row(vec![
            item.id.to_string(),
            item.created_at.clone(),
            item.message.clone(),
        ]);
    }
    table
}

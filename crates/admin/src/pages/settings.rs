//! Settings page: backup, restore, logs and news.
//!
//! The four actions are independent; none of them touches another's state.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use proxy_console_core::{NewsId, NewsItem};
use tracing::instrument;

use super::{FormError, ListState};
use crate::api::{ApiError, ConsoleClient};

const EMPTY_NEWS: &str = "Please enter a news message";

/// Settings page state.
#[derive(Debug, Clone, Default)]
pub struct SettingsPage {
    news: ListState<NewsItem>,
    logs: Vec<String>,
}

impl SettingsPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn news(&self) -> &[NewsItem] {
        self.news.items()
    }

    #[must_use]
    pub fn news_error(&self) -> Option<&str> {
        self.news.error()
    }

    /// Log lines of the last successful `load_logs`.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    // =========================================================================
    // Backup
    // =========================================================================

    /// Download the backup into `dir` as `backup-YYYY-MM-DD.db`.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or the file write fails.
    pub async fn download_backup(
        &self,
        client: &ConsoleClient,
        dir: &Path,
    ) -> Result<PathBuf, ApiError> {
        self.download_backup_on(client, dir, chrono::Local::now().date_naive())
            .await
    }

    /// [`Self::download_backup`] with an explicit date for the file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or the file write fails.
    pub async fn download_backup_on(
        &self,
        client: &ConsoleClient,
        dir: &Path,
        today: NaiveDate,
    ) -> Result<PathBuf, ApiError> {
        client
            .download_backup(dir, today)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to download backup"))
    }

    /// Upload a backup file; returns the server message.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the server rejects it.
    pub async fn restore_backup(&self, client: &ConsoleClient, path: &Path) -> Result<String, ApiError> {
        client
            .restore_backup(path)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to restore backup"))
    }

    // =========================================================================
    // Logs
    // =========================================================================

    /// Fetch the recent backend log lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; previously loaded lines are kept.
    #[instrument(skip_all)]
    pub async fn load_logs(&mut self, client: &ConsoleClient) -> Result<&[String], ApiError> {
        match client.logs().await {
            Ok(lines) => {
                self.logs = lines;
                Ok(&self.logs)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load logs");
                Err(e)
            }
        }
    }

    // =========================================================================
    // News
    // =========================================================================

    /// Re-fetch the news list.
    #[instrument(skip_all)]
    pub async fn refresh_news(&mut self, client: &ConsoleClient) {
        self.news.begin();
        let result = client.list_news().await;
        self.news.finish(result, "Failed to fetch news");
    }

    /// Publish a news item, then re-fetch.
    ///
    /// # Errors
    ///
    /// Rejects a blank message locally; otherwise returns the server error.
    #[instrument(skip(self, client, message))]
    pub async fn add_news(&mut self, client: &ConsoleClient, message: &str) -> Result<String, FormError> {
        let message = message.trim();
        if message.is_empty() {
            let mut errors = proxy_console_core::ValidationErrors::new();
            errors.add("message", EMPTY_NEWS);
            return Err(FormError::Validation(errors));
        }

        let reply = client.add_news(message).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to add news");
            FormError::from_api(&e)
        })?;
        self.refresh_news(client).await;
        Ok(reply)
    }

    /// Delete a news item, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns the error of the delete call; the list is left as it was.
    #[instrument(skip(self, client))]
    pub async fn delete_news(&mut self, client: &ConsoleClient, id: NewsId) -> Result<String, ApiError> {
        let reply = client.delete_news(id).await.inspect_err(|e| {
            tracing::error!(news_id = %id, error = %e, "Failed to delete news");
        })?;
        self.refresh_news(client).await;
        Ok(reply)
    }
}

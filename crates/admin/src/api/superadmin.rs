//! Superadmin maintenance endpoints: news, logs, backup and restore.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use futures::StreamExt;
use proxy_console_core::{NewsId, NewsInput, NewsItem};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use super::{ApiError, ConsoleClient};

/// Name of the backup file downloaded on `today`.
#[must_use]
pub fn backup_file_name(today: NaiveDate) -> String {
    format!("backup-{}.db", today.format("%Y-%m-%d"))
}

/// Log payload: a list of lines or one block of text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Logs {
    Lines(Vec<String>),
    Text(String),
}

impl From<Logs> for Vec<String> {
    fn from(logs: Logs) -> Self {
        match logs {
            Logs::Lines(lines) => lines,
            Logs::Text(text) => text.lines().map(str::to_owned).collect(),
        }
    }
}

impl ConsoleClient {
    // =========================================================================
    // News
    // =========================================================================

    /// All news items.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_news(&self) -> Result<Vec<NewsItem>, ApiError> {
        self.get_data("superadmin/news", "news").await
    }

    /// Publish a news item.
    ///
    /// # Errors
    ///
    /// Returns the server's first error message on rejection.
    #[instrument(skip(self, message))]
    pub async fn add_news(&self, message: &str) -> Result<String, ApiError> {
        let body = NewsInput {
            message: message.to_owned(),
        };
        self.mutate(Method::POST, "superadmin/news", Some(&body))
            .await
    }

    /// Delete a news item.
    ///
    /// # Errors
    ///
    /// Returns the server's first error message on rejection.
    #[instrument(skip(self), fields(news_id = %id))]
    pub async fn delete_news(&self, id: NewsId) -> Result<String, ApiError> {
        self.mutate::<()>(Method::DELETE, &format!("superadmin/news/{id}"), None)
            .await
    }

    // =========================================================================
    // Logs
    // =========================================================================

    /// Recent backend log lines; the server decides how many.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn logs(&self) -> Result<Vec<String>, ApiError> {
        let logs: Logs = self.get_data("superadmin/logs", "logs").await?;
        Ok(logs.into())
    }

    // =========================================================================
    // Backup
    // =========================================================================

    /// Stream the database backup into `dir`.
    ///
    /// The file is named after `today` and replaced if it exists. A failed
    /// download leaves any existing file untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn download_backup(&self, dir: &Path, today: NaiveDate) -> Result<PathBuf, ApiError> {
        let request = self.request(Method::GET, "superadmin/backup").await?;
        let response = self.send(request).await?;

        let path = dir.join(backup_file_name(today));
        // Stream into a sibling temp file; an earlier backup is only replaced
        // once the whole body has arrived. The temp file is removed on drop.
        let (std_file, partial) = tempfile::Builder::new()
            .prefix(".backup-")
            .suffix(".part")
            .tempfile_in(dir)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(std_file);
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        partial.persist(&path).map_err(std::io::Error::from)?;

        tracing::info!(path = %path.display(), bytes = written, "Backup downloaded");
        Ok(path)
    }

    /// Upload a backup file to replace the backend database.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the server rejects it.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn restore_backup(&self, path: &Path) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "backup.db".to_owned(), |n| n.to_string_lossy().into_owned());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", part);

        let request = self
            .request(Method::POST, "superadmin/restore")
            .await?
            .multipart(form);
        let response = self.send(request).await?;
        let message = super::into_message(&response.text().await?)?;

        tracing::info!(%message, "Backup restored");
        Ok(message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_file_name() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(backup_file_name(today), "backup-2026-03-07.db");
    }

    #[test]
    fn test_logs_text_split_into_lines() {
        let logs: Logs = serde_json::from_str(r#""first\nsecond""#).unwrap();
        assert_eq!(Vec::<String>::from(logs), vec!["first", "second"]);
    }
}

//! Admins list page.

use chrono::NaiveDate;
use proxy_console_core::{AdminId, AdminOutput};
use serde::Serialize;
use tracing::instrument;

use super::ListState;
use crate::api::{ApiError, ConsoleClient};

const FETCH_FAILED: &str = "Failed to fetch admins";

/// Display row for one admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminRow {
    pub id: AdminId,
    pub username: String,
    pub panel: String,
    pub is_active: bool,
    /// Quota formatted in GB.
    pub traffic: String,
    pub return_traffic: bool,
    pub expiry_date: Option<String>,
    pub remaining_days: Option<i64>,
}

/// Admins page state.
#[derive(Debug, Clone, Default)]
pub struct AdminsPage {
    state: ListState<AdminOutput>,
}

impl AdminsPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[AdminOutput] {
        self.state.items()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Admin with the given id, if loaded.
    #[must_use]
    pub fn find(&self, id: AdminId) -> Option<&AdminOutput> {
        self.items().iter().find(|a| a.id == id)
    }

    /// Rows ready for display.
    #[must_use]
    pub fn rows(&self, today: NaiveDate) -> Vec<AdminRow> {
        self.items()
            .iter()
            .map(|admin| AdminRow {
                id: admin.id,
                username: admin.username.clone(),
                panel: admin.panel.clone(),
                is_active: admin.is_active,
                traffic: admin.traffic.display_gb(2),
                return_traffic: admin.return_traffic,
                expiry_date: admin.expiry_date.clone(),
                remaining_days: admin.remaining_days(today),
            })
            .collect()
    }

    /// Re-fetch the whole list.
    #[instrument(skip_all)]
    pub async fn refresh(&mut self, client: &ConsoleClient) {
        self.state.begin();
        let result = client.list_admins().await;
        self.state.finish(result, FETCH_FAILED);
    }

    /// Delete an admin, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns the error of the delete call; the list is left as it was.
    #[instrument(skip(self, client))]
    pub async fn delete(&mut self, client: &ConsoleClient, id: AdminId) -> Result<String, ApiError> {
        let message = client.delete_admin(id).await.inspect_err(|e| {
            tracing::error!(admin_id = %id, error = %e, "Failed to delete admin");
        })?;
        self.refresh(client).await;
        Ok(message)
    }

    /// Flip an admin's active flag, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns the error of the toggle call; the list is left as it was.
    #[instrument(skip(self, client))]
    pub async fn toggle_active(
        &mut self,
        client: &ConsoleClient,
        id: AdminId,
    ) -> Result<String, ApiError> {
        let message = client.toggle_admin_status(id).await.inspect_err(|e| {
            tracing::error!(admin_id = %id, error = %e, "Failed to toggle admin status");
        })?;
        self.refresh(client).await;
        Ok(message)
    }

    /// Re-fetch after a dialog reported success.
    pub async fn apply_dialog_success(&mut self, client: &ConsoleClient) {
        self.refresh(client).await;
    }
}

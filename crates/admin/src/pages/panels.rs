//! Panels list page.

use proxy_console_core::{PanelId, PanelOutput};
use tracing::instrument;

use super::ListState;
use crate::api::{ApiError, ConsoleClient};

const FETCH_FAILED: &str = "Failed to fetch panels";

/// Panels page state.
#[derive(Debug, Clone, Default)]
pub struct PanelsPage {
    state: ListState<PanelOutput>,
}

impl PanelsPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[PanelOutput] {
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

    #[must_use]
    pub fn find(&self, id: PanelId) -> Option<&PanelOutput> {
        self.items().iter().find(|p| p.id == id)
    }

    /// Re-fetch the whole list.
    #[instrument(skip_all)]
    pub async fn refresh(&mut self, client: &ConsoleClient) {
        self.state.begin();
        let result = client.list_panels().await;
        self.state.finish(result, FETCH_FAILED);
    }

    /// Delete a panel, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns the error of the delete call; the list is left as it was.
    #[instrument(skip(self, client))]
    pub async fn delete(&mut self, client: &ConsoleClient, id: PanelId) -> Result<String, ApiError> {
        let message = client.delete_panel(id).await.inspect_err(|e| {
            tracing::error!(panel_id = %id, error = %e, "Failed to delete panel");
        })?;
        self.refresh(client).await;
        Ok(message)
    }

    /// Flip a panel's active flag, then re-fetch.
    ///
    /// # Errors
    ///
    /// Returns the error of the toggle call; the list is left as it was.
    #[instrument(skip(self, client))]
    pub async fn toggle_active(
        &mut self,
        client: &ConsoleClient,
        id: PanelId,
    ) -> Result<String, ApiError> {
        let message = client.toggle_panel_status(id).await.inspect_err(|e| {
            tracing::error!(panel_id = %id, error = %e, "Failed to toggle panel status");
        })?;
        self.refresh(client).await;
        Ok(message)
    }

    /// Re-fetch after a dialog reported success.
    pub async fn apply_dialog_success(&mut self, client: &ConsoleClient) {
        self.refresh(client).await;
    }
}

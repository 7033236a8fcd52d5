//! Panel integration endpoints.

use proxy_console_core::{PanelId, PanelInput};
use reqwest::Method;
use tracing::instrument;

use super::{ApiError, ConsoleClient};

impl ConsoleClient {
    /// Register a panel.
    ///
    /// # Errors
    ///
    /// Returns the server's first error message on rejection.
    #[instrument(skip(self, input), fields(name = %input.name, panel_type = %input.panel_type))]
    pub async fn create_panel(&self, input: &PanelInput) -> Result<String, ApiError> {
        self.mutate(Method::POST, "superadmin/panel", Some(input)).await
    }

    /// Replace a panel.
    ///
    /// # Errors
    ///
    /// Returns the server's first error message on rejection.
    #[instrument(skip(self, input), fields(panel_id = %id))]
    pub async fn update_panel(&self, id: PanelId, input: &PanelInput) -> Result<String, ApiError> {
        self.mutate(Method::PUT, &format!("superadmin/panel/{id}"), Some(input))
            .await
    }

    /// Delete a panel.
    ///
    /// # Errors
    ///
    /// Returns the server's first error message on rejection.
    #[instrument(skip(self), fields(panel_id = %id))]
    pub async fn delete_panel(&self, id: PanelId) -> Result<String, ApiError> {
        self.mutate::<()>(Method::DELETE, &format!("superadmin/panel/{id}"), None)
            .await
    }

    /// Flip the active flag of a panel.
    ///
    /// # Errors
    ///
    /// Returns the server's first error message on rejection.
    #[instrument(skip(self), fields(panel_id = %id))]
    pub async fn toggle_panel_status(&self, id: PanelId) -> Result<String, ApiError> {
        self.mutate::<()>(Method::PUT, &format!("superadmin/panel/{id}/status"), None)
            .await
    }
}

//! Admin account endpoints.

use proxy_console_core::{AdminId, AdminInput, PanelInbounds};
use reqwest::Method;
use tracing::instrument;

use super::{ApiError, ConsoleClient};

impl ConsoleClient {
    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns the server's first error message on rejection.
    #[instrument(skip(self, input), fields(username = %input.username, panel = %input.panel))]
    pub async fn create_admin(&self, input: &AdminInput) -> Result<String, ApiError> {
        self.mutate(Method::POST, "superadmin/admin", Some(input)).await
    }

    /// Replace an admin account.
    ///
    /// # Errors
    ///
    /// Returns the server's first error message on rejection.
    #[instrument(skip(self, input), fields(admin_id = %id))]
    pub async fn update_admin(&self, id: AdminId, input: &AdminInput) -> Result<String, ApiError> {
        self.mutate(Method::PUT, &format!("superadmin/admin/{id}"), Some(input))
            .await
    }

    /// Delete an admin account.
    ///
    /// # Errors
    ///
    /// Returns the server's first error message on rejection.
    #[instrument(skip(self), fields(admin_id = %id))]
    pub async fn delete_admin(&self, id: AdminId) -> Result<String, ApiError> {
        self.mutate::<()>(Method::DELETE, &format!("superadmin/admin/{id}"), None)
            .await
    }

    /// Flip the active flag of an admin account.
    ///
    /// # Errors
    ///
    /// Returns the server's first error message on rejection.
    #[instrument(skip(self), fields(admin_id = %id))]
    pub async fn toggle_admin_status(&self, id: AdminId) -> Result<String, ApiError> {
        self.mutate::<()>(Method::PUT, &format!("superadmin/admin/{id}/status"), None)
            .await
    }

    /// Inbound tags of a Marzban panel, grouped by protocol.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel is unknown or unreachable.
    #[instrument(skip(self))]
    pub async fn panel_inbounds(&self, panel_name: &str) -> Result<PanelInbounds, ApiError> {
        let path = format!(
            "superadmin/panel/{}/inbounds",
            urlencoding::encode(panel_name)
        );
        self.get_data(&path, "panel inbounds").await
    }
}

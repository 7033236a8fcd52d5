//! Dashboard and listing endpoints.

use proxy_console_core::{AdminOutput, DashboardData, PanelOutput};
use tracing::instrument;

use super::{ApiError, ConsoleClient};

impl ConsoleClient {
    /// Dashboard payload for the logged-in account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardData, ApiError> {
        self.get_data("dashboard", "dashboard").await
    }

    /// All admin accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_admins(&self) -> Result<Vec<AdminOutput>, ApiError> {
        let admins: Vec<AdminOutput> = self.get_data("superadmin/admins", "admins").await?;
        tracing::debug!(count = admins.len(), "Fetched admins");
        Ok(admins)
    }

    /// All panel integrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_panels(&self) -> Result<Vec<PanelOutput>, ApiError> {
        let panels: Vec<PanelOutput> = self.get_data("superadmin/panels", "panels").await?;
        tracing::debug!(count = panels.len(), "Fetched panels");
        Ok(panels)
    }
}

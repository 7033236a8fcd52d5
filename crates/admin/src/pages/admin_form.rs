//! Admin create/edit dialog.

use chrono::NaiveDate;
use proxy_console_core::forms::AdminForm;
use proxy_console_core::{AdminId, AdminOutput, InboundSelection, PanelInbounds, PanelOutput, PanelType};
use tracing::instrument;

use super::FormError;
use crate::api::ConsoleClient;

/// State of the admin dialog between `open` and `close`.
#[derive(Debug, Clone)]
pub struct AdminFormDialog {
    /// Form values; edit freely before `submit`.
    pub form: AdminForm,
    editing: Option<AdminId>,
    panels: Vec<PanelOutput>,
    inbounds: Option<PanelInbounds>,
    selection: InboundSelection,
    error: Option<String>,
    submitting: bool,
    today: NaiveDate,
}

impl AdminFormDialog {
    /// Open the dialog for creating (`None`) or editing an admin.
    pub async fn open(client: &ConsoleClient, admin: Option<&AdminOutput>) -> Self {
        Self::open_on(client, admin, chrono::Local::now().date_naive()).await
    }

    /// Open the dialog with an explicit "today" for expiry arithmetic.
    ///
    /// Panels are loaded for the picker; a load failure is logged and
    /// leaves the picker empty.
    #[instrument(skip(client, admin), fields(admin_id = ?admin.map(|a| a.id)))]
    pub async fn open_on(
        client: &ConsoleClient,
        admin: Option<&AdminOutput>,
        today: NaiveDate,
    ) -> Self {
        let panels = client.list_panels().await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load panels");
            Vec::new()
        });

        let (form, selection) = admin.map_or_else(
            || (AdminForm::default(), InboundSelection::new()),
            |admin| {
                let selection = admin.inbound_selection().unwrap_or_else(|e| {
                    tracing::error!(admin_id = %admin.id, error = %e, "Failed to parse marzban_inbounds");
                    InboundSelection::new()
                });
                (AdminForm::from_admin(admin, today), selection)
            },
        );

        Self {
            form,
            editing: admin.map(|a| a.id),
            panels,
            inbounds: None,
            selection,
            error: None,
            submitting: false,
            today,
        }
    }

    /// Whether the dialog edits an existing admin.
    #[must_use]
    pub const fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    /// Panels available in the picker.
    #[must_use]
    pub fn panels(&self) -> &[PanelOutput] {
        &self.panels
    }

    /// Inbounds of the selected Marzban panel, once loaded.
    #[must_use]
    pub const fn inbounds(&self) -> Option<&PanelInbounds> {
        self.inbounds.as_ref()
    }

    #[must_use]
    pub const fn selection(&self) -> &InboundSelection {
        &self.selection
    }

    /// Server error of the last submit.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Type of the currently selected panel, if it is in the picker.
    #[must_use]
    pub fn panel_type(&self) -> Option<&PanelType> {
        self.panels
            .iter()
            .find(|p| p.name == self.form.panel)
            .map(|p| &p.panel_type)
    }

    /// Select a panel by name.
    ///
    /// Clears the inbound selection; for Marzban panels the inbound list is
    /// loaded (a failure is logged and leaves it unset).
    #[instrument(skip(self, client))]
    pub async fn select_panel(&mut self, client: &ConsoleClient, name: &str) {
        self.form.panel = name.to_owned();
        self.selection = InboundSelection::new();
        self.inbounds = None;

        if self
            .panel_type()
            .is_some_and(PanelType::uses_inbound_selection)
        {
            match client.panel_inbounds(name).await {
                Ok(inbounds) => self.inbounds = Some(inbounds),
                Err(e) => tracing::error!(panel = %name, error = %e, "Failed to load inbounds"),
            }
        }
    }

    /// Select or deselect a Marzban inbound.
    pub fn toggle_inbound(&mut self, protocol: &str, tag: &str) {
        self.selection.toggle(protocol, tag);
    }

    /// Validate and send the form.
    ///
    /// On success returns the server message; the caller re-fetches the list
    /// and closes the dialog.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Validation`] without calling the backend when a
    /// rule fails, or [`FormError::Server`] with the first server message.
    #[instrument(skip(self, client), fields(username = %self.form.username, panel = %self.form.panel))]
    pub async fn submit(&mut self, client: &ConsoleClient) -> Result<String, FormError> {
        self.error = None;
        let panel_type = self.panel_type().cloned();
        self.form
            .validate(panel_type.as_ref())
            .map_err(FormError::Validation)?;

        if panel_type
            .as_ref()
            .is_some_and(PanelType::uses_inbound_selection)
            && self.selection.is_empty()
        {
            tracing::warn!(panel = %self.form.panel, "No inbounds selected for Marzban admin");
        }

        let input = self
            .form
            .to_input(panel_type.as_ref(), &self.selection, self.today);

        self.submitting = true;
        let result = match self.editing {
            Some(id) => client.update_admin(id, &input).await,
            None => client.create_admin(&input).await,
        };
        self.submitting = false;

        result.map_err(|e| {
            tracing::error!(error = %e, "Admin submit failed");
            let err = FormError::from_api(&e);
            self.error = Some(err.to_string());
            err
        })
    }

    /// Reset the dialog to an empty create form.
    pub fn close(&mut self) {
        self.form = AdminForm::default();
        self.editing = None;
        self.inbounds = None;
        self.selection = InboundSelection::new();
        self.error = None;
        self.submitting = false;
    }
}

//! Panel create/edit dialog.

use proxy_console_core::forms::PanelForm;
use proxy_console_core::{PanelId, PanelOutput};
use tracing::instrument;

use super::FormError;
use crate::api::ConsoleClient;

/// State of the panel dialog between `open` and `close`.
#[derive(Debug, Clone, Default)]
pub struct PanelFormDialog {
    /// Form values; edit freely before `submit`.
    pub form: PanelForm,
    editing: Option<PanelId>,
    error: Option<String>,
    submitting: bool,
}

impl PanelFormDialog {
    /// Open the dialog for creating (`None`) or editing a panel.
    ///
    /// Credentials are not prefilled and must be entered again.
    #[must_use]
    pub fn open(panel: Option<&PanelOutput>) -> Self {
        Self {
            form: panel.map(PanelForm::from_panel).unwrap_or_default(),
            editing: panel.map(|p| p.id),
            error: None,
            submitting: false,
        }
    }

    #[must_use]
    pub const fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Validate and send the form.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Validation`] without calling the backend when a
    /// rule fails, or [`FormError::Server`] with the first server message.
    #[instrument(skip(self, client), fields(name = %self.form.name))]
    pub async fn submit(&mut self, client: &ConsoleClient) -> Result<String, FormError> {
        self.error = None;
        self.form.validate().map_err(FormError::Validation)?;
        let input = self.form.to_input();

        self.submitting = true;
        let result = match self.editing {
            Some(id) => client.update_panel(id, &input).await,
            None => client.create_panel(&input).await,
        };
        self.submitting = false;

        result.map_err(|e| {
            tracing::error!(error = %e, "Panel submit failed");
            let err = FormError::from_api(&e);
            self.error = Some(err.to_string());
            err
        })
    }

    /// Reset the dialog to an empty create form.
    pub fn close(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proxy_console_core::PanelType;

    use super::*;

    #[test]
    fn test_open_for_edit_leaves_credentials_blank() {
        let panel = PanelOutput {
            id: PanelId::new(3),
            panel_type: PanelType::TxUi,
            name: "finland".to_owned(),
            url: "https://fi.example.com:2053/".to_owned(),
            is_active: false,
        };
        let dialog = PanelFormDialog::open(Some(&panel));
        assert!(dialog.is_edit());
        assert_eq!(dialog.form.panel_type, "tx-ui");
        assert!(!dialog.form.is_active);
        assert!(dialog.form.username.is_empty());
        assert!(dialog.form.password.is_empty());
    }

    #[test]
    fn test_close_resets_to_create() {
        let mut dialog = PanelFormDialog::open(None);
        dialog.form.name = "germany".to_owned();
        dialog.close();
        assert!(!dialog.is_edit());
        assert!(dialog.form.name.is_empty());
        assert_eq!(dialog.form.panel_type, "3x-ui");
    }
}

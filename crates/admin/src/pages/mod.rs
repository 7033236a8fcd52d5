//! Console pages and dialogs as plain state holders.
//!
//! Every page follows the same contract: fetch the full collection, replace
//! it wholesale, and re-fetch after any successful mutation. A failed fetch
//! keeps the previous items and records an error string; a failed mutation
//! leaves the state untouched and hands the error back to the caller.

mod admin_form;
mod admins;
mod panel_form;
mod panels;
mod settings;

use proxy_console_core::ValidationErrors;
use thiserror::Error;

pub use admin_form::AdminFormDialog;
pub use admins::{AdminRow, AdminsPage};
pub use panel_form::PanelFormDialog;
pub use panels::PanelsPage;
pub use settings::SettingsPage;

use crate::api::ApiError;

/// Fallback shown when a dialog submit fails without a server message.
pub const OPERATION_FAILED: &str = "Operation failed";

/// Items of a list page plus its load status.
#[derive(Debug, Clone)]
pub struct ListState<T> {
    items: Vec<T>,
    error: Option<String>,
    loading: bool,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
            loading: false,
        }
    }
}

impl<T> ListState<T> {
    /// Current items.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Error of the last fetch, if it failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) const fn begin(&mut self) {
        self.loading = true;
    }

    /// Record the outcome of a fetch.
    ///
    /// Success replaces the items and clears the error; failure keeps the
    /// items. `loading` is cleared either way.
    pub(crate) fn finish(&mut self, result: Result<Vec<T>, ApiError>, fallback: &str) {
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
            }
            Err(e) => {
                tracing::error!(error = %e, "{fallback}");
                self.error = Some(server_message(&e).unwrap_or_else(|| fallback.to_owned()));
            }
        }
        self.loading = false;
    }
}

/// The message the backend sent with an error, if there was one.
pub(crate) fn server_message(error: &ApiError) -> Option<String> {
    match error {
        ApiError::Server { message, .. }
        | ApiError::Rejected(message)
        | ApiError::Unauthorized(message) => Some(message.clone()),
        _ => None,
    }
}

/// Why a dialog submit did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Local validation failed; nothing was sent.
    #[error("{}", .0.first().map_or("Invalid input", |e| e.message.as_str()))]
    Validation(ValidationErrors),

    /// The backend rejected the submit.
    #[error("{0}")]
    Server(String),
}

impl FormError {
    pub(crate) fn from_api(error: &ApiError) -> Self {
        Self::Server(server_message(error).unwrap_or_else(|| OPERATION_FAILED.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_keeps_items_on_failure() {
        let mut state = ListState::default();
        state.begin();
        state.finish(Ok(vec![1, 2, 3]), "Failed to fetch numbers");
        assert_eq!(state.items(), &[1, 2, 3]);
        assert!(!state.is_loading());

        state.begin();
        state.finish(
            Err(ApiError::MissingData("numbers")),
            "Failed to fetch numbers",
        );
        assert_eq!(state.items(), &[1, 2, 3]);
        assert_eq!(state.error(), Some("Failed to fetch numbers"));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_finish_prefers_server_message() {
        let mut state: ListState<i32> = ListState::default();
        state.finish(
            Err(ApiError::Server {
                status: 403,
                message: "Superadmin only".to_owned(),
            }),
            "Failed to fetch numbers",
        );
        assert_eq!(state.error(), Some("Superadmin only"));

        state.finish(Ok(vec![]), "Failed to fetch numbers");
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_form_error_from_api_fallback() {
        let err = FormError::from_api(&ApiError::Parse("eof".to_owned()));
        assert_eq!(err.to_string(), OPERATION_FAILED);
    }
}

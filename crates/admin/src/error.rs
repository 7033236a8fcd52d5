//! Unified error handling for the console library.

use proxy_console_core::ValidationErrors;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::panels::PanelError;
use crate::tasks::TaskError;

/// Umbrella error for callers that drive several layers at once.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Console backend call failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Upstream panel call failed.
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    /// Client management failed.
    #[error("{0}")]
    Task(#[from] TaskError),

    /// Local form validation failed.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Anything else worth reporting to the operator.
    #[error("{0}")]
    Other(String),
}

impl ConsoleError {
    /// The single message shown to the operator.
    ///
    /// Validation failures report only their first field error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) | Self::Task(TaskError::Validation(errors)) => errors
                .first()
                .map_or_else(|| errors.to_string(), |e| e.message.clone()),
            other => other.to_string(),
        }
    }
}

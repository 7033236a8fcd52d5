//! Console API errors.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the console backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credentials or the token.
    #[error("{0}")]
    Unauthorized(String),

    /// The backend answered with an error status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The backend answered 2xx with `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// A successful envelope carried no data.
    #[error("Response for {0} carried no data")]
    MissingData(&'static str),

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Local file I/O failed (backup download or restore).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend base URL could not be joined with a path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Error body shapes returned by the backend.
///
/// Handlers answer with the standard envelope, a plain `detail` string, or
/// a list of validation issues under `detail`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Envelope { message: String },
    Detail { detail: String },
    Issues { detail: Vec<Issue> },
}

#[derive(Debug, Deserialize)]
struct Issue {
    msg: String,
}

/// Extract the single first error message from an error body.
pub(crate) fn first_error_message(body: &str, status: u16) -> String {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Envelope { message } | ErrorBody::Detail { detail: message }) => {
            Some(message)
        }
        Ok(ErrorBody::Issues { detail }) => detail.into_iter().next().map(|issue| issue.msg),
        Err(_) => None,
    };

    message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_message_envelope() {
        let body = r#"{"success": false, "message": "Admin already exists"}"#;
        assert_eq!(first_error_message(body, 400), "Admin already exists");
    }

    #[test]
    fn test_first_error_message_detail() {
        let body = r#"{"detail": "Panel not found"}"#;
        assert_eq!(first_error_message(body, 404), "Panel not found");
    }

    #[test]
    fn test_first_error_message_takes_first_issue() {
        let body = r#"{"detail": [
            {"loc": ["body", "username"], "msg": "field required", "type": "missing"},
            {"loc": ["body", "panel"], "msg": "field required", "type": "missing"}
        ]}"#;
        assert_eq!(first_error_message(body, 422), "field required");
    }

    #[test]
    fn test_first_error_message_fallback() {
        assert_eq!(first_error_message("<html>oops</html>", 502), "HTTP 502");
        assert_eq!(first_error_message(r#"{"detail": []}"#, 422), "HTTP 422");
        assert_eq!(first_error_message(r#"{"message": "  "}"#, 500), "HTTP 500");
    }

    #[test]
    fn test_server_error_displays_message_only() {
        let err = ApiError::Server {
            status: 400,
            message: "Username taken".to_string(),
        };
        assert_eq!(err.to_string(), "Username taken");
        assert_eq!(err.status(), Some(400));
    }
}

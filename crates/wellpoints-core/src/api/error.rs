use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unauthorized - token may be expired")]
    Unauthorized(String),

    /// The refresh endpoint rejected the stored refresh token (or failed).
    /// The session has been cleared.
    #[error("Session expired - token refresh failed: {0}")]
    RefreshFailed(#[source] Box<ApiError>),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Coarse error classes callers branch on for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response or timeout
    Network,
    /// 401, or refresh rejected
    Auth,
    /// 4xx business-rule failures
    Validation,
    /// 5xx, malformed responses, local storage failures
    Server,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(truncated),
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            code @ 400..=499 => ApiError::Validation {
                status: code,
                message: truncated,
            },
            code @ 500..=599 => ApiError::Server {
                status: code,
                message: truncated,
            },
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Unauthorized(_) | ApiError::RefreshFailed(_) => ErrorKind::Auth,
            ApiError::AccessDenied(_)
            | ApiError::NotFound(_)
            | ApiError::Validation { .. }
            | ApiError::Encode(_) => ErrorKind::Validation,
            ApiError::Server { .. } | ApiError::InvalidResponse(_) | ApiError::Storage(_) => {
                ErrorKind::Server
            }
        }
    }

    /// HTTP status carried by the error, if the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::RefreshFailed(inner) => inner.status(),
            ApiError::InvalidResponse(_) | ApiError::Encode(_) | ApiError::Storage(_) => None,
        }
    }
}

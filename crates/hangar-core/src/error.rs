//! Error taxonomy shared by the store, the upstream clients, and the gateway.

use thiserror::Error;

/// Every failure the backend can surface to a caller. The gateway maps each
/// kind to an HTTP status; no kind is ever retried.
#[derive(Debug, Clone, Error)]
pub enum HangarError {
    /// Malformed or missing input, rejected before any other work.
    #[error("{0}")]
    BadRequest(String),

    /// Unknown flight id (data routes only).
    #[error("{0}")]
    NotFound(String),

    /// Required upstream credentials are absent; no network call was made.
    #[error("{0}")]
    Configuration(String),

    /// The provider returned an error status; its message is forwarded.
    #[error("upstream returned {status}: {detail}")]
    Upstream { status: u16, detail: String },

    /// No response from the provider (transport failure or timeout).
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The provider responded, but the body could not be parsed or lacked the
    /// expected fields.
    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// Local file read/write failure with no safe default.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl HangarError {
    /// Stable slug used in the JSON error body and the audit log.
    pub fn kind(&self) -> &'static str {
        match self {
            HangarError::BadRequest(_) => "bad-request",
            HangarError::NotFound(_) => "not-found",
            HangarError::Configuration(_) => "not-configured",
            HangarError::Upstream { .. } => "upstream-error",
            HangarError::Unavailable(_) => "upstream-unavailable",
            HangarError::Malformed(_) => "upstream-malformed",
            HangarError::Storage(_) => "storage-error",
        }
    }

    /// HTTP status for this kind. Provider error statuses are forwarded
    /// as-is when they are valid, otherwise reported as a bad gateway.
    pub fn http_status(&self) -> u16 {
        match self {
            HangarError::BadRequest(_) => 400,
            HangarError::NotFound(_) => 404,
            HangarError::Configuration(_) | HangarError::Storage(_) => 500,
            HangarError::Upstream { status, .. } => {
                if (400..=599).contains(status) {
                    *status
                } else {
                    502
                }
            }
            HangarError::Malformed(_) => 502,
            HangarError::Unavailable(_) => 503,
        }
    }

    /// Human-readable detail for the JSON error body.
    pub fn detail(&self) -> String {
        match self {
            HangarError::Upstream { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

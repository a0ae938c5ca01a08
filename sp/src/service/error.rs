//! Service error types

use thiserror::Error;

/// Errors from a plan or render service call
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failure response with a structured (JSON) body
    #[error("Service error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },

    /// Failure response whose body is not structured (binary, HTML, empty...)
    #[error("Service error {status} with opaque body ({})", .content_type.as_deref().unwrap_or("no content type"))]
    Opaque { status: u16, content_type: Option<String> },

    /// Success response that does not match the expected contract
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Server-supplied detail, when the failure carried one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ServiceError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of the failure response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Rejected { status, .. } | ServiceError::Opaque { status, .. } => Some(*status),
            ServiceError::Network(e) => e.status().map(|s| s.as_u16()),
            ServiceError::Malformed(_) => None,
        }
    }

    /// A success payload that could not be understood, rather than a failed call
    pub fn is_malformed(&self) -> bool {
        matches!(self, ServiceError::Malformed(_))
    }

    /// Human-readable message: the server detail if present, else `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().map(str::to_string).unwrap_or_else(|| fallback.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Malformed(e.to_string())
    }
}

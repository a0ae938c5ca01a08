//! Response disambiguation
//!
//! The render service answers with presentation bytes on success, but a
//! failure may arrive either as opaque bytes or as a JSON error body. The
//! declared content type decides how a failure body is read: only structured
//! bodies are parsed for a `detail`.

use serde_json::Value;
use tracing::debug;

use super::ServiceError;

/// Content type of a rendered PowerPoint deck
pub const PPTX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// How a response body is encoded, judged from its declared content type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// JSON, possibly carrying a `detail` field
    Structured,
    /// Anything else: binary, HTML, plain text, or undeclared
    Opaque,
}

/// Classify a `Content-Type` header value
///
/// `application/json` and any `+json` suffix type count as structured;
/// parameters such as `charset` are ignored.
pub fn classify(content_type: Option<&str>) -> BodyEncoding {
    let Some(raw) = content_type else {
        return BodyEncoding::Opaque;
    };
    let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    if essence == "application/json" || essence.ends_with("+json") {
        BodyEncoding::Structured
    } else {
        BodyEncoding::Opaque
    }
}

/// Pull a human-readable message out of a JSON error body
///
/// `detail` may be a plain string, or a list of validation errors each with a
/// `msg` field (joined with "; "). Any other shape yields `None`.
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Array(entries) => {
            let msgs: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(Value::as_str))
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}

/// Build the error for a non-success response from its parts
pub fn failure_from_parts(status: u16, content_type: Option<&str>, body: &[u8]) -> ServiceError {
    debug!(status, ?content_type, body_len = body.len(), "failure_from_parts: called");
    match classify(content_type) {
        BodyEncoding::Structured => ServiceError::Rejected {
            status,
            detail: extract_detail(body),
        },
        BodyEncoding::Opaque => ServiceError::Opaque {
            status,
            content_type: content_type.map(str::to_string),
        },
    }
}

/// Read a failed `reqwest` response into a `ServiceError`
pub async fn failure_from_response(response: reqwest::Response) -> ServiceError {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match response.bytes().await {
        Ok(body) => failure_from_parts(status, content_type.as_deref(), &body),
        Err(e) => {
            debug!(status, error = %e, "failure_from_response: could not read body");
            ServiceError::Opaque { status, content_type }
        }
    }
}

//! Records exchanged with the backend, and the shared API error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by collaborator calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("API request failed: {0}")]
    Request(String),

    /// The backend returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    Response { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Whether repeating the same call later could succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }

    /// The backend's `{"error": "..."}` message, if the response carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        let Self::Response { body, .. } = self else {
            return None;
        };
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        Some(parsed.error).filter(|m| !m.trim().is_empty())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

// =============================================================================
// NOTES
// =============================================================================

/// A note as returned by `GET /notes/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Opaque canvas document; decoded by [`crate::services::document`].
    #[serde(default)]
    pub canvas_data: Option<Value>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

// =============================================================================
// ANNOTATIONS
// =============================================================================

/// An AI insight attached to a span of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub selected_text: String,
    pub insight: String,
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub shape_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Body of `POST /notes/{id}/annotations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAnnotation {
    pub selected_text: String,
    pub insight: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_id: Option<String>,
    pub prompt: Option<String>,
}

// =============================================================================
// REMINDERS
// =============================================================================

/// A reminder as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    #[serde(default)]
    pub note_id: Option<String>,
    #[serde(default)]
    pub block_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub early_reminder_minutes: u32,
    #[serde(default)]
    pub notified: bool,
    #[serde(default)]
    pub completed: bool,
}

/// Body of `POST /reminders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReminder {
    pub note_id: String,
    pub block_id: Option<String>,
    pub message: String,
    /// ISO-8601 due date in UTC.
    pub due_date: String,
    pub early_reminder_minutes: u32,
}

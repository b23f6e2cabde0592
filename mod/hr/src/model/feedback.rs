use serde::{Deserialize, Serialize};

/// Lifecycle of a background polish run. Absent entirely when polishing
/// was never requested for the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolishStatus {
    Polishing,
    Ready,
    Failed,
}

/// A peer feedback entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Who wrote it.
    pub author_id: String,

    /// Who it is about.
    pub target_user_id: String,

    /// The original text as written.
    pub content: String,

    /// AI-polished rendition, present once a polish run succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polished_content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polish_status: Option<PolishStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polish_error: Option<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating a feedback entry. Supplying `model` requests a
/// background polish run with that inference model.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFeedback {
    pub target_user_id: String,
    pub content: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Input for editing a feedback entry. Same `model` semantics.
#[derive(Debug, Clone, Deserialize)]
pub struct EditFeedback {
    pub content: String,
    #[serde(default)]
    pub model: Option<String>,
}

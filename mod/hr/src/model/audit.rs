use serde::{Deserialize, Serialize};

/// One append-only audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// User who performed the action.
    pub actor_id: String,

    /// Action name, e.g. "absence:approve".
    pub action: String,

    /// Table of the affected record.
    pub target_table: String,

    /// Id of the affected record.
    pub target_id: String,

    /// Free-form JSON context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp.
    pub created_at: String,
}

/// Filters for listing/exporting audit entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub target_table: Option<String>,
    /// Inclusive RFC 3339 lower bound.
    #[serde(default)]
    pub from: Option<String>,
    /// Inclusive RFC 3339 upper bound.
    #[serde(default)]
    pub to: Option<String>,
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbsenceType {
    Vacation,
    Sick,
    Personal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbsenceStatus {
    Pending,
    Approved,
    Rejected,
}

impl AbsenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbsenceStatus::Pending => "PENDING",
            AbsenceStatus::Approved => "APPROVED",
            AbsenceStatus::Rejected => "REJECTED",
        }
    }
}

/// An absence request. Submitted PENDING; decided exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceRequest {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Owner of the request.
    pub user_id: String,

    pub absence_type: AbsenceType,

    /// First day of absence (YYYY-MM-DD).
    pub start_date: String,

    /// Last day of absence (YYYY-MM-DD), inclusive.
    pub end_date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    pub status: AbsenceStatus,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for submitting an absence request.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAbsence {
    pub absence_type: AbsenceType,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_as_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&AbsenceType::Vacation).unwrap(),
            "\"VACATION\""
        );
        assert_eq!(
            serde_json::from_str::<AbsenceStatus>("\"REJECTED\"").unwrap(),
            AbsenceStatus::Rejected
        );
    }
}

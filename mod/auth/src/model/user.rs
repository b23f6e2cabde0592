use serde::{Deserialize, Serialize};

/// Role membership. A user holds a set of these; most hold exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Role {
    /// Canonical role name, as stored and as carried in claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "EMPLOYEE",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        }
    }

    /// The authority string for this role, e.g. `ROLE_ADMIN`.
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.as_str())
    }
}

/// Compensation and contact details only self, the direct manager and
/// admins may see. Kept in its own block so the public profile view can
/// drop it wholesale instead of field-by-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitiveData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_address: Option<String>,
}

/// An employee identity.
///
/// The password hash is intentionally NOT a field here: it lives in its
/// own database column and never enters any serializable struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Unique login email.
    pub email: String,

    pub first_name: String,
    pub last_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    /// Whether the account may authenticate.
    #[serde(default = "default_true")]
    pub active: bool,

    /// Role memberships. A singleton set is the common case.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Direct manager's user id. Forms a tree; direct link only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,

    /// Hire date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<String>,

    /// Restricted profile block, absent from the public view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<SensitiveData>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

impl User {
    /// Authority strings for this user's roles, e.g. `["ROLE_MANAGER"]`.
    pub fn authorities(&self) -> Vec<String> {
        self.roles.iter().map(Role::authority).collect()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// The profile view anyone authenticated may see: no sensitive block.
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub active: bool,
    pub roles: Vec<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            job_title: u.job_title,
            department: u.department,
            active: u.active,
            roles: u.roles,
            manager_id: u.manager_id,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Input for registering a new user.
#[derive(Clone, Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    /// Defaults to `[EMPLOYEE]` when empty.
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default)]
    pub hire_date: Option<String>,
    #[serde(default)]
    pub sensitive: Option<SensitiveData>,
}

// Hand-written so the raw password can never reach a log line.
impl std::fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUser")
            .field("email", &self.email)
            .field("password", &"***")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("roles", &self.roles)
            .field("manager_id", &self.manager_id)
            .finish_non_exhaustive()
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        let json = serde_json::to_string(&Role::Manager).unwrap();
        assert_eq!(json, "\"MANAGER\"");
        let back: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(back, Role::Admin);
    }

    #[test]
    fn authorities_are_prefixed() {
        assert_eq!(Role::Employee.authority(), "ROLE_EMPLOYEE");
        assert_eq!(Role::Admin.authority(), "ROLE_ADMIN");
    }

    #[test]
    fn public_view_has_no_sensitive_block() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "a@x.com",
            "first_name": "A",
            "last_name": "B",
            "roles": ["EMPLOYEE"],
            "sensitive": {"salary": 60000.0},
            "created_at": "2026-01-01T00:00:00+00:00",
            "updated_at": "2026-01-01T00:00:00+00:00"
        }))
        .unwrap();

        let full = serde_json::to_value(&user).unwrap();
        assert!(full.get("sensitive").is_some());

        let public = serde_json::to_value(UserPublic::from(user)).unwrap();
        assert!(public.get("sensitive").is_none());
        assert_eq!(public["email"], "a@x.com");
    }

    #[test]
    fn register_debug_masks_password() {
        let input: RegisterUser = serde_json::from_value(serde_json::json!({
            "email": "a@x.com",
            "password": "hunter2",
            "first_name": "A",
            "last_name": "B"
        }))
        .unwrap();
        let debug = format!("{:?}", input);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }
}

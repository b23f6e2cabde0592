use openhr_core::{ListParams, ListResult, merge_patch, new_id, now_rfc3339};
use openhr_sql::Value;

use crate::model::{RegisterUser, Role, User, UserPublic};
use crate::service::{AuthError, AuthService, access, password};

/// Optional filters for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub department: Option<String>,
    pub manager_id: Option<String>,
}

impl AuthService {
    /// Register a new user. Enforces unique email, hashes the password,
    /// defaults the role set to `[EMPLOYEE]`.
    pub fn register_user(&self, input: RegisterUser) -> Result<User, AuthError> {
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(AuthError::Validation("email is not valid".into()));
        }
        if input.password.is_empty() {
            return Err(AuthError::Validation("password cannot be empty".into()));
        }
        if self.find_user_by_email(&input.email)?.is_some() {
            return Err(AuthError::Conflict("email already in use".into()));
        }
        if let Some(ref manager_id) = input.manager_id {
            // Fails with NotFound if the manager does not exist.
            self.get_user(manager_id)
                .map_err(|_| AuthError::Validation("manager does not exist".into()))?;
        }

        let hash = password::hash_password(&input.password)?;
        let now = now_rfc3339();
        let roles = if input.roles.is_empty() {
            vec![Role::Employee]
        } else {
            input.roles
        };

        let user = User {
            id: new_id(),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            job_title: input.job_title,
            department: input.department,
            active: true,
            roles,
            manager_id: input.manager_id,
            hire_date: input.hire_date,
            sensitive: input.sensitive,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        self.insert_record(
            "users",
            &user.id,
            &user,
            &user_indexes(&user, &hash, &now),
        )?;

        tracing::info!(user_id = %user.id, email = %user.email, "registered user");
        Ok(user)
    }

    /// Get a user by id.
    pub fn get_user(&self, id: &str) -> Result<User, AuthError> {
        self.get_record("users", id)
    }

    /// Find a user by email. `None` if absent.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = self
            .sql
            .query_one(
                "SELECT data FROM users WHERE email = ?1",
                &[Value::Text(email.to_string())],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        match row {
            Some(row) => {
                let data = row
                    .get_str("data")
                    .ok_or_else(|| AuthError::Internal("missing data column".into()))?;
                let user =
                    serde_json::from_str(data).map_err(|e| AuthError::Internal(e.to_string()))?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Find a user together with their stored password hash.
    ///
    /// The only caller is the authenticator; the hash never travels
    /// further than the verify call.
    pub(crate) fn find_user_with_hash(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AuthError> {
        let row = self
            .sql
            .query_one(
                "SELECT data, password_hash FROM users WHERE email = ?1",
                &[Value::Text(email.to_string())],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        match row {
            Some(row) => {
                let data = row
                    .get_str("data")
                    .ok_or_else(|| AuthError::Internal("missing data column".into()))?;
                let user: User =
                    serde_json::from_str(data).map_err(|e| AuthError::Internal(e.to_string()))?;
                let hash = row
                    .get_str("password_hash")
                    .ok_or_else(|| AuthError::Internal("missing password_hash column".into()))?
                    .to_string();
                Ok(Some((user, hash)))
            }
            None => Ok(None),
        }
    }

    /// List users with optional department/manager filters.
    pub fn list_users(
        &self,
        filter: &UserFilter,
        params: &ListParams,
    ) -> Result<ListResult<UserPublic>, AuthError> {
        let mut filters: Vec<(&str, Value)> = Vec::new();
        if let Some(ref department) = filter.department {
            filters.push(("department", Value::Text(department.clone())));
        }
        if let Some(ref manager_id) = filter.manager_id {
            filters.push(("manager_id", Value::Text(manager_id.clone())));
        }

        let (items, total): (Vec<User>, usize) =
            self.list_records("users", &filters, params.limit, params.offset)?;
        Ok(ListResult {
            items: items.into_iter().map(UserPublic::from).collect(),
            total,
        })
    }

    /// Direct reports of a user.
    pub fn list_reports(&self, manager_id: &str) -> Result<Vec<User>, AuthError> {
        let (items, _) = self.list_records(
            "users",
            &[("manager_id", Value::Text(manager_id.to_string()))],
            usize::MAX >> 1,
            0,
        )?;
        Ok(items)
    }

    /// Profile view of `id` for `current`: the full record (sensitive
    /// block included) for self, the direct manager and admins, the
    /// public view for everyone else.
    pub fn get_user_profile(
        &self,
        id: &str,
        current: &User,
    ) -> Result<serde_json::Value, AuthError> {
        let target = self.get_user(id)?;
        let value = if access::can_view_full_profile(current, &target) {
            serde_json::to_value(&target)
        } else {
            serde_json::to_value(UserPublic::from(target))
        };
        value.map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Update a profile with JSON merge-patch semantics. Allowed for
    /// self, the direct manager, or an admin.
    ///
    /// Identity fields (id, email, created_at) and the RBAC fields
    /// (roles, manager_id, active) are pinned — the latter change only
    /// through [`Self::set_user_roles`] / [`Self::set_user_manager`].
    pub fn update_user(
        &self,
        id: &str,
        patch: serde_json::Value,
        current: &User,
    ) -> Result<User, AuthError> {
        let existing = self.get_user(id)?;
        if !access::can_update_profile(current, &existing) {
            return Err(AuthError::Forbidden(
                "you do not have permission to update this profile".into(),
            ));
        }

        let now = now_rfc3339();
        let mut base = serde_json::to_value(&existing)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        merge_patch(&mut base, &patch);
        base["id"] = serde_json::json!(existing.id);
        base["email"] = serde_json::json!(existing.email);
        base["roles"] = serde_json::json!(existing.roles);
        base["active"] = serde_json::json!(existing.active);
        base["created_at"] = serde_json::json!(existing.created_at);
        base["updated_at"] = serde_json::json!(now);
        match existing.manager_id {
            Some(ref m) => base["manager_id"] = serde_json::json!(m),
            None => {
                if let Some(obj) = base.as_object_mut() {
                    obj.remove("manager_id");
                }
            }
        }

        let updated: User = serde_json::from_value(base)
            .map_err(|e| AuthError::Validation(format!("invalid profile patch: {}", e)))?;

        self.update_record("users", id, &updated, &user_update_indexes(&updated, &now))?;
        Ok(updated)
    }

    /// Replace a user's role set. Manager or admin only.
    pub fn set_user_roles(
        &self,
        id: &str,
        roles: Vec<Role>,
        current: &User,
    ) -> Result<User, AuthError> {
        if !access::can_assign(current) {
            return Err(AuthError::Forbidden(
                "only managers and admins may assign roles".into(),
            ));
        }
        if roles.is_empty() {
            return Err(AuthError::Validation("role set cannot be empty".into()));
        }

        let mut user = self.get_user(id)?;
        let now = now_rfc3339();
        user.roles = roles;
        user.updated_at = now.clone();
        self.update_record("users", id, &user, &user_update_indexes(&user, &now))?;
        Ok(user)
    }

    /// Reassign a user's direct manager. Manager or admin only.
    pub fn set_user_manager(
        &self,
        id: &str,
        manager_id: Option<String>,
        current: &User,
    ) -> Result<User, AuthError> {
        if !access::can_assign(current) {
            return Err(AuthError::Forbidden(
                "only managers and admins may reassign managers".into(),
            ));
        }
        if manager_id.as_deref() == Some(id) {
            return Err(AuthError::Validation("a user cannot manage themselves".into()));
        }
        if let Some(ref manager_id) = manager_id {
            self.get_user(manager_id)
                .map_err(|_| AuthError::Validation("manager does not exist".into()))?;
        }

        let mut user = self.get_user(id)?;
        let now = now_rfc3339();
        user.manager_id = manager_id;
        user.updated_at = now.clone();
        self.update_record("users", id, &user, &user_update_indexes(&user, &now))?;
        Ok(user)
    }

    /// Deactivate or reactivate an account. Manager or admin only.
    /// Deactivation also invalidates every live refresh token.
    pub fn set_user_active(
        &self,
        id: &str,
        active: bool,
        current: &User,
    ) -> Result<User, AuthError> {
        if !access::can_assign(current) {
            return Err(AuthError::Forbidden(
                "only managers and admins may change account status".into(),
            ));
        }

        let mut user = self.get_user(id)?;
        let now = now_rfc3339();
        user.active = active;
        user.updated_at = now.clone();
        self.update_record("users", id, &user, &user_update_indexes(&user, &now))?;
        if !active {
            self.logout_all(&user.id)?;
        }
        Ok(user)
    }

    /// Delete a user. Admins and the direct manager may delete; nobody
    /// may delete themselves, and a user still managing others cannot
    /// be removed.
    pub fn delete_user(&self, id: &str, current: &User) -> Result<(), AuthError> {
        let target = self.get_user(id)?;
        if !access::can_delete_user(current, &target) {
            if access::is_self(current, &target) {
                return Err(AuthError::Forbidden("no user can delete themselves".into()));
            }
            return Err(AuthError::Forbidden(
                "you do not have permission to delete this user".into(),
            ));
        }

        let reports = self
            .sql
            .query_one(
                "SELECT COUNT(*) as cnt FROM users WHERE manager_id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0);
        if reports > 0 {
            return Err(AuthError::Conflict(format!(
                "user still manages {} other user(s)",
                reports
            )));
        }

        // Refresh tokens stay as an audit trail, but none may live on.
        self.logout_all(id)?;

        let affected = self
            .sql
            .exec(
                "DELETE FROM users WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(AuthError::NotFound(format!("users/{}", id)));
        }

        tracing::info!(user_id = %id, actor = %current.id, "deleted user");
        Ok(())
    }

    /// Create the seed admin account at first start. A no-op when the
    /// email is already registered. The hash comes pre-computed from
    /// deployment config; no password ever appears here.
    pub fn bootstrap_admin(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        if self.find_user_by_email(email)?.is_some() {
            return Ok(());
        }

        let now = now_rfc3339();
        let user = User {
            id: new_id(),
            email: email.to_string(),
            first_name: "Admin".to_string(),
            last_name: "Account".to_string(),
            job_title: None,
            department: None,
            active: true,
            roles: vec![Role::Admin],
            manager_id: None,
            hire_date: None,
            sensitive: None,
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        self.insert_record(
            "users",
            &user.id,
            &user,
            &user_indexes(&user, password_hash, &now),
        )?;
        tracing::info!(email = %email, "created bootstrap admin account");
        Ok(())
    }
}

fn user_indexes<'a>(user: &User, password_hash: &str, now: &str) -> Vec<(&'a str, Value)> {
    vec![
        ("email", Value::Text(user.email.clone())),
        ("password_hash", Value::Text(password_hash.to_string())),
        ("active", Value::Integer(if user.active { 1 } else { 0 })),
        (
            "manager_id",
            match user.manager_id {
                Some(ref m) => Value::Text(m.clone()),
                None => Value::Null,
            },
        ),
        (
            "department",
            match user.department {
                Some(ref d) => Value::Text(d.clone()),
                None => Value::Null,
            },
        ),
        ("created_at", Value::Text(now.to_string())),
        ("updated_at", Value::Text(now.to_string())),
    ]
}

/// Index columns touched on update — the password hash is not among
/// them, so profile updates can never overwrite it.
fn user_update_indexes<'a>(user: &User, now: &str) -> Vec<(&'a str, Value)> {
    vec![
        ("active", Value::Integer(if user.active { 1 } else { 0 })),
        (
            "manager_id",
            match user.manager_id {
                Some(ref m) => Value::Text(m.clone()),
                None => Value::Null,
            },
        ),
        (
            "department",
            match user.department {
                Some(ref d) => Value::Text(d.clone()),
                None => Value::Null,
            },
        ),
        ("updated_at", Value::Text(now.to_string())),
    ]
}

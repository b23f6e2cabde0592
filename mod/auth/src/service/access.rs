//! Access control predicates.
//!
//! All functions here are pure: they look only at entities the caller
//! already resolved. Handlers resolve the current principal's user
//! record once per request and pass it down — there is no ambient
//! "current user" lookup anywhere in this module.

use crate::model::{Role, User};

/// The target is the current user themselves.
pub fn is_self(current: &User, target: &User) -> bool {
    current.id == target.id
}

/// The current user is the target's DIRECT manager. Transitive
/// management (manager's manager) does not count.
pub fn is_manager_of(current: &User, target: &User) -> bool {
    target.manager_id.as_deref() == Some(current.id.as_str())
}

pub fn is_admin(user: &User) -> bool {
    user.has_role(Role::Admin)
}

pub fn is_manager(user: &User) -> bool {
    user.has_role(Role::Manager)
}

/// Membership in any of the given roles.
pub fn has_any_role(user: &User, roles: &[Role]) -> bool {
    roles.iter().any(|r| user.has_role(*r))
}

// ── Composite rules ─────────────────────────────────────────────────

/// Full profile (sensitive block included): self, direct manager, admin.
pub fn can_view_full_profile(current: &User, target: &User) -> bool {
    is_self(current, target) || is_manager_of(current, target) || is_admin(current)
}

/// Profile updates follow the same rule as the full view.
pub fn can_update_profile(current: &User, target: &User) -> bool {
    is_self(current, target) || is_manager_of(current, target) || is_admin(current)
}

/// Absence decisions: the owner's direct manager, or an admin.
pub fn can_approve_absence(current: &User, owner: &User) -> bool {
    is_manager_of(current, owner) || is_admin(current)
}

/// Deletion: direct manager or admin, and never yourself.
pub fn can_delete_user(current: &User, target: &User) -> bool {
    !is_self(current, target) && (is_manager_of(current, target) || is_admin(current))
}

/// Role and manager reassignment: anyone holding the manager or admin role.
pub fn can_assign(current: &User) -> bool {
    is_manager(current) || is_admin(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, roles: Vec<Role>, manager_id: Option<&str>) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@x.com", id),
            first_name: id.to_string(),
            last_name: "T".to_string(),
            job_title: None,
            department: None,
            active: true,
            roles,
            manager_id: manager_id.map(|m| m.to_string()),
            hire_date: None,
            sensitive: None,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            updated_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn manager_of_is_direct_only() {
        let top = user("top", vec![Role::Manager], None);
        let mid = user("mid", vec![Role::Manager], Some("top"));
        let leaf = user("leaf", vec![Role::Employee], Some("mid"));

        assert!(is_manager_of(&top, &mid));
        assert!(is_manager_of(&mid, &leaf));
        // Grand-report: business intuition says yes, the rule says no.
        assert!(!is_manager_of(&top, &leaf));
        assert!(!is_manager_of(&leaf, &mid));
    }

    #[test]
    fn self_check_uses_ids() {
        let a = user("a", vec![], None);
        let a_again = user("a", vec![Role::Admin], Some("b"));
        let b = user("b", vec![], None);
        assert!(is_self(&a, &a_again));
        assert!(!is_self(&a, &b));
    }

    #[test]
    fn role_predicates() {
        let admin = user("a", vec![Role::Admin], None);
        let manager = user("m", vec![Role::Manager], None);
        let both = user("b", vec![Role::Manager, Role::Admin], None);
        let employee = user("e", vec![Role::Employee], None);

        assert!(is_admin(&admin) && !is_manager(&admin));
        assert!(is_manager(&manager) && !is_admin(&manager));
        assert!(is_admin(&both) && is_manager(&both));
        assert!(!is_admin(&employee) && !is_manager(&employee));

        assert!(has_any_role(&employee, &[Role::Employee, Role::Admin]));
        assert!(!has_any_role(&employee, &[Role::Manager, Role::Admin]));
    }

    #[test]
    fn full_profile_rule() {
        let admin = user("root", vec![Role::Admin], None);
        let manager = user("mgr", vec![Role::Manager], None);
        let target = user("t", vec![Role::Employee], Some("mgr"));
        let peer = user("p", vec![Role::Employee], Some("mgr"));

        assert!(can_view_full_profile(&target, &target));
        assert!(can_view_full_profile(&manager, &target));
        assert!(can_view_full_profile(&admin, &target));
        assert!(!can_view_full_profile(&peer, &target));
    }

    #[test]
    fn absence_rule() {
        let admin = user("root", vec![Role::Admin], None);
        let manager = user("mgr", vec![Role::Manager], None);
        let other_manager = user("mgr2", vec![Role::Manager], None);
        let owner = user("o", vec![Role::Employee], Some("mgr"));

        assert!(can_approve_absence(&manager, &owner));
        assert!(can_approve_absence(&admin, &owner));
        // Holding the MANAGER role is not enough — must be the owner's manager.
        assert!(!can_approve_absence(&other_manager, &owner));
        assert!(!can_approve_absence(&owner, &owner));
    }

    #[test]
    fn delete_rule_never_allows_self() {
        let admin = user("root", vec![Role::Admin], None);
        let manager = user("mgr", vec![Role::Manager], None);
        let report = user("r", vec![Role::Employee], Some("mgr"));
        let stranger = user("s", vec![Role::Employee], None);

        // Admin can delete others but never themselves.
        assert!(can_delete_user(&admin, &report));
        assert!(!can_delete_user(&admin, &admin));

        assert!(can_delete_user(&manager, &report));
        assert!(!can_delete_user(&manager, &stranger));
        assert!(!can_delete_user(&report, &report));
    }

    #[test]
    fn assignment_rule() {
        assert!(can_assign(&user("m", vec![Role::Manager], None)));
        assert!(can_assign(&user("a", vec![Role::Admin], None)));
        assert!(!can_assign(&user("e", vec![Role::Employee], None)));
    }
}

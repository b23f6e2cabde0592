use auth::model::User;
use auth::service::access;
use openhr_core::{new_id, now_rfc3339};
use openhr_sql::Value;

use crate::model::{AbsenceRequest, AbsenceStatus, SubmitAbsence};
use crate::service::{HrError, HrService};

impl HrService {
    /// Submit a new absence request for the current user.
    pub fn submit_absence(
        &self,
        current: &User,
        input: SubmitAbsence,
    ) -> Result<AbsenceRequest, HrError> {
        // ISO dates: lexicographic order equals chronological order.
        if input.end_date < input.start_date {
            return Err(HrError::Validation(
                "end_date must not be before start_date".into(),
            ));
        }

        let now = now_rfc3339();
        let request = AbsenceRequest {
            id: new_id(),
            user_id: current.id.clone(),
            absence_type: input.absence_type,
            start_date: input.start_date,
            end_date: input.end_date,
            reason: input.reason,
            status: AbsenceStatus::Pending,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        self.insert_record(
            "absences",
            &request.id,
            &request,
            &[
                ("user_id", Value::Text(request.user_id.clone())),
                ("status", Value::Text(request.status.as_str().to_string())),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;

        self.audit_record(
            &current.id,
            "absence:submit",
            "absences",
            &request.id,
            None,
        )?;
        Ok(request)
    }

    /// Get a single absence request; owner, their direct manager and
    /// admins may see it.
    pub fn get_absence(&self, current: &User, id: &str) -> Result<AbsenceRequest, HrError> {
        let request: AbsenceRequest = self.get_record("absences", id)?;
        let owner = self.get_auth_user(&request.user_id)?;
        if !(access::is_self(current, &owner)
            || access::is_manager_of(current, &owner)
            || access::is_admin(current))
        {
            return Err(HrError::Forbidden(
                "you do not have permission to view this absence".into(),
            ));
        }
        Ok(request)
    }

    /// The current user's own absence requests.
    pub fn list_own_absences(&self, current: &User) -> Result<Vec<AbsenceRequest>, HrError> {
        self.query_records(
            "SELECT data FROM absences WHERE user_id = ?1 ORDER BY created_at DESC",
            &[Value::Text(current.id.clone())],
        )
    }

    /// Absence requests of one user; self, direct manager or admin only.
    pub fn list_absences_for_user(
        &self,
        current: &User,
        user_id: &str,
    ) -> Result<Vec<AbsenceRequest>, HrError> {
        let owner = self.get_auth_user(user_id)?;
        if !(access::is_self(current, &owner)
            || access::is_manager_of(current, &owner)
            || access::is_admin(current))
        {
            return Err(HrError::Forbidden(
                "you do not have permission to view these absences".into(),
            ));
        }
        self.query_records(
            "SELECT data FROM absences WHERE user_id = ?1 ORDER BY created_at DESC",
            &[Value::Text(owner.id.clone())],
        )
    }

    /// All requests of the current manager's direct reports, optionally
    /// narrowed by status.
    pub fn list_team_absences(
        &self,
        current: &User,
        status: Option<AbsenceStatus>,
    ) -> Result<Vec<AbsenceRequest>, HrError> {
        if !access::is_manager(current) && !access::is_admin(current) {
            return Err(HrError::Forbidden(
                "only managers can view absences for their reports".into(),
            ));
        }

        match status {
            Some(status) => self.query_records(
                "SELECT a.data as data FROM absences a
                 JOIN users u ON u.id = a.user_id
                 WHERE u.manager_id = ?1 AND a.status = ?2
                 ORDER BY a.created_at DESC",
                &[
                    Value::Text(current.id.clone()),
                    Value::Text(status.as_str().to_string()),
                ],
            ),
            None => self.query_records(
                "SELECT a.data as data FROM absences a
                 JOIN users u ON u.id = a.user_id
                 WHERE u.manager_id = ?1
                 ORDER BY a.created_at DESC",
                &[Value::Text(current.id.clone())],
            ),
        }
    }

    /// Approve a pending request. Owner's direct manager or admin.
    pub fn approve_absence(
        &self,
        current: &User,
        id: &str,
    ) -> Result<AbsenceRequest, HrError> {
        self.decide_absence(current, id, AbsenceStatus::Approved)
    }

    /// Reject a pending request. Owner's direct manager or admin.
    pub fn reject_absence(
        &self,
        current: &User,
        id: &str,
    ) -> Result<AbsenceRequest, HrError> {
        self.decide_absence(current, id, AbsenceStatus::Rejected)
    }

    fn decide_absence(
        &self,
        current: &User,
        id: &str,
        decision: AbsenceStatus,
    ) -> Result<AbsenceRequest, HrError> {
        let mut request: AbsenceRequest = self.get_record("absences", id)?;
        let owner = self.get_auth_user(&request.user_id)?;

        if !access::can_approve_absence(current, &owner) {
            return Err(HrError::Forbidden(
                "only the owner's manager or an admin may decide this absence".into(),
            ));
        }
        if request.status != AbsenceStatus::Pending {
            return Err(HrError::Validation(format!(
                "absence is already {}",
                request.status.as_str()
            )));
        }

        let now = now_rfc3339();
        request.status = decision;
        request.updated_at = now.clone();
        self.update_record(
            "absences",
            id,
            &request,
            &[
                ("status", Value::Text(decision.as_str().to_string())),
                ("updated_at", Value::Text(now)),
            ],
        )?;

        let action = match decision {
            AbsenceStatus::Approved => "absence:approve",
            _ => "absence:reject",
        };
        self.audit_record(
            &current.id,
            action,
            "absences",
            id,
            Some(serde_json::json!({"owner": owner.id})),
        )?;

        tracing::info!(absence = %id, actor = %current.id, status = decision.as_str(), "absence decided");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use auth::model::Role;

    use super::*;
    use crate::model::AbsenceType;
    use crate::service::test_support::{register, test_services};

    fn submit(hr: &HrService, owner: &User) -> AbsenceRequest {
        hr.submit_absence(
            owner,
            SubmitAbsence {
                absence_type: AbsenceType::Vacation,
                start_date: "2026-09-01".to_string(),
                end_date: "2026-09-05".to_string(),
                reason: Some("holiday".to_string()),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_submit_starts_pending() {
        let (auth, hr) = test_services();
        let owner = register(&auth, "emp@x.com", vec![], None);
        let request = submit(&hr, &owner);
        assert_eq!(request.status, AbsenceStatus::Pending);
        assert_eq!(request.user_id, owner.id);

        let own = hr.list_own_absences(&owner).unwrap();
        assert_eq!(own.len(), 1);
    }

    #[test]
    fn test_reversed_dates_rejected() {
        let (auth, hr) = test_services();
        let owner = register(&auth, "emp@x.com", vec![], None);
        let err = hr
            .submit_absence(
                &owner,
                SubmitAbsence {
                    absence_type: AbsenceType::Sick,
                    start_date: "2026-09-05".to_string(),
                    end_date: "2026-09-01".to_string(),
                    reason: None,
                },
            )
            .err()
            .unwrap();
        assert!(matches!(err, HrError::Validation(_)));
    }

    #[test]
    fn test_direct_manager_approves() {
        let (auth, hr) = test_services();
        let manager = register(&auth, "mgr@x.com", vec![Role::Manager], None);
        let owner = register(&auth, "emp@x.com", vec![], Some(manager.id.clone()));
        let request = submit(&hr, &owner);

        let decided = hr.approve_absence(&manager, &request.id).unwrap();
        assert_eq!(decided.status, AbsenceStatus::Approved);

        // Deciding twice is invalid.
        let err = hr.reject_absence(&manager, &request.id).err().unwrap();
        assert!(matches!(err, HrError::Validation(_)));
    }

    #[test]
    fn test_unrelated_manager_cannot_decide() {
        let (auth, hr) = test_services();
        let manager = register(&auth, "mgr@x.com", vec![Role::Manager], None);
        let other = register(&auth, "other-mgr@x.com", vec![Role::Manager], None);
        let owner = register(&auth, "emp@x.com", vec![], Some(manager.id.clone()));
        let request = submit(&hr, &owner);

        // Holding MANAGER is not enough; must be the owner's manager.
        let err = hr.approve_absence(&other, &request.id).err().unwrap();
        assert!(matches!(err, HrError::Forbidden(_)));

        // The owner can't approve their own request either.
        let err = hr.approve_absence(&owner, &request.id).err().unwrap();
        assert!(matches!(err, HrError::Forbidden(_)));
    }

    #[test]
    fn test_admin_can_decide_anyones() {
        let (auth, hr) = test_services();
        let admin = register(&auth, "admin@x.com", vec![Role::Admin], None);
        let owner = register(&auth, "emp@x.com", vec![], None);
        let request = submit(&hr, &owner);

        let decided = hr.reject_absence(&admin, &request.id).unwrap();
        assert_eq!(decided.status, AbsenceStatus::Rejected);
    }

    #[test]
    fn test_decision_is_audited() {
        let (auth, hr) = test_services();
        let manager = register(&auth, "mgr@x.com", vec![Role::Manager], None);
        let owner = register(&auth, "emp@x.com", vec![], Some(manager.id.clone()));
        let request = submit(&hr, &owner);
        hr.approve_absence(&manager, &request.id).unwrap();

        let (entries, _) = hr
            .list_audit(&crate::model::AuditQuery::default(), &Default::default())
            .unwrap();
        assert!(entries.iter().any(|e| {
            e.action == "absence:approve" && e.actor_id == manager.id && e.target_id == request.id
        }));
    }

    #[test]
    fn test_team_listing_by_status() {
        let (auth, hr) = test_services();
        let manager = register(&auth, "mgr@x.com", vec![Role::Manager], None);
        let a = register(&auth, "a@x.com", vec![], Some(manager.id.clone()));
        let b = register(&auth, "b@x.com", vec![], Some(manager.id.clone()));
        let outsider = register(&auth, "c@x.com", vec![], None);

        let req_a = submit(&hr, &a);
        submit(&hr, &b);
        submit(&hr, &outsider);

        let team = hr.list_team_absences(&manager, None).unwrap();
        assert_eq!(team.len(), 2);

        hr.approve_absence(&manager, &req_a.id).unwrap();
        let pending = hr
            .list_team_absences(&manager, Some(AbsenceStatus::Pending))
            .unwrap();
        assert_eq!(pending.len(), 1);

        // Employees can't use the team listing.
        let err = hr.list_team_absences(&a, None).err().unwrap();
        assert!(matches!(err, HrError::Forbidden(_)));
    }

    #[test]
    fn test_per_user_listing_gated() {
        let (auth, hr) = test_services();
        let manager = register(&auth, "mgr@x.com", vec![Role::Manager], None);
        let owner = register(&auth, "emp@x.com", vec![], Some(manager.id.clone()));
        let peer = register(&auth, "peer@x.com", vec![], None);
        submit(&hr, &owner);

        assert_eq!(hr.list_absences_for_user(&owner, &owner.id).unwrap().len(), 1);
        assert_eq!(hr.list_absences_for_user(&manager, &owner.id).unwrap().len(), 1);
        assert!(hr.list_absences_for_user(&peer, &owner.id).is_err());
    }
}

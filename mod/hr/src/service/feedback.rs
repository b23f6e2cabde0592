use std::sync::Arc;

use auth::model::User;
use auth::service::access;
use openhr_core::{new_id, now_rfc3339};
use openhr_sql::Value;

use crate::model::{CreateFeedback, EditFeedback, Feedback, PolishStatus};
use crate::service::{HrError, HrService};

impl HrService {
    /// Create a feedback entry. When a model is named, the entry starts
    /// in POLISHING and a background task produces the polished text —
    /// the call itself returns immediately.
    pub fn create_feedback(
        self: &Arc<Self>,
        current: &User,
        input: CreateFeedback,
    ) -> Result<Feedback, HrError> {
        if input.content.trim().is_empty() {
            return Err(HrError::Validation("feedback content cannot be empty".into()));
        }
        let target = self.get_auth_user(&input.target_user_id)?;

        let now = now_rfc3339();
        let mut entry = Feedback {
            id: new_id(),
            author_id: current.id.clone(),
            target_user_id: target.id.clone(),
            content: input.content,
            polished_content: None,
            polish_status: None,
            polish_error: None,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        if input.model.is_some() {
            entry.polish_status = Some(PolishStatus::Polishing);
        }

        self.insert_record(
            "feedback",
            &entry.id,
            &entry,
            &[
                ("author_id", Value::Text(entry.author_id.clone())),
                ("target_user_id", Value::Text(entry.target_user_id.clone())),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;

        self.audit_record(
            &current.id,
            "feedback:create",
            "feedback",
            &entry.id,
            Some(serde_json::json!({"target": target.id})),
        )?;

        if let Some(model) = input.model {
            self.spawn_polish(entry.id.clone(), entry.content.clone(), model);
        }

        Ok(entry)
    }

    /// Get one entry. Author, target, the target's direct manager and
    /// admins may view.
    pub fn get_feedback(&self, current: &User, id: &str) -> Result<Feedback, HrError> {
        let entry: Feedback = self.get_record("feedback", id)?;
        if !self.can_view_feedback(current, &entry)? {
            return Err(HrError::Forbidden(
                "you do not have permission to view this feedback".into(),
            ));
        }
        Ok(entry)
    }

    /// Entries a user authored or received, filtered to what the caller
    /// may see.
    pub fn list_feedback_for_user(
        &self,
        current: &User,
        user_id: &str,
    ) -> Result<Vec<Feedback>, HrError> {
        let entries: Vec<Feedback> = self.query_records(
            "SELECT data FROM feedback
             WHERE author_id = ?1 OR target_user_id = ?1
             ORDER BY created_at DESC",
            &[Value::Text(user_id.to_string())],
        )?;

        let mut visible = Vec::new();
        for entry in entries {
            if self.can_view_feedback(current, &entry)? {
                visible.push(entry);
            }
        }
        Ok(visible)
    }

    /// Edit an entry's text. Author, the target's direct manager or an
    /// admin. Naming a model restarts polishing from the new text.
    pub fn edit_feedback(
        self: &Arc<Self>,
        current: &User,
        id: &str,
        input: EditFeedback,
    ) -> Result<Feedback, HrError> {
        let mut entry: Feedback = self.get_record("feedback", id)?;
        let target = self.get_auth_user(&entry.target_user_id)?;

        let may_edit = entry.author_id == current.id
            || access::is_manager_of(current, &target)
            || access::is_admin(current);
        if !may_edit {
            return Err(HrError::Forbidden(
                "you do not have permission to edit this feedback".into(),
            ));
        }
        if input.content.trim().is_empty() {
            return Err(HrError::Validation("feedback content cannot be empty".into()));
        }

        let now = now_rfc3339();
        entry.content = input.content;
        entry.polished_content = None;
        entry.polish_error = None;
        entry.polish_status = input.model.as_ref().map(|_| PolishStatus::Polishing);
        entry.updated_at = now.clone();

        self.update_record(
            "feedback",
            id,
            &entry,
            &[("updated_at", Value::Text(now))],
        )?;

        self.audit_record(&current.id, "feedback:edit", "feedback", id, None)?;

        if let Some(model) = input.model {
            self.spawn_polish(entry.id.clone(), entry.content.clone(), model);
        }

        Ok(entry)
    }

    fn can_view_feedback(&self, current: &User, entry: &Feedback) -> Result<bool, HrError> {
        if entry.author_id == current.id
            || entry.target_user_id == current.id
            || access::is_admin(current)
        {
            return Ok(true);
        }
        let target = self.get_auth_user(&entry.target_user_id)?;
        Ok(access::is_manager_of(current, &target))
    }

    /// Fire-and-forget polish run. No ordering guarantee with later
    /// reads beyond eventual consistency; no cancellation.
    fn spawn_polish(self: &Arc<Self>, feedback_id: String, content: String, model: String) {
        let svc = Arc::clone(self);
        tokio::spawn(async move {
            svc.run_polish(&feedback_id, &content, &model).await;
        });
    }

    pub(crate) async fn run_polish(&self, feedback_id: &str, content: &str, model: &str) {
        let outcome = self.polisher.polish(content, model).await;

        let mut entry: Feedback = match self.get_record("feedback", feedback_id) {
            Ok(entry) => entry,
            // Deleted or unreadable in the meantime — nothing to update.
            Err(e) => {
                tracing::warn!(feedback = %feedback_id, error = %e, "polish target vanished");
                return;
            }
        };

        let now = now_rfc3339();
        match outcome {
            Ok(polished) => {
                entry.polished_content = Some(polished);
                entry.polish_status = Some(PolishStatus::Ready);
                entry.polish_error = None;
            }
            Err(e) => {
                entry.polished_content = None;
                entry.polish_status = Some(PolishStatus::Failed);
                entry.polish_error = Some(e.to_string());
                tracing::warn!(feedback = %feedback_id, error = %e, "polish run failed");
            }
        }
        entry.updated_at = now.clone();

        if let Err(e) = self.update_record(
            "feedback",
            feedback_id,
            &entry,
            &[("updated_at", Value::Text(now))],
        ) {
            tracing::warn!(feedback = %feedback_id, error = %e, "failed to store polish result");
        }
    }
}

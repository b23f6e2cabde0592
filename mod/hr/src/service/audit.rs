use openhr_core::{ListParams, new_id, now_rfc3339};
use openhr_sql::Value;

use crate::model::{AuditLog, AuditQuery};
use crate::service::{HrError, HrService};

impl HrService {
    /// Append one audit entry. Entries are never updated or deleted.
    pub fn audit_record(
        &self,
        actor_id: &str,
        action: &str,
        target_table: &str,
        target_id: &str,
        details: Option<serde_json::Value>,
    ) -> Result<AuditLog, HrError> {
        let entry = AuditLog {
            id: new_id(),
            actor_id: actor_id.to_string(),
            action: action.to_string(),
            target_table: target_table.to_string(),
            target_id: target_id.to_string(),
            details,
            created_at: now_rfc3339(),
        };

        self.insert_record(
            "audit_log",
            &entry.id,
            &entry,
            &[
                ("actor_id", Value::Text(entry.actor_id.clone())),
                ("action", Value::Text(entry.action.clone())),
                ("target_table", Value::Text(entry.target_table.clone())),
                ("created_at", Value::Text(entry.created_at.clone())),
            ],
        )?;
        Ok(entry)
    }

    /// List audit entries matching the filters, newest first.
    pub fn list_audit(
        &self,
        query: &AuditQuery,
        params: &ListParams,
    ) -> Result<(Vec<AuditLog>, usize), HrError> {
        let (where_sql, mut bind) = build_filters(query);

        let count_sql = format!("SELECT COUNT(*) as cnt FROM audit_log{}", where_sql);
        let total = self
            .sql
            .query_one(&count_sql, &bind)
            .map_err(|e| HrError::Storage(e.to_string()))?
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let limit_idx = bind.len() + 1;
        let offset_idx = bind.len() + 2;
        bind.push(Value::Integer(params.limit as i64));
        bind.push(Value::Integer(params.offset as i64));

        let sql = format!(
            "SELECT data FROM audit_log{} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            where_sql, limit_idx, offset_idx,
        );
        let items = self.query_records(&sql, &bind)?;
        Ok((items, total))
    }

    /// Export the filtered entries as CSV (header + one line per entry).
    pub fn export_audit_csv(&self, query: &AuditQuery) -> Result<String, HrError> {
        let (where_sql, bind) = build_filters(query);
        let sql = format!(
            "SELECT data FROM audit_log{} ORDER BY created_at DESC",
            where_sql
        );
        let entries: Vec<AuditLog> = self.query_records(&sql, &bind)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "id",
                "actor_id",
                "action",
                "target_table",
                "target_id",
                "details",
                "created_at",
            ])
            .map_err(|e| HrError::Internal(e.to_string()))?;
        for entry in &entries {
            let details = entry
                .details
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_default();
            writer
                .write_record([
                    entry.id.as_str(),
                    entry.actor_id.as_str(),
                    entry.action.as_str(),
                    entry.target_table.as_str(),
                    entry.target_id.as_str(),
                    details.as_str(),
                    entry.created_at.as_str(),
                ])
                .map_err(|e| HrError::Internal(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| HrError::Internal(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| HrError::Internal(e.to_string()))
    }
}

fn build_filters(query: &AuditQuery) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut bind = Vec::new();

    let mut push = |clauses: &mut Vec<String>, bind: &mut Vec<Value>, clause: &str, v: String| {
        clauses.push(format!("{} ?{}", clause, bind.len() + 1));
        bind.push(Value::Text(v));
    };

    if let Some(ref actor) = query.actor_id {
        push(&mut clauses, &mut bind, "actor_id =", actor.clone());
    }
    if let Some(ref action) = query.action {
        push(&mut clauses, &mut bind, "action =", action.clone());
    }
    if let Some(ref table) = query.target_table {
        push(&mut clauses, &mut bind, "target_table =", table.clone());
    }
    if let Some(ref from) = query.from {
        push(&mut clauses, &mut bind, "created_at >=", from.clone());
    }
    if let Some(ref to) = query.to {
        push(&mut clauses, &mut bind, "created_at <=", to.clone());
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, bind)
}

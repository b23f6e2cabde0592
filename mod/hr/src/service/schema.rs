use openhr_sql::SQLStore;

use crate::service::HrError;

/// Initialize the SQLite schema for HR resources.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), HrError> {
    let statements = [
        // Absence requests
        "CREATE TABLE IF NOT EXISTS absences (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            status TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_absences_user ON absences(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_absences_status ON absences(status)",

        // Feedback entries
        "CREATE TABLE IF NOT EXISTS feedback (
            id TEXT PRIMARY KEY,
            author_id TEXT NOT NULL,
            target_user_id TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_feedback_author ON feedback(author_id)",
        "CREATE INDEX IF NOT EXISTS idx_feedback_target ON feedback(target_user_id)",

        // Audit log: append-only, no updated_at by design of the resource
        "CREATE TABLE IF NOT EXISTS audit_log (
            id TEXT PRIMARY KEY,
            actor_id TEXT NOT NULL,
            action TEXT NOT NULL,
            target_table TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_audit_actor ON audit_log(actor_id)",
        "CREATE INDEX IF NOT EXISTS idx_audit_action ON audit_log(action)",
        "CREATE INDEX IF NOT EXISTS idx_audit_created ON audit_log(created_at)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])
            .map_err(|e| HrError::Storage(e.to_string()))?;
    }

    Ok(())
}

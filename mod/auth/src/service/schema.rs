use openhr_sql::SQLStore;

use crate::service::AuthError;

/// Initialize the SQLite schema for auth resources.
///
/// `password_hash` is a bare column on purpose — it is not part of the
/// JSON `data` record, so no serialization path can ever emit it.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), AuthError> {
    let statements = [
        // Users table: core identity
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            manager_id TEXT,
            department TEXT,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_users_manager ON users(manager_id)",
        "CREATE INDEX IF NOT EXISTS idx_users_department ON users(department)",

        // Refresh tokens: id is the opaque token string itself.
        // Rows are never deleted; `valid` is flipped to 0 on consume/logout.
        "CREATE TABLE IF NOT EXISTS refresh_tokens (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            valid INTEGER NOT NULL DEFAULT 1,
            expires_at TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user ON refresh_tokens(user_id, valid)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])
            .map_err(|e| AuthError::Storage(e.to_string()))?;
    }

    Ok(())
}

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, params_from_iter};

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path)
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        // Enable WAL mode for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned((*i).into()),
            Value::Real(f) => ToSqlOutput::Owned((*f).into()),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// Extract a Value from a rusqlite row at a given column index.
fn value_at(row: &rusqlite::Row, idx: usize) -> Value {
    match row.get_ref(idx) {
        Ok(ValueRef::Integer(i)) => Value::Integer(i),
        Ok(ValueRef::Real(f)) => Value::Real(f),
        Ok(ValueRef::Text(t)) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        Ok(ValueRef::Blob(b)) => Value::Blob(b.to_vec()),
        Ok(ValueRef::Null) | Err(_) => Value::Null,
    }
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let columns = column_names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| (name.clone(), value_at(row, i)))
                    .collect();
                Ok(Row { columns })
            })
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        let affected = conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        Ok(affected as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let s = SqliteStore::open_in_memory().unwrap();
        s.exec(
            "CREATE TABLE t (id TEXT PRIMARY KEY, n INTEGER, x REAL, note TEXT)",
            &[],
        )
        .unwrap();
        s
    }

    #[test]
    fn test_exec_and_query() {
        let s = store();
        let affected = s
            .exec(
                "INSERT INTO t (id, n, x, note) VALUES (?1, ?2, ?3, ?4)",
                &[
                    Value::Text("a".into()),
                    Value::Integer(7),
                    Value::Real(1.5),
                    Value::Null,
                ],
            )
            .unwrap();
        assert_eq!(affected, 1);

        let rows = s
            .query("SELECT * FROM t WHERE id = ?1", &[Value::Text("a".into())])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("id"), Some("a"));
        assert_eq!(rows[0].get_i64("n"), Some(7));
        assert_eq!(rows[0].get_f64("x"), Some(1.5));
        assert_eq!(rows[0].get("note"), Some(&Value::Null));
    }

    #[test]
    fn test_query_one() {
        let s = store();
        assert!(s.query_one("SELECT * FROM t", &[]).unwrap().is_none());
        s.exec(
            "INSERT INTO t (id, n) VALUES ('a', 1), ('b', 2)",
            &[],
        )
        .unwrap();
        let row = s
            .query_one("SELECT * FROM t ORDER BY id", &[])
            .unwrap()
            .unwrap();
        assert_eq!(row.get_str("id"), Some("a"));
    }

    #[test]
    fn test_affected_count_on_update() {
        let s = store();
        s.exec("INSERT INTO t (id, n) VALUES ('a', 1), ('b', 1)", &[])
            .unwrap();
        let affected = s
            .exec("UPDATE t SET n = 2 WHERE n = 1", &[])
            .unwrap();
        assert_eq!(affected, 2);
        let affected = s
            .exec("UPDATE t SET n = 3 WHERE n = 99", &[])
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let s = SqliteStore::open(&dir.path().join("test.db")).unwrap();
        s.exec("CREATE TABLE k (id TEXT)", &[]).unwrap();
        s.exec("INSERT INTO k (id) VALUES ('x')", &[]).unwrap();
        assert_eq!(s.query("SELECT * FROM k", &[]).unwrap().len(), 1);
    }
}

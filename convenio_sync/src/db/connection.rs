//! SQLite connection helpers.

use std::path::Path;

use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};

use crate::store::{StoreError, StoreResult};

/// Strip an optional `sqlite://` or `sqlite:` scheme; diesel wants a path or `file:` URI.
pub fn sqlite_path(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

/// Open an existing SQLite database and apply connection-wide PRAGMAs.
///
/// A missing file is a [`StoreError::Connection`]; only migrations create databases.
/// `:memory:` and `file:` URIs are passed through unchecked.
pub fn connect_sqlite(database_url: &str) -> StoreResult<SqliteConnection> {
    let path = sqlite_path(database_url);
    if path != ":memory:" && !path.starts_with("file:") && !Path::new(path).is_file() {
        return Err(StoreError::Connection(format!(
            "{path}: database file does not exist"
        )));
    }
    let mut conn = SqliteConnection::establish(path)
        .map_err(|e| StoreError::Connection(format!("{path}: {e}")))?;

    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    sql_query("PRAGMA busy_timeout=5000;").execute(&mut conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_prefixes_are_stripped() {
        assert_eq!(sqlite_path("sqlite://data/app.db"), "data/app.db");
        assert_eq!(sqlite_path("sqlite:app.db"), "app.db");
        assert_eq!(sqlite_path("/tmp/app.db"), "/tmp/app.db");
        assert_eq!(sqlite_path(":memory:"), ":memory:");
    }

    #[test]
    fn unreachable_path_is_a_connection_error() {
        let err = connect_sqlite("/nonexistent-dir/deeper/app.db").err().expect("expected connection error");
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[test]
    fn missing_file_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.db");
        let err = connect_sqlite(path.to_str().unwrap()).err().expect("expected connection error");
        assert!(matches!(err, StoreError::Connection(ref m) if m.contains("does not exist")));
        assert!(!path.exists());
    }

    #[test]
    fn in_memory_database_still_opens() {
        assert!(connect_sqlite(":memory:").is_ok());
    }
}

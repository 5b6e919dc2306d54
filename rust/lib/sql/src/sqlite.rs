use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::{ffi, Connection, ErrorCode};

use crate::error::SQLError;
use crate::traits::{Row, SQLExecutor, SQLStore, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
///
/// A single connection sits behind a mutex; every call holds the lock for
/// its whole duration, transactions included.
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

        Self::from_connection(conn)
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, SQLError> {
        // Edge rows cascade with their parents.
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl SQLExecutor for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Query(e.to_string()))?;
        query_on(&conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;
        exec_on(&conn, sql, params)
    }
}

impl SQLStore for SqliteStore {
    fn transaction(
        &self,
        body: &mut dyn FnMut(&dyn SQLExecutor) -> Result<(), SQLError>,
    ) -> Result<(), SQLError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        let tx = conn
            .transaction()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        // Dropping `tx` on the error path rolls it back.
        body(&TxExecutor { conn: &tx })?;

        tx.commit()
            .map_err(|e| classify(e, SQLError::Execution))
    }
}

/// Executor handed to transaction bodies.
struct TxExecutor<'a> {
    conn: &'a Connection,
}

impl SQLExecutor for TxExecutor<'_> {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        query_on(self.conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        exec_on(self.conn, sql, params)
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

fn query_on(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        bound.iter().map(|b| b.as_ref()).collect();

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| SQLError::Query(e.to_string()))?;

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            let mut columns = Vec::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                columns.push((name.clone(), row_value_at(row, i)?));
            }
            Ok(Row { columns })
        })
        .map_err(|e| classify(e, SQLError::Query))?;

    let mut result = Vec::new();
    for row in rows {
        // `INSERT ... RETURNING` surfaces constraint failures while stepping.
        result.push(row.map_err(|e| classify(e, SQLError::Query))?);
    }
    Ok(result)
}

fn exec_on(conn: &Connection, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        bound.iter().map(|b| b.as_ref()).collect();

    let affected = conn
        .execute(sql, param_refs.as_slice())
        .map_err(|e| classify(e, SQLError::Execution))?;

    Ok(affected as u64)
}

/// Extract a Value from a rusqlite row at a given column index.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Value> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    })
}

/// Key collisions become `SQLError::Duplicate`, other constraint failures
/// `SQLError::Constraint`, everything else `fallback`.
fn classify(e: rusqlite::Error, fallback: fn(String) -> SQLError) -> SQLError {
    let rusqlite::Error::SqliteFailure(failure, _) = &e else {
        return fallback(e.to_string());
    };
    match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
            SQLError::Duplicate(e.to_string())
        }
        _ if failure.code == ErrorCode::ConstraintViolation => SQLError::Constraint(e.to_string()),
        _ => fallback(e.to_string()),
    }
}

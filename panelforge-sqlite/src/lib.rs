//! Implement `panelforge_core::DbConn` by way of the `rusqlite` crate.

use panelforge_core::{
    DbConn, DbType, DbValue, Error, SQLSTATE_FOREIGN_KEY_VIOLATION, SQLSTATE_UNIQUE_VIOLATION,
};
use rusqlite::{Connection, ToSql};
use std::path::Path;
use std::sync::Mutex;

/// A wrapping of `rusqlite::Connection` that implements
/// `panelforge_core::DbConn`.
///
// Connection is not Send, which is needed e.g. when used as managed data by
// actix-web. Hence Mutex.
//
pub struct SqliteConn(Mutex<Connection>);

impl SqliteConn {
    /// Try to create with [default flags
    /// ](https://docs.rs/rusqlite/latest/rusqlite/struct.Connection.html#flags)
    /// and enabled foreign key support.
    ///
    pub fn new(path: &Path) -> Result<Self, Error> {
        Ok(Self(Mutex::new(Self::result(
            Connection::open(path).and_then(|conn| {
                conn.execute("PRAGMA foreign_keys = ON", [])?;
                Ok(conn)
            }),
        )?)))
    }

    /// An in-memory connection, mainly for tests.
    ///
    pub fn in_memory() -> Result<Self, Error> {
        Ok(Self(Mutex::new(Self::result(
            Connection::open_in_memory().and_then(|conn| {
                conn.execute("PRAGMA foreign_keys = ON", [])?;
                Ok(conn)
            }),
        )?)))
    }

    /// Replace `$` with `?`.
    fn fix_params(params: &str) -> String {
        params.replace("$", "?")
    }

    /// Convert `res` to `Result<T, panelforge_core::Error>`.
    fn result<T>(res: rusqlite::Result<T>) -> Result<T, Error> {
        res.map_err(|e| {
            let mut sqlstate = None;
            if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e {
                if let rusqlite::ErrorCode::ConstraintViolation = err.code {
                    if let Some(text) = msg {
                        if text.starts_with("FOREIGN KEY") {
                            sqlstate = Some(SQLSTATE_FOREIGN_KEY_VIOLATION);
                        } else if text.starts_with("UNIQUE") {
                            sqlstate = Some(SQLSTATE_UNIQUE_VIOLATION);
                        }
                    }
                }
            }
            Error::persistence(sqlstate, e)
        })
    }
}

macro_rules! from_values {
    ($values:expr) => {
        &$values
            .iter()
            .map(|val| match val {
                DbValue::Float(v) => v as &dyn ToSql,
                DbValue::Int(v) => v as &dyn ToSql,
                DbValue::Text(v) => v as &dyn ToSql,
                DbValue::NulFloat(v) => v as &dyn ToSql,
                DbValue::NulInt(v) => v as &dyn ToSql,
                DbValue::NulText(v) => v as &dyn ToSql,
            })
            .collect::<Vec<_>>()[..]
    };
}

impl DbConn for SqliteConn {
    fn exec(&self, sql: &str, vals: &[DbValue]) -> Result<usize, Error> {
        Self::result(
            self.0.lock().unwrap().execute(&Self::fix_params(sql), from_values!(vals)),
        )
    }

    fn query(
        &self,
        sql: &str,
        vals: &[DbValue],
        types: &[DbType],
    ) -> Result<Vec<Vec<DbValue>>, Error> {
        Self::result(
            self.0
                .lock()
                .unwrap()
                .prepare(&Self::fix_params(sql))
                .and_then(|mut stmt| {
                    Ok({
                        let mut rows = Vec::new();
                        for row_result in stmt.query_map(
                            from_values!(vals),
                            |sqlt_row| -> rusqlite::Result<Vec<DbValue>> {
                                let mut row = Vec::new();
                                for (ix, typ) in types.iter().enumerate() {
                                    row.push(match typ {
                                        DbType::Float => {
                                            DbValue::Float(sqlt_row.get::<_, f64>(ix)?)
                                        }
                                        DbType::Int => {
                                            DbValue::Int(sqlt_row.get::<_, i64>(ix)?)
                                        }
                                        DbType::Text => {
                                            DbValue::Text(sqlt_row.get::<_, String>(ix)?)
                                        }
                                        DbType::NulFloat => DbValue::NulFloat(
                                            sqlt_row.get::<_, Option<f64>>(ix)?,
                                        ),
                                        DbType::NulInt => DbValue::NulInt(
                                            sqlt_row.get::<_, Option<i64>>(ix)?,
                                        ),
                                        DbType::NulText => DbValue::NulText(
                                            sqlt_row.get::<_, Option<String>>(ix)?,
                                        ),
                                    })
                                }
                                Ok(row)
                            },
                        )? {
                            rows.push(row_result?)
                        }
                        rows
                    })
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_and_query_round_trip() {
        let conn = SqliteConn::in_memory().unwrap();
        conn.exec("CREATE TABLE t (id INTEGER, name TEXT)", &[]).unwrap();
        conn.exec(
            "INSERT INTO t (id, name) VALUES ($1, $2)",
            &[DbValue::Int(1), DbValue::Text("widget".to_string())],
        )
        .unwrap();
        let rows = conn
            .query("SELECT id, name FROM t WHERE id = $1", &[DbValue::Int(1)], &[
                DbType::Int,
                DbType::Text,
            ])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0][0], DbValue::Int(1)));
    }

    #[test]
    fn unique_violation_is_tagged() {
        let conn = SqliteConn::in_memory().unwrap();
        conn.exec("CREATE TABLE t (id INTEGER PRIMARY KEY)", &[]).unwrap();
        conn.exec("INSERT INTO t (id) VALUES (1)", &[]).unwrap();
        let err = conn.exec("INSERT INTO t (id) VALUES (1)", &[]).unwrap_err();
        assert!(err.is_unique_violation());
    }
}

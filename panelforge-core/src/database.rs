//! Trait and helper types abstracting the `Connection` capability generated
//! CRUD controllers read and write through.
//!
//! This is deliberately thin: one query method, one exec method, and a
//! handful of loosely-typed values. No query builder, no pooling policy, no
//! migrations -- those belong to whatever hands a live connection to the
//! application.
//!
use crate::Error;
use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A cloneable handle to a [`DbConn`](trait.DbConn.html) implementation.
///
#[derive(Clone)]
pub struct DatabaseIf(Arc<dyn DbConn + Send + Sync>);

impl DatabaseIf {
    /// Create an interface to `client`.
    ///
    pub fn new(client: Arc<dyn DbConn + Send + Sync>) -> Self {
        Self(client.clone())
    }

    /// Begin a transaction.
    ///
    pub fn begin(&self) -> Result<(), Error> {
        self.0.begin()
    }

    /// Commit the present transaction.
    ///
    /// On error try to `rollback()` before returning error.
    ///
    pub fn commit(&self) -> Result<(), Error> {
        self.0.commit().map_err(|commit_err| {
            if let Err(rollback_err) = self.0.rollback() {
                rollback_err
            } else {
                commit_err
            }
        })
    }

    /// Execute an SQL statement.
    ///
    /// `sql` is the statement, which may be parameterized using `$1`, `$2`,
    /// ... to indicate the position of the parameter in `values`.
    ///
    /// Returns the number of affected rows.
    ///
    pub fn exec(&self, sql: &str, values: &[DbValue]) -> Result<usize, Error> {
        self.0.exec(sql, values)
    }

    /// Execute an SQL query and return the result.
    ///
    /// `types` indicates how the implementation should convert the result to
    /// `DbValue` vectors. `types.len()` must equal the length of each of the
    /// returned `DbValue` vectors.
    ///
    pub fn query(
        &self,
        sql: &str,
        values: &[DbValue],
        types: &[DbType],
    ) -> Result<Vec<Vec<DbValue>>, Error> {
        self.0.query(sql, values, types)
    }

    /// Query for one single value from one single column. See [`query()`
    /// ](#method.query). Ignores errors.
    ///
    pub fn query_column(
        &self,
        sql: &str,
        values: &[DbValue],
        typ: DbType,
    ) -> Option<DbValue> {
        self.query(sql, values, &[typ])
            .ok()
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| row.into_iter().next())
    }

    /// Rollback the present transaction.
    ///
    pub fn rollback(&self) -> Result<(), Error> {
        self.0.rollback()
    }

    /// Wrap code in a database transaction and ensure `ROLLBACK` on any error
    /// -- not only database errors.
    ///
    /// Returns what `action` returns. Before returning does a `COMMIT` or
    /// `ROLLBACK` depending on whether `action` succeeds.
    ///
    pub fn transaction<T, F>(&self, action: F) -> Result<T, Error>
    where
        F: FnOnce(&DatabaseIf) -> Result<T, Error>,
    {
        let _ = self.0.begin();
        let result = action(self);
        let _ = match &result {
            Ok(_) => self.0.commit(),
            Err(_) => self.0.rollback(),
        };
        result
    }
}

/// The driver-facing half of the `Connection` capability.
///
pub trait DbConn: Send + Sync {
    /// Begin a transaction. The default sends `BEGIN` via `exec()`.
    ///
    fn begin(&self) -> Result<(), Error> {
        tracing::trace!("BEGIN");
        self.exec("BEGIN", &[]).map(|_| ())
    }

    /// Commit the present transaction. The default sends `COMMIT` via
    /// `exec()`.
    ///
    fn commit(&self) -> Result<(), Error> {
        tracing::trace!("COMMIT");
        self.exec("COMMIT", &[]).map(|_| ())
    }

    /// See [`DatabaseIf::exec()`](struct.DatabaseIf.html#method.exec).
    ///
    /// Required to return an [`Error::PersistenceError`
    /// ](../error/enum.Error.html#variant.PersistenceError) with
    /// [`sqlstate`](../error/struct.DatabaseError.html#structfield.sqlstate)
    /// [`SQLSTATE_FOREIGN_KEY_VIOLATION`
    /// ](../error/constant.SQLSTATE_FOREIGN_KEY_VIOLATION.html) (or
    /// [`SQLSTATE_UNIQUE_VIOLATION`
    /// ](../error/constant.SQLSTATE_UNIQUE_VIOLATION.html)) when such an
    /// error occurs, regardless of whether the driver itself reports the
    /// matching `SQLSTATE`.
    ///
    fn exec(&self, sql: &str, values: &[DbValue]) -> Result<usize, Error>;

    /// See [`DatabaseIf::query()`](struct.DatabaseIf.html#method.query).
    ///
    fn query(
        &self,
        sql: &str,
        values: &[DbValue],
        types: &[DbType],
    ) -> Result<Vec<Vec<DbValue>>, Error>;

    /// Rollback the present transaction. The default sends `ROLLBACK` via
    /// `exec()`.
    ///
    fn rollback(&self) -> Result<(), Error> {
        tracing::trace!("ROLLBACK");
        self.exec("ROLLBACK", &[]).map(|_| ())
    }
}

/// The possible types as seen by the database.
///
/// Mirrors the DB field type enum at the value level (see
/// [`crate::table::DbFieldType`](../table/enum.DbFieldType.html), which is
/// the declarative, column-level counterpart used in `Table` configuration).
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DbType {
    /// `f64`
    Float,
    /// `i64`
    Int,
    /// `String`
    Text,
    /// `Option<f64>`
    NulFloat,
    /// `Option<i64>`
    NulInt,
    /// `Option<String>`
    NulText,
}

/// The obvious conversion.
///
impl From<DbValue> for DbType {
    fn from(v: DbValue) -> Self {
        match v {
            DbValue::Float(_) => Self::Float,
            DbValue::Int(_) => Self::Int,
            DbValue::Text(_) => Self::Text,
            DbValue::NulFloat(_) => Self::NulFloat,
            DbValue::NulInt(_) => Self::NulInt,
            DbValue::NulText(_) => Self::NulText,
        }
    }
}

/// The values sent to and from the database by a [`DbConn`](trait.DbConn.html)
/// implementation, and the cell values a generated list/form/detail view
/// renders.
///
#[derive(Clone, Debug)]
pub enum DbValue {
    Float(f64),
    Int(i64),
    Text(String),
    NulFloat(Option<f64>),
    NulInt(Option<i64>),
    NulText(Option<String>),
}

impl DbValue {
    /// Collapse into an `Option`, e.g.
    /// ```text
    /// Int(i)          -> Some(Int(i))
    /// NulInt(None)    -> None
    /// NulInt(Some(i)) -> Some(Int(i))
    /// ```
    pub fn to_option(&self) -> Option<Self> {
        match self {
            Self::NulFloat(opt) => opt.map(Self::Float),
            Self::NulInt(opt) => opt.map(Self::Int),
            Self::NulText(opt) => opt.as_ref().map(|s| Self::Text(s.clone())),
            _ => Some(self.clone()),
        }
    }

    /// Write the value as accepted by SQL, e.g.
    /// ```text
    /// Int(42)          -> "42"
    /// NulInt(None)     -> "NULL"
    /// NulInt(Some(42)) -> "42"
    /// Text("foo")      -> "'foo'"
    /// ```
    pub fn sql_value(&self) -> String {
        match self {
            DbValue::Float(v) => v.to_string(),
            DbValue::Int(v) => v.to_string(),
            DbValue::Text(v) => format!("'{}'", v.replace("'", "''")),
            DbValue::NulFloat(v) => {
                v.map(|v| v.to_string()).unwrap_or_else(|| "NULL".to_string())
            }
            DbValue::NulInt(v) => {
                v.map(|v| v.to_string()).unwrap_or_else(|| "NULL".to_string())
            }
            DbValue::NulText(v) => v
                .as_ref()
                .map(|v| format!("'{}'", v.replace("'", "''")))
                .unwrap_or_else(|| "NULL".to_string()),
        }
    }

    /// `true` if the DB field type enum for the declaring column would infer
    /// a numeric display (used by the default list renderer to right-align
    /// cells).
    ///
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Float(_) | Self::Int(_) | Self::NulFloat(_) | Self::NulInt(_)
        )
    }
}

macro_rules! write_opt {
    ($f:ident, $o:ident) => {
        match $o {
            Some(v) => write!($f, "Some({})", v),
            None => write!($f, "None"),
        }
    };
}

impl fmt::Display for DbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            DbValue::Float(v) => write!(f, "{}", v),
            DbValue::Int(v) => write!(f, "{}", v),
            DbValue::Text(v) => write!(f, "{}", v),
            DbValue::NulFloat(v) => write_opt!(f, v),
            DbValue::NulInt(v) => write_opt!(f, v),
            DbValue::NulText(v) => write_opt!(f, v),
        }
    }
}

macro_rules! db_value_convert {
    ($other:ty, $variant:ident $(,)?) => {
        db_value_convert!($other, $variant, value, other);
    };
    ($other:ty, $variant:ident, $from_db:expr $(,)?) => {
        db_value_convert!($other, $variant, $from_db, other as _);
    };
    ($other:ty, $variant:ident, $from_db:expr, $into_db:expr $(,)?) => {
        impl ::std::convert::From<$other> for DbValue {
            fn from(other: $other) -> Self {
                DbValue::$variant($into_db)
            }
        }
        impl ::std::convert::TryFrom<DbValue> for $other {
            type Error = Error;
            fn try_from(db_value: DbValue) -> Result<Self, Self::Error> {
                match db_value {
                    DbValue::$variant(value) => Ok($from_db),
                    _ => Err(Error::parameter_invalid(&format!(
                        "cannot convert {:?} into {}",
                        db_value,
                        stringify!($other),
                    ))),
                }
            }
        }
    };
}

db_value_convert! { bool, Int, value != 0 }
db_value_convert! { f32, Float, value as f32 }
db_value_convert! { f64, Float }
db_value_convert! { i32, Int, value as i32 }
db_value_convert! { i64, Int }
db_value_convert! {
    NaiveDate,
    Int,
    NaiveDate::from_num_days_from_ce_opt(value as i32).unwrap(),
    other.num_days_from_ce() as i64,
}
db_value_convert! {
    NaiveDateTime,
    Int,
    DateTime::<Utc>::from_timestamp(value, 0).unwrap().naive_utc(),
    other.and_utc().timestamp(),
}
db_value_convert! {
    NaiveTime,
    Int,
    NaiveTime::from_num_seconds_from_midnight_opt(value as u32, 0).unwrap(),
    other.num_seconds_from_midnight() as i64,
}
db_value_convert! { String, Text }
db_value_convert! { u32, Int, value as u32 }
db_value_convert! { u64, Int, value as u64 }
db_value_convert! { usize, Int, value as usize }

/// Facilitates conversions between [`DbValue::Text`
/// ](enum.DbValue.html#variant.Text) and any JSON-serializable type, for
/// columns storing structured data as JSON.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct JsonField<T>(pub T);

impl<T: DeserializeOwned + Serialize> From<JsonField<T>> for DbValue {
    fn from(field: JsonField<T>) -> Self {
        DbValue::Text(serde_json::to_string(&field.0).expect(&format!(
            "serde_json::to_string() cannot handle {}",
            std::any::type_name::<T>(),
        )))
    }
}

impl<T: std::fmt::Debug + DeserializeOwned + Serialize> TryFrom<DbValue>
    for JsonField<T>
{
    type Error = Error;
    fn try_from(db_value: DbValue) -> Result<Self, Self::Error> {
        match db_value {
            DbValue::Text(value) => Ok(Self(
                serde_json::from_str(&value)
                    .map_err(|e| Error::parameter_invalid(e.to_string()))?,
            )),
            _ => Err(Error::parameter_invalid(&format!(
                "cannot convert {db_value:?} into {}",
                std::any::type_name::<T>(),
            ))),
        }
    }
}

/// A [`DbConn`](trait.DbConn.html) that does nothing and returns
/// [`Error::PersistenceError`](../error/enum.Error.html#variant.PersistenceError).
///
/// Useful as a placeholder before a real connection is wired in, and in unit
/// tests of code that should never reach the database.
///
#[derive(Clone, Debug)]
pub struct NullConn;

impl DbConn for NullConn {
    fn exec(&self, _sql: &str, _vals: &[DbValue]) -> Result<usize, Error> {
        Err(Error::persistence(None, "no database"))
    }

    fn query(
        &self,
        _sql: &str,
        _values: &[DbValue],
        _types: &[DbType],
    ) -> Result<Vec<Vec<DbValue>>, Error> {
        Err(Error::persistence(None, "no database"))
    }
}

/// Execute SQL statements read from `source`, split at `';'`.
///
/// If execution fails the `original_error` is returned if `Some(_)`,
/// otherwise the error returned from the failing `exec()`.
///
pub fn try_exec_sql(
    db: &DatabaseIf,
    source: &str,
    original_error: Option<Error>,
) -> Result<(), Error> {
    for statement in source.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        if let Err(e) = db.exec(statement, &[]) {
            return Err(original_error.unwrap_or(e));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_value_quotes_text_and_escapes_ticks() {
        assert_eq!(DbValue::Text("o'brien".to_string()).sql_value(), "'o''brien'");
        assert_eq!(DbValue::Int(42).sql_value(), "42");
        assert_eq!(DbValue::NulInt(None).sql_value(), "NULL");
    }

    #[test]
    fn null_conn_always_errors() {
        let conn = NullConn;
        assert!(conn.exec("SELECT 1", &[]).is_err());
        assert!(conn.query("SELECT 1", &[], &[]).is_err());
    }

    #[test]
    fn bool_round_trips_through_int() {
        let v: DbValue = true.into();
        assert!(matches!(v, DbValue::Int(1)));
        assert_eq!(bool::try_from(DbValue::Int(0)).unwrap(), false);
    }
}

//! Implements `panelforge_core::SessionStore` over `actix-session`, with an
//! optional database-table-backed mode for deployments that cannot rely on
//! the host's cookie store alone (e.g. the single-session-per-user rule
//! enforced by the generated login flow).

use panelforge_core::{DatabaseIf, DbType, DbValue, Error, SessionStore};
use std::collections::HashMap;
use std::sync::Mutex;

const SESSION_ID_KEY: &str = "__panelforge__session_id";
const SESSION_SELECT: &str = "SELECT data FROM panelforge_sessions WHERE id = $1";
const SESSION_INSERT: &str = "INSERT INTO panelforge_sessions (id, data) VALUES ($1, $2)";
const SESSION_UPDATE: &str = "UPDATE panelforge_sessions SET data = $2 WHERE id = $1";
const SESSION_DELETE: &str = "DELETE FROM panelforge_sessions WHERE id = $1";

/// Either a thin wrapper around the actix-web cookie session (the common
/// case), or a database-table-backed session keyed by an id stashed in that
/// same cookie -- used when a deployment wants session data to survive
/// across app restarts without trusting an unbounded signed cookie.
///
pub enum ActixSession {
    Cookie(actix_session::Session),
    Database { cookie: actix_session::Session, db: DatabaseIf, id: i64, data: Mutex<HashMap<String, String>> },
}

impl ActixSession {
    /// Wrap a bare actix-web cookie session.
    ///
    pub fn cookie(session: actix_session::Session) -> Self {
        Self::Cookie(session)
    }

    /// Load (or create) a database-backed session row identified by an id
    /// stashed in `cookie`.
    ///
    pub fn database(cookie: actix_session::Session, db: DatabaseIf) -> Result<Self, Error> {
        let id: i64 = match cookie.get(SESSION_ID_KEY).map_err(|e| Error::other(e.to_string()))? {
            Some(id) => id,
            None => {
                let id = rand::random::<i64>();
                cookie.insert(SESSION_ID_KEY, id).map_err(|e| Error::other(e.to_string()))?;
                id
            }
        };
        let data = db
            .query(SESSION_SELECT, &[DbValue::Int(id)], &[DbType::Text])
            .ok()
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| row.into_iter().next())
            .and_then(|value| match value {
                DbValue::Text(text) => serde_json::from_str(&text).ok(),
                _ => None,
            })
            .unwrap_or_else(|| {
                let _ = db.exec(SESSION_INSERT, &[DbValue::Int(id), DbValue::Text("{}".to_string())]);
                HashMap::new()
            });
        Ok(Self::Database { cookie, db, id, data: Mutex::new(data) })
    }
}

impl SessionStore for ActixSession {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Cookie(session) => session.get::<String>(key).ok().flatten(),
            Self::Database { data, .. } => data.lock().unwrap().get(key).cloned(),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        match self {
            Self::Cookie(session) => {
                session.insert(key, value).map_err(|e| Error::other(e.to_string()))
            }
            Self::Database { db, id, data, .. } => {
                data.lock().unwrap().insert(key.to_string(), value.to_string());
                let json = serde_json::to_string(&*data.lock().unwrap())
                    .map_err(|e| Error::other(e.to_string()))?;
                db.exec(SESSION_UPDATE, &[DbValue::Int(*id), DbValue::Text(json)]).map(|_| ())
            }
        }
    }

    fn remove(&self, key: &str) {
        match self {
            Self::Cookie(session) => session.remove(key).map_or((), |_| ()),
            Self::Database { data, .. } => {
                data.lock().unwrap().remove(key);
            }
        }
    }

    fn clear(&self) {
        match self {
            Self::Cookie(session) => session.clear(),
            Self::Database { db, id, data, cookie } => {
                data.lock().unwrap().clear();
                let _ = db.exec(SESSION_DELETE, &[DbValue::Int(*id)]);
                cookie.clear();
            }
        }
    }

    fn renew(&self) {
        if let Self::Cookie(session) = self {
            session.renew();
        }
    }
}

#[cfg(test)]
mod tests {
    // `actix_session::Session` cannot be constructed outside a running
    // service, so this module is covered by the integration tests under
    // `tests/` that drive the full adapter through `actix_web::test`.
}

//! The `Connection` capability has a database on the other end; this is its
//! sibling for session state -- an opaque key/value store the core neither
//! signs, encrypts, nor persists itself.
//!
use crate::Error;
use std::sync::Arc;

/// A cloneable handle to a [`SessionStore`](trait.SessionStore.html)
/// implementation, bound to one request's session.
///
#[derive(Clone)]
pub struct SessionIf(Arc<dyn SessionStore + Send + Sync>);

impl SessionIf {
    /// Wrap `store` for use by handlers.
    ///
    pub fn new(store: Arc<dyn SessionStore + Send + Sync>) -> Self {
        Self(store)
    }

    /// Look up `key`.
    ///
    pub fn get(&self, key: &str) -> Option<String> {
        self.0.get(key)
    }

    /// Store `value` under `key`.
    ///
    pub fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.0.set(key, value)
    }

    /// Remove `key`, if present.
    ///
    pub fn remove(&self, key: &str) {
        self.0.remove(key)
    }

    /// Forget every key.
    ///
    pub fn clear(&self) {
        self.0.clear()
    }

    /// Rotate the underlying session identity while keeping its data,
    /// defeating session fixation across a login boundary. Implementations
    /// that do not track an identity separate from their data may treat this
    /// as a no-op.
    ///
    pub fn renew(&self) {
        self.0.renew()
    }
}

/// The adapter-facing half of the session capability.
///
/// Cookie attributes, signing, and storage location are deployment concerns
/// outside this trait; an implementation is free to back it with an
/// in-memory map, a signed cookie, or a database row.
///
pub trait SessionStore: Send + Sync {
    /// See [`SessionIf::get()`](struct.SessionIf.html#method.get).
    ///
    fn get(&self, key: &str) -> Option<String>;

    /// See [`SessionIf::set()`](struct.SessionIf.html#method.set).
    ///
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// See [`SessionIf::remove()`](struct.SessionIf.html#method.remove).
    ///
    fn remove(&self, key: &str);

    /// See [`SessionIf::clear()`](struct.SessionIf.html#method.clear).
    ///
    fn clear(&self);

    /// See [`SessionIf::renew()`](struct.SessionIf.html#method.renew).
    ///
    fn renew(&self) {}
}

/// An in-process [`SessionStore`](trait.SessionStore.html) backed by a
/// mutex-guarded map. Adequate for tests and single-process deployments;
/// production adapters typically delegate to the host framework's own
/// session extension instead (e.g. a signed cookie).
///
#[derive(Default)]
pub struct MemorySessionStore(std::sync::Mutex<std::collections::HashMap<String, String>>);

impl MemorySessionStore {
    /// A fresh, empty store.
    ///
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.0.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.0.lock().unwrap().remove(key);
    }

    fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = SessionIf::new(Arc::new(MemorySessionStore::new()));
        assert_eq!(store.get("k"), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k"), Some("v".to_string()));
        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn clear_forgets_everything() {
        let store = SessionIf::new(Arc::new(MemorySessionStore::new()));
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.clear();
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), None);
    }
}

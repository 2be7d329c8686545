//! A simple flash-notification mechanism layered over the session
//! capability.
//!
use crate::SessionIf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const FLASH_KEY: &'static str = "__panelforge__flash";

/// Notifications queued in the session and drained (once) by the next
/// request that reads them.
///
pub struct Flash {
    session: SessionIf,
    // { severity => [message, ...], ... }
    flashes: HashMap<String, Vec<String>>,
}

impl Flash {
    /// Load whatever is presently stored in `session`'s flash slot.
    ///
    pub fn new(session: SessionIf) -> Self {
        let flashes = session
            .get(FLASH_KEY)
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_else(HashMap::new);
        Self { session, flashes }
    }

    /// Clear the flashes, also in the session.
    ///
    pub fn clear(&mut self) {
        self.flashes.clear();
        self.store();
    }

    /// Copy the messages under `severities` without removing them. See
    /// [`remove()`](#method.remove) to consume them.
    ///
    pub fn peek(&self, severities: &[&str]) -> Vec<FlashData> {
        let mut result = Vec::new();
        for severity in severities {
            if let Some(messages) = self.flashes.get(*severity) {
                result.extend(messages.iter().map(|message| FlashData {
                    severity: severity.to_string(),
                    message: message.to_string(),
                }));
            }
        }
        result
    }

    /// Queue `message` under `severity` and persist to the session.
    ///
    /// If the exact message is already queued under that severity, do
    /// nothing and return `false`; otherwise push it and return `true`.
    ///
    /// `severity` and `message` must not contain HTML markup.
    ///
    pub fn push(&mut self, severity: &str, message: &str) -> bool {
        let msgs = self.flashes.entry(severity.to_string()).or_default();
        if msgs.iter().any(|m| m == message) {
            return false;
        }
        msgs.push(message.to_string());
        self.store();
        true
    }

    /// Remove and forget (also in the session) the messages under
    /// `severities`, returning them ordered first by `severities`, then by
    /// push order. `"<br>"` is substituted for `"\n"` in each message.
    ///
    pub fn remove(&mut self, severities: &[&str]) -> Vec<FlashData> {
        let mut removed = Vec::new();
        for severity in severities {
            if let Some(messages) = self.flashes.get_mut(*severity) {
                removed.extend(messages.drain(..).map(|message| FlashData {
                    severity: severity.to_string(),
                    message: message.replace("\n", "<br>"),
                }));
            }
        }
        self.store();
        removed
    }

    fn store(&self) {
        if let Ok(json) = serde_json::to_string(&self.flashes) {
            let _ = self.session.set(FLASH_KEY, &json);
        }
    }
}

/// One flash message, as returned by [`Flash::peek()`](struct.Flash.html#method.peek)
/// and [`Flash::remove()`](struct.Flash.html#method.remove).
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FlashData {
    /// The message severity, e.g. `"error"`, `"notice"`.
    pub severity: String,
    /// The message text, possibly containing `<br>`.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use std::sync::Arc;

    #[test]
    fn push_then_remove_is_one_shot() {
        let session = SessionIf::new(Arc::new(MemorySessionStore::new()));
        let mut flash = Flash::new(session.clone());
        assert!(flash.push("error", "bad input"));
        assert!(!flash.push("error", "bad input"));

        let mut flash_again = Flash::new(session.clone());
        let removed = flash_again.remove(&["error"]);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].message, "bad input");

        let mut flash_once_more = Flash::new(session);
        assert!(flash_once_more.remove(&["error"]).is_empty());
    }
}

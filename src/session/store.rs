//! Per-client session state.
//!
//! # Responsibilities
//! - Map client identity keys to accumulated upstream cookie strings
//! - Serialize all read-modify-write access behind one mutex
//! - Optionally evict idle entries after a configured TTL
//!
//! # Design Decisions
//! - One explicit store object constructed at startup and injected into
//!   handlers; no process-global state
//! - The lock is held only for lookup/merge, never across a network call
//! - Eviction is lazy: expired entries are dropped on the next access

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::session::cookies;

struct SessionEntry {
    cookies: String,
    last_updated: Instant,
}

/// Shared store of accumulated per-client cookies.
pub struct SessionStore {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    /// Create a store. `ttl = None` keeps entries for the process lifetime.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Accumulated cookie string for an identity, if any.
    pub fn cookie_header(&self, identity: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.evict_expired(&mut entries);
        entries.get(identity).map(|entry| entry.cookies.clone())
    }

    /// Merge new cookie pairs into an identity's entry.
    ///
    /// Read-modify-write under a single lock acquisition; readers never
    /// observe a partially merged string.
    pub fn merge(&self, identity: &str, new_pairs: &[(String, String)]) {
        if new_pairs.is_empty() {
            return;
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.evict_expired(&mut entries);

        let existing = entries
            .get(identity)
            .map(|entry| entry.cookies.as_str())
            .unwrap_or("");
        let merged = cookies::merge_into(existing, new_pairs);

        entries.insert(
            identity.to_string(),
            SessionEntry {
                cookies: merged,
                last_updated: Instant::now(),
            },
        );
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.evict_expired(&mut entries);
        entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identity/cookie pairs for the diagnostics endpoint.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.evict_expired(&mut entries);
        entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.cookies.clone()))
            .collect()
    }

    fn evict_expired(&self, entries: &mut HashMap<String, SessionEntry>) {
        if let Some(ttl) = self.ttl {
            let now = Instant::now();
            entries.retain(|_, entry| now.duration_since(entry.last_updated) < ttl);
        }
    }
}

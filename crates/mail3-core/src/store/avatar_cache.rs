//! Session-wide avatar cache keyed by address.
//!
//! Each address owns a `watch` channel holding its current [`AvatarEntry`];
//! callers that find a lookup already in flight wait on that channel instead
//! of starting another one. Every state change is also broadcast to
//! [`AvatarCache::subscribe`] listeners, once per transition.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};

use crate::models::{AvatarResult, PlaceholderKind};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarEntry {
    /// Lookup in flight
    Resolving,
    Resolved(String),
    /// Caller-supplied override
    Provided(String),
    Empty(PlaceholderKind),
}

impl AvatarEntry {
    pub fn is_resolving(&self) -> bool {
        matches!(self, AvatarEntry::Resolving)
    }

    pub fn result(&self) -> AvatarResult {
        match self {
            AvatarEntry::Resolving => AvatarResult::Loading,
            AvatarEntry::Resolved(url) => AvatarResult::Resolved(url.clone()),
            AvatarEntry::Provided(url) => AvatarResult::UseProvidedOverride(url.clone()),
            AvatarEntry::Empty(kind) => AvatarResult::UsePlaceholder(*kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarChange {
    pub address: String,
    pub result: AvatarResult,
}

/// Outcome of [`AvatarCache::claim`].
pub enum Claim {
    /// Nothing was cached; the caller must perform the lookup and
    /// [`AvatarCache::complete`] it. The receiver observes that completion.
    Leader(watch::Receiver<AvatarEntry>),
    /// Another caller is resolving this address.
    InFlight(watch::Receiver<AvatarEntry>),
    Cached(AvatarResult),
}

pub struct AvatarCache {
    entries: Mutex<HashMap<String, watch::Sender<AvatarEntry>>>,
    changes: broadcast::Sender<AvatarChange>,
}

impl Default for AvatarCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AvatarCache {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            changes,
        }
    }

    // ===== Getters =====

    pub fn get(&self, address: &str) -> Option<AvatarResult> {
        self.entries
            .lock()
            .get(address)
            .map(|tx| tx.borrow().result())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Change notifications for every address.
    pub fn subscribe(&self) -> broadcast::Receiver<AvatarChange> {
        self.changes.subscribe()
    }

    /// State channel for a single address, if it is known.
    pub fn watch(&self, address: &str) -> Option<watch::Receiver<AvatarEntry>> {
        self.entries.lock().get(address).map(|tx| tx.subscribe())
    }

    // ===== Mutations =====

    /// Unconditionally set the entry for `address`. Returns whether it changed.
    pub fn set(&self, address: &str, entry: AvatarEntry) -> bool {
        let mut entries = self.entries.lock();
        self.store(&mut entries, address, entry, |_| true)
    }

    /// Insert `entry` only if nothing is cached for `address` yet.
    /// Returns the result that is cached afterwards.
    pub fn insert_if_absent(&self, address: &str, entry: AvatarEntry) -> AvatarResult {
        let mut entries = self.entries.lock();
        if let Some(tx) = entries.get(address) {
            return tx.borrow().result();
        }
        let result = entry.result();
        self.store(&mut entries, address, entry, |_| true);
        result
    }

    /// Mark `address` as resolving unless it is already known.
    pub fn claim(&self, address: &str) -> Claim {
        let mut entries = self.entries.lock();
        if let Some(tx) = entries.get(address) {
            let current = tx.borrow().clone();
            return if current.is_resolving() {
                Claim::InFlight(tx.subscribe())
            } else {
                Claim::Cached(current.result())
            };
        }
        let (tx, rx) = watch::channel(AvatarEntry::Resolving);
        entries.insert(address.to_string(), tx);
        self.broadcast(address, AvatarResult::Loading);
        Claim::Leader(rx)
    }

    /// Finish a lookup started with [`claim`](Self::claim). Ignored if the
    /// entry moved on meanwhile (e.g. an override was supplied).
    pub fn complete(&self, address: &str, entry: AvatarEntry) -> bool {
        let mut entries = self.entries.lock();
        self.store(&mut entries, address, entry, AvatarEntry::is_resolving)
    }

    /// Forget every entry. In-flight lookups still complete into the fresh map.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn store(
        &self,
        entries: &mut HashMap<String, watch::Sender<AvatarEntry>>,
        address: &str,
        entry: AvatarEntry,
        may_replace: impl Fn(&AvatarEntry) -> bool,
    ) -> bool {
        let result = entry.result();
        let changed = match entries.get(address) {
            Some(tx) => tx.send_if_modified(|current| {
                if *current == entry || !may_replace(current) {
                    return false;
                }
                *current = entry;
                true
            }),
            None => {
                let (tx, _) = watch::channel(entry);
                entries.insert(address.to_string(), tx);
                true
            }
        };
        if changed {
            self.broadcast(address, result);
        }
        changed
    }

    fn broadcast(&self, address: &str, result: AvatarResult) {
        tracing::trace!(address, ?result, "avatar cache updated");
        // No subscribers is fine.
        let _ = self.changes.send(AvatarChange {
            address: address.to_string(),
            result,
        });
    }
}

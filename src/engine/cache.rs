//! TTL cache for enrichment lookups.
//!
//! Keyed by (subject, signal). Entries expire lazily: an expired entry is
//! removed by the read that finds it. One `RwLock` guards the map so the
//! coordinator can share the cache with concurrent fetch tasks.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::data::{Attributes, Subject};
use crate::types::Signal;

type Key = (Subject, Signal);

struct CacheEntry {
    /// `None` records that the sources had nothing for this key.
    value: Option<Attributes>,
    inserted_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.inserted_at < self.ttl
    }
}

#[derive(Default)]
pub struct EnrichmentCache {
    entries: RwLock<HashMap<Key, CacheEntry>>,
}

impl EnrichmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh cached value, if any. The outer `Option` is the hit; the
    /// inner one is what the sources returned.
    pub fn get(&self, subject: &Subject, signal: Signal) -> Option<Option<Attributes>> {
        let key = (subject.clone(), signal);
        let now = Utc::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(&key) {
                None => return None,
                Some(entry) if entry.is_fresh(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Re-check: another writer may have refreshed it in between.
        if entries.get(&key).is_some_and(|e| !e.is_fresh(now)) {
            entries.remove(&key);
        }
        None
    }

    pub fn insert(&self, subject: Subject, signal: Signal, value: Option<Attributes>, ttl: Duration) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert((subject, signal), CacheEntry { value, inserted_at: Utc::now(), ttl });
    }

    pub fn invalidate(&self, subject: &Subject, signal: Signal) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&(subject.clone(), signal)).is_some()
    }

    /// Drop every signal cached for one subject.
    pub fn invalidate_subject(&self, subject: &Subject) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(s, _), _| s != subject);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Remove expired entries.
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

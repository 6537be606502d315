//! TTL cache of key ID → JSON Web Keys
//!
//! Wraps any [`KeyProvider`] and memoizes successful, non-empty answers for
//! the configured TTL:
//!
//! - Errors are propagated and never cached.
//! - Empty answers are never cached, so a key published after a miss is
//!   discoverable on the very next call.
//! - Expiry is checked on every read; a sweep of all expired entries runs
//!   at most once per sweep interval (2 × TTL) on the write path.
//!
//! Concurrent misses for the same key ID may each reach the inner provider.
//! The cache is an optimisation, not a lock.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jsonwebtoken::jwk::Jwk;
use parking_lot::Mutex;
use tracing::debug;

use super::KeyProvider;
use crate::clock::{Clock, SystemClock};
use crate::error::Result;

/// Cache entry: a non-empty key list and its expiry
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Keys published under the key ID
    keys: Vec<Jwk>,
    /// When this entry expires; `None` when the TTL runs past what
    /// `SystemTime` can represent
    expires_at: Option<SystemTime>,
}

impl CacheEntry {
    fn is_valid(&self, now: SystemTime) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }

    fn outlives(&self, other: &Self) -> bool {
        match (self.expires_at, other.expires_at) {
            (None, Some(_)) => true,
            (Some(ours), Some(theirs)) => ours > theirs,
            (_, None) => false,
        }
    }
}

/// Caching key provider
pub struct KeychainCache {
    /// Provider consulted on a miss
    inner: Arc<dyn KeyProvider>,
    /// key ID → keys
    entries: DashMap<String, CacheEntry>,
    /// Lifetime of an entry
    ttl: Duration,
    /// Minimum time between full sweeps
    sweep_interval: Duration,
    /// Time of the last full sweep
    last_sweep: Mutex<SystemTime>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for KeychainCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .field("sweep_interval", &self.sweep_interval)
            .finish_non_exhaustive()
    }
}

impl KeychainCache {
    /// Wrap `inner` with a cache whose entries live for `ttl`
    pub fn new(ttl: Duration, inner: Arc<dyn KeyProvider>) -> Self {
        Self::with_clock(ttl, inner, Arc::new(SystemClock))
    }

    /// Same as [`new`](Self::new) with an explicit time source
    pub fn with_clock(ttl: Duration, inner: Arc<dyn KeyProvider>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            inner,
            entries: DashMap::new(),
            ttl,
            sweep_interval: ttl.saturating_mul(2),
            last_sweep: Mutex::new(now),
            clock,
        }
    }

    /// Entry lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries currently held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the entry for `kid`, forcing the next lookup to the inner provider
    pub fn invalidate(&self, kid: &str) {
        self.entries.remove(kid);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
        debug!("Keychain cache cleared");
    }

    fn get_cached(&self, kid: &str, now: SystemTime) -> Option<Vec<Jwk>> {
        let expired = match self.entries.get(kid) {
            Some(entry) if entry.is_valid(now) => return Some(entry.keys.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(kid, |_, entry| !entry.is_valid(now));
        }
        None
    }

    fn insert(&self, kid: &str, keys: Vec<Jwk>, now: SystemTime) {
        let fresh = CacheEntry {
            keys,
            expires_at: now.checked_add(self.ttl),
        };
        match self.entries.entry(kid.to_string()) {
            Entry::Occupied(mut occupied) => {
                // a concurrent miss may already have stored a fresher answer
                if fresh.outlives(occupied.get()) {
                    occupied.insert(fresh);
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
            }
        }
        self.maybe_sweep(now);
    }

    fn maybe_sweep(&self, now: SystemTime) {
        {
            let mut last = self.last_sweep.lock();
            match now.duration_since(*last) {
                Ok(since) if since >= self.sweep_interval => *last = now,
                _ => return,
            }
        }
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_valid(now));
        debug!(
            evicted = before.saturating_sub(self.entries.len()),
            remaining = self.entries.len(),
            "Swept expired keychain entries"
        );
    }
}

#[async_trait]
impl KeyProvider for KeychainCache {
    async fn key(&self, kid: &str) -> Result<Vec<Jwk>> {
        let now = self.clock.now();
        if let Some(keys) = self.get_cached(kid, now) {
            debug!(key_id = kid, "Keychain cache hit");
            return Ok(keys);
        }

        debug!(key_id = kid, "Keychain cache miss");
        let keys = self.inner.key(kid).await?;
        if !keys.is_empty() {
            self.insert(kid, keys.clone(), self.clock.now());
        }
        Ok(keys)
    }
}

// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The coherency store: keyed, type-erased, generation-tagged entries with a
//! single-flight guard for cold reads
//!
//! Entries are validated lazily on access against three conditions: not
//! explicitly removed, not expired, and tagged with the owning kind's current
//! generation. A failed condition makes the entry logically absent; the slot
//! itself is dropped the next time its key is touched.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use super::config::CacheConfig;
use super::generation::GenerationMap;
use crate::model::EntityKind;

/// Errors surfaced by the coherency store.
///
/// A miss is never an error. The store itself cannot fail; the only error
/// sources are the caller-supplied loader and key misuse across types.
/// `Clone` is required so one loader failure can be published to every caller
/// queued behind the same flight.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("cache loader failed: {0}")]
    Loader(String),

    #[error("cache entry for '{0}' holds a different type")]
    TypeMismatch(String),
}

impl CacheError {
    /// Wrap a collaborator failure for propagation through a flight.
    pub fn loader(err: impl std::fmt::Display) -> Self {
        CacheError::Loader(err.to_string())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Hit/miss accounting, kept for operator visibility.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    /// Loads led by a caller.
    pub flights: u64,
    /// Callers that waited on another caller's in-flight load.
    pub joined_flights: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Outcome of one single-flight load, published to queued waiters.
/// `Ok(None)` means the loader completed but found nothing to cache.
type FlightResult = CacheResult<Option<ErasedValue>>;

type FlightSlot = tokio::sync::Mutex<Option<FlightResult>>;

struct Slot {
    value: ErasedValue,
    kind: EntityKind,
    generation: u64,
    expires_at: Instant,
}

impl Slot {
    fn is_live(&self, current_generation: u64, now: Instant) -> bool {
        self.generation == current_generation && now < self.expires_at
    }
}

/// Process-wide read-through cache with generational invalidation.
///
/// Constructed once at startup and shared by `Arc` with every domain
/// service. Values are stored type-erased; each service reads and writes
/// through its own typed calls and its own key namespace.
pub struct CoherencyStore {
    config: CacheConfig,
    generations: Arc<GenerationMap>,
    entries: RwLock<HashMap<String, Slot>>,
    flights: Mutex<HashMap<String, Arc<FlightSlot>>>,
    stats: RwLock<CacheStats>,
}

impl CoherencyStore {
    /// Create a store with the given configuration and generation map.
    pub fn new(config: CacheConfig, generations: Arc<GenerationMap>) -> Result<Self, String> {
        config.validate()?;

        Ok(Self {
            config,
            generations,
            entries: RwLock::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        })
    }

    /// Create a store with default configuration and a fresh generation map.
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default(), Arc::new(GenerationMap::new()))
            .expect("default cache configuration is valid")
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Handle to the shared generation map.
    pub fn generations(&self) -> Arc<GenerationMap> {
        Arc::clone(&self.generations)
    }

    /// Look up a live entry. Returns `None` when the key is absent, expired,
    /// or tagged with a retired generation; a dead slot found this way is
    /// dropped before returning.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        if !self.config.enabled {
            return None;
        }

        let now = Instant::now();
        let dead = {
            let entries = self.entries.read();
            match entries.get(key) {
                None => {
                    self.stats.write().misses += 1;
                    return None;
                }
                Some(slot) => {
                    let current = self.generations.current(slot.kind);
                    if slot.is_live(current, now) {
                        if let Ok(value) = Arc::clone(&slot.value).downcast::<T>() {
                            self.stats.write().hits += 1;
                            return Some(value.as_ref().clone());
                        }
                        // Live entry of a different type under this key.
                        // Treated as a miss; the entry stays for its owner.
                        self.stats.write().misses += 1;
                        return None;
                    }
                    true
                }
            }
        };

        if dead {
            let mut entries = self.entries.write();
            if let Some(slot) = entries.get(key) {
                if !slot.is_live(self.generations.current(slot.kind), now) {
                    entries.remove(key);
                    self.stats.write().evictions += 1;
                }
            }
        }

        self.stats.write().misses += 1;
        None
    }

    /// Store a value tagged with the kind's current generation. Overwrites
    /// silently. `ttl` falls back to the configured per-kind default.
    pub fn set<T: Send + Sync + 'static>(
        &self,
        key: impl Into<String>,
        kind: EntityKind,
        value: T,
        ttl: Option<Duration>,
    ) {
        if !self.config.enabled {
            return;
        }

        let key = key.into();
        let ttl = ttl.unwrap_or_else(|| self.config.ttl_for(kind));
        let slot = Slot {
            value: Arc::new(value),
            kind,
            generation: self.generations.current(kind),
            expires_at: Instant::now() + ttl,
        };

        let mut entries = self.entries.write();
        if entries.len() >= self.config.max_entries && !entries.contains_key(&key) {
            let pruned = Self::prune_dead(&mut entries, &self.generations);
            let mut stats = self.stats.write();
            stats.evictions += pruned as u64;
            if entries.len() >= self.config.max_entries {
                log::warn!(
                    "cache exceeds max_entries ({}) with live entries; inserting anyway",
                    self.config.max_entries
                );
            }
        }
        entries.insert(key, slot);
        self.stats.write().insertions += 1;
    }

    /// Explicit single-key eviction.
    pub fn remove(&self, key: &str) {
        if self.entries.write().remove(key).is_some() {
            self.stats.write().evictions += 1;
        }
    }

    /// Retire the kind's current generation. Every entry tagged with it
    /// becomes logically invalid without being touched.
    pub fn bump_generation(&self, kind: EntityKind) -> u64 {
        self.generations.bump(kind)
    }

    /// Read-through with a single-flight guard.
    ///
    /// On a miss, exactly one caller per key runs `loader`; every caller
    /// queued behind it observes the same outcome, value or error. A loader
    /// that returns `Ok(None)` (entity absent) or an error caches nothing,
    /// so a later call retries.
    pub async fn get_or_load<T, F, Fut>(
        &self,
        key: &str,
        kind: EntityKind,
        ttl: Option<Duration>,
        loader: F,
    ) -> CacheResult<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<Option<T>>> + Send,
    {
        if !self.config.enabled {
            return loader().await;
        }

        let mut loader = Some(loader);
        loop {
            if let Some(value) = self.get::<T>(key) {
                return Ok(Some(value));
            }

            let (slot, leader_guard) = {
                let mut flights = self.flights.lock();
                match flights.get(key) {
                    Some(existing) => (Arc::clone(existing), None),
                    None => {
                        let slot: Arc<FlightSlot> = Arc::new(tokio::sync::Mutex::new(None));
                        let guard = Arc::clone(&slot)
                            .try_lock_owned()
                            .expect("freshly created flight slot is uncontended");
                        flights.insert(key.to_string(), Arc::clone(&slot));
                        (slot, Some(guard))
                    }
                }
            };

            match leader_guard {
                Some(mut guard) => {
                    self.stats.write().flights += 1;

                    // Double check under the flight: an earlier flight may
                    // have populated the key between our miss and now.
                    if let Some(value) = self.get::<T>(key) {
                        *guard = Some(Ok(Some(Arc::new(value.clone()) as ErasedValue)));
                        self.retire_flight(key, &slot);
                        return Ok(Some(value));
                    }

                    let loader = loader.take().expect("leader role is taken at most once");
                    let result = loader().await;

                    let published: FlightResult = match &result {
                        Ok(Some(value)) => {
                            self.set(key, kind, value.clone(), ttl);
                            Ok(Some(Arc::new(value.clone()) as ErasedValue))
                        }
                        Ok(None) => Ok(None),
                        Err(err) => {
                            log::debug!("flight for '{}' failed: {}", key, err);
                            Err(err.clone())
                        }
                    };
                    *guard = Some(published);
                    self.retire_flight(key, &slot);
                    return result;
                }
                None => {
                    self.stats.write().joined_flights += 1;
                    let guard = slot.lock().await;
                    match guard.as_ref() {
                        Some(Ok(Some(erased))) => {
                            return match Arc::clone(erased).downcast::<T>() {
                                Ok(value) => Ok(Some(value.as_ref().clone())),
                                Err(_) => Err(CacheError::TypeMismatch(key.to_string())),
                            };
                        }
                        Some(Ok(None)) => return Ok(None),
                        Some(Err(err)) => return Err(err.clone()),
                        None => {
                            // The leader was dropped before publishing.
                            // Retire the stale registration and retry; this
                            // caller may lead the next flight.
                            drop(guard);
                            self.retire_flight(key, &slot);
                            continue;
                        }
                    }
                }
            }
        }
    }

    /// Number of stored slots, live or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the accounting counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    /// Drop every entry. Generations and statistics are untouched.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    fn prune_dead(entries: &mut HashMap<String, Slot>, generations: &GenerationMap) -> usize {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, slot| slot.is_live(generations.current(slot.kind), now));
        before - entries.len()
    }

    fn retire_flight(&self, key: &str, slot: &Arc<FlightSlot>) {
        let mut flights = self.flights.lock();
        if let Some(current) = flights.get(key) {
            if Arc::ptr_eq(current, slot) {
                flights.remove(key);
            }
        }
    }
}

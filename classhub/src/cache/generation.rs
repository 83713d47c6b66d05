// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-kind generation tokens for bulk invalidation
//!
//! Each entity kind owns one monotonically increasing counter. A cache entry
//! records the counter value at insertion; a bump retires every entry tagged
//! with an earlier value without touching the entries themselves. The map is
//! constructed once at startup and shared by handle, so there is no hidden
//! process-global state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::EntityKind;

/// One atomic generation counter per entity kind.
pub struct GenerationMap {
    tokens: HashMap<EntityKind, AtomicU64>,
}

impl GenerationMap {
    /// Create a map with every kind at generation 1.
    pub fn new() -> Self {
        let tokens = EntityKind::ALL
            .iter()
            .map(|kind| (*kind, AtomicU64::new(1)))
            .collect();
        Self { tokens }
    }

    /// Current generation for a kind.
    pub fn current(&self, kind: EntityKind) -> u64 {
        self.token(kind).load(Ordering::Acquire)
    }

    /// Atomically replace the kind's generation with the next one and return
    /// it. Concurrent bumps never lose an intermediate generation: each call
    /// retires whatever token it observed.
    pub fn bump(&self, kind: EntityKind) -> u64 {
        let next = self.token(kind).fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("generation bump: {} -> {}", kind, next);
        next
    }

    fn token(&self, kind: EntityKind) -> &AtomicU64 {
        // Every kind is inserted in new(); EntityKind is a closed enum.
        self.tokens
            .get(&kind)
            .expect("generation map covers every entity kind")
    }
}

impl Default for GenerationMap {
    fn default() -> Self {
        Self::new()
    }
}

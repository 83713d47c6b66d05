// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Generationally-invalidated read-through caching
//!
//! This module provides the coherency layer every domain service reads
//! through:
//! - A keyed, type-erased in-memory store with TTL expiration
//! - One generation token per entity kind for bulk invalidation
//! - A single-flight guard so a cold hot key is loaded exactly once
//!
//! Entries are never swept in the background; a dead entry (expired, or
//! tagged with a retired generation) is dropped lazily the next time its key
//! is touched.

pub mod config;
pub mod generation;
pub mod keys;
pub mod store;

pub use config::CacheConfig;
pub use generation::GenerationMap;
pub use keys::KeySpace;
pub use store::{CacheError, CacheResult, CacheStats, CoherencyStore};

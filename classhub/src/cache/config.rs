// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache configuration and TTL policy

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::model::EntityKind;

/// Configuration for the coherency store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable/disable caching entirely. When disabled every read is a miss
    /// and loaders run unguarded.
    pub enabled: bool,

    /// Expiration applied when neither the caller nor a per-kind override
    /// supplies one.
    pub default_ttl: Duration,

    /// Per-kind TTL overrides. Kinds that change rarely (school years,
    /// templates) can afford longer expirations than volatile ones (teams).
    pub ttl_overrides: HashMap<EntityKind, Duration>,

    /// Soft bound on stored entries. Crossing it triggers a lazy prune of
    /// dead entries on the next insert; live entries are never evicted for
    /// size.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let mut ttl_overrides = HashMap::new();
        ttl_overrides.insert(EntityKind::SchoolYear, Duration::from_secs(3600));
        ttl_overrides.insert(EntityKind::Template, Duration::from_secs(1800));
        ttl_overrides.insert(EntityKind::Team, Duration::from_secs(120));

        Self {
            enabled: true,
            default_ttl: Duration::from_secs(300), // 5 minutes
            ttl_overrides,
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for read-heavy deployments: longer expirations across
    /// the board.
    pub fn read_optimized() -> Self {
        let mut config = Self::default();
        config.default_ttl = Duration::from_secs(900);
        config
            .ttl_overrides
            .insert(EntityKind::SchoolYear, Duration::from_secs(7200));
        config
    }

    /// Configuration for tests and short-lived tools: tiny expirations so
    /// staleness windows close quickly.
    pub fn short_lived() -> Self {
        Self {
            enabled: true,
            default_ttl: Duration::from_secs(5),
            ttl_overrides: HashMap::new(),
            max_entries: 1_000,
        }
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Override the TTL for one entity kind.
    pub fn with_ttl_override(mut self, kind: EntityKind, ttl: Duration) -> Self {
        self.ttl_overrides.insert(kind, ttl);
        self
    }

    /// Resolve the TTL for an entity kind.
    pub fn ttl_for(&self, kind: EntityKind) -> Duration {
        self.ttl_overrides
            .get(&kind)
            .copied()
            .unwrap_or(self.default_ttl)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        if self.default_ttl.is_zero() {
            return Err("default_ttl must be greater than zero".to_string());
        }

        if let Some((kind, _)) = self.ttl_overrides.iter().find(|(_, ttl)| ttl.is_zero()) {
            return Err(format!("ttl override for {} must be greater than zero", kind));
        }

        if self.max_entries == 0 {
            return Err("max_entries must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CacheConfig::default().validate().is_ok());
        assert!(CacheConfig::read_optimized().validate().is_ok());
        assert!(CacheConfig::short_lived().validate().is_ok());
    }

    #[test]
    fn ttl_resolution_prefers_overrides() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl_for(EntityKind::SchoolYear), Duration::from_secs(3600));
        assert_eq!(config.ttl_for(EntityKind::Department), config.default_ttl);
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let config = CacheConfig::new().with_default_ttl(Duration::ZERO);
        assert!(config.validate().is_err());

        let config =
            CacheConfig::new().with_ttl_override(EntityKind::User, Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn disabled_config_skips_validation() {
        let mut config = CacheConfig::new().with_default_ttl(Duration::ZERO);
        config.enabled = false;
        assert!(config.validate().is_ok());
    }
}

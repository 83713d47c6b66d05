// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache key construction
//!
//! Each domain service owns a private namespace of key prefixes and builds
//! its keys through a [`KeySpace`] so the spelling stays consistent across
//! read and invalidation paths. The store itself attaches no meaning to key
//! contents.

use std::fmt::Display;
use uuid::Uuid;

/// Key builder for one entity family's namespace.
///
/// Produced keys follow the `Prefix_Qualifier_Value` convention, for example
/// `Department_Id_7f…`, `Team_ByOwner_a3…`, `User_AllActive`.
#[derive(Debug, Clone, Copy)]
pub struct KeySpace {
    prefix: &'static str,
}

impl KeySpace {
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Key for a single entity looked up by id.
    pub fn id(&self, id: &Uuid) -> String {
        format!("{}_Id_{}", self.prefix, id)
    }

    /// Key for the list of all active entities of the family.
    pub fn all_active(&self) -> String {
        format!("{}_AllActive", self.prefix)
    }

    /// Key for entities grouped under an owning entity.
    pub fn by_owner(&self, owner: &Uuid) -> String {
        format!("{}_ByOwner_{}", self.prefix, owner)
    }

    /// Key for an arbitrary qualifier, e.g. `scoped("ByDepartment", dept_id)`.
    pub fn scoped(&self, qualifier: &str, value: impl Display) -> String {
        format!("{}_{}_{}", self.prefix, qualifier, value)
    }

    /// Key for a family-wide singleton, e.g. `tagged("Current")` for the
    /// current school year.
    pub fn tagged(&self, qualifier: &str) -> String {
        format!("{}_{}", self.prefix, qualifier)
    }
}

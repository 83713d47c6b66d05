// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Repository seam
//!
//! The cold-path source of truth behind the cache. Production deployments
//! bind these traits to their persistence layer; the in-memory
//! implementation in [`memory`] serves tests and in-process tooling.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::Entity;

pub use memory::InMemoryRepository;

#[derive(Error, Debug, Clone)]
pub enum RepoError {
    #[error("repository storage failure: {0}")]
    Storage(String),

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("entity already exists: {0}")]
    Conflict(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Keyed storage for one entity family.
#[async_trait]
pub trait Repository<T>: Send + Sync
where
    T: Entity + Clone + Send + Sync,
{
    /// Fetch one entity by id.
    async fn get(&self, id: Uuid) -> RepoResult<Option<T>>;

    /// Fetch every stored entity.
    async fn list(&self) -> RepoResult<Vec<T>>;

    /// Fetch entities satisfying a predicate.
    async fn find(&self, predicate: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> RepoResult<Vec<T>>;

    /// Store a new entity. Errors with [`RepoError::Conflict`] when the id
    /// is already present.
    async fn add(&self, entity: T) -> RepoResult<()>;

    /// Replace a stored entity. Errors with [`RepoError::NotFound`] when the
    /// id is absent.
    async fn update(&self, entity: T) -> RepoResult<()>;

    /// Flush pending changes. A no-op for backends that write through.
    async fn save(&self) -> RepoResult<()> {
        Ok(())
    }
}

// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory repository

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{RepoError, RepoResult, Repository};
use crate::model::Entity;

/// HashMap-backed repository. Writes are immediate; `save` is a no-op.
pub struct InMemoryRepository<T> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T> InMemoryRepository<T>
where
    T: Entity + Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Seed an entity directly, bypassing conflict checks. Test convenience.
    pub fn seed(&self, entity: T) {
        self.rows.write().insert(entity.id(), entity);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl<T> Default for InMemoryRepository<T>
where
    T: Entity + Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Repository<T> for InMemoryRepository<T>
where
    T: Entity + Clone + Send + Sync,
{
    async fn get(&self, id: Uuid) -> RepoResult<Option<T>> {
        Ok(self.rows.read().get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<T>> {
        Ok(self.rows.read().values().cloned().collect())
    }

    async fn find(&self, predicate: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> RepoResult<Vec<T>> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|entity| predicate(entity))
            .cloned()
            .collect())
    }

    async fn add(&self, entity: T) -> RepoResult<()> {
        let mut rows = self.rows.write();
        if rows.contains_key(&entity.id()) {
            return Err(RepoError::Conflict(entity.id().to_string()));
        }
        rows.insert(entity.id(), entity);
        Ok(())
    }

    async fn update(&self, entity: T) -> RepoResult<()> {
        let mut rows = self.rows.write();
        if !rows.contains_key(&entity.id()) {
            return Err(RepoError::NotFound(entity.id().to_string()));
        }
        rows.insert(entity.id(), entity);
        Ok(())
    }
}

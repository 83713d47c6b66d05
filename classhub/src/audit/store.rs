// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Persistence seam for operation records

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::error::AuditResult;
use super::query::AuditFilter;
use super::record::OperationRecord;

/// Storage backend for the audit trail. Implementations own durability and
/// ordering; the trail only requires upsert-style writes and filtered reads.
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Persist a new record.
    async fn insert(&self, record: OperationRecord) -> AuditResult<()>;

    /// Persist the current state of an existing record. Upsert semantics:
    /// writing a record that was never inserted is not an error.
    async fn update(&self, record: OperationRecord) -> AuditResult<()>;

    /// Fetch one record by id.
    async fn get(&self, id: Uuid) -> AuditResult<Option<OperationRecord>>;

    /// Fetch records matching the filter, most recent first, with the
    /// filter's pagination applied.
    async fn search(&self, filter: &AuditFilter) -> AuditResult<Vec<OperationRecord>>;
}

/// In-memory operation store, the reference implementation used by tests and
/// in-process tools.
#[derive(Default)]
pub struct InMemoryOperationStore {
    records: RwLock<HashMap<Uuid, OperationRecord>>,
}

impl InMemoryOperationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl OperationStore for InMemoryOperationStore {
    async fn insert(&self, record: OperationRecord) -> AuditResult<()> {
        self.records.write().insert(record.id, record);
        Ok(())
    }

    async fn update(&self, record: OperationRecord) -> AuditResult<()> {
        self.records.write().insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AuditResult<Option<OperationRecord>> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn search(&self, filter: &AuditFilter) -> AuditResult<Vec<OperationRecord>> {
        let mut matching: Vec<OperationRecord> = self
            .records
            .read()
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        let page: Vec<OperationRecord> = match filter.limit {
            Some(limit) => matching.into_iter().skip(filter.offset).take(limit).collect(),
            None => matching.into_iter().skip(filter.offset).collect(),
        };
        Ok(page)
    }
}

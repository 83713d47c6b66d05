// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The audit trail: the single interface services use to record operations
//!
//! Write paths (open, close, progress) surface persistence failures as
//! errors; a lost audit entry is a defect. Read paths and benign races
//! (unknown id, double close) never error.

use std::sync::Arc;
use uuid::Uuid;

use super::error::AuditResult;
use super::query::AuditFilter;
use super::record::{OperationKind, OperationRecord, OperationStatus};
use super::store::OperationStore;
use crate::principal::{PrincipalResolver, SYSTEM_PRINCIPAL};

/// Process-wide audit trail over a pluggable [`OperationStore`].
pub struct AuditTrail {
    store: Arc<dyn OperationStore>,
    principal: Arc<dyn PrincipalResolver>,
}

impl AuditTrail {
    pub fn new(store: Arc<dyn OperationStore>, principal: Arc<dyn PrincipalResolver>) -> Self {
        Self { store, principal }
    }

    /// Open a record for a mutating action that is about to run. The record
    /// is persisted InProgress with `created_by` resolved from the acting
    /// principal, falling back to the system identifier.
    pub async fn open(
        &self,
        kind: OperationKind,
        target_type: impl Into<String>,
        target_id: Option<String>,
        target_name: Option<String>,
        parent_id: Option<Uuid>,
    ) -> AuditResult<OperationRecord> {
        let created_by = self
            .principal
            .current()
            .unwrap_or_else(|| SYSTEM_PRINCIPAL.to_string());

        let mut record = OperationRecord::new(
            kind,
            target_type,
            target_id,
            target_name,
            parent_id,
            created_by,
        );
        record.start();

        log::debug!(
            "audit open: {} {} on {} ({:?})",
            record.id,
            record.kind,
            record.target_type,
            record.target_name
        );
        self.store.insert(record.clone()).await?;
        Ok(record)
    }

    /// Close a record into a terminal status. Returns `false` when the id is
    /// unknown; the caller's business action is not at fault for a missing
    /// record. Closing an already-terminal record merges benignly.
    pub async fn close(
        &self,
        id: Uuid,
        status: OperationStatus,
        message: Option<&str>,
        stack_trace: Option<&str>,
    ) -> AuditResult<bool> {
        let Some(mut record) = self.store.get(id).await? else {
            log::debug!("audit close for unknown record {}", id);
            return Ok(false);
        };

        if !record.close(status, message, stack_trace) {
            log::warn!("audit close for {} with non-terminal status {}", id, status);
            return Ok(false);
        }

        log::debug!("audit close: {} -> {}", id, record.status);
        self.store.update(record).await?;
        Ok(true)
    }

    /// Update the progress counters of an in-progress bulk record. Returns
    /// `false` for an unknown id or a record that already reached a terminal
    /// status.
    pub async fn report_progress(
        &self,
        id: Uuid,
        processed: u64,
        failed: u64,
        total: Option<u64>,
    ) -> AuditResult<bool> {
        let Some(mut record) = self.store.get(id).await? else {
            return Ok(false);
        };

        if !record.apply_progress(processed, failed, total) {
            return Ok(false);
        }

        self.store.update(record).await?;
        Ok(true)
    }

    /// Record an operation that was already finished when logged, in one
    /// step. The start time is backdated slightly so the duration is a small
    /// positive value rather than zero.
    pub async fn log_completed(
        &self,
        kind: OperationKind,
        target_type: impl Into<String>,
        target_id: Option<String>,
        target_name: Option<String>,
        status: OperationStatus,
        message: Option<&str>,
    ) -> AuditResult<OperationRecord> {
        let created_by = self
            .principal
            .current()
            .unwrap_or_else(|| SYSTEM_PRINCIPAL.to_string());

        let record = OperationRecord::finished(
            kind,
            target_type,
            target_id,
            target_name,
            created_by,
            status,
            message,
        );
        self.store.insert(record.clone()).await?;
        Ok(record)
    }

    /// Hide a record from default queries. The record is never deleted.
    pub async fn deactivate(&self, id: Uuid) -> AuditResult<bool> {
        let Some(mut record) = self.store.get(id).await? else {
            return Ok(false);
        };
        record.deactivate();
        self.store.update(record).await?;
        Ok(true)
    }

    /// Fetch one record by id.
    pub async fn find(&self, id: Uuid) -> AuditResult<Option<OperationRecord>> {
        self.store.get(id).await
    }

    /// History for one target entity, most recent first, optionally capped.
    pub async fn for_target(
        &self,
        target_type: &str,
        target_id: &str,
        limit: Option<usize>,
    ) -> AuditResult<Vec<OperationRecord>> {
        let mut filter = AuditFilter::new().target(target_type, target_id);
        filter.limit = limit;
        self.store.search(&filter).await
    }

    /// History recorded for one acting principal, most recent first.
    pub async fn for_principal(&self, created_by: &str) -> AuditResult<Vec<OperationRecord>> {
        self.store
            .search(&AuditFilter::new().created_by(created_by))
            .await
    }

    /// Filtered, paginated history.
    pub async fn search(&self, filter: &AuditFilter) -> AuditResult<Vec<OperationRecord>> {
        self.store.search(filter).await
    }
}

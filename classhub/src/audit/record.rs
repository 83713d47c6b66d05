// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Operation records and their state machine
//!
//! Transitions are monotonic toward a terminal status:
//!
//! ```text
//! Pending --start--> InProgress --complete--> Completed
//!                    InProgress --fail------> Failed
//!                    InProgress --cancel----> Cancelled
//!                    InProgress --partial---> PartialSuccess
//! ```
//!
//! Pending may be corrected to InProgress without counting as a transition.
//! Closing an already-terminal record merges instead of transitioning: the
//! message is appended, the terminal status and completion time stay put.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Business-action types recorded in the trail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OperationKind {
    EntityCreated,
    EntityUpdated,
    EntityDeleted,
    EntityArchived,
    BulkOperation,
    StatusChanged,
    MemberAdded,
    MemberRemoved,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::EntityCreated => "entity_created",
            OperationKind::EntityUpdated => "entity_updated",
            OperationKind::EntityDeleted => "entity_deleted",
            OperationKind::EntityArchived => "entity_archived",
            OperationKind::BulkOperation => "bulk_operation",
            OperationKind::StatusChanged => "status_changed",
            OperationKind::MemberAdded => "member_added",
            OperationKind::MemberRemoved => "member_removed",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle states of an operation record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OperationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    PartialSuccess,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Completed
                | OperationStatus::Failed
                | OperationStatus::Cancelled
                | OperationStatus::PartialSuccess
        )
    }

    /// Derive the terminal status of a bulk operation from its counters.
    pub fn from_counters(processed: u64, failed: u64, total: u64) -> OperationStatus {
        if failed == 0 {
            OperationStatus::Completed
        } else if processed == 0 || failed >= total {
            OperationStatus::Failed
        } else {
            OperationStatus::PartialSuccess
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationStatus::Pending => "pending",
            OperationStatus::InProgress => "in_progress",
            OperationStatus::Completed => "completed",
            OperationStatus::Failed => "failed",
            OperationStatus::Cancelled => "cancelled",
            OperationStatus::PartialSuccess => "partial_success",
        };
        write!(f, "{}", s)
    }
}

/// One business mutation's lifecycle, independent of its outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationRecord {
    pub id: Uuid,
    pub kind: OperationKind,
    pub status: OperationStatus,

    pub target_type: String,
    pub target_id: Option<String>,
    pub target_name: Option<String>,

    pub created_by: String,

    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Progress counters for bulk operations.
    pub processed_items: Option<u64>,
    pub failed_items: Option<u64>,
    pub total_items: Option<u64>,

    pub error_message: Option<String>,
    pub error_stack_trace: Option<String>,

    /// Free-form completion details; messages append rather than overwrite.
    pub details: Option<String>,

    /// Links a sub-operation to its bulk parent.
    pub parent_id: Option<Uuid>,

    /// Visibility flag; records are deactivated, never deleted.
    pub is_active: bool,
}

impl OperationRecord {
    pub fn new(
        kind: OperationKind,
        target_type: impl Into<String>,
        target_id: Option<String>,
        target_name: Option<String>,
        parent_id: Option<Uuid>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: OperationStatus::Pending,
            target_type: target_type.into(),
            target_id,
            target_name,
            created_by: created_by.into(),
            started_at: Utc::now(),
            completed_at: None,
            processed_items: None,
            failed_items: None,
            total_items: None,
            error_message: None,
            error_stack_trace: None,
            details: None,
            parent_id: None,
            is_active: true,
        }
        .with_parent(parent_id)
    }

    fn with_parent(mut self, parent_id: Option<Uuid>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Build a record that is already finished when logged. The start time
    /// is backdated slightly so the duration is a small positive value.
    pub fn finished(
        kind: OperationKind,
        target_type: impl Into<String>,
        target_id: Option<String>,
        target_name: Option<String>,
        created_by: impl Into<String>,
        status: OperationStatus,
        message: Option<&str>,
    ) -> Self {
        let mut record = Self::new(kind, target_type, target_id, target_name, None, created_by);
        let completed = Utc::now();
        record.started_at = completed - Duration::milliseconds(1);
        record.status = if status.is_terminal() {
            status
        } else {
            OperationStatus::Completed
        };
        record.completed_at = Some(completed);
        if let Some(message) = message {
            match record.status {
                OperationStatus::Failed => record.error_message = Some(message.to_string()),
                _ => record.append_details(message),
            }
        }
        record
    }

    /// Correct Pending to InProgress. Not a transition; calling it on a
    /// record that already left Pending is a no-op.
    pub fn start(&mut self) {
        if self.status == OperationStatus::Pending {
            self.status = OperationStatus::InProgress;
        }
    }

    /// Close into a terminal status.
    ///
    /// Returns `false` when `status` is not terminal. Closing an
    /// already-terminal record is benign: the message is merged into the
    /// details and nothing else changes, so duration stays intact.
    pub fn close(
        &mut self,
        status: OperationStatus,
        message: Option<&str>,
        stack_trace: Option<&str>,
    ) -> bool {
        if !status.is_terminal() {
            return false;
        }

        if self.status.is_terminal() {
            if let Some(message) = message {
                self.append_details(message);
            }
            return true;
        }

        self.status = status;
        self.completed_at = Some(Utc::now());

        match status {
            OperationStatus::Failed => {
                self.error_message = message.map(str::to_string);
                self.error_stack_trace = stack_trace.map(str::to_string);
            }
            _ => {
                if let Some(message) = message {
                    self.append_details(message);
                }
            }
        }
        true
    }

    /// Update bulk progress counters. Returns `false` once the record is
    /// terminal; a terminal status never regresses to InProgress.
    pub fn apply_progress(&mut self, processed: u64, failed: u64, total: Option<u64>) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.start();
        self.processed_items = Some(processed);
        self.failed_items = Some(failed);
        if total.is_some() {
            self.total_items = total;
        }
        true
    }

    /// Elapsed time between start and completion, once both are known.
    /// Clamped at zero; a duration is never negative.
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at
            .map(|completed| (completed - self.started_at).max(Duration::zero()))
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    fn append_details(&mut self, message: &str) {
        match &mut self.details {
            Some(details) => {
                details.push_str("; ");
                details.push_str(message);
            }
            None => self.details = Some(message.to_string()),
        }
    }
}

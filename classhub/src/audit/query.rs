// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Filtering for audit history queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{OperationKind, OperationRecord, OperationStatus};

/// Filter over the operation history. Empty filter matches every active
/// record; pagination applies after matching, most recent first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Match records started at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Match records started strictly before this instant.
    pub until: Option<DateTime<Utc>>,
    pub kind: Option<OperationKind>,
    pub status: Option<OperationStatus>,
    pub created_by: Option<String>,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    /// Deactivated records are hidden unless explicitly requested.
    pub include_inactive: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, at: DateTime<Utc>) -> Self {
        self.since = Some(at);
        self
    }

    pub fn until(mut self, at: DateTime<Utc>) -> Self {
        self.until = Some(at);
        self
    }

    pub fn kind(mut self, kind: OperationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status(mut self, status: OperationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn created_by(mut self, principal: impl Into<String>) -> Self {
        self.created_by = Some(principal.into());
        self
    }

    pub fn target(mut self, target_type: impl Into<String>, target_id: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self.target_id = Some(target_id.into());
        self
    }

    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Whether a record satisfies every set predicate. Pagination is not
    /// applied here.
    pub fn matches(&self, record: &OperationRecord) -> bool {
        if !self.include_inactive && !record.is_active {
            return false;
        }
        if let Some(since) = self.since {
            if record.started_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.started_at >= until {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if record.kind != kind {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(created_by) = &self.created_by {
            if &record.created_by != created_by {
                return false;
            }
        }
        if let Some(target_type) = &self.target_type {
            if &record.target_type != target_type {
                return false;
            }
        }
        if let Some(target_id) = &self.target_id {
            if record.target_id.as_ref() != Some(target_id) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: OperationKind, created_by: &str) -> OperationRecord {
        OperationRecord::new(
            kind,
            "Team",
            Some("team-1".to_string()),
            None,
            None,
            created_by,
        )
    }

    #[test]
    fn empty_filter_matches_active_records() {
        let r = record(OperationKind::EntityCreated, "admin");
        assert!(AuditFilter::new().matches(&r));

        let mut inactive = record(OperationKind::EntityCreated, "admin");
        inactive.deactivate();
        assert!(!AuditFilter::new().matches(&inactive));
        assert!(AuditFilter::new().include_inactive().matches(&inactive));
    }

    #[test]
    fn predicates_are_conjunctive() {
        let r = record(OperationKind::MemberAdded, "admin");

        assert!(AuditFilter::new()
            .kind(OperationKind::MemberAdded)
            .created_by("admin")
            .matches(&r));
        assert!(!AuditFilter::new()
            .kind(OperationKind::MemberAdded)
            .created_by("someone-else")
            .matches(&r));
        assert!(!AuditFilter::new()
            .target("Team", "team-2")
            .matches(&r));
    }

    #[test]
    fn date_range_is_half_open() {
        let r = record(OperationKind::EntityUpdated, "admin");
        assert!(AuditFilter::new().since(r.started_at).matches(&r));
        assert!(!AuditFilter::new().until(r.started_at).matches(&r));
    }
}

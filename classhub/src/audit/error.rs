// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the audit trail

use thiserror::Error;

/// Audit failures are persistence failures. A lost audit entry is a defect
/// worth surfacing, so write-path errors propagate to the caller; benign
/// conditions (unknown id on close, double close) are signalled by return
/// value instead.
#[derive(Error, Debug, Clone)]
pub enum AuditError {
    #[error("audit storage failure: {0}")]
    Storage(String),
}

pub type AuditResult<T> = Result<T, AuditError>;

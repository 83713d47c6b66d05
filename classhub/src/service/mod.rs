// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Domain service facades
//!
//! One facade per entity family, each composing the same four collaborators:
//! the coherency store for reads, the audit trail for every mutation, the
//! directory executor for remote changes and the notification sink for
//! status delivery.
//!
//! Every write follows the same contract: open an audit record, validate,
//! execute the remote command where the entity is directory-backed, write
//! the repository, invalidate the affected cache keys, close the record and
//! surface its message to the acting principal. Business failures
//! (validation, directory rejection) are recovered locally into a
//! `None`/`false` result plus a Failed audit entry; only infrastructure
//! failures (repository or audit store malfunction) propagate as errors.

pub mod context;
pub mod department;
pub mod school_year;
pub mod subject;
pub mod team;
pub mod template;
pub mod user;

use thiserror::Error;

use crate::audit::AuditError;
use crate::cache::CacheError;
use crate::repo::RepoError;

pub use context::ServiceContext;
pub use department::DepartmentService;
pub use school_year::SchoolYearService;
pub use subject::SubjectService;
pub use team::{MemberAdditionReport, TeamService};
pub use template::TemplateService;
pub use user::UserService;

/// Infrastructure failures surfaced by the facades. Ordinary business
/// failures never appear here; they come back as `None`/`false` results.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    #[error("cache failure: {0}")]
    Cache(String),

    #[error("audit failure: {0}")]
    Audit(String),

    #[error("repository failure: {0}")]
    Repository(String),
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        match err {
            // Loader failures inside a read-through are repository failures.
            CacheError::Loader(message) => ServiceError::Repository(message),
            other => ServiceError::Cache(other.to_string()),
        }
    }
}

impl From<AuditError> for ServiceError {
    fn from(err: AuditError) -> Self {
        ServiceError::Audit(err.to_string())
    }
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        ServiceError::Repository(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

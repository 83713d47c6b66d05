// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! ClassHub - school and organization administration core for Microsoft Teams
//!
//! ClassHub manages departments, users, school years, subjects, team
//! templates and teams/channels, delegating every remote change to a
//! directory command executor.
//!
//! # Architecture
//!
//! - **Coherency store** ([`cache`]): a read-through cache keyed by
//!   namespaced strings, invalidated per entity kind through generation
//!   tokens, with a single-flight guard so a cold hot key is loaded once.
//! - **Audit trail** ([`audit`]): every mutating business action is an
//!   operation record moving Pending → InProgress → terminal, with progress
//!   counters for bulk work and a queryable history.
//! - **Domain services** ([`service`]): one facade per entity family
//!   composing cache, audit, repository and directory executor into the
//!   business operations.
//!
//! The collaborator seams ([`repo`], [`directory`], [`notify`],
//! [`principal`]) ship with in-process reference implementations; production
//! deployments bind them to their persistence layer, Graph connector and
//! delivery channel.
//!
//! # Usage
//!
//! ```ignore
//! let generations = Arc::new(GenerationMap::new());
//! let store = Arc::new(CoherencyStore::new(CacheConfig::default(), generations)?);
//! let audit = Arc::new(AuditTrail::new(
//!     Arc::new(InMemoryOperationStore::new()),
//!     Arc::new(FixedPrincipal("admin@school.edu".into())),
//! ));
//! let ctx = ServiceContext::new(store, audit, Arc::new(LogSink));
//!
//! let departments = DepartmentService::new(ctx.clone(), dept_repo, user_repo);
//! let created = departments.create("Mathematics", None).await?;
//! ```

pub mod audit;
pub mod cache;
pub mod directory;
pub mod model;
pub mod notify;
pub mod principal;
pub mod repo;
pub mod service;

// Re-export the primary surface.
pub use audit::{
    AuditFilter, AuditTrail, InMemoryOperationStore, OperationKind, OperationRecord,
    OperationStatus,
};
pub use cache::{CacheConfig, CacheError, CoherencyStore, GenerationMap, KeySpace};
pub use directory::{DirectoryCommand, DirectoryExecutor, DirectoryOutcome, DryRunDirectory};
pub use model::{
    Channel, Department, EntityKind, SchoolUser, SchoolYear, Subject, Team, TeamTemplate, UserRole,
};
pub use notify::{LogSink, NotificationSink};
pub use principal::{FixedPrincipal, PrincipalResolver, SystemPrincipal, SYSTEM_PRINCIPAL};
pub use repo::{InMemoryRepository, Repository};
pub use service::{
    DepartmentService, MemberAdditionReport, SchoolYearService, ServiceContext, ServiceError,
    SubjectService, TeamService, TemplateService, UserService,
};

/// ClassHub version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ClassHub crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Operation audit trail
//!
//! Every mutating business action is represented by an [`OperationRecord`]
//! that moves through a small state machine: opened before validation,
//! progressed during bulk work, closed into exactly one terminal status.
//! Records survive the action that produced them, whether it succeeded or
//! not, and are queryable by target, principal and filter.
//!
//! Persistence is delegated to an [`OperationStore`]; an in-memory
//! implementation ships with the crate.

pub mod error;
pub mod query;
pub mod record;
pub mod store;
pub mod trail;

pub use error::{AuditError, AuditResult};
pub use query::AuditFilter;
pub use record::{OperationKind, OperationRecord, OperationStatus};
pub use store::{InMemoryOperationStore, OperationStore};
pub use trail::AuditTrail;

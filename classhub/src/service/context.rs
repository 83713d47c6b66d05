// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared facade plumbing
//!
//! The context bundles the singletons every facade composes and carries the
//! small rituals they all repeat: closing records on the failure paths,
//! running directory commands, and fire-and-forget notification.

use std::sync::Arc;

use super::{ServiceError, ServiceResult};
use crate::audit::{AuditTrail, OperationRecord, OperationStatus};
use crate::cache::CoherencyStore;
use crate::directory::{DirectoryCommand, DirectoryExecutor, DirectoryOutcome};
use crate::notify::NotificationSink;

/// Collaborators shared by every domain service facade.
#[derive(Clone)]
pub struct ServiceContext {
    pub store: Arc<CoherencyStore>,
    pub audit: Arc<AuditTrail>,
    pub sink: Arc<dyn NotificationSink>,
}

impl ServiceContext {
    pub fn new(
        store: Arc<CoherencyStore>,
        audit: Arc<AuditTrail>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self { store, audit, sink }
    }

    /// Fire-and-forget delivery. Failures are logged and swallowed; they
    /// never roll back the business action.
    pub async fn notify(&self, recipient: &str, message: &str) {
        if let Err(err) = self.sink.deliver(recipient, message).await {
            log::warn!("notification to {} dropped: {}", recipient, err);
        }
    }

    /// Recover a business failure: close the record as Failed with the
    /// message and surface it to the acting principal. The caller then
    /// returns its `None`/`false` result.
    pub async fn reject(&self, record: &OperationRecord, message: &str) -> ServiceResult<()> {
        self.audit
            .close(record.id, OperationStatus::Failed, Some(message), None)
            .await?;
        self.notify(&record.created_by, message).await;
        Ok(())
    }

    /// Close the record as Completed with the message and surface it.
    pub async fn complete(&self, record: &OperationRecord, message: &str) -> ServiceResult<()> {
        self.close_with(record, OperationStatus::Completed, message).await
    }

    /// Close the record into an explicit terminal status with the message
    /// and surface it.
    pub async fn close_with(
        &self,
        record: &OperationRecord,
        status: OperationStatus,
        message: &str,
    ) -> ServiceResult<()> {
        self.audit
            .close(record.id, status, Some(message), None)
            .await?;
        self.notify(&record.created_by, message).await;
        Ok(())
    }

    /// Best-effort Failed close while an infrastructure error is already
    /// being propagated. A second failure here is only logged.
    pub async fn abandon(&self, record: &OperationRecord, message: &str) {
        if let Err(err) = self
            .audit
            .close(record.id, OperationStatus::Failed, Some(message), None)
            .await
        {
            log::warn!(
                "audit close for {} dropped during failure handling: {}",
                record.id,
                err
            );
        }
    }

    /// Lift a collaborator result, abandoning the open record first when it
    /// carries an infrastructure error.
    pub async fn guard<T, E>(
        &self,
        record: &OperationRecord,
        result: Result<T, E>,
    ) -> ServiceResult<T>
    where
        E: Into<ServiceError>,
    {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                let err = err.into();
                self.abandon(record, &err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Run a directory command on behalf of an open record.
    ///
    /// Returns the outcome only when the remote side accepted the command.
    /// A rejection or a transport failure closes the record as Failed,
    /// notifies, and yields `None`: state is unchanged on both sides, so the
    /// caller recovers locally.
    pub async fn execute_remote(
        &self,
        directory: &Arc<dyn DirectoryExecutor>,
        record: &OperationRecord,
        command: DirectoryCommand,
    ) -> ServiceResult<Option<DirectoryOutcome>> {
        match directory.execute(command).await {
            Ok(outcome) if outcome.success => Ok(Some(outcome)),
            Ok(outcome) => {
                let message = outcome
                    .message
                    .unwrap_or_else(|| "directory rejected the command".to_string());
                self.reject(record, &message).await?;
                Ok(None)
            }
            Err(err) => {
                self.reject(record, &err.to_string()).await?;
                Ok(None)
            }
        }
    }
}

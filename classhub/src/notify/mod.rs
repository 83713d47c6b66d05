// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Notification delivery seam
//!
//! Services surface every terminal audit message to the acting principal
//! through this sink. Delivery is fire-and-forget: a failure here is logged
//! and never rolls back the business action that produced the message.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum NotifyError {
    #[error("notification delivery failure: {0}")]
    Delivery(String),
}

/// Delivers human-readable status messages to a principal.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, recipient: &str, message: &str) -> Result<(), NotifyError>;
}

/// Sink that writes notifications to the log. The default for headless and
/// test runs.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, recipient: &str, message: &str) -> Result<(), NotifyError> {
        log::info!("notify {}: {}", recipient, message);
        Ok(())
    }
}

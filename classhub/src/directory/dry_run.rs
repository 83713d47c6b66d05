// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Offline directory executor
//!
//! Accepts every command without touching any remote system, fabricating
//! remote identifiers for create commands. Used for previews and for running
//! the administration flows against local state only.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{DirectoryCommand, DirectoryExecutor, DirectoryOutcome, DirectoryResult};

#[derive(Default)]
pub struct DryRunDirectory {
    counter: AtomicU64,
    executed: Mutex<Vec<DirectoryCommand>>,
}

impl DryRunDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands executed so far, in order.
    pub fn executed(&self) -> Vec<DirectoryCommand> {
        self.executed.lock().clone()
    }

    pub fn executed_count(&self) -> usize {
        self.executed.lock().len()
    }

    fn fabricate_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("dry-run-{}-{}", prefix, n)
    }
}

#[async_trait]
impl DirectoryExecutor for DryRunDirectory {
    async fn execute(&self, command: DirectoryCommand) -> DirectoryResult<DirectoryOutcome> {
        log::info!("dry-run directory: {}", command);

        let remote_id = match &command {
            DirectoryCommand::CreateTeam { .. } => Some(self.fabricate_id("team")),
            DirectoryCommand::CreateChannel { .. } => Some(self.fabricate_id("channel")),
            DirectoryCommand::CreateUser { .. } => Some(self.fabricate_id("user")),
            _ => None,
        };

        self.executed.lock().push(command);
        Ok(DirectoryOutcome::accepted(remote_id))
    }
}

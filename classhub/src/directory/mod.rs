// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Directory command execution seam
//!
//! All remote changes (teams, channels, users, memberships) go through one
//! command-execution facade. The core treats the executor as opaque: a
//! command either comes back with an outcome (accepted or rejected by the
//! remote side) or fails in transport. Rejections and transport failures are
//! both ordinary business failures to the services; neither rolls back
//! anything locally, because nothing local has been written yet.

pub mod dry_run;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use dry_run::DryRunDirectory;

/// Commands accepted by the remote directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectoryCommand {
    CreateTeam {
        display_name: String,
        owner_upn: String,
    },
    ArchiveTeam {
        remote_id: String,
    },
    DeleteTeam {
        remote_id: String,
    },
    CreateChannel {
        team_remote_id: String,
        name: String,
    },
    RemoveChannel {
        team_remote_id: String,
        channel_remote_id: String,
    },
    AddMember {
        team_remote_id: String,
        member_upn: String,
        as_owner: bool,
    },
    RemoveMember {
        team_remote_id: String,
        member_upn: String,
    },
    CreateUser {
        display_name: String,
        upn: String,
    },
    UpdateUser {
        upn: String,
        display_name: String,
    },
    DeactivateUser {
        upn: String,
    },
}

impl fmt::Display for DirectoryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryCommand::CreateTeam { display_name, .. } => {
                write!(f, "create_team '{}'", display_name)
            }
            DirectoryCommand::ArchiveTeam { remote_id } => {
                write!(f, "archive_team {}", remote_id)
            }
            DirectoryCommand::DeleteTeam { remote_id } => write!(f, "delete_team {}", remote_id),
            DirectoryCommand::CreateChannel { name, .. } => {
                write!(f, "create_channel '{}'", name)
            }
            DirectoryCommand::RemoveChannel {
                channel_remote_id, ..
            } => write!(f, "remove_channel {}", channel_remote_id),
            DirectoryCommand::AddMember { member_upn, .. } => {
                write!(f, "add_member {}", member_upn)
            }
            DirectoryCommand::RemoveMember { member_upn, .. } => {
                write!(f, "remove_member {}", member_upn)
            }
            DirectoryCommand::CreateUser { upn, .. } => write!(f, "create_user {}", upn),
            DirectoryCommand::UpdateUser { upn, .. } => write!(f, "update_user {}", upn),
            DirectoryCommand::DeactivateUser { upn } => write!(f, "deactivate_user {}", upn),
        }
    }
}

/// What the remote side said about a command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectoryOutcome {
    pub success: bool,
    /// Identifier assigned by the remote side, for create commands.
    pub remote_id: Option<String>,
    pub message: Option<String>,
}

impl DirectoryOutcome {
    pub fn accepted(remote_id: Option<String>) -> Self {
        Self {
            success: true,
            remote_id,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            remote_id: None,
            message: Some(message.into()),
        }
    }
}

/// Failure to reach the directory at all, as opposed to a rejection.
#[derive(Error, Debug, Clone)]
pub enum DirectoryError {
    #[error("directory transport failure: {0}")]
    Transport(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Executes commands against the remote directory.
#[async_trait]
pub trait DirectoryExecutor: Send + Sync {
    async fn execute(&self, command: DirectoryCommand) -> DirectoryResult<DirectoryOutcome>;
}

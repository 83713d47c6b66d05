// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Team administration
//!
//! Teams are the directory-heavy family: provisioning fans out one remote
//! command per channel, and membership changes run one command per member.
//! Bulk member addition opens one sub-record per member under a bulk parent
//! and reports progress after every item, so a half-failed run is visible in
//! the trail as PartialSuccess with the exact counters.

use std::sync::Arc;
use uuid::Uuid;

use super::context::ServiceContext;
use super::ServiceResult;
use crate::audit::{OperationKind, OperationStatus};
use crate::cache::{CacheError, KeySpace};
use crate::directory::{DirectoryCommand, DirectoryExecutor};
use crate::model::{Channel, EntityKind, SchoolUser, SchoolYear, Team, TeamTemplate};
use crate::repo::Repository;

const KEYS: KeySpace = KeySpace::new("Team");
const KIND: EntityKind = EntityKind::Team;

/// Counters from one bulk member addition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAdditionReport {
    pub operation_id: Uuid,
    pub added: u64,
    pub failed: u64,
    pub total: u64,
}

pub struct TeamService {
    ctx: ServiceContext,
    teams: Arc<dyn Repository<Team>>,
    templates: Arc<dyn Repository<TeamTemplate>>,
    users: Arc<dyn Repository<SchoolUser>>,
    years: Arc<dyn Repository<SchoolYear>>,
    directory: Arc<dyn DirectoryExecutor>,
}

impl TeamService {
    pub fn new(
        ctx: ServiceContext,
        teams: Arc<dyn Repository<Team>>,
        templates: Arc<dyn Repository<TeamTemplate>>,
        users: Arc<dyn Repository<SchoolUser>>,
        years: Arc<dyn Repository<SchoolYear>>,
        directory: Arc<dyn DirectoryExecutor>,
    ) -> Self {
        Self {
            ctx,
            teams,
            templates,
            users,
            years,
            directory,
        }
    }

    pub async fn team(&self, id: Uuid) -> ServiceResult<Option<Team>> {
        let repo = Arc::clone(&self.teams);
        let found = self
            .ctx
            .store
            .get_or_load(&KEYS.id(&id), KIND, None, move || async move {
                repo.get(id).await.map_err(CacheError::loader)
            })
            .await?;
        Ok(found)
    }

    pub async fn teams_for_owner(&self, owner_id: Uuid) -> ServiceResult<Vec<Team>> {
        let repo = Arc::clone(&self.teams);
        let list = self
            .ctx
            .store
            .get_or_load(&KEYS.by_owner(&owner_id), KIND, None, move || async move {
                let teams = repo
                    .find(&|t: &Team| !t.archived && t.owner_id == owner_id)
                    .await
                    .map_err(CacheError::loader)?;
                Ok(Some(teams))
            })
            .await?;
        Ok(list.unwrap_or_default())
    }

    /// Provision a team in the directory from a template, fanning out one
    /// channel per template entry. Channel failures do not abort the team;
    /// they are counted and the operation closes PartialSuccess.
    pub async fn create_from_template(
        &self,
        display_name: &str,
        owner_id: Uuid,
        template_id: Uuid,
        school_year_id: Option<Uuid>,
    ) -> ServiceResult<Option<Team>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityCreated,
                "Team",
                None,
                Some(display_name.to_string()),
                None,
            )
            .await?;

        let display_name = display_name.trim();
        if display_name.is_empty() {
            self.ctx.reject(&op, "team name must not be empty").await?;
            return Ok(None);
        }

        let owner = self.ctx.guard(&op, self.users.get(owner_id).await).await?;
        let Some(owner) = owner.filter(|u| u.is_active) else {
            self.ctx
                .reject(&op, "team owner does not exist or is inactive")
                .await?;
            return Ok(None);
        };

        let template = self
            .ctx
            .guard(&op, self.templates.get(template_id).await)
            .await?;
        let Some(template) = template.filter(|t| t.is_active) else {
            self.ctx
                .reject(&op, "team template does not exist or is inactive")
                .await?;
            return Ok(None);
        };

        if let Some(year_id) = school_year_id {
            let year = self.ctx.guard(&op, self.years.get(year_id).await).await?;
            if year.is_none() {
                self.ctx.reject(&op, "school year does not exist").await?;
                return Ok(None);
            }
        }

        let command = DirectoryCommand::CreateTeam {
            display_name: display_name.to_string(),
            owner_upn: owner.upn.clone(),
        };
        let Some(outcome) = self
            .ctx
            .execute_remote(&self.directory, &op, command)
            .await?
        else {
            return Ok(None);
        };
        let Some(remote_id) = outcome.remote_id else {
            self.ctx
                .reject(&op, "directory accepted the team but returned no identifier")
                .await?;
            return Ok(None);
        };

        // Channel fan-out. The team already exists remotely, so channel
        // failures degrade the result instead of aborting it.
        let total = template.channel_names.len() as u64;
        let mut provisioned = 0u64;
        let mut failed = 0u64;
        let mut channels = Vec::new();
        for name in &template.channel_names {
            let command = DirectoryCommand::CreateChannel {
                team_remote_id: remote_id.clone(),
                name: name.clone(),
            };
            match self.directory.execute(command).await {
                Ok(outcome) if outcome.success => {
                    let mut channel = Channel::new(name.clone());
                    channel.remote_id = outcome.remote_id;
                    channels.push(channel);
                    provisioned += 1;
                }
                Ok(outcome) => {
                    log::warn!(
                        "channel '{}' rejected for team '{}': {}",
                        name,
                        display_name,
                        outcome.message.as_deref().unwrap_or("no reason given")
                    );
                    failed += 1;
                }
                Err(err) => {
                    log::warn!(
                        "channel '{}' failed for team '{}': {}",
                        name,
                        display_name,
                        err
                    );
                    failed += 1;
                }
            }
            self.ctx
                .guard(
                    &op,
                    self.ctx
                        .audit
                        .report_progress(op.id, provisioned, failed, Some(total))
                        .await,
                )
                .await?;
        }

        let mut team = Team::new(display_name, owner_id);
        team.remote_id = Some(remote_id);
        team.template_id = Some(template_id);
        team.school_year_id = school_year_id;
        team.channels = channels;
        team.member_ids.push(owner_id);
        self.ctx.guard(&op, self.teams.add(team.clone()).await).await?;

        self.ctx.store.bump_generation(KIND);

        let status = if failed == 0 {
            OperationStatus::Completed
        } else {
            OperationStatus::PartialSuccess
        };
        let message = format!(
            "team '{}' created, {} of {} channels provisioned",
            display_name, provisioned, total
        );
        self.ctx.close_with(&op, status, &message).await?;
        Ok(Some(team))
    }

    /// Add members in bulk. One sub-record per member is linked under the
    /// bulk parent; the parent's counters advance after every item and its
    /// terminal status is derived from them.
    pub async fn add_members(
        &self,
        team_id: Uuid,
        member_ids: &[Uuid],
    ) -> ServiceResult<Option<MemberAdditionReport>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::BulkOperation,
                "Team",
                Some(team_id.to_string()),
                None,
                None,
            )
            .await?;

        let Some(mut team) = self.ctx.guard(&op, self.teams.get(team_id).await).await? else {
            self.ctx.reject(&op, "team does not exist").await?;
            return Ok(None);
        };
        if team.archived {
            let message = format!("team '{}' is archived", team.display_name);
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        }
        let Some(remote_id) = team.remote_id.clone() else {
            let message = format!("team '{}' has no directory identifier", team.display_name);
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        };

        let total = member_ids.len() as u64;
        let mut added = 0u64;
        let mut failed = 0u64;
        let mut changed = false;

        for member_id in member_ids {
            let member = self.ctx.guard(&op, self.users.get(*member_id).await).await?;

            let sub = self
                .ctx
                .audit
                .open(
                    OperationKind::MemberAdded,
                    "User",
                    Some(member_id.to_string()),
                    member.as_ref().map(|m| m.display_name.clone()),
                    Some(op.id),
                )
                .await?;

            match member.filter(|m| m.is_active) {
                None => {
                    failed += 1;
                    self.ctx
                        .guard(
                            &op,
                            self.ctx
                                .audit
                                .close(
                                    sub.id,
                                    OperationStatus::Failed,
                                    Some("user does not exist or is inactive"),
                                    None,
                                )
                                .await,
                        )
                        .await?;
                }
                Some(member) if team.member_ids.contains(member_id) => {
                    added += 1;
                    let message = format!("'{}' is already a member", member.upn);
                    self.ctx
                        .guard(
                            &op,
                            self.ctx
                                .audit
                                .close(sub.id, OperationStatus::Completed, Some(&message), None)
                                .await,
                        )
                        .await?;
                }
                Some(member) => {
                    let command = DirectoryCommand::AddMember {
                        team_remote_id: remote_id.clone(),
                        member_upn: member.upn.clone(),
                        as_owner: false,
                    };
                    let (sub_status, sub_message) = match self.directory.execute(command).await {
                        Ok(outcome) if outcome.success => {
                            team.member_ids.push(*member_id);
                            changed = true;
                            added += 1;
                            (
                                OperationStatus::Completed,
                                format!("'{}' added", member.upn),
                            )
                        }
                        Ok(outcome) => {
                            failed += 1;
                            (
                                OperationStatus::Failed,
                                outcome
                                    .message
                                    .unwrap_or_else(|| "directory rejected the member".to_string()),
                            )
                        }
                        Err(err) => {
                            failed += 1;
                            (OperationStatus::Failed, err.to_string())
                        }
                    };
                    self.ctx
                        .guard(
                            &op,
                            self.ctx
                                .audit
                                .close(sub.id, sub_status, Some(&sub_message), None)
                                .await,
                        )
                        .await?;
                }
            }

            self.ctx
                .guard(
                    &op,
                    self.ctx
                        .audit
                        .report_progress(op.id, added, failed, Some(total))
                        .await,
                )
                .await?;
        }

        if changed {
            self.ctx.guard(&op, self.teams.update(team.clone()).await).await?;
            self.ctx.store.remove(&KEYS.id(&team_id));
            self.ctx.store.bump_generation(KIND);
        }

        let status = OperationStatus::from_counters(added, failed, total);
        let message = format!(
            "{} of {} members added to team '{}'",
            added, total, team.display_name
        );
        self.ctx.close_with(&op, status, &message).await?;

        Ok(Some(MemberAdditionReport {
            operation_id: op.id,
            added,
            failed,
            total,
        }))
    }

    pub async fn remove_member(&self, team_id: Uuid, member_id: Uuid) -> ServiceResult<bool> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::MemberRemoved,
                "Team",
                Some(team_id.to_string()),
                None,
                None,
            )
            .await?;

        let Some(mut team) = self.ctx.guard(&op, self.teams.get(team_id).await).await? else {
            self.ctx.reject(&op, "team does not exist").await?;
            return Ok(false);
        };
        if !team.member_ids.contains(&member_id) {
            self.ctx.reject(&op, "user is not a member of this team").await?;
            return Ok(false);
        }
        if member_id == team.owner_id {
            self.ctx.reject(&op, "the team owner cannot be removed").await?;
            return Ok(false);
        }
        let Some(remote_id) = team.remote_id.clone() else {
            let message = format!("team '{}' has no directory identifier", team.display_name);
            self.ctx.reject(&op, &message).await?;
            return Ok(false);
        };

        let member = self.ctx.guard(&op, self.users.get(member_id).await).await?;
        let Some(member) = member else {
            self.ctx.reject(&op, "user does not exist").await?;
            return Ok(false);
        };

        let command = DirectoryCommand::RemoveMember {
            team_remote_id: remote_id,
            member_upn: member.upn.clone(),
        };
        if self
            .ctx
            .execute_remote(&self.directory, &op, command)
            .await?
            .is_none()
        {
            return Ok(false);
        }

        team.member_ids.retain(|id| *id != member_id);
        self.ctx.guard(&op, self.teams.update(team.clone()).await).await?;

        self.ctx.store.remove(&KEYS.id(&team_id));
        self.ctx.store.bump_generation(KIND);

        let message = format!(
            "'{}' removed from team '{}'",
            member.upn, team.display_name
        );
        self.ctx.complete(&op, &message).await?;
        Ok(true)
    }

    /// Archive a team remotely and mark it locally. Archived teams drop out
    /// of owner listings but stay readable by id.
    pub async fn archive(&self, team_id: Uuid) -> ServiceResult<bool> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityArchived,
                "Team",
                Some(team_id.to_string()),
                None,
                None,
            )
            .await?;

        let Some(mut team) = self.ctx.guard(&op, self.teams.get(team_id).await).await? else {
            self.ctx.reject(&op, "team does not exist").await?;
            return Ok(false);
        };
        if team.archived {
            let message = format!("team '{}' is already archived", team.display_name);
            self.ctx.reject(&op, &message).await?;
            return Ok(false);
        }
        let Some(remote_id) = team.remote_id.clone() else {
            let message = format!("team '{}' has no directory identifier", team.display_name);
            self.ctx.reject(&op, &message).await?;
            return Ok(false);
        };

        let command = DirectoryCommand::ArchiveTeam { remote_id };
        if self
            .ctx
            .execute_remote(&self.directory, &op, command)
            .await?
            .is_none()
        {
            return Ok(false);
        }

        team.archived = true;
        self.ctx.guard(&op, self.teams.update(team.clone()).await).await?;

        self.ctx.store.remove(&KEYS.id(&team_id));
        self.ctx.store.bump_generation(KIND);

        let message = format!("team '{}' archived", team.display_name);
        self.ctx.complete(&op, &message).await?;
        Ok(true)
    }
}

// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! User administration
//!
//! Users are directory-backed: creation, display-name changes and
//! deactivation run a remote command before any local write. Role changes
//! are a local classification and touch only the repository.

use std::sync::Arc;
use uuid::Uuid;

use super::context::ServiceContext;
use super::ServiceResult;
use crate::audit::OperationKind;
use crate::cache::{CacheError, KeySpace};
use crate::directory::{DirectoryCommand, DirectoryExecutor};
use crate::model::{Department, EntityKind, SchoolUser, UserRole};
use crate::repo::Repository;

const KEYS: KeySpace = KeySpace::new("User");
const KIND: EntityKind = EntityKind::User;

pub struct UserService {
    ctx: ServiceContext,
    users: Arc<dyn Repository<SchoolUser>>,
    departments: Arc<dyn Repository<Department>>,
    directory: Arc<dyn DirectoryExecutor>,
}

impl UserService {
    pub fn new(
        ctx: ServiceContext,
        users: Arc<dyn Repository<SchoolUser>>,
        departments: Arc<dyn Repository<Department>>,
        directory: Arc<dyn DirectoryExecutor>,
    ) -> Self {
        Self {
            ctx,
            users,
            departments,
            directory,
        }
    }

    pub async fn user(&self, id: Uuid) -> ServiceResult<Option<SchoolUser>> {
        let repo = Arc::clone(&self.users);
        let found = self
            .ctx
            .store
            .get_or_load(&KEYS.id(&id), KIND, None, move || async move {
                repo.get(id).await.map_err(CacheError::loader)
            })
            .await?;
        Ok(found)
    }

    pub async fn active_users(&self) -> ServiceResult<Vec<SchoolUser>> {
        let repo = Arc::clone(&self.users);
        let list = self
            .ctx
            .store
            .get_or_load(&KEYS.all_active(), KIND, None, move || async move {
                let active = repo
                    .find(&|u: &SchoolUser| u.is_active)
                    .await
                    .map_err(CacheError::loader)?;
                Ok(Some(active))
            })
            .await?;
        Ok(list.unwrap_or_default())
    }

    pub async fn users_in_department(&self, department_id: Uuid) -> ServiceResult<Vec<SchoolUser>> {
        let repo = Arc::clone(&self.users);
        let list = self
            .ctx
            .store
            .get_or_load(
                &KEYS.by_owner(&department_id),
                KIND,
                None,
                move || async move {
                    let members = repo
                        .find(&|u: &SchoolUser| {
                            u.is_active && u.department_id == Some(department_id)
                        })
                        .await
                        .map_err(CacheError::loader)?;
                    Ok(Some(members))
                },
            )
            .await?;
        Ok(list.unwrap_or_default())
    }

    /// Create a user in the directory and mirror it locally.
    pub async fn create(
        &self,
        display_name: &str,
        upn: &str,
        role: UserRole,
        department_id: Option<Uuid>,
    ) -> ServiceResult<Option<SchoolUser>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityCreated,
                "User",
                None,
                Some(display_name.to_string()),
                None,
            )
            .await?;

        let display_name = display_name.trim();
        let upn = upn.trim();
        if display_name.is_empty() {
            self.ctx.reject(&op, "display name must not be empty").await?;
            return Ok(None);
        }
        if !upn.contains('@') {
            let message = format!("'{}' is not a valid user principal name", upn);
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        }

        let existing = self
            .ctx
            .guard(
                &op,
                self.users
                    .find(&|u: &SchoolUser| u.upn.eq_ignore_ascii_case(upn))
                    .await,
            )
            .await?;
        if !existing.is_empty() {
            let message = format!("a user with principal name '{}' already exists", upn);
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        }

        if let Some(dept) = department_id {
            let department = self.ctx.guard(&op, self.departments.get(dept).await).await?;
            if !department.map(|d| d.is_active).unwrap_or(false) {
                self.ctx
                    .reject(&op, "assigned department does not exist or is inactive")
                    .await?;
                return Ok(None);
            }
        }

        let command = DirectoryCommand::CreateUser {
            display_name: display_name.to_string(),
            upn: upn.to_string(),
        };
        if self
            .ctx
            .execute_remote(&self.directory, &op, command)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let mut user = SchoolUser::new(display_name, upn, role);
        user.department_id = department_id;
        self.ctx.guard(&op, self.users.add(user.clone()).await).await?;

        self.ctx.store.bump_generation(KIND);

        let message = format!("user '{}' ({}) created", display_name, upn);
        self.ctx.complete(&op, &message).await?;
        Ok(Some(user))
    }

    pub async fn update_display_name(
        &self,
        id: Uuid,
        display_name: &str,
    ) -> ServiceResult<Option<SchoolUser>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityUpdated,
                "User",
                Some(id.to_string()),
                None,
                None,
            )
            .await?;

        let display_name = display_name.trim();
        if display_name.is_empty() {
            self.ctx.reject(&op, "display name must not be empty").await?;
            return Ok(None);
        }

        let Some(mut user) = self.ctx.guard(&op, self.users.get(id).await).await? else {
            self.ctx.reject(&op, "user does not exist").await?;
            return Ok(None);
        };

        let command = DirectoryCommand::UpdateUser {
            upn: user.upn.clone(),
            display_name: display_name.to_string(),
        };
        if self
            .ctx
            .execute_remote(&self.directory, &op, command)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        user.display_name = display_name.to_string();
        self.ctx.guard(&op, self.users.update(user.clone()).await).await?;

        self.ctx.store.remove(&KEYS.id(&id));
        self.ctx.store.bump_generation(KIND);

        let message = format!("user '{}' renamed to '{}'", user.upn, display_name);
        self.ctx.complete(&op, &message).await?;
        Ok(Some(user))
    }

    /// Reclassify a user. Local only; the directory has no notion of school
    /// roles.
    pub async fn change_role(&self, id: Uuid, role: UserRole) -> ServiceResult<Option<SchoolUser>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::StatusChanged,
                "User",
                Some(id.to_string()),
                None,
                None,
            )
            .await?;

        let Some(mut user) = self.ctx.guard(&op, self.users.get(id).await).await? else {
            self.ctx.reject(&op, "user does not exist").await?;
            return Ok(None);
        };

        let old_role = user.role;
        user.role = role;
        self.ctx.guard(&op, self.users.update(user.clone()).await).await?;

        self.ctx.store.remove(&KEYS.id(&id));
        self.ctx.store.bump_generation(KIND);

        let message = format!(
            "user '{}' role changed from {} to {}",
            user.upn, old_role, role
        );
        self.ctx.complete(&op, &message).await?;
        Ok(Some(user))
    }

    /// Deactivate a user in the directory and locally. The record stays for
    /// history; nothing is physically deleted.
    pub async fn deactivate(&self, id: Uuid) -> ServiceResult<bool> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityDeleted,
                "User",
                Some(id.to_string()),
                None,
                None,
            )
            .await?;

        let Some(mut user) = self.ctx.guard(&op, self.users.get(id).await).await? else {
            self.ctx.reject(&op, "user does not exist").await?;
            return Ok(false);
        };
        if !user.is_active {
            self.ctx.reject(&op, "user is already deactivated").await?;
            return Ok(false);
        }

        let command = DirectoryCommand::DeactivateUser {
            upn: user.upn.clone(),
        };
        if self
            .ctx
            .execute_remote(&self.directory, &op, command)
            .await?
            .is_none()
        {
            return Ok(false);
        }

        user.is_active = false;
        self.ctx.guard(&op, self.users.update(user.clone()).await).await?;

        self.ctx.store.remove(&KEYS.id(&id));
        self.ctx.store.bump_generation(KIND);

        let message = format!("user '{}' deactivated", user.upn);
        self.ctx.complete(&op, &message).await?;
        Ok(true)
    }
}

// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Department administration

use std::sync::Arc;
use uuid::Uuid;

use super::context::ServiceContext;
use super::ServiceResult;
use crate::audit::OperationKind;
use crate::cache::{CacheError, KeySpace};
use crate::model::{Department, EntityKind, SchoolUser};
use crate::repo::Repository;

const KEYS: KeySpace = KeySpace::new("Department");
const KIND: EntityKind = EntityKind::Department;

/// Facade for department reads and mutations. Departments are a purely
/// local construct; no directory commands are involved.
pub struct DepartmentService {
    ctx: ServiceContext,
    departments: Arc<dyn Repository<Department>>,
    users: Arc<dyn Repository<SchoolUser>>,
}

impl DepartmentService {
    pub fn new(
        ctx: ServiceContext,
        departments: Arc<dyn Repository<Department>>,
        users: Arc<dyn Repository<SchoolUser>>,
    ) -> Self {
        Self {
            ctx,
            departments,
            users,
        }
    }

    pub async fn department(&self, id: Uuid) -> ServiceResult<Option<Department>> {
        let repo = Arc::clone(&self.departments);
        let found = self
            .ctx
            .store
            .get_or_load(&KEYS.id(&id), KIND, None, move || async move {
                repo.get(id).await.map_err(CacheError::loader)
            })
            .await?;
        Ok(found)
    }

    pub async fn active_departments(&self) -> ServiceResult<Vec<Department>> {
        let repo = Arc::clone(&self.departments);
        let list = self
            .ctx
            .store
            .get_or_load(&KEYS.all_active(), KIND, None, move || async move {
                let active = repo
                    .find(&|d: &Department| d.is_active)
                    .await
                    .map_err(CacheError::loader)?;
                Ok(Some(active))
            })
            .await?;
        Ok(list.unwrap_or_default())
    }

    /// Create a department. Fails the operation (returning `None`) when the
    /// name is empty or already taken, or the designated head is unknown.
    pub async fn create(
        &self,
        name: &str,
        head_user_id: Option<Uuid>,
    ) -> ServiceResult<Option<Department>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityCreated,
                "Department",
                None,
                Some(name.to_string()),
                None,
            )
            .await?;

        let name = name.trim();
        if name.is_empty() {
            self.ctx.reject(&op, "department name must not be empty").await?;
            return Ok(None);
        }

        let duplicates = self
            .ctx
            .guard(
                &op,
                self.departments
                    .find(&|d: &Department| d.is_active && d.name.eq_ignore_ascii_case(name))
                    .await,
            )
            .await?;
        if !duplicates.is_empty() {
            let message = format!("department '{}' already exists", name);
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        }

        if let Some(head) = head_user_id {
            let head_user = self.ctx.guard(&op, self.users.get(head).await).await?;
            if head_user.is_none() {
                self.ctx
                    .reject(&op, "designated head of department does not exist")
                    .await?;
                return Ok(None);
            }
        }

        let mut department = Department::new(name);
        department.head_user_id = head_user_id;
        self.ctx
            .guard(&op, self.departments.add(department.clone()).await)
            .await?;

        // New entity: only list variants can be stale.
        self.ctx.store.bump_generation(KIND);

        let message = format!("department '{}' created", name);
        self.ctx.complete(&op, &message).await?;
        Ok(Some(department))
    }

    pub async fn rename(&self, id: Uuid, new_name: &str) -> ServiceResult<Option<Department>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityUpdated,
                "Department",
                Some(id.to_string()),
                None,
                None,
            )
            .await?;

        let new_name = new_name.trim();
        if new_name.is_empty() {
            self.ctx.reject(&op, "department name must not be empty").await?;
            return Ok(None);
        }

        let Some(mut department) = self.ctx.guard(&op, self.departments.get(id).await).await?
        else {
            self.ctx.reject(&op, "department does not exist").await?;
            return Ok(None);
        };

        let old_name = std::mem::replace(&mut department.name, new_name.to_string());
        self.ctx
            .guard(&op, self.departments.update(department.clone()).await)
            .await?;

        self.ctx.store.remove(&KEYS.id(&id));
        self.ctx.store.bump_generation(KIND);

        let message = format!("department '{}' renamed to '{}'", old_name, new_name);
        self.ctx.complete(&op, &message).await?;
        Ok(Some(department))
    }

    /// Soft-delete a department. Refused while active users are still
    /// assigned to it.
    pub async fn deactivate(&self, id: Uuid) -> ServiceResult<bool> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityDeleted,
                "Department",
                Some(id.to_string()),
                None,
                None,
            )
            .await?;

        let Some(mut department) = self.ctx.guard(&op, self.departments.get(id).await).await?
        else {
            self.ctx.reject(&op, "department does not exist").await?;
            return Ok(false);
        };

        let assigned = self
            .ctx
            .guard(
                &op,
                self.users
                    .find(&|u: &SchoolUser| u.is_active && u.department_id == Some(id))
                    .await,
            )
            .await?;
        if !assigned.is_empty() {
            let message = format!(
                "department '{}' still has {} assigned users",
                department.name,
                assigned.len()
            );
            self.ctx.reject(&op, &message).await?;
            return Ok(false);
        }

        department.is_active = false;
        self.ctx
            .guard(&op, self.departments.update(department.clone()).await)
            .await?;

        self.ctx.store.remove(&KEYS.id(&id));
        self.ctx.store.bump_generation(KIND);

        let message = format!("department '{}' deactivated", department.name);
        self.ctx.complete(&op, &message).await?;
        Ok(true)
    }
}

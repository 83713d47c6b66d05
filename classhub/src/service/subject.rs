// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Subject administration

use std::sync::Arc;
use uuid::Uuid;

use super::context::ServiceContext;
use super::ServiceResult;
use crate::audit::OperationKind;
use crate::cache::{CacheError, KeySpace};
use crate::model::{Department, EntityKind, Subject};
use crate::repo::Repository;

const KEYS: KeySpace = KeySpace::new("Subject");
const KIND: EntityKind = EntityKind::Subject;

pub struct SubjectService {
    ctx: ServiceContext,
    subjects: Arc<dyn Repository<Subject>>,
    departments: Arc<dyn Repository<Department>>,
}

impl SubjectService {
    pub fn new(
        ctx: ServiceContext,
        subjects: Arc<dyn Repository<Subject>>,
        departments: Arc<dyn Repository<Department>>,
    ) -> Self {
        Self {
            ctx,
            subjects,
            departments,
        }
    }

    pub async fn subject(&self, id: Uuid) -> ServiceResult<Option<Subject>> {
        let repo = Arc::clone(&self.subjects);
        let found = self
            .ctx
            .store
            .get_or_load(&KEYS.id(&id), KIND, None, move || async move {
                repo.get(id).await.map_err(CacheError::loader)
            })
            .await?;
        Ok(found)
    }

    pub async fn subjects_of_department(&self, department_id: Uuid) -> ServiceResult<Vec<Subject>> {
        let repo = Arc::clone(&self.subjects);
        let list = self
            .ctx
            .store
            .get_or_load(
                &KEYS.by_owner(&department_id),
                KIND,
                None,
                move || async move {
                    let subjects = repo
                        .find(&|s: &Subject| s.is_active && s.department_id == department_id)
                        .await
                        .map_err(CacheError::loader)?;
                    Ok(Some(subjects))
                },
            )
            .await?;
        Ok(list.unwrap_or_default())
    }

    /// Create a subject. The code must be unique within its department.
    pub async fn create(
        &self,
        code: &str,
        name: &str,
        department_id: Uuid,
    ) -> ServiceResult<Option<Subject>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityCreated,
                "Subject",
                None,
                Some(name.to_string()),
                None,
            )
            .await?;

        let code = code.trim();
        let name = name.trim();
        if code.is_empty() || name.is_empty() {
            self.ctx
                .reject(&op, "subject code and name must not be empty")
                .await?;
            return Ok(None);
        }

        let department = self
            .ctx
            .guard(&op, self.departments.get(department_id).await)
            .await?;
        if !department.map(|d| d.is_active).unwrap_or(false) {
            self.ctx
                .reject(&op, "owning department does not exist or is inactive")
                .await?;
            return Ok(None);
        }

        let duplicates = self
            .ctx
            .guard(
                &op,
                self.subjects
                    .find(&|s: &Subject| {
                        s.is_active
                            && s.department_id == department_id
                            && s.code.eq_ignore_ascii_case(code)
                    })
                    .await,
            )
            .await?;
        if !duplicates.is_empty() {
            let message = format!("subject code '{}' is already used in this department", code);
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        }

        let subject = Subject::new(code, name, department_id);
        self.ctx
            .guard(&op, self.subjects.add(subject.clone()).await)
            .await?;

        self.ctx.store.bump_generation(KIND);

        let message = format!("subject '{}' ({}) created", name, code);
        self.ctx.complete(&op, &message).await?;
        Ok(Some(subject))
    }

    pub async fn rename(&self, id: Uuid, new_name: &str) -> ServiceResult<Option<Subject>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityUpdated,
                "Subject",
                Some(id.to_string()),
                None,
                None,
            )
            .await?;

        let new_name = new_name.trim();
        if new_name.is_empty() {
            self.ctx.reject(&op, "subject name must not be empty").await?;
            return Ok(None);
        }

        let Some(mut subject) = self.ctx.guard(&op, self.subjects.get(id).await).await? else {
            self.ctx.reject(&op, "subject does not exist").await?;
            return Ok(None);
        };

        let old_name = std::mem::replace(&mut subject.name, new_name.to_string());
        self.ctx
            .guard(&op, self.subjects.update(subject.clone()).await)
            .await?;

        self.ctx.store.remove(&KEYS.id(&id));
        self.ctx.store.bump_generation(KIND);

        let message = format!("subject '{}' renamed to '{}'", old_name, new_name);
        self.ctx.complete(&op, &message).await?;
        Ok(Some(subject))
    }

    /// Soft-delete a subject.
    pub async fn retire(&self, id: Uuid) -> ServiceResult<bool> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityDeleted,
                "Subject",
                Some(id.to_string()),
                None,
                None,
            )
            .await?;

        let Some(mut subject) = self.ctx.guard(&op, self.subjects.get(id).await).await? else {
            self.ctx.reject(&op, "subject does not exist").await?;
            return Ok(false);
        };
        if !subject.is_active {
            self.ctx.reject(&op, "subject is already retired").await?;
            return Ok(false);
        }

        subject.is_active = false;
        self.ctx
            .guard(&op, self.subjects.update(subject.clone()).await)
            .await?;

        self.ctx.store.remove(&KEYS.id(&id));
        self.ctx.store.bump_generation(KIND);

        let message = format!("subject '{}' retired", subject.name);
        self.ctx.complete(&op, &message).await?;
        Ok(true)
    }
}

// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Team template administration

use std::sync::Arc;
use uuid::Uuid;

use super::context::ServiceContext;
use super::ServiceResult;
use crate::audit::OperationKind;
use crate::cache::{CacheError, KeySpace};
use crate::model::{EntityKind, TeamTemplate};
use crate::repo::Repository;

const KEYS: KeySpace = KeySpace::new("Template");
const KIND: EntityKind = EntityKind::Template;

pub struct TemplateService {
    ctx: ServiceContext,
    templates: Arc<dyn Repository<TeamTemplate>>,
}

impl TemplateService {
    pub fn new(ctx: ServiceContext, templates: Arc<dyn Repository<TeamTemplate>>) -> Self {
        Self { ctx, templates }
    }

    pub async fn template(&self, id: Uuid) -> ServiceResult<Option<TeamTemplate>> {
        let repo = Arc::clone(&self.templates);
        let found = self
            .ctx
            .store
            .get_or_load(&KEYS.id(&id), KIND, None, move || async move {
                repo.get(id).await.map_err(CacheError::loader)
            })
            .await?;
        Ok(found)
    }

    pub async fn active_templates(&self) -> ServiceResult<Vec<TeamTemplate>> {
        let repo = Arc::clone(&self.templates);
        let list = self
            .ctx
            .store
            .get_or_load(&KEYS.all_active(), KIND, None, move || async move {
                let active = repo
                    .find(&|t: &TeamTemplate| t.is_active)
                    .await
                    .map_err(CacheError::loader)?;
                Ok(Some(active))
            })
            .await?;
        Ok(list.unwrap_or_default())
    }

    /// Create a template. A template must name at least one channel and may
    /// not repeat channel names.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        channel_names: Vec<String>,
    ) -> ServiceResult<Option<TeamTemplate>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityCreated,
                "Template",
                None,
                Some(name.to_string()),
                None,
            )
            .await?;

        let name = name.trim();
        if name.is_empty() {
            self.ctx.reject(&op, "template name must not be empty").await?;
            return Ok(None);
        }
        if let Some(message) = Self::channel_list_problem(&channel_names) {
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        }

        let duplicates = self
            .ctx
            .guard(
                &op,
                self.templates
                    .find(&|t: &TeamTemplate| t.is_active && t.name.eq_ignore_ascii_case(name))
                    .await,
            )
            .await?;
        if !duplicates.is_empty() {
            let message = format!("template '{}' already exists", name);
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        }

        let mut template = TeamTemplate::new(name, channel_names);
        template.description = description.map(str::to_string);
        self.ctx
            .guard(&op, self.templates.add(template.clone()).await)
            .await?;

        self.ctx.store.bump_generation(KIND);

        let message = format!(
            "template '{}' created with {} channels",
            name,
            template.channel_names.len()
        );
        self.ctx.complete(&op, &message).await?;
        Ok(Some(template))
    }

    /// Replace a template's channel list. Teams already provisioned from
    /// the template are unaffected.
    pub async fn update_channels(
        &self,
        id: Uuid,
        channel_names: Vec<String>,
    ) -> ServiceResult<Option<TeamTemplate>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityUpdated,
                "Template",
                Some(id.to_string()),
                None,
                None,
            )
            .await?;

        if let Some(message) = Self::channel_list_problem(&channel_names) {
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        }

        let Some(mut template) = self.ctx.guard(&op, self.templates.get(id).await).await? else {
            self.ctx.reject(&op, "template does not exist").await?;
            return Ok(None);
        };

        template.channel_names = channel_names;
        self.ctx
            .guard(&op, self.templates.update(template.clone()).await)
            .await?;

        self.ctx.store.remove(&KEYS.id(&id));
        self.ctx.store.bump_generation(KIND);

        let message = format!(
            "template '{}' now defines {} channels",
            template.name,
            template.channel_names.len()
        );
        self.ctx.complete(&op, &message).await?;
        Ok(Some(template))
    }

    fn channel_list_problem(channel_names: &[String]) -> Option<String> {
        if channel_names.is_empty() {
            return Some("a template must define at least one channel".to_string());
        }
        if channel_names.iter().any(|c| c.trim().is_empty()) {
            return Some("channel names must not be empty".to_string());
        }
        for (i, a) in channel_names.iter().enumerate() {
            if channel_names[i + 1..]
                .iter()
                .any(|b| a.eq_ignore_ascii_case(b))
            {
                return Some(format!("duplicate channel name '{}'", a));
            }
        }
        None
    }
}

// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! School year administration
//!
//! Years are local constructs. The current year is the hottest read in the
//! system (`SchoolYear_Current`): every team provisioning flow consults it,
//! so it goes through the single-flight read-through like everything else.

use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use super::context::ServiceContext;
use super::ServiceResult;
use crate::audit::OperationKind;
use crate::cache::{CacheError, KeySpace};
use crate::model::{EntityKind, SchoolYear};
use crate::repo::Repository;

const KEYS: KeySpace = KeySpace::new("SchoolYear");
const KIND: EntityKind = EntityKind::SchoolYear;

pub struct SchoolYearService {
    ctx: ServiceContext,
    years: Arc<dyn Repository<SchoolYear>>,
}

impl SchoolYearService {
    pub fn new(ctx: ServiceContext, years: Arc<dyn Repository<SchoolYear>>) -> Self {
        Self { ctx, years }
    }

    pub async fn school_year(&self, id: Uuid) -> ServiceResult<Option<SchoolYear>> {
        let repo = Arc::clone(&self.years);
        let found = self
            .ctx
            .store
            .get_or_load(&KEYS.id(&id), KIND, None, move || async move {
                repo.get(id).await.map_err(CacheError::loader)
            })
            .await?;
        Ok(found)
    }

    /// The year currently marked current, if any.
    pub async fn current_school_year(&self) -> ServiceResult<Option<SchoolYear>> {
        let repo = Arc::clone(&self.years);
        let found = self
            .ctx
            .store
            .get_or_load(&KEYS.tagged("Current"), KIND, None, move || async move {
                let current = repo
                    .find(&|y: &SchoolYear| y.is_current)
                    .await
                    .map_err(CacheError::loader)?;
                Ok(current.into_iter().next())
            })
            .await?;
        Ok(found)
    }

    /// Every known year, newest first.
    pub async fn all_school_years(&self) -> ServiceResult<Vec<SchoolYear>> {
        let repo = Arc::clone(&self.years);
        let list = self
            .ctx
            .store
            .get_or_load(&KEYS.all_active(), KIND, None, move || async move {
                let mut years = repo.list().await.map_err(CacheError::loader)?;
                years.sort_by(|a, b| b.starts_on.cmp(&a.starts_on));
                Ok(Some(years))
            })
            .await?;
        Ok(list.unwrap_or_default())
    }

    /// Create a year. Refused when the label is empty or taken, the dates
    /// are out of order, or the span overlaps an existing year.
    pub async fn create(
        &self,
        label: &str,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    ) -> ServiceResult<Option<SchoolYear>> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::EntityCreated,
                "SchoolYear",
                None,
                Some(label.to_string()),
                None,
            )
            .await?;

        let label = label.trim();
        if label.is_empty() {
            self.ctx.reject(&op, "school year label must not be empty").await?;
            return Ok(None);
        }
        if starts_on >= ends_on {
            let message = format!(
                "school year '{}' must start before it ends ({} >= {})",
                label, starts_on, ends_on
            );
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        }

        let year = SchoolYear::new(label, starts_on, ends_on);

        let conflicting = self
            .ctx
            .guard(
                &op,
                self.years
                    .find(&|y: &SchoolYear| {
                        y.label.eq_ignore_ascii_case(label) || y.overlaps(&year)
                    })
                    .await,
            )
            .await?;
        if let Some(conflict) = conflicting.first() {
            let message = format!(
                "school year '{}' conflicts with existing year '{}'",
                label, conflict.label
            );
            self.ctx.reject(&op, &message).await?;
            return Ok(None);
        }

        self.ctx.guard(&op, self.years.add(year.clone()).await).await?;

        self.ctx.store.bump_generation(KIND);

        let message = format!("school year '{}' created", label);
        self.ctx.complete(&op, &message).await?;
        Ok(Some(year))
    }

    /// Mark one year as current, unmarking whichever held the flag before.
    pub async fn set_current(&self, id: Uuid) -> ServiceResult<bool> {
        let op = self
            .ctx
            .audit
            .open(
                OperationKind::StatusChanged,
                "SchoolYear",
                Some(id.to_string()),
                None,
                None,
            )
            .await?;

        let Some(mut year) = self.ctx.guard(&op, self.years.get(id).await).await? else {
            self.ctx.reject(&op, "school year does not exist").await?;
            return Ok(false);
        };
        if year.is_current {
            let message = format!("school year '{}' is already current", year.label);
            self.ctx.complete(&op, &message).await?;
            return Ok(true);
        }

        let previous = self
            .ctx
            .guard(&op, self.years.find(&|y: &SchoolYear| y.is_current).await)
            .await?;
        for mut prev in previous {
            prev.is_current = false;
            self.ctx.guard(&op, self.years.update(prev).await).await?;
        }

        year.is_current = true;
        self.ctx.guard(&op, self.years.update(year.clone()).await).await?;

        self.ctx.store.remove(&KEYS.tagged("Current"));
        self.ctx.store.remove(&KEYS.id(&id));
        self.ctx.store.bump_generation(KIND);

        let message = format!("school year '{}' is now current", year.label);
        self.ctx.complete(&op, &message).await?;
        Ok(true)
    }
}

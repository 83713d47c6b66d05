// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Domain models for the school administration core
//!
//! Every cacheable entity family is listed in [`EntityKind`], which doubles
//! as the taxonomy for generation-token invalidation. The models themselves
//! are plain serde structs; persistence and remote representation are owned
//! by the collaborators behind the `repo` and `directory` seams.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Entity families managed by the administration core.
///
/// One generation token exists per kind; bumping it invalidates every cache
/// entry tagged with the kind's previous generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Department,
    User,
    SchoolYear,
    Subject,
    Template,
    Team,
}

impl EntityKind {
    /// All kinds, in declaration order. Used to pre-size the generation map.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Department,
        EntityKind::User,
        EntityKind::SchoolYear,
        EntityKind::Subject,
        EntityKind::Template,
        EntityKind::Team,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Department => "Department",
            EntityKind::User => "User",
            EntityKind::SchoolYear => "SchoolYear",
            EntityKind::Subject => "Subject",
            EntityKind::Template => "Template",
            EntityKind::Team => "Team",
        };
        write!(f, "{}", s)
    }
}

/// Anything a repository can store: identified by a stable UUID.
pub trait Entity {
    fn id(&self) -> Uuid;
}

/// Organizational unit users and subjects belong to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    /// Head of department, when one is assigned.
    pub head_user_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Department {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            head_user_id: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

impl Entity for Department {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Role a directory user plays within the school.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Teacher,
    Student,
    Staff,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
            UserRole::Staff => "staff",
        };
        write!(f, "{}", s)
    }
}

/// A person in the directory, mirrored locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchoolUser {
    pub id: Uuid,
    pub display_name: String,
    /// User principal name, the directory-side login identifier.
    pub upn: String,
    pub role: UserRole,
    pub department_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl SchoolUser {
    pub fn new(display_name: impl Into<String>, upn: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            upn: upn.into(),
            role,
            department_id: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

impl Entity for SchoolUser {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// An academic year. At most one year is marked current at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchoolYear {
    pub id: Uuid,
    pub label: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub is_current: bool,
}

impl SchoolYear {
    pub fn new(label: impl Into<String>, starts_on: NaiveDate, ends_on: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            starts_on,
            ends_on,
            is_current: false,
        }
    }

    /// True when the two years share at least one day.
    pub fn overlaps(&self, other: &SchoolYear) -> bool {
        self.starts_on <= other.ends_on && other.starts_on <= self.ends_on
    }
}

impl Entity for SchoolYear {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// A taught subject, scoped to a department by a short code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub department_id: Uuid,
    pub is_active: bool,
}

impl Subject {
    pub fn new(code: impl Into<String>, name: impl Into<String>, department_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            department_id,
            is_active: true,
        }
    }
}

impl Entity for Subject {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Blueprint for provisioning a team: name plus the channels to fan out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub channel_names: Vec<String>,
    pub is_active: bool,
}

impl TeamTemplate {
    pub fn new(name: impl Into<String>, channel_names: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            channel_names,
            is_active: true,
        }
    }
}

impl Entity for TeamTemplate {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// A channel inside a team. Channels live and die with their team, so they
/// are embedded rather than stored in a repository of their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Channel {
    pub id: Uuid,
    pub name: String,
    /// Identifier assigned by the remote directory, once provisioned.
    pub remote_id: Option<String>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            remote_id: None,
        }
    }
}

/// A collaboration team, locally mirrored with its remote identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: Uuid,
    pub display_name: String,
    /// Identifier assigned by the remote directory at creation time.
    pub remote_id: Option<String>,
    pub owner_id: Uuid,
    pub template_id: Option<Uuid>,
    pub school_year_id: Option<Uuid>,
    pub channels: Vec<Channel>,
    pub member_ids: Vec<Uuid>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(display_name: impl Into<String>, owner_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            remote_id: None,
            owner_id,
            template_id: None,
            school_year_id: None,
            channels: Vec::new(),
            member_ids: Vec::new(),
            archived: false,
            created_at: Utc::now(),
        }
    }
}

impl Entity for Team {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_display_matches_key_prefixes() {
        assert_eq!(EntityKind::Department.to_string(), "Department");
        assert_eq!(EntityKind::SchoolYear.to_string(), "SchoolYear");
        assert_eq!(EntityKind::ALL.len(), 6);
    }

    #[test]
    fn school_year_overlap_is_inclusive() {
        let a = SchoolYear::new(
            "2025/26",
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
        );
        let b = SchoolYear::new(
            "2026/27",
            NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            NaiveDate::from_ymd_opt(2027, 6, 30).unwrap(),
        );
        let c = SchoolYear::new(
            "2027/28",
            NaiveDate::from_ymd_opt(2027, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2028, 6, 30).unwrap(),
        );
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }
}

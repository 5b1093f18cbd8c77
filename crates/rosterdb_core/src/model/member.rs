//! Member record and relationship helpers.
//!
//! # Invariants
//! - `id` is `None` until the first save.
//! - `created_at`/`updated_at` are storage-assigned epoch milliseconds.
//! - `change_team` keeps `team_id` and the team's member list in step.

use super::team::{Team, TeamId};
use super::ModelValidationError;
use serde::{Deserialize, Serialize};

pub type MemberId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Option<MemberId>,
    pub username: String,
    pub age: i32,
    pub team_id: Option<TeamId>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Member {
    /// Creates an unsaved member with age 0 and no team.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_age(username, 0)
    }

    pub fn with_age(username: impl Into<String>, age: i32) -> Self {
        Self {
            id: None,
            username: username.into(),
            age,
            team_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Creates an unsaved member already assigned to `team`.
    ///
    /// # Errors
    /// - `TeamNotPersisted` when `team` has no id yet.
    pub fn with_team(
        username: impl Into<String>,
        age: i32,
        team: &mut Team,
    ) -> Result<Self, ModelValidationError> {
        let mut member = Self::with_age(username, age);
        member.change_team(team)?;
        Ok(member)
    }

    /// Moves this member to `team`, updating both sides of the relationship.
    ///
    /// The member id is recorded in `team.members` only once the member has
    /// been saved; unsaved members appear there after reload.
    pub fn change_team(&mut self, team: &mut Team) -> Result<(), ModelValidationError> {
        let team_id = team.id.ok_or(ModelValidationError::TeamNotPersisted)?;
        self.team_id = Some(team_id);
        if let Some(member_id) = self.id {
            team.attach_member(member_id);
        }
        Ok(())
    }

    /// Clears the team reference and removes this member from `team`.
    pub fn leave_team(&mut self, team: &mut Team) {
        if self.team_id.is_some() && self.team_id == team.id {
            self.team_id = None;
            if let Some(member_id) = self.id {
                team.detach_member(member_id);
            }
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.username.trim().is_empty() {
            return Err(ModelValidationError::BlankUsername);
        }
        if self.age < 0 {
            return Err(ModelValidationError::NegativeAge(self.age));
        }
        Ok(())
    }
}

/// A member loaded together with its team in one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberWithTeam {
    pub member: Member,
    pub team: Option<Team>,
}

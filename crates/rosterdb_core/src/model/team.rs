//! Team record.

use super::member::MemberId;
use super::ModelValidationError;
use serde::{Deserialize, Serialize};

pub type TeamId = i64;

/// A named group of members.
///
/// `members` is the inverse side of `Member::team_id`. It is only filled by
/// explicit loads (`TeamRepository::find_with_members`) or by
/// `Member::change_team`; saving a team never writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: Option<TeamId>,
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberId>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::BlankTeamName);
        }
        Ok(())
    }

    pub fn has_member(&self, member_id: MemberId) -> bool {
        self.members.contains(&member_id)
    }

    pub(crate) fn attach_member(&mut self, member_id: MemberId) {
        if !self.has_member(member_id) {
            self.members.push(member_id);
        }
    }

    pub(crate) fn detach_member(&mut self, member_id: MemberId) {
        self.members.retain(|id| *id != member_id);
    }
}

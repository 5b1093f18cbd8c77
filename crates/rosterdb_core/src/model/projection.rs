//! Read models selected directly by query instead of full records.

use super::member::{Member, MemberId};
use serde::Serialize;

/// Member summary joined with the team name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDto {
    pub id: MemberId,
    pub username: String,
    pub team_name: Option<String>,
}

impl From<&Member> for MemberDto {
    /// Team name is left empty; use a join projection when it is needed.
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.unwrap_or_default(),
            username: member.username.clone(),
            team_name: None,
        }
    }
}

impl From<Member> for MemberDto {
    fn from(member: Member) -> Self {
        Self::from(&member)
    }
}

/// Open projection: `username` is computed as `"{username} {age}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsernameOnly {
    pub username: String,
}

/// Closed projection carrying only the username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsernameOnlyDto {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamInfo {
    pub name: String,
}

/// Username plus a nested team view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedProjection {
    pub username: String,
    pub team: Option<TeamInfo>,
}

/// Flat member row used by native paged queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberProjection {
    pub id: MemberId,
    pub username: String,
    pub team_name: Option<String>,
}

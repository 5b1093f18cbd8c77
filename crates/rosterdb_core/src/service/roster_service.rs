//! Roster use-case service.
//!
//! # Responsibility
//! - Team creation, member registration and team assignment.
//! - Default member listing as paged summaries.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::model::member::{Member, MemberId};
use crate::model::projection::MemberDto;
use crate::model::team::Team;
use crate::model::ModelValidationError;
use crate::query::{MemberField, Predicate, Sort};
use crate::repo::{MemberRepository, Page, PageRequest, RepoError, RepoResult, TeamRepository};
use log::info;

pub struct RosterService<M: MemberRepository, T: TeamRepository> {
    members: M,
    teams: T,
    page_size: i64,
}

impl<M: MemberRepository, T: TeamRepository> RosterService<M, T> {
    pub fn new(members: M, teams: T) -> Self {
        Self {
            members,
            teams,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size used by `list_members`; values below 1 are rejected there.
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn members(&self) -> &M {
        &self.members
    }

    pub fn teams(&self) -> &T {
        &self.teams
    }

    pub fn create_team(&self, name: impl Into<String>) -> RepoResult<Team> {
        self.teams.save(&Team::new(name))
    }

    pub fn register_member(&self, username: impl Into<String>, age: i32) -> RepoResult<Member> {
        self.members.save(&Member::with_age(username, age))
    }

    /// Saves a new member assigned to `team` and records it in `team.members`.
    pub fn join_member(
        &self,
        username: impl Into<String>,
        age: i32,
        team: &mut Team,
    ) -> RepoResult<Member> {
        let member = Member::with_team(username, age, team)?;
        let mut saved = self.members.save(&member)?;
        saved.change_team(team)?;
        Ok(saved)
    }

    /// Moves a saved member from `from` to `to` and persists the new reference.
    ///
    /// Both in-memory member lists are updated. Nothing changes when `to`
    /// has not been saved yet.
    pub fn transfer_member(
        &self,
        member: &mut Member,
        from: &mut Team,
        to: &mut Team,
    ) -> RepoResult<Member> {
        member.change_team(to)?;
        if let (Some(member_id), true) = (member.id, from.id != to.id) {
            from.detach_member(member_id);
        }
        self.members.save(member)
    }

    /// Saves `count` demo members named `user{i}` with age `i`.
    pub fn seed_members(&self, count: usize) -> RepoResult<usize> {
        for index in 0..count {
            self.register_member(format!("user{index}"), seed_age(index)?)?;
        }
        info!(
            "event=seed_members module=service status=ok count={}",
            count
        );
        Ok(count)
    }

    /// Member summaries ordered by username.
    pub fn list_members(&self, page: i64) -> RepoResult<Page<MemberDto>> {
        let request =
            PageRequest::sorted(page, self.page_size, Sort::asc(MemberField::Username))?;
        Ok(self
            .members
            .find_page(&Predicate::all(), &request)?
            .map(MemberDto::from))
    }

    pub fn member_username(&self, id: MemberId) -> RepoResult<String> {
        self.members
            .find_by_id(id)?
            .map(|member| member.username)
            .ok_or(RepoError::NotFound {
                entity: "member",
                id: Some(id),
            })
    }
}

fn seed_age(index: usize) -> RepoResult<i32> {
    i32::try_from(index).map_err(|_| {
        RepoError::Validation(ModelValidationError::InvalidFieldValue {
            field: "age",
            reason: "seed index exceeds the member age range",
        })
    })
}

#[cfg(test)]
mod tests {
    use super::seed_age;
    use crate::model::ModelValidationError;
    use crate::repo::RepoError;

    #[test]
    fn seed_age_rejects_indexes_past_i32() {
        assert_eq!(seed_age(41).unwrap(), 41);
        let index = usize::try_from(i64::from(i32::MAX) + 1).unwrap();
        assert!(matches!(
            seed_age(index),
            Err(RepoError::Validation(
                ModelValidationError::InvalidFieldValue { field: "age", .. }
            ))
        ));
    }
}

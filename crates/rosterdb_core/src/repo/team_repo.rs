//! Team repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `team.members` is never written; it is read back only by
//!   `find_with_members`.
//! - Deleting a team that members still reference fails with
//!   `ConstraintViolation`.

use super::crud::{CrudRepository, QueryRepository};
use super::error::{RepoError, RepoResult};
use super::page::{fetch_page, fetch_slice, Page, PageRequest, Slice};
use super::schema::{ensure_connection_ready, MEMBER_TABLE, TEAM_TABLE};
use super::store::{query_count, query_rows, RowShape};
use crate::model::member::MemberId;
use crate::model::team::{Team, TeamId};
use crate::query::{Predicate, QueryPlan, Sort, TeamField, TEAM_SOURCE};
use log::debug;
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "team";

const TEAM_COLUMNS: &str = "t.team_id AS team_id, t.name AS name";

const TEAM_SHAPE: RowShape<Team> = RowShape {
    columns: TEAM_COLUMNS,
    joined: false,
    decode: parse_team_row,
};

pub trait TeamRepository:
    QueryRepository<Entity = Team, Id = TeamId, Field = TeamField>
{
    /// Loads a team with the ids of its members in ascending order.
    fn find_with_members(&self, id: TeamId) -> RepoResult<Option<Team>>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeamRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[TEAM_TABLE, MEMBER_TABLE])?;
        Ok(Self { conn })
    }

    fn select(
        &self,
        predicate: &Predicate<TeamField>,
        sort: &Sort<TeamField>,
    ) -> RepoResult<Vec<Team>> {
        let statement = QueryPlan::new(&TEAM_SOURCE, predicate)
            .sorted(sort)
            .select(TEAM_COLUMNS);
        query_rows(self.conn, &statement, parse_team_row)
    }

    fn member_ids(&self, id: TeamId) -> RepoResult<Vec<MemberId>> {
        let mut stmt = self.conn.prepare(
            "SELECT member_id
             FROM member
             WHERE team_id = ?1
             ORDER BY member_id ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }
}

impl CrudRepository for SqliteTeamRepository<'_> {
    type Entity = Team;
    type Id = TeamId;

    fn save(&self, team: &Team) -> RepoResult<Team> {
        team.validate()?;

        let id = match team.id {
            None => {
                self.conn.execute(
                    "INSERT INTO team (name) VALUES (?1);",
                    [team.name.as_str()],
                )?;
                self.conn.last_insert_rowid()
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE team SET name = ?1 WHERE team_id = ?2;",
                    params![team.name.as_str(), id],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: ENTITY,
                        id: Some(id),
                    });
                }
                id
            }
        };

        debug!(
            "event=entity_save module=repo status=ok entity={} id={} insert={}",
            ENTITY,
            id,
            team.is_new()
        );
        self.find_by_id(id)?.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: Some(id),
        })
    }

    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>> {
        let predicate = Predicate::all().eq(TeamField::Id, id);
        Ok(self
            .select(&predicate, &Sort::unsorted())?
            .into_iter()
            .next())
    }

    fn find_all(&self) -> RepoResult<Vec<Team>> {
        self.select(&Predicate::all(), &Sort::unsorted())
    }

    fn delete(&self, team: &Team) -> RepoResult<()> {
        let id = team.id.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: None,
        })?;
        self.delete_by_id(id)
    }

    fn delete_by_id(&self, id: TeamId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM team WHERE team_id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: ENTITY,
                id: Some(id),
            });
        }

        debug!(
            "event=entity_delete module=repo status=ok entity={} id={}",
            ENTITY, id
        );
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        self.count_where(&Predicate::all())
    }

    fn exists_by_id(&self, id: TeamId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM team WHERE team_id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl QueryRepository for SqliteTeamRepository<'_> {
    type Field = TeamField;

    fn find(
        &self,
        predicate: &Predicate<TeamField>,
        sort: &Sort<TeamField>,
    ) -> RepoResult<Vec<Team>> {
        self.select(predicate, sort)
    }

    fn find_one(&self, predicate: &Predicate<TeamField>) -> RepoResult<Option<Team>> {
        let statement = QueryPlan::new(&TEAM_SOURCE, predicate)
            .window(2, 0)
            .select(TEAM_COLUMNS);
        let mut rows = query_rows(self.conn, &statement, parse_team_row)?;
        if rows.len() > 1 {
            return Err(RepoError::IncorrectResultSize {
                expected: 1,
                actual: self.count_where(predicate)?,
            });
        }
        Ok(rows.pop())
    }

    fn count_where(&self, predicate: &Predicate<TeamField>) -> RepoResult<u64> {
        query_count(self.conn, &QueryPlan::new(&TEAM_SOURCE, predicate).count())
    }

    fn find_page(
        &self,
        predicate: &Predicate<TeamField>,
        request: &PageRequest<TeamField>,
    ) -> RepoResult<Page<Team>> {
        fetch_page(self.conn, &TEAM_SOURCE, predicate, request, &TEAM_SHAPE)
    }

    fn find_slice(
        &self,
        predicate: &Predicate<TeamField>,
        request: &PageRequest<TeamField>,
    ) -> RepoResult<Slice<Team>> {
        fetch_slice(self.conn, &TEAM_SOURCE, predicate, request, &TEAM_SHAPE)
    }
}

impl TeamRepository for SqliteTeamRepository<'_> {
    fn find_with_members(&self, id: TeamId) -> RepoResult<Option<Team>> {
        let Some(mut team) = self.find_by_id(id)? else {
            return Ok(None);
        };
        team.members = self.member_ids(id)?;
        Ok(Some(team))
    }
}

fn parse_team_row(row: &Row<'_>) -> RepoResult<Team> {
    let id: TeamId = row.get("team_id")?;
    let team = Team {
        id: Some(id),
        name: row.get("name")?,
        members: Vec::new(),
    };
    team.validate()
        .map_err(|err| RepoError::InvalidData(format!("team {id}: {err}")))?;
    Ok(team)
}

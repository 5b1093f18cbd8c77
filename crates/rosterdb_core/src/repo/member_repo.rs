//! Member repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD, predicate, paged and named/derived queries over `member`.
//! - Projections and team-joined reads without loading full graphs.
//! - Bulk updates and locking reads.
//!
//! # Invariants
//! - Write paths call `Member::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows as `InvalidData`.
//! - Only `find_by_id` consults the persistence context; every other read
//!   goes to storage.

use super::bulk::{execute_bulk_update, BulkUpdateResult, CacheSync, UpdateExpr};
use super::context::PersistenceContext;
use super::crud::{CrudRepository, QueryOutcome, QueryRepository};
use super::error::{RepoError, RepoResult};
use super::lock::{acquire_write_lock, LockMode};
use super::page::{fetch_page, fetch_slice, Page, PageRequest, Slice};
use super::projection::{projection_shape, Projection};
use super::schema::{ensure_connection_ready, MEMBER_TABLE, TEAM_TABLE};
use super::store::{query_count, query_rows, RowShape, NOW_MS_SQL};
use crate::model::member::{Member, MemberId, MemberWithTeam};
use crate::model::projection::{MemberDto, MemberProjection};
use crate::model::team::Team;
use crate::query::{
    expect_args, list_arg, value_arg, DeriveError, MemberField, Predicate, QueryAction, QueryArg,
    QueryDispatcher, QueryPlan, Sort, MEMBER_SOURCE,
};
use log::{debug, info};
use rusqlite::{params, Connection, Row};
use std::time::Instant;

const ENTITY: &str = "member";

const MEMBER_COLUMNS: &str = "m.member_id AS member_id,
    m.username AS username,
    m.age AS age,
    m.team_id AS team_id,
    m.created_at AS created_at,
    m.updated_at AS updated_at";

const MEMBER_WITH_TEAM_COLUMNS: &str = "m.member_id AS member_id,
    m.username AS username,
    m.age AS age,
    m.team_id AS team_id,
    m.created_at AS created_at,
    m.updated_at AS updated_at,
    t.team_id AS joined_team_id,
    t.name AS team_name";

const MEMBER_SHAPE: RowShape<Member> = RowShape {
    columns: MEMBER_COLUMNS,
    joined: false,
    decode: parse_member_row,
};

/// Member-specific queries on top of the generic contracts.
pub trait MemberRepository:
    QueryRepository<Entity = Member, Id = MemberId, Field = MemberField>
{
    /// Runs a registered named query, or derives one from `name`.
    ///
    /// # Errors
    /// - `InvalidQuery` for unknown names, properties or argument mismatches.
    fn find_by_query(&self, name: &str, args: &[QueryArg]) -> RepoResult<QueryOutcome<Member>>;

    /// Selects projection `P` for every member matching `predicate`, in id
    /// order.
    fn find_projected<P: Projection>(
        &self,
        predicate: &Predicate<MemberField>,
    ) -> RepoResult<Vec<P>>;

    fn find_usernames(&self) -> RepoResult<Vec<String>>;

    /// Members that belong to a team, with the team name.
    fn find_member_dtos(&self) -> RepoResult<Vec<MemberDto>>;

    /// Every member including those without a team, paged.
    fn find_projection_page(
        &self,
        request: &PageRequest<MemberField>,
    ) -> RepoResult<Page<MemberProjection>>;

    /// Members with their team loaded by the same query.
    fn find_with_team(
        &self,
        predicate: &Predicate<MemberField>,
        sort: &Sort<MemberField>,
    ) -> RepoResult<Vec<MemberWithTeam>>;

    /// # Errors
    /// - `TransactionRequired` for `PessimisticWrite` outside a transaction.
    /// - `LockConflict` when another connection holds the write lock.
    fn find_with_lock(
        &self,
        predicate: &Predicate<MemberField>,
        lock: LockMode,
    ) -> RepoResult<Vec<Member>>;

    /// Applies `updates` to every matching row in one statement.
    fn bulk_update(
        &self,
        predicate: &Predicate<MemberField>,
        updates: &[UpdateExpr<MemberField>],
        sync: CacheSync,
    ) -> RepoResult<BulkUpdateResult>;

    /// `age = age + 1` for members with `age >= min_age`; clears the context.
    fn bulk_age_plus(&self, min_age: i32) -> RepoResult<usize>;

    /// Reloads one member from storage, replacing any cached copy.
    fn refresh(&self, id: MemberId) -> RepoResult<Option<Member>>;
    fn detach(&self, id: MemberId);
    fn clear_context(&self);
    fn is_cached(&self, id: MemberId) -> bool;
}

/// SQLite-backed member repository with a per-instance persistence context.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
    context: PersistenceContext<Member>,
    queries: QueryDispatcher<MemberField>,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[TEAM_TABLE, MEMBER_TABLE])?;
        Ok(Self {
            conn,
            context: PersistenceContext::new(),
            queries: named_member_queries(),
        })
    }

    fn select(
        &self,
        predicate: &Predicate<MemberField>,
        sort: &Sort<MemberField>,
        limit: Option<u64>,
    ) -> RepoResult<Vec<Member>> {
        let mut plan = QueryPlan::new(&MEMBER_SOURCE, predicate).sorted(sort);
        if let Some(limit) = limit {
            plan = plan.window(limit, 0);
        }
        query_rows(self.conn, &plan.select(MEMBER_COLUMNS), parse_member_row)
    }

    fn load(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let predicate = Predicate::all().eq(MemberField::Id, id);
        Ok(self
            .select(&predicate, &Sort::unsorted(), Some(1))?
            .into_iter()
            .next())
    }
}

impl CrudRepository for SqliteMemberRepository<'_> {
    type Entity = Member;
    type Id = MemberId;

    fn save(&self, member: &Member) -> RepoResult<Member> {
        member.validate()?;

        let id = match member.id {
            None => {
                self.conn.execute(
                    &format!(
                        "INSERT INTO member (
                            username,
                            age,
                            team_id,
                            created_at,
                            updated_at
                        ) VALUES (?1, ?2, ?3, {now}, {now});",
                        now = NOW_MS_SQL
                    ),
                    params![member.username.as_str(), member.age, member.team_id],
                )?;
                self.conn.last_insert_rowid()
            }
            Some(id) => {
                let changed = self.conn.execute(
                    &format!(
                        "UPDATE member
                         SET
                            username = ?1,
                            age = ?2,
                            team_id = ?3,
                            updated_at = {now}
                         WHERE member_id = ?4;",
                        now = NOW_MS_SQL
                    ),
                    params![member.username.as_str(), member.age, member.team_id, id],
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

        let saved = self.load(id)?.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: Some(id),
        })?;
        self.context.put(id, saved.clone());
        debug!(
            "event=entity_save module=repo status=ok entity={} id={} insert={}",
            ENTITY,
            id,
            member.is_new()
        );
        Ok(saved)
    }

    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>> {
        if let Some(cached) = self.context.get(id) {
            debug!(
                "event=context_hit module=repo status=ok entity={} id={}",
                ENTITY, id
            );
            return Ok(Some(cached));
        }

        let loaded = self.load(id)?;
        if let Some(member) = &loaded {
            self.context.put(id, member.clone());
        }
        Ok(loaded)
    }

    fn find_all(&self) -> RepoResult<Vec<Member>> {
        self.select(&Predicate::all(), &Sort::unsorted(), None)
    }

    fn delete(&self, member: &Member) -> RepoResult<()> {
        let id = member.id.ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: None,
        })?;
        self.delete_by_id(id)
    }

    fn delete_by_id(&self, id: MemberId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM member WHERE member_id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: ENTITY,
                id: Some(id),
            });
        }

        self.context.evict(id);
        debug!(
            "event=entity_delete module=repo status=ok entity={} id={}",
            ENTITY, id
        );
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        self.count_where(&Predicate::all())
    }

    fn exists_by_id(&self, id: MemberId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM member WHERE member_id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl QueryRepository for SqliteMemberRepository<'_> {
    type Field = MemberField;

    fn find(
        &self,
        predicate: &Predicate<MemberField>,
        sort: &Sort<MemberField>,
    ) -> RepoResult<Vec<Member>> {
        self.select(predicate, sort, None)
    }

    fn find_one(&self, predicate: &Predicate<MemberField>) -> RepoResult<Option<Member>> {
        let mut rows = self.select(predicate, &Sort::unsorted(), Some(2))?;
        if rows.len() > 1 {
            return Err(RepoError::IncorrectResultSize {
                expected: 1,
                actual: self.count_where(predicate)?,
            });
        }
        Ok(rows.pop())
    }

    fn count_where(&self, predicate: &Predicate<MemberField>) -> RepoResult<u64> {
        query_count(self.conn, &QueryPlan::new(&MEMBER_SOURCE, predicate).count())
    }

    fn find_page(
        &self,
        predicate: &Predicate<MemberField>,
        request: &PageRequest<MemberField>,
    ) -> RepoResult<Page<Member>> {
        fetch_page(self.conn, &MEMBER_SOURCE, predicate, request, &MEMBER_SHAPE)
    }

    fn find_slice(
        &self,
        predicate: &Predicate<MemberField>,
        request: &PageRequest<MemberField>,
    ) -> RepoResult<Slice<Member>> {
        fetch_slice(self.conn, &MEMBER_SOURCE, predicate, request, &MEMBER_SHAPE)
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn find_by_query(&self, name: &str, args: &[QueryArg]) -> RepoResult<QueryOutcome<Member>> {
        let started_at = Instant::now();
        let resolved = self.queries.resolve(name, args)?;

        let outcome = match resolved.action {
            QueryAction::Find => QueryOutcome::Rows(self.select(
                &resolved.predicate,
                &resolved.sort,
                resolved.limit,
            )?),
            QueryAction::Count => QueryOutcome::Count(self.count_where(&resolved.predicate)?),
            QueryAction::Exists => {
                QueryOutcome::Exists(self.count_where(&resolved.predicate)? > 0)
            }
        };

        debug!(
            "event=query_dispatch module=repo status=ok query={} origin={:?} duration_ms={}",
            name,
            resolved.origin,
            started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }

    fn find_projected<P: Projection>(
        &self,
        predicate: &Predicate<MemberField>,
    ) -> RepoResult<Vec<P>> {
        let statement = QueryPlan::new(&MEMBER_SOURCE, predicate)
            .joined()
            .select(P::COLUMNS);
        query_rows(self.conn, &statement, P::from_row)
    }

    fn find_usernames(&self) -> RepoResult<Vec<String>> {
        let statement = QueryPlan::new(&MEMBER_SOURCE, &Predicate::<MemberField>::all())
            .select("m.username AS username");
        query_rows(self.conn, &statement, |row| Ok(row.get("username")?))
    }

    fn find_member_dtos(&self) -> RepoResult<Vec<MemberDto>> {
        self.find_projected(&Predicate::all().is_not_null(MemberField::TeamId))
    }

    fn find_projection_page(
        &self,
        request: &PageRequest<MemberField>,
    ) -> RepoResult<Page<MemberProjection>> {
        fetch_page(
            self.conn,
            &MEMBER_SOURCE,
            &Predicate::all(),
            request,
            &projection_shape::<MemberProjection>(),
        )
    }

    fn find_with_team(
        &self,
        predicate: &Predicate<MemberField>,
        sort: &Sort<MemberField>,
    ) -> RepoResult<Vec<MemberWithTeam>> {
        let statement = QueryPlan::new(&MEMBER_SOURCE, predicate)
            .sorted(sort)
            .joined()
            .select(MEMBER_WITH_TEAM_COLUMNS);
        query_rows(self.conn, &statement, parse_member_with_team_row)
    }

    fn find_with_lock(
        &self,
        predicate: &Predicate<MemberField>,
        lock: LockMode,
    ) -> RepoResult<Vec<Member>> {
        if lock == LockMode::PessimisticWrite {
            acquire_write_lock(self.conn, &MEMBER_SOURCE, predicate, "updated_at")?;
        }
        self.select(predicate, &Sort::unsorted(), None)
    }

    fn bulk_update(
        &self,
        predicate: &Predicate<MemberField>,
        updates: &[UpdateExpr<MemberField>],
        sync: CacheSync,
    ) -> RepoResult<BulkUpdateResult> {
        let result =
            execute_bulk_update(self.conn, &MEMBER_SOURCE, predicate, updates, Some("updated_at"))?;

        match sync {
            CacheSync::Keep => {}
            CacheSync::EvictAffected => self.context.evict_all(&result.affected_ids),
            CacheSync::ClearAll => self.context.clear(),
        }

        info!(
            "event=bulk_update module=repo status=ok entity={} affected={} cache_sync={:?}",
            ENTITY, result.affected, sync
        );
        Ok(result)
    }

    fn bulk_age_plus(&self, min_age: i32) -> RepoResult<usize> {
        let result = self.bulk_update(
            &Predicate::all().ge(MemberField::Age, min_age),
            &[UpdateExpr::increment(MemberField::Age, 1)],
            CacheSync::ClearAll,
        )?;
        Ok(result.affected)
    }

    fn refresh(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let loaded = self.load(id)?;
        match &loaded {
            Some(member) => self.context.put(id, member.clone()),
            None => self.context.evict(id),
        }
        Ok(loaded)
    }

    fn detach(&self, id: MemberId) {
        self.context.evict(id);
    }

    fn clear_context(&self) {
        self.context.clear();
    }

    fn is_cached(&self, id: MemberId) -> bool {
        self.context.contains(id)
    }
}

fn named_member_queries() -> QueryDispatcher<MemberField> {
    QueryDispatcher::new()
        .register("findByUsername", username_equals)
        .register("findUser", username_and_age)
        .register("findByNames", username_in)
}

fn username_equals(args: &[QueryArg]) -> Result<Predicate<MemberField>, DeriveError> {
    expect_args(args, 1)?;
    Ok(Predicate::all().eq(MemberField::Username, value_arg(args, 0, "username")?))
}

fn username_and_age(args: &[QueryArg]) -> Result<Predicate<MemberField>, DeriveError> {
    expect_args(args, 2)?;
    Ok(Predicate::all()
        .eq(MemberField::Username, value_arg(args, 0, "username")?)
        .eq(MemberField::Age, value_arg(args, 1, "age")?))
}

fn username_in(args: &[QueryArg]) -> Result<Predicate<MemberField>, DeriveError> {
    expect_args(args, 1)?;
    Ok(Predicate::all().is_in(MemberField::Username, list_arg(args, 0)?))
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let id: MemberId = row.get("member_id")?;
    let raw_age: i64 = row.get("age")?;
    let age = i32::try_from(raw_age).map_err(|_| {
        RepoError::InvalidData(format!("age `{raw_age}` out of range in member.age"))
    })?;

    let member = Member {
        id: Some(id),
        username: row.get("username")?,
        age,
        team_id: row.get("team_id")?,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    };
    member
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("member {id}: {err}")))?;
    Ok(member)
}

fn parse_member_with_team_row(row: &Row<'_>) -> RepoResult<MemberWithTeam> {
    let member = parse_member_row(row)?;
    let team = match row.get::<_, Option<i64>>("joined_team_id")? {
        Some(team_id) => Some(Team {
            id: Some(team_id),
            name: row.get("team_name")?,
            members: Vec::new(),
        }),
        None => None,
    };
    Ok(MemberWithTeam { member, team })
}

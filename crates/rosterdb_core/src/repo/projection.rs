//! Row decoders for member read models.
//!
//! Every projection reads from `member m LEFT JOIN team t`, so each one can
//! be selected for any member predicate.

use super::error::RepoResult;
use super::store::RowShape;
use crate::model::projection::{
    MemberDto, MemberProjection, NestedProjection, TeamInfo, UsernameOnly, UsernameOnlyDto,
};
use rusqlite::Row;

/// A read model selected directly by column list.
pub trait Projection: Sized {
    const COLUMNS: &'static str;

    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

pub(crate) fn projection_shape<P: Projection>() -> RowShape<P> {
    RowShape {
        columns: P::COLUMNS,
        joined: true,
        decode: P::from_row,
    }
}

impl Projection for MemberDto {
    const COLUMNS: &'static str =
        "m.member_id AS member_id, m.username AS username, t.name AS team_name";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("member_id")?,
            username: row.get("username")?,
            team_name: row.get("team_name")?,
        })
    }
}

impl Projection for MemberProjection {
    const COLUMNS: &'static str =
        "m.member_id AS member_id, m.username AS username, t.name AS team_name";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("member_id")?,
            username: row.get("username")?,
            team_name: row.get("team_name")?,
        })
    }
}

impl Projection for UsernameOnly {
    const COLUMNS: &'static str = "m.username AS username, m.age AS age";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let username: String = row.get("username")?;
        let age: i64 = row.get("age")?;
        Ok(Self {
            username: format!("{username} {age}"),
        })
    }
}

impl Projection for UsernameOnlyDto {
    const COLUMNS: &'static str = "m.username AS username";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            username: row.get("username")?,
        })
    }
}

impl Projection for NestedProjection {
    const COLUMNS: &'static str = "m.username AS username, t.name AS team_name";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let team_name: Option<String> = row.get("team_name")?;
        Ok(Self {
            username: row.get("username")?,
            team: team_name.map(|name| TeamInfo { name }),
        })
    }
}

use rosterdb_core::db::{open_db_in_memory, open_db_with};
use rosterdb_core::{
    CrudRepository, DatabaseTarget, LockMode, Member, MemberField, MemberRepository, Predicate,
    RepoError, RosterConfig, SqliteMemberRepository,
};
use std::path::Path;

fn short_timeout_config(path: &Path) -> RosterConfig {
    RosterConfig {
        database: DatabaseTarget::File(path.to_path_buf()),
        busy_timeout_ms: 50,
        ..RosterConfig::default()
    }
}

#[test]
fn pessimistic_lock_requires_transaction() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    repo.save(&Member::with_age("member1", 10)).unwrap();

    let err = repo
        .find_with_lock(
            &Predicate::all().eq(MemberField::Username, "member1"),
            LockMode::PessimisticWrite,
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::TransactionRequired));

    let plain = repo
        .find_with_lock(
            &Predicate::all().eq(MemberField::Username, "member1"),
            LockMode::None,
        )
        .unwrap();
    assert_eq!(plain.len(), 1);
}

#[test]
fn pessimistic_lock_inside_transaction_returns_rows_unchanged() {
    let mut conn = open_db_in_memory().unwrap();
    let saved = {
        let repo = SqliteMemberRepository::try_new(&conn).unwrap();
        repo.save(&Member::with_age("member1", 10)).unwrap()
    };

    let tx = conn.transaction().unwrap();
    {
        let repo = SqliteMemberRepository::try_new(&tx).unwrap();
        let locked = repo
            .find_with_lock(
                &Predicate::all().eq(MemberField::Username, "member1"),
                LockMode::PessimisticWrite,
            )
            .unwrap();
        assert_eq!(locked, vec![saved]);
    }
    tx.commit().unwrap();
}

#[test]
fn locked_rows_block_writers_on_other_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locking.db");
    let config = short_timeout_config(&path);

    let mut conn_a = open_db_with(&config).unwrap();
    let conn_b = open_db_with(&config).unwrap();

    let saved = SqliteMemberRepository::try_new(&conn_a)
        .unwrap()
        .save(&Member::with_age("member1", 10))
        .unwrap();

    let tx = conn_a.transaction().unwrap();
    let repo_a = SqliteMemberRepository::try_new(&tx).unwrap();
    let locked = repo_a
        .find_with_lock(
            &Predicate::all().eq(MemberField::Username, "member1"),
            LockMode::PessimisticWrite,
        )
        .unwrap();
    assert_eq!(locked.len(), 1);

    let repo_b = SqliteMemberRepository::try_new(&conn_b).unwrap();
    assert_eq!(repo_b.count().unwrap(), 1);

    let mut changed = saved.clone();
    changed.age = 99;
    let err = repo_b.save(&changed).unwrap_err();
    assert!(matches!(err, RepoError::LockConflict(_)), "got {err}");

    drop(repo_a);
    tx.commit().unwrap();

    let saved_after_commit = repo_b.save(&changed).unwrap();
    assert_eq!(saved_after_commit.age, 99);
}

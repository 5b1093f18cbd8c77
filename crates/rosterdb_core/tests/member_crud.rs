use rosterdb_core::db::open_db_in_memory;
use rosterdb_core::{
    CrudRepository, Member, MemberRepository, ModelValidationError, RepoError,
    SqliteMemberRepository, SqliteTeamRepository, Team,
};

#[test]
fn save_then_find_by_id_returns_saved_member() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let saved = repo.save(&Member::with_age("memberA", 10)).unwrap();
    let id = saved.id.unwrap();

    assert_eq!(repo.find_by_id(id).unwrap(), Some(saved.clone()));
    assert_eq!(saved.username, "memberA");
    assert_eq!(saved.age, 10);
    assert!(saved.created_at.is_some());
    assert_eq!(saved.created_at, saved.updated_at);

    repo.clear_context();
    assert_eq!(repo.find_by_id(id).unwrap(), Some(saved));
}

#[test]
fn find_by_id_returns_none_for_absent_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    assert_eq!(repo.find_by_id(42).unwrap(), None);
    assert!(!repo.exists_by_id(42).unwrap());
}

#[test]
fn count_tracks_saves_and_deletes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let saved: Vec<Member> = (0..5)
        .map(|index| repo.save(&Member::with_age(format!("member{index}"), index)).unwrap())
        .collect();
    repo.delete(&saved[1]).unwrap();
    repo.delete_by_id(saved[3].id.unwrap()).unwrap();

    assert_eq!(repo.count().unwrap(), 3);
    assert!(repo.exists_by_id(saved[0].id.unwrap()).unwrap());
    assert!(!repo.exists_by_id(saved[1].id.unwrap()).unwrap());
    assert_eq!(repo.find_by_id(saved[1].id.unwrap()).unwrap(), None);
}

#[test]
fn find_all_returns_members_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    for name in ["charlie", "alice", "bob"] {
        repo.save(&Member::new(name)).unwrap();
    }

    let usernames: Vec<String> = repo
        .find_all()
        .unwrap()
        .into_iter()
        .map(|member| member.username)
        .collect();
    assert_eq!(usernames, vec!["charlie", "alice", "bob"]);
}

#[test]
fn save_existing_member_updates_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = repo.save(&Member::with_age("member1", 10)).unwrap();
    member.username = "member2".to_string();
    member.age = 11;
    let updated = repo.save(&member).unwrap();

    assert_eq!(updated.id, member.id);
    assert_eq!(updated.username, "member2");
    assert_eq!(updated.age, 11);
    assert_eq!(updated.created_at, member.created_at);
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn save_with_unknown_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::with_age("ghost", 1);
    member.id = Some(77);

    let err = repo.save(&member).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "member",
            id: Some(77)
        }
    ));
}

#[test]
fn delete_absent_member_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let err = repo.delete_by_id(999).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: Some(999), .. }));

    let err = repo.delete(&Member::new("never saved")).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: None, .. }));

    let saved = repo.save(&Member::new("member1")).unwrap();
    repo.delete(&saved).unwrap();
    let err = repo.delete(&saved).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));
}

#[test]
fn save_rejects_invalid_member_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let err = repo.save(&Member::new("   ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::BlankUsername)
    ));

    let err = repo.save(&Member::with_age("member1", -3)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::NegativeAge(-3))
    ));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn ids_are_never_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let first = repo.save(&Member::new("member1")).unwrap();
    repo.delete(&first).unwrap();
    let second = repo.save(&Member::new("member2")).unwrap();

    assert!(second.id.unwrap() > first.id.unwrap());
}

#[test]
fn member_with_unknown_team_violates_constraint() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::with_age("member1", 10);
    member.team_id = Some(404);

    let err = repo.save(&member).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
}

#[test]
fn change_team_persists_reference_and_back_reference() {
    let conn = open_db_in_memory().unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();

    let mut team_a = teams.save(&Team::new("teamA")).unwrap();
    let mut team_b = teams.save(&Team::new("teamB")).unwrap();
    let mut member = members
        .save(&Member::with_team("member1", 10, &mut team_a).unwrap())
        .unwrap();

    member.change_team(&mut team_b).unwrap();
    let moved = members.save(&member).unwrap();

    assert_eq!(moved.team_id, team_b.id);
    assert!(team_b.has_member(moved.id.unwrap()));
}

#[test]
fn persistence_context_tracks_loaded_members() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let id = repo.save(&Member::new("member1")).unwrap().id.unwrap();
    assert!(repo.is_cached(id));

    repo.detach(id);
    assert!(!repo.is_cached(id));

    repo.find_by_id(id).unwrap();
    assert!(repo.is_cached(id));

    repo.delete_by_id(id).unwrap();
    assert!(!repo.is_cached(id));
    assert_eq!(repo.refresh(id).unwrap(), None);
}

use rosterdb_core::db::open_db_in_memory;
use rosterdb_core::{
    CrudRepository, Member, ModelValidationError, Predicate, QueryRepository, RepoError,
    SqliteMemberRepository, SqliteTeamRepository, Team, TeamField, TeamRepository,
};

#[test]
fn save_and_find_team() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTeamRepository::try_new(&conn).unwrap();

    let saved = repo.save(&Team::new("teamA")).unwrap();
    let id = saved.id.unwrap();

    assert_eq!(repo.find_by_id(id).unwrap(), Some(saved));
    assert_eq!(repo.count().unwrap(), 1);
    assert!(repo.exists_by_id(id).unwrap());
}

#[test]
fn rename_and_delete_team() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTeamRepository::try_new(&conn).unwrap();

    let mut team = repo.save(&Team::new("teamA")).unwrap();
    team.name = "teamZ".to_string();
    repo.save(&team).unwrap();

    let found = repo
        .find_one(&Predicate::all().eq(TeamField::Name, "teamZ"))
        .unwrap()
        .unwrap();
    assert_eq!(found.id, team.id);

    repo.delete(&team).unwrap();
    assert_eq!(repo.count().unwrap(), 0);
    assert!(matches!(
        repo.delete(&team).unwrap_err(),
        RepoError::NotFound { entity: "team", .. }
    ));
}

#[test]
fn blank_team_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTeamRepository::try_new(&conn).unwrap();

    let err = repo.save(&Team::new(" ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::BlankTeamName)
    ));
}

#[test]
fn find_with_members_loads_member_ids() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut team_a = teams.save(&Team::new("teamA")).unwrap();
    let mut team_b = teams.save(&Team::new("teamB")).unwrap();
    let first = members
        .save(&Member::with_team("member1", 10, &mut team_a).unwrap())
        .unwrap();
    let second = members
        .save(&Member::with_team("member2", 20, &mut team_a).unwrap())
        .unwrap();
    members
        .save(&Member::with_team("member3", 30, &mut team_b).unwrap())
        .unwrap();

    let loaded = teams
        .find_with_members(team_a.id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(loaded.members, vec![first.id.unwrap(), second.id.unwrap()]);

    let plain = teams.find_by_id(team_a.id.unwrap()).unwrap().unwrap();
    assert!(plain.members.is_empty());

    assert_eq!(teams.find_with_members(999).unwrap(), None);
}

#[test]
fn deleting_team_with_members_violates_constraint() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut team = teams.save(&Team::new("teamA")).unwrap();
    let member = members
        .save(&Member::with_team("member1", 10, &mut team).unwrap())
        .unwrap();

    let err = teams.delete(&team).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert!(teams.exists_by_id(team.id.unwrap()).unwrap());

    members.delete(&member).unwrap();
    teams.delete(&team).unwrap();
    assert_eq!(teams.count().unwrap(), 0);
}

#[test]
fn member_cannot_join_unsaved_team() {
    let mut team = Team::new("teamA");
    let err = Member::with_team("member1", 10, &mut team).unwrap_err();
    assert_eq!(err, ModelValidationError::TeamNotPersisted);
}

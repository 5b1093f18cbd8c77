use rosterdb_core::db::open_db_in_memory;
use rosterdb_core::{
    CrudRepository, Direction, Member, MemberDto, MemberField, MemberRepository, PageRequest,
    Predicate, QueryRepository, RepoError, Sort, SqliteMemberRepository, SqliteTeamRepository,
    Team, TeamField,
};

fn seed_same_age(repo: &SqliteMemberRepository<'_>, count: usize) {
    for index in 1..=count {
        repo.save(&Member::with_age(format!("member{index}"), 10))
            .unwrap();
    }
}

#[test]
fn first_page_reports_totals() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed_same_age(&repo, 6);
    repo.save(&Member::with_age("other", 99)).unwrap();

    let request = PageRequest::sorted(0, 3, Sort::desc(MemberField::Username)).unwrap();
    let page = repo
        .find_page(&Predicate::all().eq(MemberField::Age, 10), &request)
        .unwrap();

    let usernames: Vec<&str> = page
        .content
        .iter()
        .map(|member| member.username.as_str())
        .collect();
    assert_eq!(usernames, vec!["member6", "member5", "member4"]);
    assert_eq!(page.number_of_elements(), 3);
    assert_eq!(page.total_elements, 6);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.number, 0);
    assert!(page.is_first);
    assert!(page.has_next);
}

#[test]
fn last_page_has_no_next() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed_same_age(&repo, 7);

    let request = PageRequest::sorted(2, 3, Sort::asc(MemberField::Id)).unwrap();
    let page = repo.find_page(&Predicate::all(), &request).unwrap();

    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].username, "member7");
    assert_eq!(page.total_elements, 7);
    assert_eq!(page.total_pages, 3);
    assert!(!page.is_first);
    assert!(!page.has_next);
    assert!(page.is_last);
}

#[test]
fn page_beyond_end_is_empty_but_counted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed_same_age(&repo, 4);

    let request = PageRequest::of(5, 3).unwrap();
    let page = repo.find_page(&Predicate::all(), &request).unwrap();

    assert!(page.content.is_empty());
    assert_eq!(page.total_elements, 4);
    assert_eq!(page.total_pages, 2);
    assert!(!page.has_next);
}

#[test]
fn invalid_page_requests_are_rejected() {
    assert!(matches!(
        PageRequest::<MemberField>::of(-1, 10),
        Err(RepoError::InvalidPage { page: -1, size: 10 })
    ));
    assert!(matches!(
        PageRequest::<MemberField>::sorted(0, 0, Sort::asc(MemberField::Username)),
        Err(RepoError::InvalidPage { page: 0, size: 0 })
    ));
}

#[test]
fn page_map_converts_content_to_dto() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed_same_age(&repo, 4);

    let request = PageRequest::sorted(0, 3, Sort::asc(MemberField::Username)).unwrap();
    let page = repo
        .find_page(&Predicate::all(), &request)
        .unwrap()
        .map(MemberDto::from);

    assert_eq!(page.content[0].username, "member1");
    assert_eq!(page.content[0].team_name, None);
    assert_eq!(page.total_elements, 4);

    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["content"][2]["username"], "member3");
}

#[test]
fn slice_probes_one_extra_row_without_count() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed_same_age(&repo, 5);

    let request = PageRequest::sorted(0, 3, Sort::by(MemberField::Id, Direction::Asc)).unwrap();
    let first = repo.find_slice(&Predicate::all(), &request).unwrap();
    assert_eq!(first.content.len(), 3);
    assert!(first.has_next);
    assert!(first.is_first);

    let second = repo.find_slice(&Predicate::all(), &request.next()).unwrap();
    assert_eq!(second.content.len(), 2);
    assert!(!second.has_next);
    assert_eq!(second.content[1].username, "member5");
}

#[test]
fn projection_page_includes_members_without_team() {
    let conn = open_db_in_memory().unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();

    let mut team = teams.save(&Team::new("teamA")).unwrap();
    members
        .save(&Member::with_team("m1", 10, &mut team).unwrap())
        .unwrap();
    members.save(&Member::with_age("m2", 20)).unwrap();
    members.save(&Member::with_age("m3", 30)).unwrap();

    let request = PageRequest::of(0, 2).unwrap();
    let page = members.find_projection_page(&request).unwrap();

    assert_eq!(page.total_elements, 3);
    assert_eq!(page.content[0].team_name.as_deref(), Some("teamA"));
    assert_eq!(page.content[1].team_name, None);
    assert!(page.has_next);
}

#[test]
fn team_pages_use_team_fields() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    for name in ["teamC", "teamA", "teamB"] {
        teams.save(&Team::new(name)).unwrap();
    }

    let request = PageRequest::sorted(0, 2, Sort::asc(TeamField::Name)).unwrap();
    let page = teams.find_page(&Predicate::all(), &request).unwrap();

    let names: Vec<&str> = page.content.iter().map(|team| team.name.as_str()).collect();
    assert_eq!(names, vec!["teamA", "teamB"]);
    assert_eq!(page.total_pages, 2);
}

use cfp_core::db::open_db_in_memory;
use cfp_core::repo::conference_repo::ConferenceRepository;
use cfp_core::service::MAX_PARENT_DEPTH;
use cfp_core::{
    Conference, ConferenceEdition, ConferenceService, ConferenceServiceError, DeleteMode,
    RepoError, SqliteConferenceRepository,
};
use chrono::NaiveDate;
use rusqlite::Connection;

type Service<'conn> = ConferenceService<SqliteConferenceRepository<'conn>>;

fn service(conn: &Connection) -> Service<'_> {
    ConferenceService::new(SqliteConferenceRepository::try_new(conn).unwrap())
}

fn child_of(service: &Service<'_>, name: &str, parent: Option<&Conference>) -> Conference {
    let mut conference = Conference::new(name);
    conference.parent_id = parent.map(|parent| parent.id);
    service.create_conference(&conference).unwrap()
}

#[test]
fn ancestors_are_listed_nearest_first() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let root = child_of(&service, "ICIS", None);
    let middle = child_of(&service, "ICIS Doctoral Consortium", Some(&root));
    let leaf = child_of(&service, "ICIS DC Workshop", Some(&middle));

    let names: Vec<String> = service
        .conference_ancestors(leaf.id)
        .unwrap()
        .into_iter()
        .map(|conference| conference.name)
        .collect();
    assert_eq!(names, vec!["ICIS Doctoral Consortium", "ICIS"]);
    assert!(service.conference_ancestors(root.id).unwrap().is_empty());
}

#[test]
fn reparenting_under_a_descendant_is_a_cycle() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let root = child_of(&service, "ECIS", None);
    let child = child_of(&service, "ECIS Workshops", Some(&root));

    let mut looped = root.clone();
    looped.parent_id = Some(child.id);
    assert!(matches!(
        service.update_conference(&looped),
        Err(ConferenceServiceError::CycleDetected { .. })
    ));

    let mut own_parent = root.clone();
    own_parent.parent_id = Some(root.id);
    assert!(matches!(
        service.update_conference(&own_parent),
        Err(ConferenceServiceError::CycleDetected { .. })
    ));
    assert_eq!(service.get_conference(root.id).unwrap().unwrap().parent_id, None);
}

#[test]
fn chains_deeper_than_the_bound_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let mut parent = child_of(&service, "level 0", None);
    for level in 1..=MAX_PARENT_DEPTH {
        parent = child_of(&service, &format!("level {level}"), Some(&parent));
    }

    let mut too_deep = Conference::new("one too many");
    too_deep.parent_id = Some(parent.id);
    assert!(matches!(
        service.create_conference(&too_deep),
        Err(ConferenceServiceError::ParentChainTooDeep { .. })
    ));
}

#[test]
fn unknown_parent_is_a_missing_reference() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let mut conference = Conference::new("Orphan");
    conference.parent_id = Some(uuid::Uuid::new_v4());

    assert!(matches!(
        service.create_conference(&conference),
        Err(ConferenceServiceError::Repo(RepoError::MissingReference {
            field: "parent",
            ..
        }))
    ));
}

#[test]
fn edition_parents_follow_the_same_rules() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let conference = child_of(&service, "HICSS", None);
    let day = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();

    let main = service
        .create_edition(&ConferenceEdition::new(conference.id, "HICSS-58", day, day, "US"))
        .unwrap();
    let mut track = ConferenceEdition::new(conference.id, "HICSS-58 Minitrack", day, day, "US");
    track.parent_id = Some(main.id);
    let track = service.create_edition(&track).unwrap();

    assert_eq!(
        service.edition_ancestors(track.id).unwrap(),
        vec![main.clone()]
    );

    let mut looped = main.clone();
    looped.parent_id = Some(track.id);
    assert!(matches!(
        service.update_edition(&looped),
        Err(ConferenceServiceError::CycleDetected { .. })
    ));

    service.delete_edition(main.id, DeleteMode::Restrict).unwrap();
    let orphaned = service.get_edition(track.id).unwrap().unwrap();
    assert_eq!(orphaned.parent_id, None);
}

fn chain(service: &Service<'_>, prefix: &str, len: usize) -> Vec<Conference> {
    let mut levels: Vec<Conference> = Vec::new();
    for level in 0..len {
        let conference = child_of(service, &format!("{prefix} {level}"), levels.last());
        levels.push(conference);
    }
    levels
}

#[test]
fn reparenting_counts_the_moved_subtree() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let upper = chain(&service, "upper", 20);
    let lower = chain(&service, "lower", 20);

    let mut moved = lower[0].clone();
    moved.parent_id = Some(upper[19].id);
    assert!(matches!(
        service.update_conference(&moved),
        Err(ConferenceServiceError::ParentChainTooDeep { .. })
    ));
    assert_eq!(service.get_conference(moved.id).unwrap().unwrap().parent_id, None);
    assert_eq!(service.conference_ancestors(lower[19].id).unwrap().len(), 19);

    let mut fits = lower[0].clone();
    fits.parent_id = Some(upper[12].id);
    service.update_conference(&fits).unwrap();
    assert_eq!(
        service.conference_ancestors(lower[19].id).unwrap().len(),
        MAX_PARENT_DEPTH
    );
}

#[test]
fn edition_reparenting_counts_the_moved_subtree() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let conference = child_of(&service, "AMCIS", None);
    let day = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();

    let mut editions: Vec<ConferenceEdition> = Vec::new();
    for level in 0..=MAX_PARENT_DEPTH {
        let mut edition =
            ConferenceEdition::new(conference.id, &format!("AMCIS track {level}"), day, day, "US");
        edition.parent_id = editions.last().map(|parent| parent.id);
        editions.push(service.create_edition(&edition).unwrap());
    }
    let head = service
        .create_edition(&ConferenceEdition::new(conference.id, "AMCIS 2025", day, day, "US"))
        .unwrap();

    let mut moved = editions[0].clone();
    moved.parent_id = Some(head.id);
    assert!(matches!(
        service.update_edition(&moved),
        Err(ConferenceServiceError::ParentChainTooDeep { .. })
    ));
    assert_eq!(service.get_edition(moved.id).unwrap().unwrap().parent_id, None);
}

#[test]
fn repository_writes_check_parent_chains() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteConferenceRepository::try_new(&conn).unwrap();
    let root = Conference::new("PACIS");
    repo.create_conference(&root).unwrap();
    let mut child = Conference::new("PACIS Workshops");
    child.parent_id = Some(root.id);
    repo.create_conference(&child).unwrap();

    let mut looped = root.clone();
    looped.parent_id = Some(child.id);
    assert!(matches!(
        repo.update_conference(&looped),
        Err(RepoError::ParentCycle { .. })
    ));
    assert_eq!(repo.get_conference(root.id).unwrap().unwrap().parent_id, None);
}

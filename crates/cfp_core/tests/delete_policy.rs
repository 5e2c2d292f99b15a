use cfp_core::db::open_db_in_memory;
use cfp_core::{
    Book, BookPublisher, Call, CallKind, CallService, CallTarget, CallType, Deadline,
    DeadlineType, DeleteMode, InboundMessage, MailingList, MailingListService,
    PublicationService, RepoError, SqliteBookRepository, SqliteCallRepository,
    SqliteDeadlineRepository, SqliteJournalRepository, SqliteMailingListRepository,
    SqliteUniversityRepository, University, UniversityDivision, UniversityService,
};
use chrono::NaiveDate;
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn call_service(
    conn: &Connection,
) -> CallService<SqliteCallRepository<'_>, SqliteDeadlineRepository<'_>> {
    CallService::new(
        SqliteCallRepository::try_new(conn).unwrap(),
        SqliteDeadlineRepository::try_new(conn).unwrap(),
    )
}

/// University -> division -> call -> deadline + mailing list message.
fn seed_university(conn: &Connection) -> University {
    let universities = UniversityService::new(SqliteUniversityRepository::try_new(conn).unwrap());
    let university = universities
        .create_university(&University::new("University of Mannheim", "DE"))
        .unwrap();
    let division = universities
        .create_division(&UniversityDivision::new(
            university.id,
            "Chair of Enterprise Systems",
            "Business School",
        ))
        .unwrap();

    let calls = call_service(conn);
    let call_type = calls
        .create_call_type(&CallType::new("Position", CallKind::UniversityDivision))
        .unwrap();
    let call = calls
        .create_call(&Call::new(
            "PhD position",
            call_type.id,
            CallTarget::university_division(division.id),
        ))
        .unwrap();
    let deadline_type = calls
        .create_deadline_type(&DeadlineType::new("Application"))
        .unwrap();
    let mut deadline = Deadline::new(
        call.id,
        deadline_type.id,
        NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
    );
    deadline.mandatory = true;
    calls.create_deadline(&deadline).unwrap();

    let lists = MailingListService::new(SqliteMailingListRepository::try_new(conn).unwrap());
    let list = lists
        .create_mailing_list(&MailingList::new("AIS World"))
        .unwrap();
    let inbound = InboundMessage::from_raw(
        list.id,
        call.id,
        "Subject: PhD position in Mannheim\nMessage-ID: <phd-1@aisworld>\n",
        "Apply now",
    )
    .unwrap();
    lists.ingest_message(inbound).unwrap();

    university
}

#[test]
fn restricted_university_delete_keeps_everything() {
    let conn = setup();
    let university = seed_university(&conn);
    let service = UniversityService::new(SqliteUniversityRepository::try_new(&conn).unwrap());

    match service
        .delete_university(university.id, DeleteMode::Restrict)
        .unwrap_err()
    {
        RepoError::HasDependents {
            id,
            dependent_table,
            count,
            ..
        } => {
            assert_eq!(id, university.id);
            assert_eq!(dependent_table, "university_divisions");
            assert_eq!(count, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(count(&conn, "universities"), 1);
    assert_eq!(count(&conn, "university_divisions"), 1);
    assert_eq!(count(&conn, "calls"), 1);
    assert_eq!(count(&conn, "deadlines"), 1);
}

#[test]
fn cascading_university_delete_removes_the_whole_chain() {
    let conn = setup();
    let university = seed_university(&conn);
    let service = UniversityService::new(SqliteUniversityRepository::try_new(&conn).unwrap());

    service
        .delete_university(university.id, DeleteMode::Cascade)
        .unwrap();

    assert_eq!(count(&conn, "universities"), 0);
    assert_eq!(count(&conn, "university_divisions"), 0);
    assert_eq!(count(&conn, "calls"), 0);
    assert_eq!(count(&conn, "deadlines"), 0);
    assert_eq!(count(&conn, "mailing_list_messages"), 0);
    assert_eq!(count(&conn, "mailing_lists"), 1);
    assert_eq!(count(&conn, "call_types"), 1);
    assert_eq!(count(&conn, "deadline_types"), 1);
}

#[test]
fn division_with_calls_is_restricted() {
    let conn = setup();
    seed_university(&conn);
    let service = UniversityService::new(SqliteUniversityRepository::try_new(&conn).unwrap());
    let division = service.list_divisions(None).unwrap().remove(0);

    assert!(matches!(
        service.delete_division(division.id, DeleteMode::Restrict),
        Err(RepoError::HasDependents {
            dependent_table: "calls",
            ..
        })
    ));
}

#[test]
fn call_delete_is_restricted_by_messages_too() {
    let conn = setup();
    seed_university(&conn);
    let calls = call_service(&conn);
    let call = calls.list_calls().unwrap().remove(0);
    let deadline = calls.list_deadlines_for_call(call.id).unwrap().remove(0);
    calls.delete_deadline(deadline.id).unwrap();

    assert!(matches!(
        calls.delete_call(call.id, DeleteMode::Restrict),
        Err(RepoError::HasDependents {
            dependent_table: "mailing_list_messages",
            ..
        })
    ));
}

#[test]
fn publisher_cascade_removes_books_and_their_calls() {
    let conn = setup();
    let publications = PublicationService::new(
        SqliteJournalRepository::try_new(&conn).unwrap(),
        SqliteBookRepository::try_new(&conn).unwrap(),
    );
    let publisher = publications
        .create_publisher(&BookPublisher::new("Springer"))
        .unwrap();
    let book = publications
        .create_book(&Book::new(publisher.id, "Handbook of Information Systems"))
        .unwrap();
    let calls = call_service(&conn);
    let call_type = calls
        .create_call_type(&CallType::new("Chapter", CallKind::Book))
        .unwrap();
    calls
        .create_call(&Call::new(
            "Call for chapters",
            call_type.id,
            CallTarget::book(book.id),
        ))
        .unwrap();

    assert!(matches!(
        publications.delete_publisher(publisher.id, DeleteMode::Restrict),
        Err(RepoError::HasDependents {
            dependent_table: "books",
            ..
        })
    ));
    assert!(matches!(
        publications.delete_book(book.id, DeleteMode::Restrict),
        Err(RepoError::HasDependents {
            dependent_table: "calls",
            ..
        })
    ));

    publications
        .delete_publisher(publisher.id, DeleteMode::Cascade)
        .unwrap();
    assert_eq!(count(&conn, "books"), 0);
    assert_eq!(count(&conn, "calls"), 0);
}

#[test]
fn deleting_missing_rows_is_not_found() {
    let conn = setup();
    let service = UniversityService::new(SqliteUniversityRepository::try_new(&conn).unwrap());
    let id = uuid::Uuid::new_v4();

    assert!(matches!(
        service.delete_university(id, DeleteMode::Cascade),
        Err(RepoError::NotFound {
            entity: "university",
            ..
        })
    ));
}

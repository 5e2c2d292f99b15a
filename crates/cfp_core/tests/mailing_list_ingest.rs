use cfp_core::db::open_db_in_memory;
use cfp_core::{
    Call, CallKind, CallService, CallTarget, CallType, DeleteMode, InboundMessage, IngestOutcome,
    Journal, MailingList, MailingListService, PublicationService, RepoError,
    SqliteBookRepository, SqliteCallRepository, SqliteDeadlineRepository,
    SqliteJournalRepository, SqliteMailingListRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

const HEADERS: &str = "From: Editors <editors@jais.example>\n\
Subject: [JAIS] Special issue on platforms\n\
Message-ID: <si-2024@jais.example>\n";

fn seed_call(conn: &Connection) -> Call {
    let journal = PublicationService::new(
        SqliteJournalRepository::try_new(conn).unwrap(),
        SqliteBookRepository::try_new(conn).unwrap(),
    )
    .create_journal(&Journal::new("Journal of the AIS"))
    .unwrap();
    let calls = CallService::new(
        SqliteCallRepository::try_new(conn).unwrap(),
        SqliteDeadlineRepository::try_new(conn).unwrap(),
    );
    let call_type = calls
        .create_call_type(&CallType::new("Special issue", CallKind::Journal))
        .unwrap();
    calls
        .create_call(&Call::new(
            "Special issue on platforms",
            call_type.id,
            CallTarget::journal(journal.id),
        ))
        .unwrap()
}

fn seed_list(service: &MailingListService<SqliteMailingListRepository<'_>>) -> MailingList {
    let mut list = MailingList::new("AIS World");
    list.acronym = "AISWorld".to_string();
    service.create_mailing_list(&list).unwrap()
}

#[test]
fn same_message_id_is_stored_once() {
    let conn = open_db_in_memory().unwrap();
    let call = seed_call(&conn);
    let service = MailingListService::new(SqliteMailingListRepository::try_new(&conn).unwrap());
    let list = seed_list(&service);

    let first = service
        .ingest_message(InboundMessage::from_raw(list.id, call.id, HEADERS, "body").unwrap())
        .unwrap();
    let second = service
        .ingest_message(InboundMessage::from_raw(list.id, call.id, HEADERS, "resent").unwrap())
        .unwrap();

    let IngestOutcome::Created(created) = &first else {
        panic!("first ingest must create: {first:?}");
    };
    assert!(second.is_duplicate());
    assert_eq!(second.message(), created);
    assert_eq!(created.message, "body");
    assert_eq!(service.list_messages(Some(call.id)).unwrap().len(), 1);
}

#[test]
fn same_message_id_on_another_list_is_a_new_message() {
    let conn = open_db_in_memory().unwrap();
    let call = seed_call(&conn);
    let service = MailingListService::new(SqliteMailingListRepository::try_new(&conn).unwrap());
    let first_list = seed_list(&service);
    let second_list = service
        .create_mailing_list(&MailingList::new("SIGSAND"))
        .unwrap();

    for list_id in [first_list.id, second_list.id] {
        let outcome = service
            .ingest_message(InboundMessage::from_raw(list_id, call.id, HEADERS, "").unwrap())
            .unwrap();
        assert!(!outcome.is_duplicate());
    }
    assert_eq!(service.list_messages(None).unwrap().len(), 2);
}

#[test]
fn ingest_checks_list_and_call() {
    let conn = open_db_in_memory().unwrap();
    let call = seed_call(&conn);
    let service = MailingListService::new(SqliteMailingListRepository::try_new(&conn).unwrap());
    let list = seed_list(&service);

    let unknown_list = InboundMessage::from_raw(Uuid::new_v4(), call.id, HEADERS, "").unwrap();
    assert!(matches!(
        service.ingest_message(unknown_list),
        Err(RepoError::MissingReference {
            field: "mailing_list",
            ..
        })
    ));

    let unknown_call = InboundMessage::from_raw(list.id, Uuid::new_v4(), HEADERS, "").unwrap();
    assert!(matches!(
        service.ingest_message(unknown_call),
        Err(RepoError::MissingReference { field: "call", .. })
    ));
}

#[test]
fn message_label_and_timestamp_survive_updates() {
    let conn = open_db_in_memory().unwrap();
    let call = seed_call(&conn);
    let service = MailingListService::new(SqliteMailingListRepository::try_new(&conn).unwrap());
    let list = seed_list(&service);

    let stored = service
        .ingest_message(InboundMessage::from_raw(list.id, call.id, HEADERS, "").unwrap())
        .unwrap()
        .message()
        .clone();
    assert!(stored.timestamp > 0);
    assert_eq!(
        service.message_label(stored.id).unwrap().as_deref(),
        Some("[AISWorld] [JAIS] Special issue on platforms")
    );

    let mut edited = stored.clone();
    edited.subject = "Special issue on platforms (extended)".to_string();
    edited.timestamp = 1;
    let updated = service.update_message(&edited).unwrap();
    assert_eq!(updated.subject, "Special issue on platforms (extended)");
    assert_eq!(updated.timestamp, stored.timestamp);

    let err = conn
        .execute(
            "UPDATE mailing_list_messages SET timestamp = 1 WHERE id = ?1;",
            [stored.id.to_string()],
        )
        .unwrap_err();
    assert!(err.to_string().contains("immutable"));
}

#[test]
fn mailing_list_delete_policy_covers_messages() {
    let conn = open_db_in_memory().unwrap();
    let call = seed_call(&conn);
    let service = MailingListService::new(SqliteMailingListRepository::try_new(&conn).unwrap());
    let list = seed_list(&service);
    service
        .ingest_message(InboundMessage::from_raw(list.id, call.id, HEADERS, "").unwrap())
        .unwrap();

    assert!(matches!(
        service.delete_mailing_list(list.id, DeleteMode::Restrict),
        Err(RepoError::HasDependents {
            dependent_table: "mailing_list_messages",
            ..
        })
    ));
    service
        .delete_mailing_list(list.id, DeleteMode::Cascade)
        .unwrap();
    assert!(service.list_messages(None).unwrap().is_empty());
    assert!(service.list_mailing_lists().unwrap().is_empty());
}

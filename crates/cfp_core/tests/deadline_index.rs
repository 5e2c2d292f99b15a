use cfp_core::db::open_db_in_memory;
use cfp_core::{
    deadline_index_service, Book, BookPublisher, Call, CallKind, CallService, CallTarget,
    CallType, Conference, ConferenceEdition, ConferenceService, Deadline, DeadlineType, Journal,
    PublicationService, SqliteBookRepository, SqliteCallRepository, SqliteConferenceRepository,
    SqliteDeadlineRepository, SqliteJournalRepository, SqliteUniversityRepository, University,
    UniversityDivision, UniversityService,
};
use chrono::NaiveDate;
use rusqlite::Connection;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Fixture {
    conn: Connection,
}

impl Fixture {
    fn new() -> Self {
        Self {
            conn: open_db_in_memory().unwrap(),
        }
    }

    fn calls(&self) -> CallService<SqliteCallRepository<'_>, SqliteDeadlineRepository<'_>> {
        CallService::new(
            SqliteCallRepository::try_new(&self.conn).unwrap(),
            SqliteDeadlineRepository::try_new(&self.conn).unwrap(),
        )
    }

    fn edition_call(&self, edition_name: &str) -> Call {
        let conferences =
            ConferenceService::new(SqliteConferenceRepository::try_new(&self.conn).unwrap());
        let conference = conferences
            .create_conference(&Conference::new("ICIS"))
            .unwrap();
        let edition = conferences
            .create_edition(&ConferenceEdition::new(
                conference.id,
                edition_name,
                date(2024, 12, 15),
                date(2024, 12, 18),
                "TH",
            ))
            .unwrap();
        let call_type = self
            .calls()
            .create_call_type(&CallType::new("Full paper", CallKind::ConferenceEdition))
            .unwrap();
        let mut call = Call::new(
            "Call for papers",
            call_type.id,
            CallTarget::conference_edition(edition.id),
        );
        call.url = "https://icis2024.aisconferences.org/cfp".to_string();
        self.calls().create_call(&call).unwrap()
    }

    fn journal_call(&self) -> Call {
        let publications = PublicationService::new(
            SqliteJournalRepository::try_new(&self.conn).unwrap(),
            SqliteBookRepository::try_new(&self.conn).unwrap(),
        );
        let mut journal = Journal::new("Journal of the AIS");
        journal.acronym = "JAIS".to_string();
        let journal = publications.create_journal(&journal).unwrap();
        let call_type = self
            .calls()
            .create_call_type(&CallType::new("Special issue", CallKind::Journal))
            .unwrap();
        self.calls()
            .create_call(&Call::new(
                "Special issue on platforms",
                call_type.id,
                CallTarget::journal(journal.id),
            ))
            .unwrap()
    }

    fn book_call(&self) -> Call {
        let publications = PublicationService::new(
            SqliteJournalRepository::try_new(&self.conn).unwrap(),
            SqliteBookRepository::try_new(&self.conn).unwrap(),
        );
        let publisher = publications
            .create_publisher(&BookPublisher::new("Springer"))
            .unwrap();
        let book = publications
            .create_book(&Book::new(publisher.id, "Digital Platforms Handbook"))
            .unwrap();
        let call_type = self
            .calls()
            .create_call_type(&CallType::new("Chapter proposal", CallKind::Book))
            .unwrap();
        self.calls()
            .create_call(&Call::new(
                "Call for chapters",
                call_type.id,
                CallTarget::book(book.id),
            ))
            .unwrap()
    }

    fn division_call(&self) -> Call {
        let universities =
            UniversityService::new(SqliteUniversityRepository::try_new(&self.conn).unwrap());
        let university = universities
            .create_university(&University::new("University of Cologne", "DE"))
            .unwrap();
        let division = universities
            .create_division(&UniversityDivision::new(
                university.id,
                "Chair of Information Systems",
                "Faculty of Management",
            ))
            .unwrap();
        let call_type = self
            .calls()
            .create_call_type(&CallType::new("PhD position", CallKind::UniversityDivision))
            .unwrap();
        self.calls()
            .create_call(&Call::new(
                "Doctoral researcher",
                call_type.id,
                CallTarget::university_division(division.id),
            ))
            .unwrap()
    }

    fn deadline_type(&self, name: &str) -> DeadlineType {
        self.calls()
            .create_deadline_type(&DeadlineType::new(name))
            .unwrap()
    }

    fn deadline(
        &self,
        call: &Call,
        deadline_type: &DeadlineType,
        on: NaiveDate,
        mandatory: bool,
    ) -> Deadline {
        let mut deadline = Deadline::new(call.id, deadline_type.id, on);
        deadline.mandatory = mandatory;
        self.calls().create_deadline(&deadline).unwrap().deadline
    }
}

#[test]
fn empty_catalog_yields_empty_index() {
    let fixture = Fixture::new();
    let index = deadline_index_service(&fixture.conn)
        .unwrap()
        .index()
        .unwrap();
    assert!(index.is_empty());
    assert!(index.editions.is_empty());
    assert!(index.divisions.is_empty());
}

#[test]
fn editions_list_only_mandatory_deadlines_latest_first() {
    let fixture = Fixture::new();
    let call = fixture.edition_call("ICIS 2024");
    let submission = fixture.deadline_type("Submission");

    fixture.deadline(&call, &submission, date(2024, 1, 10), true);
    fixture.deadline(&call, &submission, date(2024, 3, 1), true);
    fixture.deadline(&call, &submission, date(2024, 2, 1), false);

    let editions = deadline_index_service(&fixture.conn)
        .unwrap()
        .list_mandatory_deadlines(CallKind::ConferenceEdition)
        .unwrap();
    let dates: Vec<NaiveDate> = editions
        .iter()
        .map(|listing| listing.deadline.date)
        .collect();
    assert_eq!(dates, vec![date(2024, 3, 1), date(2024, 1, 10)]);
}

#[test]
fn index_groups_by_target_kind_with_labels() {
    let fixture = Fixture::new();
    let edition_call = fixture.edition_call("ICIS 2024");
    let journal_call = fixture.journal_call();
    let submission = fixture.deadline_type("Submission");

    fixture.deadline(&edition_call, &submission, date(2024, 5, 1), true);
    let mut extended = Deadline::new(journal_call.id, submission.id, date(2024, 6, 1));
    extended.mandatory = true;
    extended.extension = Some(date(2024, 6, 30));
    fixture.calls().create_deadline(&extended).unwrap();

    let index = deadline_index_service(&fixture.conn)
        .unwrap()
        .index()
        .unwrap();

    assert_eq!(index.editions.len(), 1);
    assert_eq!(index.journals.len(), 1);
    assert!(index.books.is_empty());
    assert!(index.divisions.is_empty());

    let edition = &index.editions[0];
    assert_eq!(edition.label, "2024-05-01 - Submission");
    assert_eq!(edition.target_label, "ICIS 2024");
    assert_eq!(edition.call_title, "Call for papers");
    assert_eq!(edition.call_url, "https://icis2024.aisconferences.org/cfp");
    assert_eq!(edition.call_id, edition_call.id);

    let journal = &index.journals[0];
    assert_eq!(journal.label, "2024-06-30 - Submission (extended)");
    assert_eq!(journal.target_label, "Journal of the AIS (JAIS)");
    assert_eq!(journal.target, journal_call.target);
    assert_eq!(index.for_kind(CallKind::Journal), &index.journals[..]);
}

#[test]
fn book_and_division_groups_hold_their_own_mandatory_rows() {
    let fixture = Fixture::new();
    let book_call = fixture.book_call();
    let division_call = fixture.division_call();
    let submission = fixture.deadline_type("Submission");
    let notification = fixture.deadline_type("Notification");

    fixture.deadline(&book_call, &submission, date(2024, 9, 1), true);
    fixture.deadline(&book_call, &notification, date(2024, 11, 1), true);
    fixture.deadline(&book_call, &notification, date(2024, 12, 1), false);
    fixture.deadline(&division_call, &submission, date(2024, 7, 15), true);
    fixture.deadline(&division_call, &notification, date(2024, 8, 15), false);

    let index = deadline_index_service(&fixture.conn)
        .unwrap()
        .index()
        .unwrap();
    assert!(index.editions.is_empty());
    assert!(index.journals.is_empty());

    let book_dates: Vec<NaiveDate> = index
        .books
        .iter()
        .map(|listing| listing.deadline.date)
        .collect();
    assert_eq!(book_dates, vec![date(2024, 11, 1), date(2024, 9, 1)]);
    assert!(index.books.iter().all(|listing| listing.call_id == book_call.id));
    assert!(index
        .books
        .iter()
        .all(|listing| listing.target_label == "Digital Platforms Handbook"));
    assert_eq!(index.books[0].label, "2024-11-01 - Notification");

    assert_eq!(index.divisions.len(), 1);
    let division = &index.divisions[0];
    assert_eq!(division.deadline.date, date(2024, 7, 15));
    assert_eq!(division.call_id, division_call.id);
    assert_eq!(division.call_title, "Doctoral researcher");
    assert_eq!(division.target_label, "Chair of Information Systems");
    assert_eq!(
        index.for_kind(CallKind::UniversityDivision),
        &index.divisions[..]
    );
}

#[test]
fn index_serializes_for_the_cli() {
    let fixture = Fixture::new();
    let call = fixture.edition_call("ECIS 2025");
    let submission = fixture.deadline_type("Submission");
    fixture.deadline(&call, &submission, date(2025, 1, 5), true);

    let index = deadline_index_service(&fixture.conn)
        .unwrap()
        .index()
        .unwrap();
    let json = serde_json::to_value(&index).unwrap();

    assert_eq!(json["editions"][0]["deadline"]["date"], "2025-01-05");
    assert_eq!(json["editions"][0]["target"]["kind"], "conference_edition");
    assert_eq!(json["journals"], serde_json::json!([]));
}

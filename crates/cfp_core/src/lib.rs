//! Core of the call-for-papers catalog.
//! Owns the schema, the admin services and the mandatory-deadline index.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::book::{Book, BookId, BookPublisher, BookPublisherId};
pub use model::call::{Call, CallId, CallKind, CallTarget, CallType, CallTypeId};
pub use model::conference::{
    Conference, ConferenceEdition, ConferenceEditionId, ConferenceId, Sponsor, SponsorId,
};
pub use model::deadline::{Deadline, DeadlineId, DeadlineType, DeadlineTypeId, ValidationWarning};
pub use model::journal::{Journal, JournalId};
pub use model::mailing_list::{
    MailingList, MailingListId, MailingListMessage, MailingListMessageId,
};
pub use model::university::{
    University, UniversityDivision, UniversityDivisionId, UniversityId,
};
pub use model::validation::ValidationError;
pub use repo::book_repo::SqliteBookRepository;
pub use repo::call_repo::{SqliteCallRepository, TargetChoice};
pub use repo::common::{DeleteMode, RepoError, RepoResult};
pub use repo::conference_repo::SqliteConferenceRepository;
pub use repo::deadline_repo::SqliteDeadlineRepository;
pub use repo::journal_repo::SqliteJournalRepository;
pub use repo::mailing_list_repo::SqliteMailingListRepository;
pub use repo::university_repo::SqliteUniversityRepository;
pub use service::call_service::{CallService, DeadlineWrite};
pub use service::conference_service::{ConferenceService, ConferenceServiceError};
pub use service::deadline_index::{DeadlineIndex, DeadlineIndexService, DeadlineListing};
pub use service::mailing_list_service::{InboundMessage, IngestOutcome, MailingListService};
pub use service::publication_service::PublicationService;
pub use service::university_service::UniversityService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Wires the index service over one connection.
pub fn deadline_index_service(
    conn: &rusqlite::Connection,
) -> RepoResult<DeadlineIndexService<SqliteDeadlineRepository<'_>, SqliteCallRepository<'_>>> {
    Ok(DeadlineIndexService::new(
        SqliteDeadlineRepository::try_new(conn)?,
        SqliteCallRepository::try_new(conn)?,
    ))
}

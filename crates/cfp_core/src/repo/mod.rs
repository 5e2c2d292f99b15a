//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per catalog area.
//! - Keep SQL, reference checks and delete policy inside the persistence
//!   boundary.
//!
//! # Invariants
//! - Write paths call the record's `validate()` before SQL mutations.
//! - Mandatory references are checked before insert/update and reported as
//!   `MissingReference` naming the field.
//! - Deletes honor `DeleteMode`: `Restrict` rejects rows with dependents,
//!   `Cascade` removes dependents in the same transaction.

pub mod book_repo;
pub mod call_repo;
pub mod common;
pub mod conference_repo;
pub mod deadline_repo;
pub mod journal_repo;
pub mod mailing_list_repo;
pub mod university_repo;

//! Journal repository contracts and SQLite implementation.

use crate::model::call::CallTarget;
use crate::model::journal::{Journal, JournalId};
use crate::repo::call_repo::release_target_calls_in;
use crate::repo::common::{
    bool_to_int, delete_row, ensure_connection_ready, parse_bool, parse_uuid, require_existing,
    DeleteMode, RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const JOURNAL_SELECT_SQL: &str = "SELECT
    id,
    title,
    acronym,
    website,
    description,
    basket
FROM journals";

/// Repository interface for journals.
pub trait JournalRepository {
    fn create_journal(&self, journal: &Journal) -> RepoResult<JournalId>;
    fn update_journal(&self, journal: &Journal) -> RepoResult<()>;
    fn get_journal(&self, id: JournalId) -> RepoResult<Option<Journal>>;
    fn list_journals(&self) -> RepoResult<Vec<Journal>>;
    fn delete_journal(&self, id: JournalId, mode: DeleteMode) -> RepoResult<()>;
}

/// SQLite-backed journal repository.
pub struct SqliteJournalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJournalRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[(
                "journals",
                &["id", "title", "acronym", "website", "description", "basket"],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn create_journal(&self, journal: &Journal) -> RepoResult<JournalId> {
        journal.validate()?;
        self.conn.execute(
            "INSERT INTO journals (id, title, acronym, website, description, basket)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                journal.id.to_string(),
                journal.title.as_str(),
                journal.acronym.as_str(),
                journal.website.as_str(),
                journal.description.as_str(),
                bool_to_int(journal.basket),
            ],
        )?;
        Ok(journal.id)
    }

    fn update_journal(&self, journal: &Journal) -> RepoResult<()> {
        journal.validate()?;
        require_existing(self.conn, "journals", "journal", journal.id)?;
        self.conn.execute(
            "UPDATE journals
             SET title = ?2, acronym = ?3, website = ?4, description = ?5, basket = ?6
             WHERE id = ?1;",
            params![
                journal.id.to_string(),
                journal.title.as_str(),
                journal.acronym.as_str(),
                journal.website.as_str(),
                journal.description.as_str(),
                bool_to_int(journal.basket),
            ],
        )?;
        Ok(())
    }

    fn get_journal(&self, id: JournalId) -> RepoResult<Option<Journal>> {
        get_journal_in(self.conn, id)
    }

    fn list_journals(&self) -> RepoResult<Vec<Journal>> {
        list_journals_in(self.conn)
    }

    fn delete_journal(&self, id: JournalId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "journals", "journal", id)?;
        release_target_calls_in(&tx, "journal", CallTarget::journal(id), mode)?;
        delete_row(&tx, "journals", "journal", id)?;
        tx.commit()?;
        Ok(())
    }
}

pub(crate) fn get_journal_in(conn: &Connection, id: JournalId) -> RepoResult<Option<Journal>> {
    let mut stmt = conn.prepare(&format!("{JOURNAL_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_journal_row(row)?));
    }
    Ok(None)
}

pub(crate) fn list_journals_in(conn: &Connection) -> RepoResult<Vec<Journal>> {
    let mut stmt = conn.prepare(&format!(
        "{JOURNAL_SELECT_SQL} ORDER BY title COLLATE NOCASE ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut journals = Vec::new();
    while let Some(row) = rows.next()? {
        journals.push(parse_journal_row(row)?);
    }
    Ok(journals)
}

fn parse_journal_row(row: &Row<'_>) -> RepoResult<Journal> {
    let id: String = row.get("id")?;
    Ok(Journal {
        id: parse_uuid(&id, "journals.id")?,
        title: row.get("title")?,
        acronym: row.get("acronym")?,
        website: row.get("website")?,
        description: row.get("description")?,
        basket: parse_bool(row.get("basket")?, "journals.basket")?,
    })
}

//! Mailing list and mailing list message repository.
//!
//! # Invariants
//! - `timestamp` is written by SQLite on insert and never updated.
//! - At most one message exists per `(mailing_list_id, external_message_id)`.

use crate::model::call::CallId;
use crate::model::mailing_list::{
    MailingList, MailingListId, MailingListMessage, MailingListMessageId,
};
use crate::repo::common::{
    delete_row, ensure_connection_ready, ensure_no_dependents, parse_uuid, require_existing,
    require_reference, DeleteMode, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const MAILING_LIST_SELECT_SQL: &str = "SELECT id, name, acronym, topic, website FROM mailing_lists";

const MESSAGE_SELECT_SQL: &str = "SELECT
    id,
    mailing_list_id,
    call_id,
    subject,
    sender,
    headers,
    message,
    timestamp,
    external_message_id
FROM mailing_list_messages";

/// Result of an idempotent message insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageInsert {
    /// The message was stored; carries the row as persisted.
    Inserted(MailingListMessage),
    /// A message with the same list and external id already existed.
    AlreadyPresent(MailingListMessage),
}

/// Repository interface for mailing lists and their messages.
pub trait MailingListRepository {
    fn create_mailing_list(&self, mailing_list: &MailingList) -> RepoResult<MailingListId>;
    fn update_mailing_list(&self, mailing_list: &MailingList) -> RepoResult<()>;
    fn get_mailing_list(&self, id: MailingListId) -> RepoResult<Option<MailingList>>;
    fn list_mailing_lists(&self) -> RepoResult<Vec<MailingList>>;
    fn delete_mailing_list(&self, id: MailingListId, mode: DeleteMode) -> RepoResult<()>;

    /// Inserts unless the `(list, external id)` pair is already stored.
    fn insert_message(&self, message: &MailingListMessage) -> RepoResult<MessageInsert>;
    /// Updates every column except `timestamp`.
    fn update_message(&self, message: &MailingListMessage) -> RepoResult<MailingListMessage>;
    fn get_message(&self, id: MailingListMessageId) -> RepoResult<Option<MailingListMessage>>;
    /// Lists messages newest first, optionally for one call.
    fn list_messages(&self, call_id: Option<CallId>) -> RepoResult<Vec<MailingListMessage>>;
    fn delete_message(&self, id: MailingListMessageId) -> RepoResult<()>;
}

/// SQLite-backed mailing list repository.
pub struct SqliteMailingListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMailingListRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "mailing_lists",
                    &["id", "name", "acronym", "topic", "website"],
                ),
                (
                    "mailing_list_messages",
                    &[
                        "id",
                        "mailing_list_id",
                        "call_id",
                        "subject",
                        "sender",
                        "headers",
                        "message",
                        "timestamp",
                        "external_message_id",
                    ],
                ),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl MailingListRepository for SqliteMailingListRepository<'_> {
    fn create_mailing_list(&self, mailing_list: &MailingList) -> RepoResult<MailingListId> {
        mailing_list.validate()?;
        self.conn.execute(
            "INSERT INTO mailing_lists (id, name, acronym, topic, website)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                mailing_list.id.to_string(),
                mailing_list.name.as_str(),
                mailing_list.acronym.as_str(),
                mailing_list.topic.as_str(),
                mailing_list.website.as_str(),
            ],
        )?;
        Ok(mailing_list.id)
    }

    fn update_mailing_list(&self, mailing_list: &MailingList) -> RepoResult<()> {
        mailing_list.validate()?;
        require_existing(self.conn, "mailing_lists", "mailing list", mailing_list.id)?;
        self.conn.execute(
            "UPDATE mailing_lists
             SET name = ?2, acronym = ?3, topic = ?4, website = ?5
             WHERE id = ?1;",
            params![
                mailing_list.id.to_string(),
                mailing_list.name.as_str(),
                mailing_list.acronym.as_str(),
                mailing_list.topic.as_str(),
                mailing_list.website.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_mailing_list(&self, id: MailingListId) -> RepoResult<Option<MailingList>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MAILING_LIST_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_mailing_list_row(row)?));
        }
        Ok(None)
    }

    fn list_mailing_lists(&self) -> RepoResult<Vec<MailingList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MAILING_LIST_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut mailing_lists = Vec::new();
        while let Some(row) = rows.next()? {
            mailing_lists.push(parse_mailing_list_row(row)?);
        }
        Ok(mailing_lists)
    }

    fn delete_mailing_list(&self, id: MailingListId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "mailing_lists", "mailing list", id)?;
        match mode {
            DeleteMode::Restrict => {
                ensure_no_dependents(
                    &tx,
                    "mailing list",
                    id,
                    "mailing_list_messages",
                    "mailing_list_id",
                )?;
            }
            DeleteMode::Cascade => {
                tx.execute(
                    "DELETE FROM mailing_list_messages WHERE mailing_list_id = ?1;",
                    [id.to_string()],
                )?;
            }
        }
        delete_row(&tx, "mailing_lists", "mailing list", id)?;
        tx.commit()?;
        Ok(())
    }

    fn insert_message(&self, message: &MailingListMessage) -> RepoResult<MessageInsert> {
        message.validate()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_message_references(&tx, message)?;
        let changed = tx.execute(
            "INSERT OR IGNORE INTO mailing_list_messages (
                id,
                mailing_list_id,
                call_id,
                subject,
                sender,
                headers,
                message,
                external_message_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                message.id.to_string(),
                message.mailing_list_id.to_string(),
                message.call_id.to_string(),
                message.subject.as_str(),
                message.sender.as_str(),
                message.headers.as_str(),
                message.message.as_str(),
                message.external_message_id.as_str(),
            ],
        )?;
        let stored = find_message_in(&tx, message.mailing_list_id, &message.external_message_id)?
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "message {} missing after insert into mailing list {}",
                    message.id, message.mailing_list_id
                ))
            })?;
        tx.commit()?;

        if changed == 0 {
            Ok(MessageInsert::AlreadyPresent(stored))
        } else {
            Ok(MessageInsert::Inserted(stored))
        }
    }

    fn update_message(&self, message: &MailingListMessage) -> RepoResult<MailingListMessage> {
        message.validate()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "mailing_list_messages", "mailing list message", message.id)?;
        check_message_references(&tx, message)?;
        tx.execute(
            "UPDATE mailing_list_messages
             SET
                mailing_list_id = ?2,
                call_id = ?3,
                subject = ?4,
                sender = ?5,
                headers = ?6,
                message = ?7,
                external_message_id = ?8
             WHERE id = ?1;",
            params![
                message.id.to_string(),
                message.mailing_list_id.to_string(),
                message.call_id.to_string(),
                message.subject.as_str(),
                message.sender.as_str(),
                message.headers.as_str(),
                message.message.as_str(),
                message.external_message_id.as_str(),
            ],
        )?;
        let stored = get_message_in(&tx, message.id)?.ok_or(RepoError::NotFound {
            entity: "mailing list message",
            id: message.id,
        })?;
        tx.commit()?;
        Ok(stored)
    }

    fn get_message(&self, id: MailingListMessageId) -> RepoResult<Option<MailingListMessage>> {
        get_message_in(self.conn, id)
    }

    fn list_messages(&self, call_id: Option<CallId>) -> RepoResult<Vec<MailingListMessage>> {
        let mut sql = format!("{MESSAGE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(call_id) = call_id {
            sql.push_str(" AND call_id = ?");
            bind_values.push(Value::Text(call_id.to_string()));
        }
        sql.push_str(" ORDER BY timestamp DESC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next()? {
            messages.push(parse_message_row(row)?);
        }
        Ok(messages)
    }

    fn delete_message(&self, id: MailingListMessageId) -> RepoResult<()> {
        delete_row(
            self.conn,
            "mailing_list_messages",
            "mailing list message",
            id,
        )
    }
}

fn get_message_in(
    conn: &Connection,
    id: MailingListMessageId,
) -> RepoResult<Option<MailingListMessage>> {
    let mut stmt = conn.prepare(&format!("{MESSAGE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_message_row(row)?));
    }
    Ok(None)
}

fn find_message_in(
    conn: &Connection,
    mailing_list_id: MailingListId,
    external_message_id: &str,
) -> RepoResult<Option<MailingListMessage>> {
    let mut stmt = conn.prepare(&format!(
        "{MESSAGE_SELECT_SQL} WHERE mailing_list_id = ?1 AND external_message_id = ?2;"
    ))?;
    let mut rows = stmt.query(params![mailing_list_id.to_string(), external_message_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_message_row(row)?));
    }
    Ok(None)
}

fn check_message_references(conn: &Connection, message: &MailingListMessage) -> RepoResult<()> {
    require_reference(
        conn,
        "mailing_lists",
        "mailing_list",
        message.mailing_list_id,
    )?;
    require_reference(conn, "calls", "call", message.call_id)
}

fn parse_mailing_list_row(row: &Row<'_>) -> RepoResult<MailingList> {
    let id: String = row.get("id")?;
    Ok(MailingList {
        id: parse_uuid(&id, "mailing_lists.id")?,
        name: row.get("name")?,
        acronym: row.get("acronym")?,
        topic: row.get("topic")?,
        website: row.get("website")?,
    })
}

fn parse_message_row(row: &Row<'_>) -> RepoResult<MailingListMessage> {
    let id: String = row.get("id")?;
    let mailing_list_id: String = row.get("mailing_list_id")?;
    let call_id: String = row.get("call_id")?;
    Ok(MailingListMessage {
        id: parse_uuid(&id, "mailing_list_messages.id")?,
        mailing_list_id: parse_uuid(&mailing_list_id, "mailing_list_messages.mailing_list_id")?,
        call_id: parse_uuid(&call_id, "mailing_list_messages.call_id")?,
        subject: row.get("subject")?,
        sender: row.get("sender")?,
        headers: row.get("headers")?,
        message: row.get("message")?,
        timestamp: row.get("timestamp")?,
        external_message_id: row.get("external_message_id")?,
    })
}

//! Call and call type repository, plus the fixed call-target dispatch.
//!
//! # Responsibility
//! - Persist calls and call types.
//! - Resolve `CallTarget` values against the four target tables through a
//!   match over `CallKind`.
//!
//! # Invariants
//! - A call is written only when its target row and call type exist and the
//!   call type is scoped to the target's kind.
//! - Deleting a call in `Restrict` mode fails while deadlines or mailing list
//!   messages reference it.

use crate::model::call::{Call, CallId, CallKind, CallTarget, CallType, CallTypeId};
use crate::repo::book_repo::{get_book_in, list_books_in};
use crate::repo::common::{
    call_type_kind, delete_row, ensure_connection_ready, ensure_no_dependents,
    list_referencing_ids, parse_call_kind, parse_uuid, require_existing, row_exists, DeleteMode,
    RepoError, RepoResult,
};
use crate::repo::conference_repo::{get_edition_in, list_editions_in};
use crate::repo::journal_repo::{get_journal_in, list_journals_in};
use crate::repo::university_repo::{get_division_in, list_divisions_in};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use serde::Serialize;

const CALL_SELECT_SQL: &str = "SELECT
    id,
    title,
    call_type_id,
    content,
    url,
    target_kind,
    target_id
FROM calls";

const CALL_TYPE_SELECT_SQL: &str = "SELECT id, name, target_kind FROM call_types";

/// Selectable call target for admin forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetChoice {
    pub target: CallTarget,
    pub label: String,
}

/// Repository interface for calls and call types.
pub trait CallRepository {
    fn create_call_type(&self, call_type: &CallType) -> RepoResult<CallTypeId>;
    fn update_call_type(&self, call_type: &CallType) -> RepoResult<()>;
    fn get_call_type(&self, id: CallTypeId) -> RepoResult<Option<CallType>>;
    /// Lists call types by name, optionally only those scoped to `kind`.
    fn list_call_types(&self, kind: Option<CallKind>) -> RepoResult<Vec<CallType>>;
    fn delete_call_type(&self, id: CallTypeId, mode: DeleteMode) -> RepoResult<()>;

    fn create_call(&self, call: &Call) -> RepoResult<CallId>;
    fn update_call(&self, call: &Call) -> RepoResult<()>;
    fn get_call(&self, id: CallId) -> RepoResult<Option<Call>>;
    /// Lists calls by title, optionally only those targeting `kind`.
    fn list_calls(&self, kind: Option<CallKind>) -> RepoResult<Vec<Call>>;
    fn list_calls_for_target(&self, target: CallTarget) -> RepoResult<Vec<Call>>;
    fn delete_call(&self, id: CallId, mode: DeleteMode) -> RepoResult<()>;

    fn target_exists(&self, target: CallTarget) -> RepoResult<bool>;
    /// Display label of the target row, `None` when it does not exist.
    fn target_label(&self, target: CallTarget) -> RepoResult<Option<String>>;
    /// Every row of `kind` as a selectable target, in that kind's default order.
    fn target_choices(&self, kind: CallKind) -> RepoResult<Vec<TargetChoice>>;
}

/// SQLite-backed call repository.
pub struct SqliteCallRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCallRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("call_types", &["id", "name", "target_kind"]),
                (
                    "calls",
                    &[
                        "id",
                        "title",
                        "call_type_id",
                        "content",
                        "url",
                        "target_kind",
                        "target_id",
                    ],
                ),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl CallRepository for SqliteCallRepository<'_> {
    fn create_call_type(&self, call_type: &CallType) -> RepoResult<CallTypeId> {
        call_type.validate()?;
        self.conn.execute(
            "INSERT INTO call_types (id, name, target_kind) VALUES (?1, ?2, ?3);",
            params![
                call_type.id.to_string(),
                call_type.name.as_str(),
                call_type.target_kind.as_str(),
            ],
        )?;
        Ok(call_type.id)
    }

    fn update_call_type(&self, call_type: &CallType) -> RepoResult<()> {
        call_type.validate()?;
        require_existing(self.conn, "call_types", "call type", call_type.id)?;

        let conflicting: Option<String> = self
            .conn
            .query_row(
                "SELECT target_kind
                 FROM calls
                 WHERE call_type_id = ?1
                   AND target_kind <> ?2
                 LIMIT 1;",
                params![call_type.id.to_string(), call_type.target_kind.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(value) = conflicting {
            return Err(RepoError::CallTypeKindMismatch {
                call_type_id: call_type.id,
                call_type_kind: call_type.target_kind,
                target_kind: parse_call_kind(&value, "calls.target_kind")?,
            });
        }

        self.conn.execute(
            "UPDATE call_types SET name = ?2, target_kind = ?3 WHERE id = ?1;",
            params![
                call_type.id.to_string(),
                call_type.name.as_str(),
                call_type.target_kind.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_call_type(&self, id: CallTypeId) -> RepoResult<Option<CallType>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CALL_TYPE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_call_type_row(row)?));
        }
        Ok(None)
    }

    fn list_call_types(&self, kind: Option<CallKind>) -> RepoResult<Vec<CallType>> {
        let mut sql = format!("{CALL_TYPE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(kind) = kind {
            sql.push_str(" AND target_kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }
        sql.push_str(" ORDER BY name COLLATE NOCASE ASC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut call_types = Vec::new();
        while let Some(row) = rows.next()? {
            call_types.push(parse_call_type_row(row)?);
        }
        Ok(call_types)
    }

    fn delete_call_type(&self, id: CallTypeId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "call_types", "call type", id)?;
        match mode {
            DeleteMode::Restrict => {
                ensure_no_dependents(&tx, "call type", id, "calls", "call_type_id")?;
            }
            DeleteMode::Cascade => {
                for call_id in list_referencing_ids(&tx, "calls", "call_type_id", id)? {
                    delete_call_in(&tx, call_id, DeleteMode::Cascade)?;
                }
            }
        }
        delete_row(&tx, "call_types", "call type", id)?;
        tx.commit()?;
        Ok(())
    }

    fn create_call(&self, call: &Call) -> RepoResult<CallId> {
        call.validate()?;
        check_call_references(self.conn, call)?;
        self.conn.execute(
            "INSERT INTO calls (
                id,
                title,
                call_type_id,
                content,
                url,
                target_kind,
                target_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                call.id.to_string(),
                call.title.as_str(),
                call.call_type_id.to_string(),
                call.content.as_str(),
                call.url.as_str(),
                call.target.kind.as_str(),
                call.target.id.to_string(),
            ],
        )?;
        Ok(call.id)
    }

    fn update_call(&self, call: &Call) -> RepoResult<()> {
        call.validate()?;
        require_existing(self.conn, "calls", "call", call.id)?;
        check_call_references(self.conn, call)?;
        self.conn.execute(
            "UPDATE calls
             SET
                title = ?2,
                call_type_id = ?3,
                content = ?4,
                url = ?5,
                target_kind = ?6,
                target_id = ?7
             WHERE id = ?1;",
            params![
                call.id.to_string(),
                call.title.as_str(),
                call.call_type_id.to_string(),
                call.content.as_str(),
                call.url.as_str(),
                call.target.kind.as_str(),
                call.target.id.to_string(),
            ],
        )?;
        Ok(())
    }

    fn get_call(&self, id: CallId) -> RepoResult<Option<Call>> {
        get_call_in(self.conn, id)
    }

    fn list_calls(&self, kind: Option<CallKind>) -> RepoResult<Vec<Call>> {
        let mut sql = format!("{CALL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(kind) = kind {
            sql.push_str(" AND target_kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }
        sql.push_str(" ORDER BY title COLLATE NOCASE ASC, id ASC;");
        query_calls(self.conn, &sql, bind_values)
    }

    fn list_calls_for_target(&self, target: CallTarget) -> RepoResult<Vec<Call>> {
        query_calls(
            self.conn,
            &format!(
                "{CALL_SELECT_SQL}
                 WHERE target_kind = ?
                   AND target_id = ?
                 ORDER BY title COLLATE NOCASE ASC, id ASC;"
            ),
            vec![
                Value::Text(target.kind.as_str().to_string()),
                Value::Text(target.id.to_string()),
            ],
        )
    }

    fn delete_call(&self, id: CallId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        delete_call_in(&tx, id, mode)?;
        tx.commit()?;
        Ok(())
    }

    fn target_exists(&self, target: CallTarget) -> RepoResult<bool> {
        row_exists(self.conn, target.kind.table(), target.id)
    }

    fn target_label(&self, target: CallTarget) -> RepoResult<Option<String>> {
        target_label_in(self.conn, target)
    }

    fn target_choices(&self, kind: CallKind) -> RepoResult<Vec<TargetChoice>> {
        let choices = match kind {
            CallKind::ConferenceEdition => list_editions_in(self.conn, None)?
                .into_iter()
                .map(|row| TargetChoice {
                    target: CallTarget::conference_edition(row.id),
                    label: row.to_string(),
                })
                .collect(),
            CallKind::Journal => list_journals_in(self.conn)?
                .into_iter()
                .map(|row| TargetChoice {
                    target: CallTarget::journal(row.id),
                    label: row.to_string(),
                })
                .collect(),
            CallKind::Book => list_books_in(self.conn, None)?
                .into_iter()
                .map(|row| TargetChoice {
                    target: CallTarget::book(row.id),
                    label: row.to_string(),
                })
                .collect(),
            CallKind::UniversityDivision => list_divisions_in(self.conn, None)?
                .into_iter()
                .map(|row| TargetChoice {
                    target: CallTarget::university_division(row.id),
                    label: row.to_string(),
                })
                .collect(),
        };
        Ok(choices)
    }
}

pub(crate) fn get_call_in(conn: &Connection, id: CallId) -> RepoResult<Option<Call>> {
    let mut stmt = conn.prepare(&format!("{CALL_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_call_row(row)?));
    }
    Ok(None)
}

pub(crate) fn target_label_in(conn: &Connection, target: CallTarget) -> RepoResult<Option<String>> {
    let label = match target.kind {
        CallKind::ConferenceEdition => get_edition_in(conn, target.id)?.map(|row| row.to_string()),
        CallKind::Journal => get_journal_in(conn, target.id)?.map(|row| row.to_string()),
        CallKind::Book => get_book_in(conn, target.id)?.map(|row| row.to_string()),
        CallKind::UniversityDivision => {
            get_division_in(conn, target.id)?.map(|row| row.to_string())
        }
    };
    Ok(label)
}

/// Deletes one call; `Cascade` removes its deadlines and messages first.
pub(crate) fn delete_call_in(conn: &Connection, id: CallId, mode: DeleteMode) -> RepoResult<()> {
    require_existing(conn, "calls", "call", id)?;
    match mode {
        DeleteMode::Restrict => {
            ensure_no_dependents(conn, "call", id, "deadlines", "call_id")?;
            ensure_no_dependents(conn, "call", id, "mailing_list_messages", "call_id")?;
        }
        DeleteMode::Cascade => {
            conn.execute("DELETE FROM deadlines WHERE call_id = ?1;", [id.to_string()])?;
            conn.execute(
                "DELETE FROM mailing_list_messages WHERE call_id = ?1;",
                [id.to_string()],
            )?;
        }
    }
    delete_row(conn, "calls", "call", id)
}

/// Applies `mode` to the calls targeting `target` before the target is deleted.
pub(crate) fn release_target_calls_in(
    conn: &Connection,
    entity: &'static str,
    target: CallTarget,
    mode: DeleteMode,
) -> RepoResult<()> {
    let call_ids = list_target_call_ids(conn, target)?;
    match mode {
        DeleteMode::Restrict if !call_ids.is_empty() => Err(RepoError::HasDependents {
            entity,
            id: target.id,
            dependent_table: "calls",
            count: call_ids.len() as i64,
        }),
        DeleteMode::Restrict => Ok(()),
        DeleteMode::Cascade => {
            for call_id in call_ids {
                delete_call_in(conn, call_id, DeleteMode::Cascade)?;
            }
            Ok(())
        }
    }
}

fn list_target_call_ids(conn: &Connection, target: CallTarget) -> RepoResult<Vec<CallId>> {
    let mut stmt = conn.prepare(
        "SELECT id
         FROM calls
         WHERE target_kind = ?1
           AND target_id = ?2
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query(params![target.kind.as_str(), target.id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "calls.id")?);
    }
    Ok(ids)
}

fn check_call_references(conn: &Connection, call: &Call) -> RepoResult<()> {
    let call_type_kind =
        call_type_kind(conn, call.call_type_id)?.ok_or(RepoError::MissingReference {
            field: "call_type",
            id: call.call_type_id,
        })?;
    if !row_exists(conn, call.target.kind.table(), call.target.id)? {
        return Err(RepoError::MissingReference {
            field: "target",
            id: call.target.id,
        });
    }
    if call_type_kind != call.target.kind {
        return Err(RepoError::CallTypeKindMismatch {
            call_type_id: call.call_type_id,
            call_type_kind,
            target_kind: call.target.kind,
        });
    }
    Ok(())
}

fn query_calls(conn: &Connection, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Call>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut calls = Vec::new();
    while let Some(row) = rows.next()? {
        calls.push(parse_call_row(row)?);
    }
    Ok(calls)
}

fn parse_call_row(row: &Row<'_>) -> RepoResult<Call> {
    let id: String = row.get("id")?;
    let call_type_id: String = row.get("call_type_id")?;
    let target_kind: String = row.get("target_kind")?;
    let target_id: String = row.get("target_id")?;

    Ok(Call {
        id: parse_uuid(&id, "calls.id")?,
        title: row.get("title")?,
        call_type_id: parse_uuid(&call_type_id, "calls.call_type_id")?,
        content: row.get("content")?,
        url: row.get("url")?,
        target: CallTarget {
            kind: parse_call_kind(&target_kind, "calls.target_kind")?,
            id: parse_uuid(&target_id, "calls.target_id")?,
        },
    })
}

fn parse_call_type_row(row: &Row<'_>) -> RepoResult<CallType> {
    let id: String = row.get("id")?;
    let target_kind: String = row.get("target_kind")?;
    Ok(CallType {
        id: parse_uuid(&id, "call_types.id")?,
        name: row.get("name")?,
        target_kind: parse_call_kind(&target_kind, "call_types.target_kind")?,
    })
}

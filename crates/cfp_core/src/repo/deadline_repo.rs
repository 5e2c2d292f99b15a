//! Deadline and deadline type repository.
//!
//! # Responsibility
//! - Persist deadlines in per-call order.
//! - Serve the mandatory-deadline listing used by the index view.
//!
//! # Invariants
//! - `sort_order` values of one call are dense from 0 after every reorder.
//! - New deadlines, and deadlines moved to another call, append to the end.

use crate::model::call::{CallId, CallKind, CallTarget};
use crate::model::deadline::{Deadline, DeadlineId, DeadlineType, DeadlineTypeId};
use crate::repo::common::{
    bool_to_int, delete_row, ensure_connection_ready, ensure_no_dependents, parse_bool,
    parse_call_kind, parse_uuid, require_existing, require_reference, DeleteMode, RepoError,
    RepoResult,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;

const DEADLINE_TYPE_SELECT_SQL: &str = "SELECT id, name FROM deadline_types";

const DEADLINE_SELECT_SQL: &str = "SELECT
    id,
    call_id,
    deadline_type_id,
    date,
    extension,
    mandatory,
    sort_order
FROM deadlines";

const MANDATORY_BY_KIND_SQL: &str = "SELECT
    d.id,
    d.call_id,
    d.deadline_type_id,
    d.date,
    d.extension,
    d.mandatory,
    d.sort_order,
    t.name AS deadline_type_name,
    c.title AS call_title,
    c.url AS call_url,
    c.target_kind,
    c.target_id
FROM deadlines d
JOIN calls c ON c.id = d.call_id
JOIN deadline_types t ON t.id = d.deadline_type_id
WHERE d.mandatory = 1
  AND c.target_kind = ?1
ORDER BY d.date DESC, d.id ASC;";

/// Mandatory deadline joined with its type and call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandatoryDeadlineRow {
    pub deadline: Deadline,
    pub deadline_type_name: String,
    pub call_title: String,
    pub call_url: String,
    pub target: CallTarget,
}

/// Repository interface for deadlines and deadline types.
pub trait DeadlineRepository {
    fn create_deadline_type(&self, deadline_type: &DeadlineType) -> RepoResult<DeadlineTypeId>;
    fn update_deadline_type(&self, deadline_type: &DeadlineType) -> RepoResult<()>;
    fn get_deadline_type(&self, id: DeadlineTypeId) -> RepoResult<Option<DeadlineType>>;
    fn list_deadline_types(&self) -> RepoResult<Vec<DeadlineType>>;
    fn delete_deadline_type(&self, id: DeadlineTypeId, mode: DeleteMode) -> RepoResult<()>;

    /// Inserts a deadline at the end of its call. Returns the stored row.
    fn create_deadline(&self, deadline: &Deadline) -> RepoResult<Deadline>;
    /// Updates a deadline; `sort_order` on the input is ignored.
    fn update_deadline(&self, deadline: &Deadline) -> RepoResult<Deadline>;
    fn get_deadline(&self, id: DeadlineId) -> RepoResult<Option<Deadline>>;
    /// All deadlines grouped by call, each group in `sort_order`.
    fn list_deadlines(&self) -> RepoResult<Vec<Deadline>>;
    fn list_deadlines_for_call(&self, call_id: CallId) -> RepoResult<Vec<Deadline>>;
    fn set_deadline_order(&self, call_id: CallId, ordered_ids: &[DeadlineId]) -> RepoResult<()>;
    fn latest_deadline(&self, call_id: CallId) -> RepoResult<Option<Deadline>>;
    fn delete_deadline(&self, id: DeadlineId) -> RepoResult<()>;

    /// Mandatory deadlines whose call targets `kind`, latest date first.
    fn list_mandatory_by_kind(&self, kind: CallKind) -> RepoResult<Vec<MandatoryDeadlineRow>>;
}

/// SQLite-backed deadline repository.
pub struct SqliteDeadlineRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDeadlineRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("deadline_types", &["id", "name"]),
                (
                    "deadlines",
                    &[
                        "id",
                        "call_id",
                        "deadline_type_id",
                        "date",
                        "extension",
                        "mandatory",
                        "sort_order",
                    ],
                ),
                ("calls", &["id", "title", "url", "target_kind", "target_id"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl DeadlineRepository for SqliteDeadlineRepository<'_> {
    fn create_deadline_type(&self, deadline_type: &DeadlineType) -> RepoResult<DeadlineTypeId> {
        deadline_type.validate()?;
        self.conn.execute(
            "INSERT INTO deadline_types (id, name) VALUES (?1, ?2);",
            params![deadline_type.id.to_string(), deadline_type.name.as_str()],
        )?;
        Ok(deadline_type.id)
    }

    fn update_deadline_type(&self, deadline_type: &DeadlineType) -> RepoResult<()> {
        deadline_type.validate()?;
        require_existing(
            self.conn,
            "deadline_types",
            "deadline type",
            deadline_type.id,
        )?;
        self.conn.execute(
            "UPDATE deadline_types SET name = ?2 WHERE id = ?1;",
            params![deadline_type.id.to_string(), deadline_type.name.as_str()],
        )?;
        Ok(())
    }

    fn get_deadline_type(&self, id: DeadlineTypeId) -> RepoResult<Option<DeadlineType>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DEADLINE_TYPE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_deadline_type_row(row)?));
        }
        Ok(None)
    }

    fn list_deadline_types(&self) -> RepoResult<Vec<DeadlineType>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DEADLINE_TYPE_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut deadline_types = Vec::new();
        while let Some(row) = rows.next()? {
            deadline_types.push(parse_deadline_type_row(row)?);
        }
        Ok(deadline_types)
    }

    fn delete_deadline_type(&self, id: DeadlineTypeId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "deadline_types", "deadline type", id)?;
        match mode {
            DeleteMode::Restrict => {
                ensure_no_dependents(&tx, "deadline type", id, "deadlines", "deadline_type_id")?;
            }
            DeleteMode::Cascade => {
                tx.execute(
                    "DELETE FROM deadlines WHERE deadline_type_id = ?1;",
                    [id.to_string()],
                )?;
            }
        }
        delete_row(&tx, "deadline_types", "deadline type", id)?;
        tx.commit()?;
        Ok(())
    }

    fn create_deadline(&self, deadline: &Deadline) -> RepoResult<Deadline> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_deadline_references(&tx, deadline)?;
        let sort_order = next_sort_order(&tx, deadline.call_id)?;
        tx.execute(
            "INSERT INTO deadlines (
                id,
                call_id,
                deadline_type_id,
                date,
                extension,
                mandatory,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                deadline.id.to_string(),
                deadline.call_id.to_string(),
                deadline.deadline_type_id.to_string(),
                deadline.date,
                deadline.extension,
                bool_to_int(deadline.mandatory),
                sort_order,
            ],
        )?;
        tx.commit()?;

        Ok(Deadline {
            sort_order,
            ..deadline.clone()
        })
    }

    fn update_deadline(&self, deadline: &Deadline) -> RepoResult<Deadline> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing = get_deadline_in(&tx, deadline.id)?.ok_or(RepoError::NotFound {
            entity: "deadline",
            id: deadline.id,
        })?;
        check_deadline_references(&tx, deadline)?;
        let sort_order = if existing.call_id == deadline.call_id {
            existing.sort_order
        } else {
            next_sort_order(&tx, deadline.call_id)?
        };
        tx.execute(
            "UPDATE deadlines
             SET
                call_id = ?2,
                deadline_type_id = ?3,
                date = ?4,
                extension = ?5,
                mandatory = ?6,
                sort_order = ?7
             WHERE id = ?1;",
            params![
                deadline.id.to_string(),
                deadline.call_id.to_string(),
                deadline.deadline_type_id.to_string(),
                deadline.date,
                deadline.extension,
                bool_to_int(deadline.mandatory),
                sort_order,
            ],
        )?;
        tx.commit()?;

        Ok(Deadline {
            sort_order,
            ..deadline.clone()
        })
    }

    fn get_deadline(&self, id: DeadlineId) -> RepoResult<Option<Deadline>> {
        get_deadline_in(self.conn, id)
    }

    fn list_deadlines(&self) -> RepoResult<Vec<Deadline>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DEADLINE_SELECT_SQL} ORDER BY call_id ASC, sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut deadlines = Vec::new();
        while let Some(row) = rows.next()? {
            deadlines.push(parse_deadline_row(row)?);
        }
        Ok(deadlines)
    }

    fn list_deadlines_for_call(&self, call_id: CallId) -> RepoResult<Vec<Deadline>> {
        list_deadlines_for_call_in(self.conn, call_id)
    }

    fn set_deadline_order(&self, call_id: CallId, ordered_ids: &[DeadlineId]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "calls", "call", call_id)?;

        let current: HashSet<DeadlineId> = list_deadlines_for_call_in(&tx, call_id)?
            .into_iter()
            .map(|deadline| deadline.id)
            .collect();
        let requested: HashSet<DeadlineId> = ordered_ids.iter().copied().collect();
        if requested.len() != ordered_ids.len() || requested != current {
            return Err(RepoError::DeadlineOrderMismatch { call_id });
        }

        for (position, id) in ordered_ids.iter().enumerate() {
            tx.execute(
                "UPDATE deadlines SET sort_order = ?2 WHERE id = ?1;",
                params![id.to_string(), position as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn latest_deadline(&self, call_id: CallId) -> RepoResult<Option<Deadline>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DEADLINE_SELECT_SQL}
             WHERE call_id = ?1
             ORDER BY date DESC, sort_order ASC, id ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([call_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_deadline_row(row)?));
        }
        Ok(None)
    }

    fn delete_deadline(&self, id: DeadlineId) -> RepoResult<()> {
        delete_row(self.conn, "deadlines", "deadline", id)
    }

    fn list_mandatory_by_kind(&self, kind: CallKind) -> RepoResult<Vec<MandatoryDeadlineRow>> {
        let mut stmt = self.conn.prepare(MANDATORY_BY_KIND_SQL)?;
        let mut rows = stmt.query([kind.as_str()])?;
        let mut listing = Vec::new();
        while let Some(row) = rows.next()? {
            listing.push(parse_mandatory_row(row)?);
        }
        Ok(listing)
    }
}

fn get_deadline_in(conn: &Connection, id: DeadlineId) -> RepoResult<Option<Deadline>> {
    let mut stmt = conn.prepare(&format!("{DEADLINE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_deadline_row(row)?));
    }
    Ok(None)
}

fn list_deadlines_for_call_in(conn: &Connection, call_id: CallId) -> RepoResult<Vec<Deadline>> {
    let mut stmt = conn.prepare(&format!(
        "{DEADLINE_SELECT_SQL} WHERE call_id = ?1 ORDER BY sort_order ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([call_id.to_string()])?;
    let mut deadlines = Vec::new();
    while let Some(row) = rows.next()? {
        deadlines.push(parse_deadline_row(row)?);
    }
    Ok(deadlines)
}

fn next_sort_order(conn: &Connection, call_id: CallId) -> RepoResult<i64> {
    let max: Option<i64> = conn
        .query_row(
            "SELECT MAX(sort_order) FROM deadlines WHERE call_id = ?1;",
            [call_id.to_string()],
            |row| row.get(0),
        )
        .optional()?
        .flatten();
    Ok(max.map_or(0, |value| value + 1))
}

fn check_deadline_references(conn: &Connection, deadline: &Deadline) -> RepoResult<()> {
    require_reference(conn, "calls", "call", deadline.call_id)?;
    require_reference(
        conn,
        "deadline_types",
        "deadline_type",
        deadline.deadline_type_id,
    )
}

fn parse_deadline_type_row(row: &Row<'_>) -> RepoResult<DeadlineType> {
    let id: String = row.get("id")?;
    Ok(DeadlineType {
        id: parse_uuid(&id, "deadline_types.id")?,
        name: row.get("name")?,
    })
}

fn parse_deadline_row(row: &Row<'_>) -> RepoResult<Deadline> {
    let id: String = row.get("id")?;
    let call_id: String = row.get("call_id")?;
    let deadline_type_id: String = row.get("deadline_type_id")?;
    let date: NaiveDate = row.get("date")?;
    let extension: Option<NaiveDate> = row.get("extension")?;

    Ok(Deadline {
        id: parse_uuid(&id, "deadlines.id")?,
        call_id: parse_uuid(&call_id, "deadlines.call_id")?,
        deadline_type_id: parse_uuid(&deadline_type_id, "deadlines.deadline_type_id")?,
        date,
        extension,
        mandatory: parse_bool(row.get("mandatory")?, "deadlines.mandatory")?,
        sort_order: row.get("sort_order")?,
    })
}

fn parse_mandatory_row(row: &Row<'_>) -> RepoResult<MandatoryDeadlineRow> {
    let target_kind: String = row.get("target_kind")?;
    let target_id: String = row.get("target_id")?;
    Ok(MandatoryDeadlineRow {
        deadline: parse_deadline_row(row)?,
        deadline_type_name: row.get("deadline_type_name")?,
        call_title: row.get("call_title")?,
        call_url: row.get("call_url")?,
        target: CallTarget {
            kind: parse_call_kind(&target_kind, "calls.target_kind")?,
            id: parse_uuid(&target_id, "calls.target_id")?,
        },
    })
}

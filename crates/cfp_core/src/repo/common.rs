//! Shared repository error type and SQLite helpers.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::call::{CallKind, CallTypeId};
use crate::model::validation::ValidationError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Most ancestors any conference or edition may have.
pub const MAX_PARENT_DEPTH: usize = 32;

/// Policy for rows that are still referenced when deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Reject the delete while dependents exist.
    #[default]
    Restrict,
    /// Delete dependents first, in one transaction.
    Cascade,
}

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: Uuid,
    },
    /// A mandatory (or provided optional) reference points to no row.
    MissingReference {
        field: &'static str,
        id: Uuid,
    },
    /// Call type is scoped to another kind than the call target.
    CallTypeKindMismatch {
        call_type_id: CallTypeId,
        call_type_kind: CallKind,
        target_kind: CallKind,
    },
    /// Restricted delete of a row that still has dependents.
    HasDependents {
        entity: &'static str,
        id: Uuid,
        dependent_table: &'static str,
        count: i64,
    },
    /// Deadline reorder input is not exactly the call's deadline set.
    DeadlineOrderMismatch {
        call_id: Uuid,
    },
    /// Setting `parent_id` would make the row its own ancestor.
    ParentCycle {
        id: Uuid,
        parent_id: Uuid,
    },
    /// The write would give some row more than `max_depth` ancestors.
    ParentChainTooDeep {
        id: Uuid,
        max_depth: usize,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::MissingReference { field, id } => {
                write!(f, "`{field}` references a missing row: {id}")
            }
            Self::CallTypeKindMismatch {
                call_type_id,
                call_type_kind,
                target_kind,
            } => write!(
                f,
                "call type {call_type_id} applies to `{call_type_kind}`, call targets `{target_kind}`"
            ),
            Self::HasDependents {
                entity,
                id,
                dependent_table,
                count,
            } => write!(
                f,
                "{entity} {id} is still referenced by {count} row(s) in `{dependent_table}`"
            ),
            Self::DeadlineOrderMismatch { call_id } => write!(
                f,
                "deadline order must list every deadline of call {call_id} exactly once"
            ),
            Self::ParentCycle { id, parent_id } => {
                write!(f, "parent {parent_id} would make {id} its own ancestor")
            }
            Self::ParentChainTooDeep { id, max_depth } => {
                write!(f, "parent chain of {id} is deeper than {max_depth} links")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "catalog repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Verifies schema version and required table/column layout.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Returns whether `table` holds a row with `id`. `table` must be a static name.
pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: Uuid) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Fails with `MissingReference` when `id` has no row in `table`.
pub(crate) fn require_reference(
    conn: &Connection,
    table: &'static str,
    field: &'static str,
    id: Uuid,
) -> RepoResult<()> {
    if row_exists(conn, table, id)? {
        Ok(())
    } else {
        Err(RepoError::MissingReference { field, id })
    }
}

/// Same as [`require_reference`] for optional references.
pub(crate) fn require_optional_reference(
    conn: &Connection,
    table: &'static str,
    field: &'static str,
    id: Option<Uuid>,
) -> RepoResult<()> {
    match id {
        Some(id) => require_reference(conn, table, field, id),
        None => Ok(()),
    }
}

/// Counts rows of `table` whose `column` equals `id`.
pub(crate) fn count_referencing(
    conn: &Connection,
    table: &'static str,
    column: &'static str,
    id: Uuid,
) -> RepoResult<i64> {
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1;"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Fails with `HasDependents` when any row of `table.column` references `id`.
pub(crate) fn ensure_no_dependents(
    conn: &Connection,
    entity: &'static str,
    id: Uuid,
    table: &'static str,
    column: &'static str,
) -> RepoResult<()> {
    let count = count_referencing(conn, table, column, id)?;
    if count > 0 {
        return Err(RepoError::HasDependents {
            entity,
            id,
            dependent_table: table,
            count,
        });
    }
    Ok(())
}

/// Deletes one row by id, mapping zero affected rows to `NotFound`.
pub(crate) fn delete_row(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: Uuid,
) -> RepoResult<()> {
    let changed = conn.execute(
        &format!("DELETE FROM {table} WHERE id = ?1;"),
        [id.to_string()],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}

/// Collects ids of `table` rows whose `column` equals `id`.
pub(crate) fn list_referencing_ids(
    conn: &Connection,
    table: &'static str,
    column: &'static str,
    id: Uuid,
) -> RepoResult<Vec<Uuid>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {table} WHERE {column} = ?1 ORDER BY id ASC;"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, table)?);
    }
    Ok(ids)
}

/// Fails with `NotFound` unless `table` holds `id`.
pub(crate) fn require_existing(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: Uuid,
) -> RepoResult<()> {
    if row_exists(conn, table, id)? {
        Ok(())
    } else {
        Err(RepoError::NotFound { entity, id })
    }
}

/// Checks that `id` may hang below `parent_id` in the self-referencing
/// `table`: no cycle, and neither the row nor its deepest descendant ends up
/// with more than `MAX_PARENT_DEPTH` ancestors.
pub(crate) fn check_parent_chain(
    conn: &Connection,
    table: &'static str,
    id: Uuid,
    parent_id: Uuid,
) -> RepoResult<()> {
    let subtree_depth = subtree_depth(conn, table, id)?;
    walk_parent_chain(id, parent_id, subtree_depth, |current| {
        let parent: Option<Option<String>> = conn
            .query_row(
                &format!("SELECT parent_id FROM {table} WHERE id = ?1;"),
                [current.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match parent {
            Some(parent) => parse_optional_uuid(parent, table),
            None => Err(RepoError::MissingReference {
                field: "parent",
                id: current,
            }),
        }
    })
}

/// Follows parents up from `parent_id`. The chain length plus
/// `subtree_depth` must stay within `MAX_PARENT_DEPTH`.
pub(crate) fn walk_parent_chain(
    id: Uuid,
    parent_id: Uuid,
    subtree_depth: usize,
    mut parent_of: impl FnMut(Uuid) -> RepoResult<Option<Uuid>>,
) -> RepoResult<()> {
    let mut visited = HashSet::new();
    let mut cursor = Some(parent_id);
    let mut depth = subtree_depth;
    while let Some(current) = cursor {
        if current == id || !visited.insert(current) {
            return Err(RepoError::ParentCycle { id, parent_id });
        }
        depth += 1;
        if depth > MAX_PARENT_DEPTH {
            return Err(RepoError::ParentChainTooDeep {
                id,
                max_depth: MAX_PARENT_DEPTH,
            });
        }
        cursor = parent_of(current)?;
    }
    Ok(())
}

/// Longest path from `id` down to a descendant, zero for leaves and unsaved
/// rows. Bounded one past `MAX_PARENT_DEPTH`.
fn subtree_depth(conn: &Connection, table: &'static str, id: Uuid) -> RepoResult<usize> {
    let depth: i64 = conn.query_row(
        &format!(
            "WITH RECURSIVE subtree(id, depth) AS (
                SELECT id, 0 FROM {table} WHERE id = ?1
                UNION ALL
                SELECT child.id, subtree.depth + 1
                FROM {table} AS child
                JOIN subtree ON child.parent_id = subtree.id
                WHERE subtree.depth <= ?2
            )
            SELECT COALESCE(MAX(depth), 0) FROM subtree;"
        ),
        params![id.to_string(), MAX_PARENT_DEPTH as i64],
        |row| row.get(0),
    )?;
    usize::try_from(depth).map_err(|_| {
        RepoError::InvalidData(format!("negative subtree depth {depth} in {table}"))
    })
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(value: Option<String>, column: &str) -> RepoResult<Option<Uuid>> {
    value.map(|value| parse_uuid(&value, column)).transpose()
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_call_kind(value: &str, column: &str) -> RepoResult<CallKind> {
    CallKind::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid call kind `{value}` in {column}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Loads the call kind stored for one call type, if the type exists.
pub(crate) fn call_type_kind(conn: &Connection, id: CallTypeId) -> RepoResult<Option<CallKind>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT target_kind FROM call_types WHERE id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    value
        .map(|value| parse_call_kind(&value, "call_types.target_kind"))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::{walk_parent_chain, RepoError, MAX_PARENT_DEPTH};
    use std::collections::HashMap;
    use uuid::Uuid;

    #[test]
    fn walk_accepts_short_acyclic_chain() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let parents = HashMap::from([(b, Some(c)), (c, None)]);
        let result = walk_parent_chain(a, b, 0, |id| Ok(parents[&id]));
        assert!(result.is_ok());
    }

    #[test]
    fn walk_detects_self_reference_through_chain() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let parents = HashMap::from([(b, Some(a))]);
        let result = walk_parent_chain(a, b, 0, |id| Ok(parents[&id]));
        assert!(matches!(result, Err(RepoError::ParentCycle { .. })));
    }

    #[test]
    fn walk_stops_past_max_depth() {
        let ids: Vec<Uuid> = (0..=MAX_PARENT_DEPTH + 1).map(|_| Uuid::new_v4()).collect();
        let result = walk_parent_chain(Uuid::new_v4(), ids[0], 0, |id| {
            let index = ids.iter().position(|value| *value == id).unwrap();
            Ok(ids.get(index + 1).copied())
        });
        assert!(matches!(result, Err(RepoError::ParentChainTooDeep { .. })));
    }

    #[test]
    fn walk_counts_the_subtree_below_the_row() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let parents = HashMap::from([(b, None)]);
        let fits = walk_parent_chain(a, b, MAX_PARENT_DEPTH - 1, |id| Ok(parents[&id]));
        assert!(fits.is_ok());
        let overflows = walk_parent_chain(a, b, MAX_PARENT_DEPTH, |id| Ok(parents[&id]));
        assert!(matches!(overflows, Err(RepoError::ParentChainTooDeep { .. })));
    }
}

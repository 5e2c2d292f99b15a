//! University and university division repository.
//!
//! # Invariants
//! - Every division references an existing university.
//! - Deleting a university that still owns divisions requires
//!   `DeleteMode::Cascade`, which also removes the divisions' calls together
//!   with their deadlines and mailing list messages.

use crate::model::call::CallTarget;
use crate::model::university::{
    University, UniversityDivision, UniversityDivisionId, UniversityId,
};
use crate::repo::call_repo::release_target_calls_in;
use crate::repo::common::{
    delete_row, ensure_connection_ready, ensure_no_dependents, list_referencing_ids, parse_uuid,
    require_existing, require_reference, DeleteMode, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const UNIVERSITY_SELECT_SQL: &str = "SELECT
    id,
    name,
    acronym,
    website,
    description,
    city,
    country
FROM universities";

const DIVISION_SELECT_SQL: &str = "SELECT
    id,
    university_id,
    name,
    faculty,
    acronym,
    website,
    description
FROM university_divisions";

/// Repository interface for universities and their divisions.
pub trait UniversityRepository {
    fn create_university(&self, university: &University) -> RepoResult<UniversityId>;
    fn update_university(&self, university: &University) -> RepoResult<()>;
    fn get_university(&self, id: UniversityId) -> RepoResult<Option<University>>;
    fn list_universities(&self) -> RepoResult<Vec<University>>;
    fn delete_university(&self, id: UniversityId, mode: DeleteMode) -> RepoResult<()>;

    fn create_division(&self, division: &UniversityDivision) -> RepoResult<UniversityDivisionId>;
    fn update_division(&self, division: &UniversityDivision) -> RepoResult<()>;
    fn get_division(&self, id: UniversityDivisionId) -> RepoResult<Option<UniversityDivision>>;
    /// Lists divisions by name, optionally for one university.
    fn list_divisions(
        &self,
        university_id: Option<UniversityId>,
    ) -> RepoResult<Vec<UniversityDivision>>;
    fn delete_division(&self, id: UniversityDivisionId, mode: DeleteMode) -> RepoResult<()>;
}

/// SQLite-backed university repository.
pub struct SqliteUniversityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUniversityRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "universities",
                    &[
                        "id",
                        "name",
                        "acronym",
                        "website",
                        "description",
                        "city",
                        "country",
                    ],
                ),
                (
                    "university_divisions",
                    &[
                        "id",
                        "university_id",
                        "name",
                        "faculty",
                        "acronym",
                        "website",
                        "description",
                    ],
                ),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl UniversityRepository for SqliteUniversityRepository<'_> {
    fn create_university(&self, university: &University) -> RepoResult<UniversityId> {
        university.validate()?;
        self.conn.execute(
            "INSERT INTO universities (id, name, acronym, website, description, city, country)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                university.id.to_string(),
                university.name.as_str(),
                university.acronym.as_str(),
                university.website.as_str(),
                university.description.as_str(),
                university.city.as_str(),
                university.country.as_str(),
            ],
        )?;
        Ok(university.id)
    }

    fn update_university(&self, university: &University) -> RepoResult<()> {
        university.validate()?;
        require_existing(self.conn, "universities", "university", university.id)?;
        self.conn.execute(
            "UPDATE universities
             SET
                name = ?2,
                acronym = ?3,
                website = ?4,
                description = ?5,
                city = ?6,
                country = ?7
             WHERE id = ?1;",
            params![
                university.id.to_string(),
                university.name.as_str(),
                university.acronym.as_str(),
                university.website.as_str(),
                university.description.as_str(),
                university.city.as_str(),
                university.country.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_university(&self, id: UniversityId) -> RepoResult<Option<University>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{UNIVERSITY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_university_row(row)?));
        }
        Ok(None)
    }

    fn list_universities(&self) -> RepoResult<Vec<University>> {
        let mut stmt = self.conn.prepare(&format!(
            "{UNIVERSITY_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut universities = Vec::new();
        while let Some(row) = rows.next()? {
            universities.push(parse_university_row(row)?);
        }
        Ok(universities)
    }

    fn delete_university(&self, id: UniversityId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "universities", "university", id)?;
        match mode {
            DeleteMode::Restrict => {
                ensure_no_dependents(
                    &tx,
                    "university",
                    id,
                    "university_divisions",
                    "university_id",
                )?;
            }
            DeleteMode::Cascade => {
                for division_id in
                    list_referencing_ids(&tx, "university_divisions", "university_id", id)?
                {
                    delete_division_in(&tx, division_id, DeleteMode::Cascade)?;
                }
            }
        }
        delete_row(&tx, "universities", "university", id)?;
        tx.commit()?;
        Ok(())
    }

    fn create_division(&self, division: &UniversityDivision) -> RepoResult<UniversityDivisionId> {
        division.validate()?;
        require_reference(
            self.conn,
            "universities",
            "university",
            division.university_id,
        )?;
        self.conn.execute(
            "INSERT INTO university_divisions (
                id,
                university_id,
                name,
                faculty,
                acronym,
                website,
                description
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                division.id.to_string(),
                division.university_id.to_string(),
                division.name.as_str(),
                division.faculty.as_str(),
                division.acronym.as_str(),
                division.website.as_str(),
                division.description.as_str(),
            ],
        )?;
        Ok(division.id)
    }

    fn update_division(&self, division: &UniversityDivision) -> RepoResult<()> {
        division.validate()?;
        require_existing(
            self.conn,
            "university_divisions",
            "university division",
            division.id,
        )?;
        require_reference(
            self.conn,
            "universities",
            "university",
            division.university_id,
        )?;
        self.conn.execute(
            "UPDATE university_divisions
             SET
                university_id = ?2,
                name = ?3,
                faculty = ?4,
                acronym = ?5,
                website = ?6,
                description = ?7
             WHERE id = ?1;",
            params![
                division.id.to_string(),
                division.university_id.to_string(),
                division.name.as_str(),
                division.faculty.as_str(),
                division.acronym.as_str(),
                division.website.as_str(),
                division.description.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_division(&self, id: UniversityDivisionId) -> RepoResult<Option<UniversityDivision>> {
        get_division_in(self.conn, id)
    }

    fn list_divisions(
        &self,
        university_id: Option<UniversityId>,
    ) -> RepoResult<Vec<UniversityDivision>> {
        list_divisions_in(self.conn, university_id)
    }

    fn delete_division(&self, id: UniversityDivisionId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        delete_division_in(&tx, id, mode)?;
        tx.commit()?;
        Ok(())
    }
}

pub(crate) fn get_division_in(
    conn: &Connection,
    id: UniversityDivisionId,
) -> RepoResult<Option<UniversityDivision>> {
    let mut stmt = conn.prepare(&format!("{DIVISION_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_division_row(row)?));
    }
    Ok(None)
}

pub(crate) fn list_divisions_in(
    conn: &Connection,
    university_id: Option<UniversityId>,
) -> RepoResult<Vec<UniversityDivision>> {
    let mut sql = format!("{DIVISION_SELECT_SQL} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(university_id) = university_id {
        sql.push_str(" AND university_id = ?");
        bind_values.push(Value::Text(university_id.to_string()));
    }
    sql.push_str(" ORDER BY name COLLATE NOCASE ASC, id ASC;");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut divisions = Vec::new();
    while let Some(row) = rows.next()? {
        divisions.push(parse_division_row(row)?);
    }
    Ok(divisions)
}

fn delete_division_in(
    conn: &Connection,
    id: UniversityDivisionId,
    mode: DeleteMode,
) -> RepoResult<()> {
    require_existing(conn, "university_divisions", "university division", id)?;
    release_target_calls_in(
        conn,
        "university division",
        CallTarget::university_division(id),
        mode,
    )?;
    delete_row(conn, "university_divisions", "university division", id)
}

fn parse_university_row(row: &Row<'_>) -> RepoResult<University> {
    let id: String = row.get("id")?;
    Ok(University {
        id: parse_uuid(&id, "universities.id")?,
        name: row.get("name")?,
        acronym: row.get("acronym")?,
        website: row.get("website")?,
        description: row.get("description")?,
        city: row.get("city")?,
        country: row.get("country")?,
    })
}

fn parse_division_row(row: &Row<'_>) -> RepoResult<UniversityDivision> {
    let id: String = row.get("id")?;
    let university_id: String = row.get("university_id")?;
    Ok(UniversityDivision {
        id: parse_uuid(&id, "university_divisions.id")?,
        university_id: parse_uuid(&university_id, "university_divisions.university_id")?,
        name: row.get("name")?,
        faculty: row.get("faculty")?,
        acronym: row.get("acronym")?,
        website: row.get("website")?,
        description: row.get("description")?,
    })
}

//! Sponsor, conference and conference edition repository.
//!
//! # Invariants
//! - Optional references (`sponsor_id`, `parent_id`) must point to existing
//!   rows when set; deleting their target nulls them out.
//! - `parent_id` chains stay acyclic and no row gets more than
//!   `MAX_PARENT_DEPTH` ancestors; writes check this in the same transaction.
//! - `conference_id` on editions is mandatory; deleting a conference that
//!   still owns editions requires `DeleteMode::Cascade`.

use crate::model::call::CallTarget;
use crate::model::conference::{
    Conference, ConferenceEdition, ConferenceEditionId, ConferenceId, Sponsor, SponsorId,
};
use crate::repo::call_repo::release_target_calls_in;
use crate::repo::common::{
    check_parent_chain, delete_row, ensure_connection_ready, ensure_no_dependents, list_referencing_ids,
    parse_optional_uuid, parse_uuid, require_existing, require_optional_reference,
    require_reference, DeleteMode, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const SPONSOR_SELECT_SQL: &str = "SELECT id, name, acronym, website, description FROM sponsors";

const CONFERENCE_SELECT_SQL: &str = "SELECT
    id,
    name,
    acronym,
    description,
    topic,
    website,
    sponsor_id,
    parent_id
FROM conferences";

const EDITION_SELECT_SQL: &str = "SELECT
    id,
    conference_id,
    name,
    acronym,
    theme,
    topics,
    website,
    start_date,
    end_date,
    location,
    city,
    country,
    parent_id
FROM conference_editions";

/// Repository interface for the conference catalog.
pub trait ConferenceRepository {
    fn create_sponsor(&self, sponsor: &Sponsor) -> RepoResult<SponsorId>;
    fn update_sponsor(&self, sponsor: &Sponsor) -> RepoResult<()>;
    fn get_sponsor(&self, id: SponsorId) -> RepoResult<Option<Sponsor>>;
    fn list_sponsors(&self) -> RepoResult<Vec<Sponsor>>;
    /// Deletes a sponsor; conferences it sponsored keep existing without one.
    fn delete_sponsor(&self, id: SponsorId) -> RepoResult<()>;

    fn create_conference(&self, conference: &Conference) -> RepoResult<ConferenceId>;
    fn update_conference(&self, conference: &Conference) -> RepoResult<()>;
    fn get_conference(&self, id: ConferenceId) -> RepoResult<Option<Conference>>;
    fn list_conferences(&self) -> RepoResult<Vec<Conference>>;
    fn delete_conference(&self, id: ConferenceId, mode: DeleteMode) -> RepoResult<()>;

    fn create_edition(&self, edition: &ConferenceEdition) -> RepoResult<ConferenceEditionId>;
    fn update_edition(&self, edition: &ConferenceEdition) -> RepoResult<()>;
    fn get_edition(&self, id: ConferenceEditionId) -> RepoResult<Option<ConferenceEdition>>;
    /// Lists editions by start date, optionally for one conference.
    fn list_editions(
        &self,
        conference_id: Option<ConferenceId>,
    ) -> RepoResult<Vec<ConferenceEdition>>;
    fn delete_edition(&self, id: ConferenceEditionId, mode: DeleteMode) -> RepoResult<()>;
}

/// SQLite-backed conference repository.
pub struct SqliteConferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConferenceRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("sponsors", &["id", "name", "acronym", "website", "description"]),
                (
                    "conferences",
                    &[
                        "id",
                        "name",
                        "acronym",
                        "description",
                        "topic",
                        "website",
                        "sponsor_id",
                        "parent_id",
                    ],
                ),
                (
                    "conference_editions",
                    &[
                        "id",
                        "conference_id",
                        "name",
                        "start_date",
                        "end_date",
                        "country",
                        "parent_id",
                    ],
                ),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ConferenceRepository for SqliteConferenceRepository<'_> {
    fn create_sponsor(&self, sponsor: &Sponsor) -> RepoResult<SponsorId> {
        sponsor.validate()?;
        self.conn.execute(
            "INSERT INTO sponsors (id, name, acronym, website, description)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                sponsor.id.to_string(),
                sponsor.name.as_str(),
                sponsor.acronym.as_str(),
                sponsor.website.as_str(),
                sponsor.description.as_str(),
            ],
        )?;
        Ok(sponsor.id)
    }

    fn update_sponsor(&self, sponsor: &Sponsor) -> RepoResult<()> {
        sponsor.validate()?;
        require_existing(self.conn, "sponsors", "sponsor", sponsor.id)?;
        self.conn.execute(
            "UPDATE sponsors
             SET name = ?2, acronym = ?3, website = ?4, description = ?5
             WHERE id = ?1;",
            params![
                sponsor.id.to_string(),
                sponsor.name.as_str(),
                sponsor.acronym.as_str(),
                sponsor.website.as_str(),
                sponsor.description.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_sponsor(&self, id: SponsorId) -> RepoResult<Option<Sponsor>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SPONSOR_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_sponsor_row(row)?));
        }
        Ok(None)
    }

    fn list_sponsors(&self) -> RepoResult<Vec<Sponsor>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SPONSOR_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut sponsors = Vec::new();
        while let Some(row) = rows.next()? {
            sponsors.push(parse_sponsor_row(row)?);
        }
        Ok(sponsors)
    }

    fn delete_sponsor(&self, id: SponsorId) -> RepoResult<()> {
        delete_row(self.conn, "sponsors", "sponsor", id)
    }

    fn create_conference(&self, conference: &Conference) -> RepoResult<ConferenceId> {
        conference.validate()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_conference_references(&tx, conference)?;
        tx.execute(
            "INSERT INTO conferences (
                id,
                name,
                acronym,
                description,
                topic,
                website,
                sponsor_id,
                parent_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                conference.id.to_string(),
                conference.name.as_str(),
                conference.acronym.as_str(),
                conference.description.as_str(),
                conference.topic.as_str(),
                conference.website.as_str(),
                conference.sponsor_id.map(|value| value.to_string()),
                conference.parent_id.map(|value| value.to_string()),
            ],
        )?;
        tx.commit()?;
        Ok(conference.id)
    }

    fn update_conference(&self, conference: &Conference) -> RepoResult<()> {
        conference.validate()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "conferences", "conference", conference.id)?;
        check_conference_references(&tx, conference)?;
        tx.execute(
            "UPDATE conferences
             SET
                name = ?2,
                acronym = ?3,
                description = ?4,
                topic = ?5,
                website = ?6,
                sponsor_id = ?7,
                parent_id = ?8
             WHERE id = ?1;",
            params![
                conference.id.to_string(),
                conference.name.as_str(),
                conference.acronym.as_str(),
                conference.description.as_str(),
                conference.topic.as_str(),
                conference.website.as_str(),
                conference.sponsor_id.map(|value| value.to_string()),
                conference.parent_id.map(|value| value.to_string()),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_conference(&self, id: ConferenceId) -> RepoResult<Option<Conference>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONFERENCE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_conference_row(row)?));
        }
        Ok(None)
    }

    fn list_conferences(&self) -> RepoResult<Vec<Conference>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONFERENCE_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut conferences = Vec::new();
        while let Some(row) = rows.next()? {
            conferences.push(parse_conference_row(row)?);
        }
        Ok(conferences)
    }

    fn delete_conference(&self, id: ConferenceId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "conferences", "conference", id)?;
        match mode {
            DeleteMode::Restrict => {
                ensure_no_dependents(
                    &tx,
                    "conference",
                    id,
                    "conference_editions",
                    "conference_id",
                )?;
            }
            DeleteMode::Cascade => {
                for edition_id in
                    list_referencing_ids(&tx, "conference_editions", "conference_id", id)?
                {
                    delete_edition_in(&tx, edition_id, DeleteMode::Cascade)?;
                }
            }
        }
        delete_row(&tx, "conferences", "conference", id)?;
        tx.commit()?;
        Ok(())
    }

    fn create_edition(&self, edition: &ConferenceEdition) -> RepoResult<ConferenceEditionId> {
        edition.validate()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_edition_references(&tx, edition)?;
        tx.execute(
            "INSERT INTO conference_editions (
                id,
                conference_id,
                name,
                acronym,
                theme,
                topics,
                website,
                start_date,
                end_date,
                location,
                city,
                country,
                parent_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                edition.id.to_string(),
                edition.conference_id.to_string(),
                edition.name.as_str(),
                edition.acronym.as_str(),
                edition.theme.as_str(),
                edition.topics.as_str(),
                edition.website.as_str(),
                edition.start_date,
                edition.end_date,
                edition.location.as_str(),
                edition.city.as_str(),
                edition.country.as_str(),
                edition.parent_id.map(|value| value.to_string()),
            ],
        )?;
        tx.commit()?;
        Ok(edition.id)
    }

    fn update_edition(&self, edition: &ConferenceEdition) -> RepoResult<()> {
        edition.validate()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "conference_editions", "conference edition", edition.id)?;
        check_edition_references(&tx, edition)?;
        tx.execute(
            "UPDATE conference_editions
             SET
                conference_id = ?2,
                name = ?3,
                acronym = ?4,
                theme = ?5,
                topics = ?6,
                website = ?7,
                start_date = ?8,
                end_date = ?9,
                location = ?10,
                city = ?11,
                country = ?12,
                parent_id = ?13
             WHERE id = ?1;",
            params![
                edition.id.to_string(),
                edition.conference_id.to_string(),
                edition.name.as_str(),
                edition.acronym.as_str(),
                edition.theme.as_str(),
                edition.topics.as_str(),
                edition.website.as_str(),
                edition.start_date,
                edition.end_date,
                edition.location.as_str(),
                edition.city.as_str(),
                edition.country.as_str(),
                edition.parent_id.map(|value| value.to_string()),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_edition(&self, id: ConferenceEditionId) -> RepoResult<Option<ConferenceEdition>> {
        get_edition_in(self.conn, id)
    }

    fn list_editions(
        &self,
        conference_id: Option<ConferenceId>,
    ) -> RepoResult<Vec<ConferenceEdition>> {
        list_editions_in(self.conn, conference_id)
    }

    fn delete_edition(&self, id: ConferenceEditionId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        delete_edition_in(&tx, id, mode)?;
        tx.commit()?;
        Ok(())
    }
}

pub(crate) fn get_edition_in(
    conn: &Connection,
    id: ConferenceEditionId,
) -> RepoResult<Option<ConferenceEdition>> {
    let mut stmt = conn.prepare(&format!("{EDITION_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_edition_row(row)?));
    }
    Ok(None)
}

pub(crate) fn list_editions_in(
    conn: &Connection,
    conference_id: Option<ConferenceId>,
) -> RepoResult<Vec<ConferenceEdition>> {
    let mut sql = format!("{EDITION_SELECT_SQL} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(conference_id) = conference_id {
        sql.push_str(" AND conference_id = ?");
        bind_values.push(Value::Text(conference_id.to_string()));
    }
    sql.push_str(" ORDER BY start_date ASC, id ASC;");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut editions = Vec::new();
    while let Some(row) = rows.next()? {
        editions.push(parse_edition_row(row)?);
    }
    Ok(editions)
}

fn delete_edition_in(
    conn: &Connection,
    id: ConferenceEditionId,
    mode: DeleteMode,
) -> RepoResult<()> {
    require_existing(conn, "conference_editions", "conference edition", id)?;
    release_target_calls_in(
        conn,
        "conference edition",
        CallTarget::conference_edition(id),
        mode,
    )?;
    delete_row(conn, "conference_editions", "conference edition", id)
}

fn check_conference_references(conn: &Connection, conference: &Conference) -> RepoResult<()> {
    require_optional_reference(conn, "sponsors", "sponsor", conference.sponsor_id)?;
    require_optional_reference(conn, "conferences", "parent", conference.parent_id)?;
    match conference.parent_id {
        Some(parent_id) => check_parent_chain(conn, "conferences", conference.id, parent_id),
        None => Ok(()),
    }
}

fn check_edition_references(conn: &Connection, edition: &ConferenceEdition) -> RepoResult<()> {
    require_reference(conn, "conferences", "conference", edition.conference_id)?;
    require_optional_reference(conn, "conference_editions", "parent", edition.parent_id)?;
    match edition.parent_id {
        Some(parent_id) => {
            check_parent_chain(conn, "conference_editions", edition.id, parent_id)
        }
        None => Ok(()),
    }
}

fn parse_sponsor_row(row: &Row<'_>) -> RepoResult<Sponsor> {
    let id: String = row.get("id")?;
    Ok(Sponsor {
        id: parse_uuid(&id, "sponsors.id")?,
        name: row.get("name")?,
        acronym: row.get("acronym")?,
        website: row.get("website")?,
        description: row.get("description")?,
    })
}

fn parse_conference_row(row: &Row<'_>) -> RepoResult<Conference> {
    let id: String = row.get("id")?;
    Ok(Conference {
        id: parse_uuid(&id, "conferences.id")?,
        name: row.get("name")?,
        acronym: row.get("acronym")?,
        description: row.get("description")?,
        topic: row.get("topic")?,
        website: row.get("website")?,
        sponsor_id: parse_optional_uuid(row.get("sponsor_id")?, "conferences.sponsor_id")?,
        parent_id: parse_optional_uuid(row.get("parent_id")?, "conferences.parent_id")?,
    })
}

fn parse_edition_row(row: &Row<'_>) -> RepoResult<ConferenceEdition> {
    let id: String = row.get("id")?;
    let conference_id: String = row.get("conference_id")?;
    Ok(ConferenceEdition {
        id: parse_uuid(&id, "conference_editions.id")?,
        conference_id: parse_uuid(&conference_id, "conference_editions.conference_id")?,
        name: row.get("name")?,
        acronym: row.get("acronym")?,
        theme: row.get("theme")?,
        topics: row.get("topics")?,
        website: row.get("website")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        location: row.get("location")?,
        city: row.get("city")?,
        country: row.get("country")?,
        parent_id: parse_optional_uuid(row.get("parent_id")?, "conference_editions.parent_id")?,
    })
}

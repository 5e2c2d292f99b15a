//! Conference domain model: sponsors, conferences and their yearly editions.
//!
//! # Invariants
//! - `Conference::parent_id` and `ConferenceEdition::parent_id` are weak
//!   links: a child never owns its parent, and parent chains must not cycle.
//! - `ConferenceEdition::end_date` is not earlier than `start_date`.

use crate::model::validation::{
    country_code, max_len, optional_url, required_text, ValidationError, ValidationResult,
    ACRONYM_MAX_CHARS, NAME_MAX_CHARS, THEME_MAX_CHARS,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type SponsorId = Uuid;
pub type ConferenceId = Uuid;
pub type ConferenceEditionId = Uuid;

/// Professional or academic organisation running conferences (IEEE, AIS, ACM, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sponsor {
    pub id: SponsorId,
    pub name: String,
    pub acronym: String,
    pub website: String,
    pub description: String,
}

impl Sponsor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            acronym: String::new(),
            website: String::new(),
            description: String::new(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("name", &self.name, NAME_MAX_CHARS)?;
        max_len("acronym", &self.acronym, ACRONYM_MAX_CHARS)?;
        optional_url("website", &self.website)
    }
}

impl Display for Sponsor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Conference held yearly, optionally organised in conjunction with a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    pub id: ConferenceId,
    pub name: String,
    pub acronym: String,
    pub description: String,
    pub topic: String,
    pub website: String,
    pub sponsor_id: Option<SponsorId>,
    pub parent_id: Option<ConferenceId>,
}

impl Conference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            acronym: String::new(),
            description: String::new(),
            topic: String::new(),
            website: String::new(),
            sponsor_id: None,
            parent_id: None,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("name", &self.name, NAME_MAX_CHARS)?;
        max_len("acronym", &self.acronym, ACRONYM_MAX_CHARS)?;
        optional_url("website", &self.website)
    }
}

impl Display for Conference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Annual edition of a [`Conference`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceEdition {
    pub id: ConferenceEditionId,
    pub conference_id: ConferenceId,
    pub name: String,
    pub acronym: String,
    pub theme: String,
    pub topics: String,
    pub website: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    pub city: String,
    /// ISO 3166-1 alpha-2, upper case.
    pub country: String,
    pub parent_id: Option<ConferenceEditionId>,
}

impl ConferenceEdition {
    pub fn new(
        conference_id: ConferenceId,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        country: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conference_id,
            name: name.into(),
            acronym: String::new(),
            theme: String::new(),
            topics: String::new(),
            website: String::new(),
            start_date,
            end_date,
            location: String::new(),
            city: String::new(),
            country: country.into(),
            parent_id: None,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("name", &self.name, NAME_MAX_CHARS)?;
        max_len("acronym", &self.acronym, ACRONYM_MAX_CHARS)?;
        max_len("theme", &self.theme, THEME_MAX_CHARS)?;
        optional_url("website", &self.website)?;
        max_len("location", &self.location, NAME_MAX_CHARS)?;
        max_len("city", &self.city, NAME_MAX_CHARS)?;
        country_code(&self.country)?;
        if self.end_date < self.start_date {
            return Err(ValidationError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}

impl Display for ConferenceEdition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn edition_rejects_end_before_start() {
        let edition = ConferenceEdition::new(
            Uuid::new_v4(),
            "ICIS 2024",
            date(2024, 12, 15),
            date(2024, 12, 12),
            "TH",
        );
        assert!(matches!(
            edition.validate(),
            Err(ValidationError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn edition_accepts_single_day_event() {
        let edition = ConferenceEdition::new(
            Uuid::new_v4(),
            "Workshop",
            date(2024, 6, 1),
            date(2024, 6, 1),
            "FR",
        );
        assert!(edition.validate().is_ok());
        assert_eq!(edition.to_string(), "Workshop");
    }

    #[test]
    fn conference_requires_name() {
        let conference = Conference::new(" ");
        assert_eq!(
            conference.validate(),
            Err(ValidationError::Blank { field: "name" })
        );
    }
}

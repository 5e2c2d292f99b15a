//! University and university division domain model.

use crate::model::validation::{
    country_code, max_len, optional_url, required_text, ValidationResult, ACRONYM_MAX_CHARS,
    NAME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type UniversityId = Uuid;
pub type UniversityDivisionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    pub id: UniversityId,
    pub name: String,
    pub acronym: String,
    pub website: String,
    pub description: String,
    pub city: String,
    /// ISO 3166-1 alpha-2, upper case.
    pub country: String,
}

impl University {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            acronym: String::new(),
            website: String::new(),
            description: String::new(),
            city: String::new(),
            country: country.into(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("name", &self.name, NAME_MAX_CHARS)?;
        max_len("acronym", &self.acronym, ACRONYM_MAX_CHARS)?;
        optional_url("website", &self.website)?;
        max_len("city", &self.city, NAME_MAX_CHARS)?;
        country_code(&self.country)
    }
}

impl Display for University {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Division of a university together with its faculty/school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversityDivision {
    pub id: UniversityDivisionId,
    pub university_id: UniversityId,
    pub name: String,
    pub faculty: String,
    pub acronym: String,
    pub website: String,
    pub description: String,
}

impl UniversityDivision {
    pub fn new(
        university_id: UniversityId,
        name: impl Into<String>,
        faculty: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            university_id,
            name: name.into(),
            faculty: faculty.into(),
            acronym: String::new(),
            website: String::new(),
            description: String::new(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("name", &self.name, NAME_MAX_CHARS)?;
        required_text("faculty", &self.faculty, NAME_MAX_CHARS)?;
        max_len("acronym", &self.acronym, ACRONYM_MAX_CHARS)?;
        optional_url("website", &self.website)
    }
}

impl Display for UniversityDivision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

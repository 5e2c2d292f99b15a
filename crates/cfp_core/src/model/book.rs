//! Book publisher and book domain model.

use crate::model::validation::{
    max_len, optional_url, required_text, ValidationResult, ACRONYM_MAX_CHARS, NAME_MAX_CHARS,
    THEME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type BookPublisherId = Uuid;
pub type BookId = Uuid;

/// Professional or academic publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPublisher {
    pub id: BookPublisherId,
    pub name: String,
    pub acronym: String,
    pub website: String,
    pub description: String,
}

impl BookPublisher {
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

impl Display for BookPublisher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Book soliciting chapters, always owned by one publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub publisher_id: BookPublisherId,
    pub title: String,
    pub theme: String,
    pub topics: String,
    pub website: String,
    pub description: String,
}

impl Book {
    pub fn new(publisher_id: BookPublisherId, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            publisher_id,
            title: title.into(),
            theme: String::new(),
            topics: String::new(),
            website: String::new(),
            description: String::new(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("title", &self.title, NAME_MAX_CHARS)?;
        max_len("theme", &self.theme, THEME_MAX_CHARS)?;
        optional_url("website", &self.website)
    }
}

impl Display for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

//! Journal domain model.

use crate::model::validation::{
    max_len, optional_url, required_text, ValidationResult, ACRONYM_MAX_CHARS, NAME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type JournalId = Uuid;

/// Academic journal title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub id: JournalId,
    pub title: String,
    pub acronym: String,
    pub website: String,
    pub description: String,
    /// Quality indicator: the journal belongs to the reference basket.
    pub basket: bool,
}

impl Journal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            acronym: String::new(),
            website: String::new(),
            description: String::new(),
            basket: false,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("title", &self.title, NAME_MAX_CHARS)?;
        max_len("acronym", &self.acronym, ACRONYM_MAX_CHARS)?;
        optional_url("website", &self.website)
    }
}

/// Renders `title`, or `title (acronym)` when an acronym is set.
impl Display for Journal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.acronym.is_empty() {
            f.write_str(&self.title)
        } else {
            write!(f, "{} ({})", self.title, self.acronym)
        }
    }
}

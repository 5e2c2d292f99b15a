//! Call domain model and the closed set of entity kinds a call can target.
//!
//! # Invariants
//! - `CallKind` is the only discriminator for call targets; there is no
//!   runtime type registry.
//! - A call's `target` must resolve to an existing row of `target.kind`.
//! - A call's type must be scoped to the same kind as its target.

use crate::model::book::BookId;
use crate::model::conference::ConferenceEditionId;
use crate::model::journal::JournalId;
use crate::model::university::UniversityDivisionId;
use crate::model::validation::{
    optional_url, required_text, ValidationResult, NAME_MAX_CHARS, TYPE_NAME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type CallId = Uuid;
pub type CallTypeId = Uuid;

/// Entity kind a call can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    ConferenceEdition,
    Journal,
    Book,
    UniversityDivision,
}

impl CallKind {
    /// All kinds in index display order.
    pub const ALL: [CallKind; 4] = [
        CallKind::ConferenceEdition,
        CallKind::Journal,
        CallKind::Book,
        CallKind::UniversityDivision,
    ];

    /// Stable tag persisted in `calls.target_kind` and `call_types.target_kind`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConferenceEdition => "conference_edition",
            Self::Journal => "journal",
            Self::Book => "book",
            Self::UniversityDivision => "university_division",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "conference_edition" => Some(Self::ConferenceEdition),
            "journal" => Some(Self::Journal),
            "book" => Some(Self::Book),
            "university_division" => Some(Self::UniversityDivision),
            _ => None,
        }
    }

    /// Table holding the rows of this kind.
    pub fn table(self) -> &'static str {
        match self {
            Self::ConferenceEdition => "conference_editions",
            Self::Journal => "journals",
            Self::Book => "books",
            Self::UniversityDivision => "university_divisions",
        }
    }

    pub fn verbose_name(self) -> &'static str {
        match self {
            Self::ConferenceEdition => "edition",
            Self::Journal => "journal",
            Self::Book => "book",
            Self::UniversityDivision => "division",
        }
    }
}

impl Display for CallKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polymorphic `(kind, id)` reference from a call to its owner row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallTarget {
    pub kind: CallKind,
    pub id: Uuid,
}

impl CallTarget {
    pub fn conference_edition(id: ConferenceEditionId) -> Self {
        Self {
            kind: CallKind::ConferenceEdition,
            id,
        }
    }

    pub fn journal(id: JournalId) -> Self {
        Self {
            kind: CallKind::Journal,
            id,
        }
    }

    pub fn book(id: BookId) -> Self {
        Self {
            kind: CallKind::Book,
            id,
        }
    }

    pub fn university_division(id: UniversityDivisionId) -> Self {
        Self {
            kind: CallKind::UniversityDivision,
            id,
        }
    }
}

/// Classification of calls (paper, position, ...), scoped to one target kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallType {
    pub id: CallTypeId,
    pub name: String,
    pub target_kind: CallKind,
}

impl CallType {
    pub fn new(name: impl Into<String>, target_kind: CallKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target_kind,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("name", &self.name, TYPE_NAME_MAX_CHARS)
    }
}

impl Display for CallType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Call for papers/positions attached to exactly one catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: CallId,
    pub title: String,
    pub call_type_id: CallTypeId,
    pub content: String,
    pub url: String,
    pub target: CallTarget,
}

impl Call {
    pub fn new(title: impl Into<String>, call_type_id: CallTypeId, target: CallTarget) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            call_type_id,
            content: String::new(),
            url: String::new(),
            target,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("title", &self.title, NAME_MAX_CHARS)?;
        optional_url("url", &self.url)
    }
}

impl Display for Call {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::CallKind;

    #[test]
    fn kind_tags_parse_back() {
        for kind in CallKind::ALL {
            assert_eq!(CallKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(CallKind::parse("conference"), None);
    }

    #[test]
    fn kind_serializes_as_persisted_tag() {
        let json = serde_json::to_string(&CallKind::UniversityDivision).unwrap();
        assert_eq!(json, "\"university_division\"");
    }
}

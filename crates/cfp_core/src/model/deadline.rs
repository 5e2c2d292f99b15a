//! Deadline domain model.
//!
//! # Invariants
//! - Deadlines are ordered with respect to their call through `sort_order`.
//! - `extension` should be later than `date`; violations are reported as
//!   warnings, never rejected.

use crate::model::call::CallId;
use crate::model::validation::{required_text, ValidationResult, TYPE_NAME_MAX_CHARS};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type DeadlineId = Uuid;
pub type DeadlineTypeId = Uuid;

/// Classification of deadlines (submission, acceptance, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineType {
    pub id: DeadlineTypeId,
    pub name: String,
}

impl DeadlineType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("name", &self.name, TYPE_NAME_MAX_CHARS)
    }
}

impl Display for DeadlineType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// One dated milestone of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: DeadlineId,
    pub call_id: CallId,
    pub deadline_type_id: DeadlineTypeId,
    pub date: NaiveDate,
    pub extension: Option<NaiveDate>,
    pub mandatory: bool,
    /// Position among the deadlines of the same call. Assigned by storage.
    pub sort_order: i64,
}

/// Non-blocking validation finding returned alongside a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationWarning {
    ExtensionNotAfterDate {
        date: NaiveDate,
        extension: NaiveDate,
    },
}

impl Display for ValidationWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExtensionNotAfterDate { date, extension } => write!(
                f,
                "extension {extension} is not later than deadline date {date}"
            ),
        }
    }
}

impl Deadline {
    pub fn new(call_id: CallId, deadline_type_id: DeadlineTypeId, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            call_id,
            deadline_type_id,
            date,
            extension: None,
            mandatory: false,
            sort_order: 0,
        }
    }

    pub fn warnings(&self) -> Vec<ValidationWarning> {
        match self.extension {
            Some(extension) if extension <= self.date => {
                vec![ValidationWarning::ExtensionNotAfterDate {
                    date: self.date,
                    extension,
                }]
            }
            _ => Vec::new(),
        }
    }

    /// Display label given the name of this deadline's type.
    pub fn label(&self, type_name: &str) -> String {
        deadline_label(self.date, self.extension, type_name)
    }
}

/// Renders `"{extension} - {type} (extended)"` or `"{date} - {type}"` with ISO dates.
pub fn deadline_label(date: NaiveDate, extension: Option<NaiveDate>, type_name: &str) -> String {
    match extension {
        Some(extension) => format!("{} - {type_name} (extended)", extension.format("%Y-%m-%d")),
        None => format!("{} - {type_name}", date.format("%Y-%m-%d")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn label_uses_date_without_extension() {
        let deadline = Deadline::new(Uuid::new_v4(), Uuid::new_v4(), date(2024, 3, 1));
        assert_eq!(deadline.label("Submission"), "2024-03-01 - Submission");
    }

    #[test]
    fn label_uses_extension_when_set() {
        let mut deadline = Deadline::new(Uuid::new_v4(), Uuid::new_v4(), date(2024, 3, 1));
        deadline.extension = Some(date(2024, 3, 15));
        assert_eq!(
            deadline.label("Submission"),
            "2024-03-15 - Submission (extended)"
        );
    }

    #[test]
    fn extension_before_date_is_a_warning() {
        let mut deadline = Deadline::new(Uuid::new_v4(), Uuid::new_v4(), date(2024, 3, 1));
        assert!(deadline.warnings().is_empty());

        deadline.extension = Some(date(2024, 2, 20));
        assert_eq!(
            deadline.warnings(),
            vec![ValidationWarning::ExtensionNotAfterDate {
                date: date(2024, 3, 1),
                extension: date(2024, 2, 20),
            }]
        );
    }
}

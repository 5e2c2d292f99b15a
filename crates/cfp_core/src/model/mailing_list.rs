//! Mailing list domain model.
//!
//! # Invariants
//! - `MailingListMessage::timestamp` is assigned by storage at insert time
//!   and never changes afterwards.
//! - `(mailing_list_id, external_message_id)` identifies one message.

use crate::model::call::CallId;
use crate::model::validation::{
    max_len, optional_url, required_text, ValidationResult, ACRONYM_MAX_CHARS, NAME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type MailingListId = Uuid;
pub type MailingListMessageId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailingList {
    pub id: MailingListId,
    pub name: String,
    pub acronym: String,
    pub topic: String,
    pub website: String,
}

impl MailingList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            acronym: String::new(),
            topic: String::new(),
            website: String::new(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required_text("name", &self.name, NAME_MAX_CHARS)?;
        max_len("acronym", &self.acronym, ACRONYM_MAX_CHARS)?;
        optional_url("website", &self.website)
    }
}

impl Display for MailingList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Inbound message received from a mailing list and matched to a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailingListMessage {
    pub id: MailingListMessageId,
    pub mailing_list_id: MailingListId,
    pub call_id: CallId,
    pub subject: String,
    pub sender: String,
    /// Raw header block as received.
    pub headers: String,
    pub message: String,
    /// Epoch milliseconds of receipt. Ignored on insert and update.
    pub timestamp: i64,
    /// Identifier assigned by the mail source, used for deduplication.
    pub external_message_id: String,
}

impl MailingListMessage {
    pub fn validate(&self) -> ValidationResult {
        required_text("subject", &self.subject, NAME_MAX_CHARS)?;
        max_len("sender", &self.sender, NAME_MAX_CHARS)?;
        required_text(
            "external_message_id",
            &self.external_message_id,
            NAME_MAX_CHARS,
        )
    }

    /// Display label given the list this message was received from.
    pub fn label(&self, mailing_list: &MailingList) -> String {
        message_label(&mailing_list.acronym, &self.subject)
    }
}

/// Renders `"[{acronym}] {subject}"`.
pub fn message_label(mailing_list_acronym: &str, subject: &str) -> String {
    format!("[{mailing_list_acronym}] {subject}")
}

#[cfg(test)]
mod tests {
    use super::{message_label, MailingList};

    #[test]
    fn label_prefixes_list_acronym() {
        assert_eq!(
            message_label("AISWorld", "CFP: ECIS 2025"),
            "[AISWorld] CFP: ECIS 2025"
        );
    }

    #[test]
    fn list_label_is_name() {
        assert_eq!(MailingList::new("AIS World").to_string(), "AIS World");
    }
}

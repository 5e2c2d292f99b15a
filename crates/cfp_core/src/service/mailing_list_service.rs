//! Mailing list administration and inbound message ingestion.
//!
//! # Responsibility
//! - Mailing list CRUD and message maintenance for the admin surface.
//! - Turn raw inbound mail into stored messages exactly once.
//!
//! # Invariants
//! - Ingesting the same `(mailing list, Message-ID)` twice stores one row.
//! - Logs carry ids and outcome only, never subjects or bodies.

use crate::model::call::CallId;
use crate::model::mailing_list::{
    MailingList, MailingListId, MailingListMessage, MailingListMessageId,
};
use crate::model::validation::ValidationError;
use crate::repo::common::{DeleteMode, RepoError, RepoResult};
use crate::repo::mailing_list_repo::{MailingListRepository, MessageInsert};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

static HEADER_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([!-9;-~]+):[ \t]*(.*)$").expect("valid header line regex"));

/// Message received from a mail source, before storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub mailing_list_id: MailingListId,
    pub call_id: CallId,
    pub subject: String,
    pub sender: String,
    pub headers: String,
    pub body: String,
    pub external_message_id: String,
}

impl InboundMessage {
    /// Builds a message from a raw RFC 5322 header block and body.
    ///
    /// Folded header lines are unfolded before matching. `Subject` and
    /// `From` default to empty; a missing `Message-ID` is rejected.
    pub fn from_raw(
        mailing_list_id: MailingListId,
        call_id: CallId,
        raw_headers: &str,
        body: &str,
    ) -> Result<Self, ValidationError> {
        let headers = unfold_headers(raw_headers);
        let external_message_id = header_value(&headers, "message-id")
            .filter(|value| !value.is_empty())
            .ok_or(ValidationError::Blank {
                field: "Message-ID",
            })?;

        Ok(Self {
            mailing_list_id,
            call_id,
            subject: header_value(&headers, "subject").unwrap_or_default(),
            sender: header_value(&headers, "from").unwrap_or_default(),
            headers: raw_headers.to_string(),
            body: body.to_string(),
            external_message_id,
        })
    }

    fn into_message(self) -> MailingListMessage {
        MailingListMessage {
            id: Uuid::new_v4(),
            mailing_list_id: self.mailing_list_id,
            call_id: self.call_id,
            subject: self.subject,
            sender: self.sender,
            headers: self.headers,
            message: self.body,
            timestamp: 0,
            external_message_id: self.external_message_id,
        }
    }
}

/// Result of [`MailingListService::ingest_message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// New message stored.
    Created(MailingListMessage),
    /// Same list and Message-ID already stored; nothing was written.
    Duplicate(MailingListMessage),
}

impl IngestOutcome {
    pub fn message(&self) -> &MailingListMessage {
        match self {
            Self::Created(message) | Self::Duplicate(message) => message,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// Mailing list service facade.
pub struct MailingListService<R: MailingListRepository> {
    repo: R,
}

impl<R: MailingListRepository> MailingListService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_mailing_list(&self, mailing_list: &MailingList) -> RepoResult<MailingList> {
        let id = self.repo.create_mailing_list(mailing_list)?;
        self.load_mailing_list(id)
    }

    pub fn update_mailing_list(&self, mailing_list: &MailingList) -> RepoResult<MailingList> {
        self.repo.update_mailing_list(mailing_list)?;
        self.load_mailing_list(mailing_list.id)
    }

    pub fn get_mailing_list(&self, id: MailingListId) -> RepoResult<Option<MailingList>> {
        self.repo.get_mailing_list(id)
    }

    pub fn list_mailing_lists(&self) -> RepoResult<Vec<MailingList>> {
        self.repo.list_mailing_lists()
    }

    pub fn delete_mailing_list(&self, id: MailingListId, mode: DeleteMode) -> RepoResult<()> {
        self.repo.delete_mailing_list(id, mode)?;
        info!("event=catalog_delete module=service entity=mailing_list mode={mode:?} status=ok");
        Ok(())
    }

    /// Stores an inbound message unless its Message-ID was already seen on
    /// the same list.
    pub fn ingest_message(&self, inbound: InboundMessage) -> RepoResult<IngestOutcome> {
        let mailing_list_id = inbound.mailing_list_id;
        let call_id = inbound.call_id;
        let result = self.repo.insert_message(&inbound.into_message());
        match result {
            Ok(MessageInsert::Inserted(message)) => {
                info!(
                    "event=message_ingest module=service status=created mailing_list_id={mailing_list_id} call_id={call_id} message_id={}",
                    message.id
                );
                Ok(IngestOutcome::Created(message))
            }
            Ok(MessageInsert::AlreadyPresent(message)) => {
                info!(
                    "event=message_ingest module=service status=duplicate mailing_list_id={mailing_list_id} call_id={call_id} message_id={}",
                    message.id
                );
                Ok(IngestOutcome::Duplicate(message))
            }
            Err(err) => {
                info!(
                    "event=message_ingest module=service status=error mailing_list_id={mailing_list_id} call_id={call_id}"
                );
                Err(err)
            }
        }
    }

    /// Updates a stored message. The receipt timestamp is kept.
    pub fn update_message(&self, message: &MailingListMessage) -> RepoResult<MailingListMessage> {
        self.repo.update_message(message)
    }

    pub fn get_message(&self, id: MailingListMessageId) -> RepoResult<Option<MailingListMessage>> {
        self.repo.get_message(id)
    }

    /// Lists messages newest first, optionally for one call.
    pub fn list_messages(&self, call_id: Option<CallId>) -> RepoResult<Vec<MailingListMessage>> {
        self.repo.list_messages(call_id)
    }

    pub fn delete_message(&self, id: MailingListMessageId) -> RepoResult<()> {
        self.repo.delete_message(id)
    }

    /// Renders `"[{list acronym}] {subject}"` for a stored message.
    pub fn message_label(&self, id: MailingListMessageId) -> RepoResult<Option<String>> {
        let Some(message) = self.repo.get_message(id)? else {
            return Ok(None);
        };
        let mailing_list = self.load_mailing_list(message.mailing_list_id)?;
        Ok(Some(message.label(&mailing_list)))
    }

    fn load_mailing_list(&self, id: MailingListId) -> RepoResult<MailingList> {
        self.repo.get_mailing_list(id)?.ok_or(RepoError::NotFound {
            entity: "mailing list",
            id,
        })
    }
}

/// Joins continuation lines (leading space or tab) onto the header above.
fn unfold_headers(raw_headers: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in raw_headers.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        if line.starts_with([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push(' ');
                last.push_str(line.trim_start());
                continue;
            }
        }
        lines.push(line.to_string());
    }
    lines
}

/// First value of header `name` (case-insensitive), trimmed.
fn header_value(lines: &[String], name: &str) -> Option<String> {
    lines.iter().find_map(|line| {
        let captures = HEADER_LINE_RE.captures(line)?;
        if captures[1].eq_ignore_ascii_case(name) {
            Some(captures[2].trim().to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::InboundMessage;
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    const RAW: &str = "From: Program Chairs <chairs@example.org>\r\n\
Subject: CFP: ECIS 2025,\r\n Track on Digital Platforms\r\n\
Message-ID: <abc123@lists.example.org>\r\n\
Content-Type: text/plain\r\n";

    #[test]
    fn from_raw_extracts_and_unfolds_headers() {
        let inbound =
            InboundMessage::from_raw(Uuid::new_v4(), Uuid::new_v4(), RAW, "Dear colleagues")
                .unwrap();
        assert_eq!(
            inbound.subject,
            "CFP: ECIS 2025, Track on Digital Platforms"
        );
        assert_eq!(inbound.sender, "Program Chairs <chairs@example.org>");
        assert_eq!(inbound.external_message_id, "<abc123@lists.example.org>");
        assert_eq!(inbound.headers, RAW);
        assert_eq!(inbound.body, "Dear colleagues");
        assert!(inbound.into_message().validate().is_ok());
    }

    #[test]
    fn header_names_match_case_insensitively() {
        let raw = "subject: hello\nmessage-id: <x@y>\n";
        let inbound = InboundMessage::from_raw(Uuid::new_v4(), Uuid::new_v4(), raw, "").unwrap();
        assert_eq!(inbound.subject, "hello");
        assert_eq!(inbound.external_message_id, "<x@y>");
        assert_eq!(inbound.sender, "");
    }

    #[test]
    fn missing_message_id_is_rejected() {
        let raw = "Subject: no id here\n";
        let err = InboundMessage::from_raw(Uuid::new_v4(), Uuid::new_v4(), raw, "").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Blank {
                field: "Message-ID"
            }
        );
    }

    #[test]
    fn headers_stop_at_blank_line() {
        let raw = "Subject: top\n\nMessage-ID: <in-body@x>\n";
        assert!(InboundMessage::from_raw(Uuid::new_v4(), Uuid::new_v4(), raw, "").is_err());
    }
}

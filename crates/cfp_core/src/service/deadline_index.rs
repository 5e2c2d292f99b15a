//! Read-only index of mandatory deadlines, grouped by call target kind.
//!
//! # Invariants
//! - Only deadlines flagged `mandatory` are listed.
//! - Each group is ordered by `date` descending, ties by deadline id.
//! - The index never writes.

use crate::model::call::{CallId, CallKind, CallTarget};
use crate::model::deadline::Deadline;
use crate::repo::call_repo::CallRepository;
use crate::repo::common::{RepoError, RepoResult};
use crate::repo::deadline_repo::{DeadlineRepository, MandatoryDeadlineRow};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

/// One row of the deadline index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineListing {
    pub deadline: Deadline,
    pub deadline_type_name: String,
    /// Deadline display label, e.g. `"2024-03-01 - Submission"`.
    pub label: String,
    pub call_id: CallId,
    pub call_title: String,
    pub call_url: String,
    pub target: CallTarget,
    pub target_label: String,
}

/// Mandatory deadlines split by the kind of entity their call targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeadlineIndex {
    pub editions: Vec<DeadlineListing>,
    pub journals: Vec<DeadlineListing>,
    pub books: Vec<DeadlineListing>,
    pub divisions: Vec<DeadlineListing>,
}

impl DeadlineIndex {
    pub fn for_kind(&self, kind: CallKind) -> &[DeadlineListing] {
        match kind {
            CallKind::ConferenceEdition => &self.editions,
            CallKind::Journal => &self.journals,
            CallKind::Book => &self.books,
            CallKind::UniversityDivision => &self.divisions,
        }
    }

    pub fn is_empty(&self) -> bool {
        CallKind::ALL
            .iter()
            .all(|kind| self.for_kind(*kind).is_empty())
    }
}

/// Builds the deadline index from deadline and call repositories.
pub struct DeadlineIndexService<D: DeadlineRepository, C: CallRepository> {
    deadlines: D,
    calls: C,
}

impl<D: DeadlineRepository, C: CallRepository> DeadlineIndexService<D, C> {
    pub fn new(deadlines: D, calls: C) -> Self {
        Self { deadlines, calls }
    }

    /// Lists mandatory deadlines for every kind.
    pub fn index(&self) -> RepoResult<DeadlineIndex> {
        let mut labels = HashMap::new();
        let index = DeadlineIndex {
            editions: self.listings(CallKind::ConferenceEdition, &mut labels)?,
            journals: self.listings(CallKind::Journal, &mut labels)?,
            books: self.listings(CallKind::Book, &mut labels)?,
            divisions: self.listings(CallKind::UniversityDivision, &mut labels)?,
        };
        debug!(
            "event=deadline_index module=service status=ok editions={} journals={} books={} divisions={}",
            index.editions.len(),
            index.journals.len(),
            index.books.len(),
            index.divisions.len()
        );
        Ok(index)
    }

    /// Lists mandatory deadlines whose call targets `kind`, latest first.
    pub fn list_mandatory_deadlines(&self, kind: CallKind) -> RepoResult<Vec<DeadlineListing>> {
        self.listings(kind, &mut HashMap::new())
    }

    fn listings(
        &self,
        kind: CallKind,
        labels: &mut HashMap<CallTarget, String>,
    ) -> RepoResult<Vec<DeadlineListing>> {
        let rows = self.deadlines.list_mandatory_by_kind(kind)?;
        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            let target_label = match labels.get(&row.target) {
                Some(label) => label.clone(),
                None => {
                    let label = self.calls.target_label(row.target)?.ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "call {} targets missing {} {}",
                            row.deadline.call_id, row.target.kind, row.target.id
                        ))
                    })?;
                    labels.insert(row.target, label.clone());
                    label
                }
            };
            listings.push(into_listing(row, target_label));
        }
        Ok(listings)
    }
}

fn into_listing(row: MandatoryDeadlineRow, target_label: String) -> DeadlineListing {
    DeadlineListing {
        label: row.deadline.label(&row.deadline_type_name),
        call_id: row.deadline.call_id,
        deadline: row.deadline,
        deadline_type_name: row.deadline_type_name,
        call_title: row.call_title,
        call_url: row.call_url,
        target: row.target,
        target_label,
    }
}

//! Call, call type, deadline and deadline type use-case service.
//!
//! # Responsibility
//! - Admin CRUD for calls and everything hanging off a call.
//! - Provide the per-kind choice lists used by call forms.
//!
//! # Invariants
//! - Deadline writes succeed with warnings attached instead of failing on
//!   a suspicious extension date.

use crate::model::call::{Call, CallId, CallKind, CallTarget, CallType, CallTypeId};
use crate::model::deadline::{
    Deadline, DeadlineId, DeadlineType, DeadlineTypeId, ValidationWarning,
};
use crate::repo::call_repo::{CallRepository, TargetChoice};
use crate::repo::common::{DeleteMode, RepoError, RepoResult};
use crate::repo::deadline_repo::DeadlineRepository;
use log::{info, warn};
use serde::Serialize;

/// Stored deadline plus the non-blocking findings of the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineWrite {
    pub deadline: Deadline,
    pub warnings: Vec<ValidationWarning>,
}

/// Call catalog service facade.
pub struct CallService<C: CallRepository, D: DeadlineRepository> {
    calls: C,
    deadlines: D,
}

impl<C: CallRepository, D: DeadlineRepository> CallService<C, D> {
    pub fn new(calls: C, deadlines: D) -> Self {
        Self { calls, deadlines }
    }

    pub fn create_call_type(&self, call_type: &CallType) -> RepoResult<CallType> {
        let id = self.calls.create_call_type(call_type)?;
        self.load_call_type(id)
    }

    /// Updates a call type. Changing its kind fails while calls of the old
    /// kind still use it.
    pub fn update_call_type(&self, call_type: &CallType) -> RepoResult<CallType> {
        self.calls.update_call_type(call_type)?;
        self.load_call_type(call_type.id)
    }

    pub fn get_call_type(&self, id: CallTypeId) -> RepoResult<Option<CallType>> {
        self.calls.get_call_type(id)
    }

    pub fn list_call_types(&self) -> RepoResult<Vec<CallType>> {
        self.calls.list_call_types(None)
    }

    /// Call types usable for calls targeting `kind`.
    pub fn call_types_for_kind(&self, kind: CallKind) -> RepoResult<Vec<CallType>> {
        self.calls.list_call_types(Some(kind))
    }

    pub fn delete_call_type(&self, id: CallTypeId, mode: DeleteMode) -> RepoResult<()> {
        self.calls.delete_call_type(id, mode)?;
        info!("event=catalog_delete module=service entity=call_type mode={mode:?} status=ok");
        Ok(())
    }

    pub fn create_call(&self, call: &Call) -> RepoResult<Call> {
        let id = self.calls.create_call(call)?;
        info!(
            "event=call_create module=service kind={} status=ok",
            call.target.kind
        );
        self.load_call(id)
    }

    pub fn update_call(&self, call: &Call) -> RepoResult<Call> {
        self.calls.update_call(call)?;
        self.load_call(call.id)
    }

    pub fn get_call(&self, id: CallId) -> RepoResult<Option<Call>> {
        self.calls.get_call(id)
    }

    pub fn list_calls(&self) -> RepoResult<Vec<Call>> {
        self.calls.list_calls(None)
    }

    pub fn list_calls_for_kind(&self, kind: CallKind) -> RepoResult<Vec<Call>> {
        self.calls.list_calls(Some(kind))
    }

    pub fn list_calls_for_target(&self, target: CallTarget) -> RepoResult<Vec<Call>> {
        self.calls.list_calls_for_target(target)
    }

    pub fn delete_call(&self, id: CallId, mode: DeleteMode) -> RepoResult<()> {
        self.calls.delete_call(id, mode)?;
        info!("event=catalog_delete module=service entity=call mode={mode:?} status=ok");
        Ok(())
    }

    /// Selectable targets of `kind`, labelled for display.
    pub fn target_choices(&self, kind: CallKind) -> RepoResult<Vec<TargetChoice>> {
        self.calls.target_choices(kind)
    }

    /// Label of the row a call points at, `None` when it no longer exists.
    pub fn target_label(&self, target: CallTarget) -> RepoResult<Option<String>> {
        self.calls.target_label(target)
    }

    pub fn create_deadline_type(&self, deadline_type: &DeadlineType) -> RepoResult<DeadlineType> {
        let id = self.deadlines.create_deadline_type(deadline_type)?;
        self.load_deadline_type(id)
    }

    pub fn update_deadline_type(&self, deadline_type: &DeadlineType) -> RepoResult<DeadlineType> {
        self.deadlines.update_deadline_type(deadline_type)?;
        self.load_deadline_type(deadline_type.id)
    }

    pub fn get_deadline_type(&self, id: DeadlineTypeId) -> RepoResult<Option<DeadlineType>> {
        self.deadlines.get_deadline_type(id)
    }

    pub fn list_deadline_types(&self) -> RepoResult<Vec<DeadlineType>> {
        self.deadlines.list_deadline_types()
    }

    pub fn delete_deadline_type(&self, id: DeadlineTypeId, mode: DeleteMode) -> RepoResult<()> {
        self.deadlines.delete_deadline_type(id, mode)?;
        info!("event=catalog_delete module=service entity=deadline_type mode={mode:?} status=ok");
        Ok(())
    }

    /// Appends a deadline to its call.
    pub fn create_deadline(&self, deadline: &Deadline) -> RepoResult<DeadlineWrite> {
        let stored = self.deadlines.create_deadline(deadline)?;
        Ok(with_warnings(stored))
    }

    pub fn update_deadline(&self, deadline: &Deadline) -> RepoResult<DeadlineWrite> {
        let stored = self.deadlines.update_deadline(deadline)?;
        Ok(with_warnings(stored))
    }

    pub fn get_deadline(&self, id: DeadlineId) -> RepoResult<Option<Deadline>> {
        self.deadlines.get_deadline(id)
    }

    pub fn list_deadlines(&self) -> RepoResult<Vec<Deadline>> {
        self.deadlines.list_deadlines()
    }

    pub fn list_deadlines_for_call(&self, call_id: CallId) -> RepoResult<Vec<Deadline>> {
        self.deadlines.list_deadlines_for_call(call_id)
    }

    /// Rewrites the order of a call's deadlines. `ordered_ids` must hold
    /// each of them exactly once.
    pub fn set_deadline_order(
        &self,
        call_id: CallId,
        ordered_ids: &[DeadlineId],
    ) -> RepoResult<()> {
        self.deadlines.set_deadline_order(call_id, ordered_ids)
    }

    /// The call's deadline with the most recent `date`.
    pub fn latest_deadline(&self, call_id: CallId) -> RepoResult<Option<Deadline>> {
        self.deadlines.latest_deadline(call_id)
    }

    pub fn delete_deadline(&self, id: DeadlineId) -> RepoResult<()> {
        self.deadlines.delete_deadline(id)
    }

    /// Renders the display label of a stored deadline.
    pub fn deadline_label(&self, id: DeadlineId) -> RepoResult<Option<String>> {
        let Some(deadline) = self.deadlines.get_deadline(id)? else {
            return Ok(None);
        };
        let deadline_type = self.load_deadline_type(deadline.deadline_type_id)?;
        Ok(Some(deadline.label(&deadline_type.name)))
    }

    fn load_call_type(&self, id: CallTypeId) -> RepoResult<CallType> {
        self.calls.get_call_type(id)?.ok_or(RepoError::NotFound {
            entity: "call type",
            id,
        })
    }

    fn load_call(&self, id: CallId) -> RepoResult<Call> {
        self.calls
            .get_call(id)?
            .ok_or(RepoError::NotFound { entity: "call", id })
    }

    fn load_deadline_type(&self, id: DeadlineTypeId) -> RepoResult<DeadlineType> {
        self.deadlines
            .get_deadline_type(id)?
            .ok_or(RepoError::NotFound {
                entity: "deadline type",
                id,
            })
    }
}

fn with_warnings(deadline: Deadline) -> DeadlineWrite {
    let warnings = deadline.warnings();
    for warning in &warnings {
        match warning {
            ValidationWarning::ExtensionNotAfterDate { .. } => warn!(
                "event=deadline_write module=service status=warning code=extension_not_after_date deadline_id={}",
                deadline.id
            ),
        }
    }
    DeadlineWrite { deadline, warnings }
}

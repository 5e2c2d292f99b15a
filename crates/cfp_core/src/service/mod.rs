//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into admin and index level APIs.
//! - Enforce invariants that span several rows (parent chains, ingestion
//!   dedup, mandatory-deadline listing).
//!
//! # Invariants
//! - Services never bypass repository validation and reference checks.
//! - Write paths return the record as stored.

pub mod call_service;
pub mod conference_service;
pub mod deadline_index;
pub mod mailing_list_service;
pub mod publication_service;
pub mod university_service;

pub use crate::repo::common::MAX_PARENT_DEPTH;

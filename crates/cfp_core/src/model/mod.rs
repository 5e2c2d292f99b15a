//! Catalog domain model.
//!
//! # Responsibility
//! - Define the records stored for conferences, journals, books,
//!   universities, calls, deadlines and mailing lists.
//! - Own field validation and display label rules.
//!
//! # Invariants
//! - Every record is identified by a stable UUID generated at creation.
//! - Records are plain data; reference checks live in the repository layer.

pub mod book;
pub mod call;
pub mod conference;
pub mod deadline;
pub mod journal;
pub mod mailing_list;
pub mod university;
pub mod validation;

//! Domain model for registry-managed records.
//!
//! # Responsibility
//! - Define the record shape shared by every record type.
//! - Define the tagged value used for free-form attributes.
//!
//! # Invariants
//! - Every record is identified by `Type.id`, unique across the registry.
//! - Record types are a closed set; no dynamic type lookup.

pub mod record;
pub mod value;

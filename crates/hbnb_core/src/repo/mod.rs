//! Record registry.
//!
//! # Responsibility
//! - Hold the live record set and mediate every mutation of it.
//! - Delegate durable storage to an `ObjectStore` backend.
//!
//! # Invariants
//! - Registry APIs return semantic errors (`NotFound`) in addition to
//!   storage errors.

pub mod registry;

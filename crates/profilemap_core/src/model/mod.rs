//! Domain model for location-tagged profile records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own input validation so every write path shares one rule set.
//!
//! # Invariants
//! - Every profile is identified by a stable `ProfileId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod profile;

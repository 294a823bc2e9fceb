//! Common type definitions shared across the crate.
//!
//! This module defines:
//! - Type aliases for entity IDs (`UserId`, `CourseId`, `ContentId`)
//! - The [`Operation`] enum used to describe denied actions in
//!   authorization errors
//! - [`abbrev_uuid`] for readable IDs in log fields

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type CourseId = Uuid;
pub type ContentId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Operations that can be performed on resources. Carried in authorization
/// errors so denials name the action that was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

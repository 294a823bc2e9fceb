//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides
//! strongly-typed operations, and returns domain models from
//! [`crate::db::models`].
//!
//! - [`Users`]: the credential store: account records, the combined
//!   username-or-email lookup, and the session binding slot
//! - [`Courses`]: courses plus their content attachments and enrollments
//! - [`Contents`]: content items with filtered, paginated listing

pub mod contents;
pub mod courses;
pub mod repository;
pub mod users;

pub use contents::Contents;
pub use courses::Courses;
pub use repository::Repository;
pub use users::Users;

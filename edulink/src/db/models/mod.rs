//! Database record structures, separate from the API contract so storage and
//! API representations can evolve independently.

pub mod contents;
pub mod courses;
pub mod users;

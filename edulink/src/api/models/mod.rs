//! API request and response data models.
//!
//! These structures define the public API contract and are distinct from
//! the database models in [`crate::db::models`], so the API and storage
//! representations can evolve independently. All models are annotated with
//! `utoipa` for the generated API documentation.
//!
//! - [`auth`]: login, renewal and logout payloads, cookie-bearing responses
//! - [`users`]: the role enumeration and identity snapshots
//! - [`courses`]: course CRUD payloads
//! - [`contents`]: content payloads and the filtered listing query
//! - [`pagination`]: shared pagination parameters

pub mod auth;
pub mod contents;
pub mod courses;
pub mod pagination;
pub mod users;

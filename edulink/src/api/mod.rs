//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! The API is mounted under `/api/v1`:
//!
//! - **Authentication** (`/api/v1/users/*`): signup, login, logout, token
//!   renewal, current identity, role-guarded dashboard
//! - **Courses** (`/api/v1/courses/*`): CRUD, enrollment, content attachment
//! - **Contents** (`/api/v1/contents/*`): upload, filtered listing, deletion
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`;
//! the rendered documentation is served at `/docs`.

pub mod handlers;
pub mod models;

//! Authentication and authorization subsystem.
//!
//! # Credential lifecycle
//!
//! - Passwords are hashed with Argon2id ([`password`]) before they ever
//!   reach the credential store; verification delegates to the hash's own
//!   constant-time comparison.
//! - Two classes of signed, time-bounded tokens are minted with independent
//!   secrets ([`tokens`]): short-lived access tokens carrying subject and
//!   role, long-lived refresh tokens carrying the subject only.
//! - The currently valid refresh token is persisted in a single slot on the
//!   identity record ([`session`]). Every renewal overwrites the slot, which
//!   implicitly revokes the previous token; there is no blacklist and no
//!   grace window.
//!
//! # Request-side checks
//!
//! - [`current_user`]: the auth gate. Extracts the access credential from
//!   the Authorization header or cookie, verifies it, loads the identity and
//!   attaches it to the request. Access tokens are accepted on signature and
//!   expiry alone; the refresh slot is never consulted here.
//! - [`policy`]: the role guard and the ownership policy, composed after the
//!   gate by handlers that need them.

pub mod current_user;
pub mod password;
pub mod policy;
pub mod session;
pub mod tokens;

//! Authorization checks layered after the auth gate.
//!
//! Two rules cover every protected operation:
//!
//! - [`authorize`]: the role guard, a pure membership test of the caller's
//!   role against an explicit allow-set. There is no role hierarchy; an
//!   allow-set that intends to admit admins must name `Role::Admin`.
//! - [`authorize_owner`]: the ownership policy, which passes when the caller
//!   created the resource or holds one of the override roles. Evaluated
//!   after the resource is loaded, because it needs the stored creator.

use crate::api::models::users::{CurrentUser, Role};
use crate::errors::{Error, Result};
use crate::types::{Operation, UserId};

/// Pass iff the caller's role is in the allow-set.
pub fn authorize(user: &CurrentUser, allowed: &[Role], action: Operation, resource: &str) -> Result<()> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action,
            resource: resource.to_string(),
        })
    }
}

/// Pass iff the caller created the resource, or holds an override role.
pub fn authorize_owner(
    user: &CurrentUser,
    creator: UserId,
    override_roles: &[Role],
    action: Operation,
    resource: &str,
) -> Result<()> {
    if user.id == creator || override_roles.contains(&user.role) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action,
            resource: resource.to_string(),
        })
    }
}

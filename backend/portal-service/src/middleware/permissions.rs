/// Authorization helpers for portal-service
///
/// Ownership is a plain id comparison against the record's owner field.
/// Admin status comes from the identity provider's session claim only; the
/// local `users.role` column is never consulted.
use crate::error::{AppError, Result};
use crate::models::{Actor, Role};
use crypto_core::SessionClaims;
use uuid::Uuid;

pub fn is_owner(actor_user_id: Uuid, record_owner_id: Uuid) -> bool {
    actor_user_id == record_owner_id
}

pub fn is_admin(claims: &SessionClaims) -> bool {
    claims.has_role(Role::Admin.as_str())
}

/// Role derived from the session claim
pub fn role_from_claims(claims: &SessionClaims) -> Role {
    if is_admin(claims) {
        Role::Admin
    } else {
        Role::User
    }
}

/// Forbidden unless the actor owns the record
pub fn ensure_owner(actor: &Actor, record_owner_id: Uuid, what: &str) -> Result<()> {
    if is_owner(actor.user_id, record_owner_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You don't have permission to modify this {}",
            what
        )))
    }
}

/// Admin-only operations answer 401 for everyone else
pub fn ensure_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Unauthenticated("Unauthorized".to_string()))
    }
}

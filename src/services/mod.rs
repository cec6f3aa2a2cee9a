//! Per-entity list and mutation flows.
//!
//! Services sit between the route handlers and the repository traits. Reads
//! return [`ServiceResult`]; mutations return the `{ result, errors }`
//! contract consumed by the list controller, where rejected input becomes
//! field errors and everything else is a [`TransportError`].

use thiserror::Error;

use crate::domain::auth::AuthenticatedUser;
use crate::forms::FormError;
use crate::list::mutation::{FieldError, INTERNAL_FIELD, MutationResponse, TransportError};
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::errors::{RepositoryError, RepositoryResult};

pub mod api;
pub mod api_usage;
pub mod communication;
pub mod contact;
pub mod event;
pub mod export;
pub mod extraction;
pub mod list;
pub mod report;
pub mod resource;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("invalid form: {0}")]
    Form(String),

    #[error("{0}")]
    TypeConstraint(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("internal error")]
    Internal,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Outcome of a mutation as seen by the list controller.
pub type MutationResult<T> = Result<MutationResponse<T>, TransportError>;

/// Permissions of a user allowed to see the dashboard at all.
pub fn ensure_viewer(user: &AuthenticatedUser) -> ServiceResult<Permissions> {
    let permissions = Permissions::for_user(user);
    if permissions.can_view() {
        Ok(permissions)
    } else {
        Err(ServiceError::Unauthorized)
    }
}

pub fn ensure_capability(
    user: &AuthenticatedUser,
    entity: PermissionEntity,
    capability: Capability,
) -> ServiceResult<Permissions> {
    let permissions = ensure_viewer(user)?;
    if permissions.allows(entity, capability) {
        Ok(permissions)
    } else {
        Err(ServiceError::Unauthorized)
    }
}

/// Rejection sent back when the permission object lacks a capability.
pub(crate) fn forbidden<T>(
    permissions: &Permissions,
    entity: PermissionEntity,
    capability: Capability,
) -> Option<MutationResponse<T>> {
    (!permissions.allows(entity, capability)).then(|| {
        log::warn!("Refused {capability:?} on {entity:?}");
        MutationResponse::rejected(vec![FieldError::internal(
            "You are not allowed to do this.",
        )])
    })
}

/// Rejection for an identifier that cannot name a record.
pub(crate) fn unknown<T>(what: &str) -> MutationResponse<T> {
    MutationResponse::rejected(vec![FieldError::internal(format!("Unknown {what}."))])
}

/// Form conversion failure as a rejected mutation.
pub(crate) fn rejected_form<T>(err: &FormError) -> MutationResponse<T> {
    MutationResponse::rejected(err.field_errors())
}

/// Maps a repository outcome onto the mutation contract. Rejections become
/// errors of the response, with unique violations attached to
/// `unique_field` when given; anything else is a transport failure.
pub(crate) fn respond<T>(
    result: RepositoryResult<T>,
    unique_field: Option<&str>,
) -> MutationResult<T> {
    match result {
        Ok(value) => Ok(MutationResponse::ok(value)),
        Err(RepositoryError::Conflict(_)) => Ok(MutationResponse::field_error(
            unique_field.unwrap_or(INTERNAL_FIELD),
            "This value is already taken.",
        )),
        Err(RepositoryError::NotFound) => Ok(MutationResponse::rejected(vec![
            FieldError::internal("The record no longer exists."),
        ])),
        Err(err) if err.is_rejection() => Ok(MutationResponse::rejected(vec![
            FieldError::internal(err.to_string()),
        ])),
        Err(err) => {
            log::error!("Mutation failed: {err}");
            Err(TransportError::new(err.to_string()))
        }
    }
}

//! Conversions between the error types of each layer.
//!
//! Domain values, forms and the list core know nothing about the repository
//! or service errors built on top of them.

use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::list::mutation::TransportError;
use crate::repository::errors::RepositoryError;
use crate::services::ServiceError;

impl From<TypeConstraintError> for ServiceError {
    fn from(val: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(val.to_string())
    }
}

impl From<TypeConstraintError> for RepositoryError {
    fn from(val: TypeConstraintError) -> Self {
        RepositoryError::ValidationError(val.to_string())
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Form(err.to_string())
    }
}

/// Whatever fails a service call reaches the list controller as a transport
/// failure.
impl From<ServiceError> for TransportError {
    fn from(err: ServiceError) -> Self {
        TransportError::new(err.to_string())
    }
}

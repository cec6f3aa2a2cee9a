//! Create/update forms backing the dashboard routes.
//!
//! Every form validates with `validator` before anything is sent, using the
//! same constructors as the domain value objects, and converts into the
//! domain payload with `TryFrom`.

use std::borrow::Cow;

use serde::Deserialize;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

use crate::domain::types::TypeConstraintError;
use crate::list::filter::FilterField;
use crate::list::mutation::{FieldError, FormErrors, INTERNAL_FIELD};

pub mod communication;
pub mod contact;
pub mod event;
pub mod extraction;
pub mod report;
pub mod resource;

#[derive(Debug, Error)]
/// Errors that can occur when turning form data into domain values.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: TypeConstraintError,
    },
}

impl FormError {
    /// Per-field errors in the shape the server reports them.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            FormError::Validation(errors) => FormErrors::from(errors)
                .fields()
                .map(|(field, messages)| FieldError {
                    field: field.to_string(),
                    messages: messages.to_vec(),
                })
                .collect(),
            FormError::Field { field, source } => {
                let field = if field.is_empty() { INTERNAL_FIELD } else { *field };
                vec![FieldError::new(field, capitalize(&source.to_string()))]
            }
        }
    }
}

/// Inputs rendered for a create/update form.
pub trait FormInputs {
    const INPUTS: &'static [FilterField];
    /// Inputs marked as required.
    const REQUIRED: &'static [&'static str] = &[];
}

/// Tags a domain constructor failure with the field it came from.
pub(crate) fn field<T>(name: &'static str, result: Result<T, TypeConstraintError>) -> Result<T, FormError> {
    result.map_err(|source| FormError::Field {
        field: name,
        source,
    })
}

/// Blank input as `None`.
pub(crate) fn blank_as_none(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

pub(crate) fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub(crate) fn required(value: &str) -> Result<(), ValidationError> {
    match blank_as_none(value) {
        Some(_) => Ok(()),
        None => Err(invalid("required", "This field is required.")),
    }
}

/// Runs a domain constructor on non-blank input.
pub(crate) fn optional_with<T>(
    value: &str,
    build: fn(String) -> Result<T, TypeConstraintError>,
    code: &'static str,
    message: &'static str,
) -> Result<(), ValidationError> {
    match blank_as_none(value) {
        Some(v) => build(v.to_string()).map(|_| ()).map_err(|_| invalid(code, message)),
        None => Ok(()),
    }
}

/// Body of a delete form. The confirm button posts `confirm=true`.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirm: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_errors_become_field_errors() {
        let error = FormError::Field {
            field: "email",
            source: TypeConstraintError::InvalidEmail,
        };

        assert_eq!(
            error.field_errors(),
            vec![FieldError::new("email", "Invalid email address.")]
        );
    }

    #[test]
    fn blank_values_are_absent() {
        assert_eq!(blank_as_none("  "), None);
        assert_eq!(blank_as_none(" x "), Some("x"));
        assert!(required(" ").is_err());
    }
}

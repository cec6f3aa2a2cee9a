//! Mutation contracts and the form state they report back into.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Error slot holding messages that belong to no particular field.
pub const INTERNAL_FIELD: &str = "$internal";

/// Error reported by the server for one field of a mutation payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            messages: vec![message.into()],
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_FIELD, message)
    }
}

/// Per-field error slots of a form, including the catch-all `$internal` slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn internal(&self) -> &[String] {
        self.get(INTERNAL_FIELD)
    }

    pub fn set_internal(&mut self, message: impl Into<String>) {
        self.add(INTERNAL_FIELD, message);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    /// Maps server errors onto the form. Errors for fields the form does not
    /// know about land in the `$internal` slot.
    pub fn absorb(&mut self, errors: Vec<FieldError>, known: &[&str]) {
        for error in errors {
            let field = if known.contains(&error.field.as_str()) {
                error.field
            } else {
                INTERNAL_FIELD.to_string()
            };
            for message in error.messages {
                self.add(field.clone(), message);
            }
        }
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in self.fields() {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{field}: {message}")?;
            }
        }
        Ok(())
    }
}

impl From<&ValidationErrors> for FormErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
                let field = if field == "__all__" {
                    INTERNAL_FIELD.to_string()
                } else {
                    field.to_string()
                };
                form_errors.add(field, message);
            }
        }
        form_errors
    }
}

/// Payload of a completed mutation: `{ result, errors }`.
///
/// A response with errors is a rejected mutation even though the transport
/// succeeded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MutationResponse<T> {
    pub result: Option<T>,
    pub errors: Vec<FieldError>,
}

impl<T> MutationResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            result: Some(result),
            errors: Vec::new(),
        }
    }

    pub fn rejected(errors: Vec<FieldError>) -> Self {
        Self {
            result: None,
            errors,
        }
    }

    pub fn field_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::rejected(vec![FieldError::new(field, message)])
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.result.is_some()
    }
}

/// Failure to complete a request at all (network, connection pool, unmapped
/// server error). Never retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Proof that the user confirmed a destructive action.
#[derive(Debug)]
pub struct Confirmed(());

impl Confirmed {
    pub fn from_flag(confirmed: bool) -> Option<Self> {
        confirmed.then_some(Self(()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
}

/// Create/update form payload validated before anything is sent.
pub trait FormDraft: Validate {
    /// Fields with their own error slot.
    const FIELDS: &'static [&'static str];
}

/// State of a create/update form: the value being edited, its error slots
/// and the dirty/open flags.
#[derive(Clone, Debug)]
pub struct EntityForm<D> {
    value: D,
    errors: FormErrors,
    dirty: bool,
    open: bool,
}

impl<D: FormDraft> EntityForm<D> {
    /// A form opened with user edits pending.
    pub fn edited(value: D) -> Self {
        Self {
            value,
            errors: FormErrors::new(),
            dirty: true,
            open: true,
        }
    }

    pub fn value(&self) -> &D {
        &self.value
    }

    pub fn into_value(self) -> D {
        self.value
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Runs client-side validation, filling the error slots on failure.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();
        match self.value.validate() {
            Ok(()) => true,
            Err(errors) => {
                self.errors = FormErrors::from(&errors);
                false
            }
        }
    }

    pub fn absorb_server_errors(&mut self, errors: Vec<FieldError>) {
        self.errors.absorb(errors, D::FIELDS);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.errors.set_internal(message);
    }

    /// Clears the dirty flag and closes the form after a successful save.
    pub fn mark_saved(&mut self) {
        self.errors.clear();
        self.dirty = false;
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Draft {
        #[validate(length(min = 1, message = "Name is required."))]
        name: String,
        #[validate(email)]
        email: String,
    }

    impl FormDraft for Draft {
        const FIELDS: &'static [&'static str] = &["name", "email"];
    }

    #[test]
    fn client_validation_fills_field_slots() {
        let mut form = EntityForm::edited(Draft {
            name: String::new(),
            email: "bad".to_string(),
        });

        assert!(!form.validate());
        assert_eq!(form.errors().get("name"), ["Name is required.".to_string()]);
        assert_eq!(form.errors().get("email").len(), 1);
        assert!(form.is_dirty());
    }

    #[test]
    fn unknown_server_fields_land_in_internal_slot() {
        let mut form = EntityForm::edited(Draft {
            name: "n".to_string(),
            email: "n@example.com".to_string(),
        });

        form.absorb_server_errors(vec![
            FieldError::new("email", "Already taken."),
            FieldError::new("nonFieldErrors", "Something else."),
        ]);

        assert_eq!(form.errors().get("email"), ["Already taken.".to_string()]);
        assert_eq!(form.errors().internal(), ["Something else.".to_string()]);
    }

    #[test]
    fn saving_closes_the_form() {
        let mut form = EntityForm::edited(Draft {
            name: "n".to_string(),
            email: "n@example.com".to_string(),
        });
        form.fail("boom");

        form.mark_saved();

        assert!(form.errors().is_empty());
        assert!(!form.is_dirty());
        assert!(!form.is_open());
    }

    #[test]
    fn confirmation_requires_the_flag() {
        assert!(Confirmed::from_flag(false).is_none());
        assert!(Confirmed::from_flag(true).is_some());
    }
}

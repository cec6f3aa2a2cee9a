use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::communication::{Communication, MEDIUM_OPTIONS, Medium, NewCommunication};
use crate::domain::types::{ContactId, SanitizedText, Subject, TypeConstraintError, optional};
use crate::forms::{FormError, FormInputs, field, invalid, required};
use crate::list::filter::{FilterField, InputKind, OptionsRef, parse_date};
use crate::list::mutation::FormDraft;

#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
/// Form data for logging a communication with a contact.
pub struct CommunicationForm {
    pub contact_id: i32,
    #[validate(custom(function = "required"))]
    pub subject: String,
    #[validate(custom(function = "valid_medium"))]
    pub medium: String,
    #[validate(custom(function = "valid_date"))]
    pub date: String,
    pub content: String,
}

fn valid_medium(value: &str) -> Result<(), ValidationError> {
    Medium::try_from(value)
        .map(|_| ())
        .map_err(|_| invalid("medium", "Pick how the contact was reached."))
}

fn valid_date(value: &str) -> Result<(), ValidationError> {
    parse_date(value)
        .map(|_| ())
        .ok_or_else(|| invalid("date", "Enter a date as YYYY-MM-DD."))
}

impl FormDraft for CommunicationForm {
    const FIELDS: &'static [&'static str] = &["subject", "medium", "date", "content"];
}

impl FormInputs for CommunicationForm {
    const REQUIRED: &'static [&'static str] = &["subject", "medium", "date"];
    const INPUTS: &'static [FilterField] = &[
        FilterField::new("subject", "Subject", InputKind::Text),
        FilterField::new("medium", "Medium", InputKind::Select)
            .with_options(OptionsRef::Static(MEDIUM_OPTIONS)),
        FilterField::new("date", "Date", InputKind::Date),
        FilterField::new("content", "Notes", InputKind::Text),
    ];
}

impl From<&Communication> for CommunicationForm {
    fn from(communication: &Communication) -> Self {
        Self {
            contact_id: communication.contact_id.get(),
            subject: communication.subject.to_string(),
            medium: communication.medium.as_str().to_string(),
            date: communication.date.to_string(),
            content: communication
                .content
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

impl TryFrom<&CommunicationForm> for NewCommunication {
    type Error = FormError;

    fn try_from(form: &CommunicationForm) -> Result<Self, Self::Error> {
        form.validate()?;
        let date = parse_date(&form.date)
            .ok_or_else(|| TypeConstraintError::InvalidValue("date".to_string()));
        Ok(Self {
            contact_id: field("", ContactId::new(form.contact_id))?,
            subject: field("subject", Subject::new(form.subject.as_str()))?,
            medium: field("medium", Medium::try_from(form.medium.as_str()))?,
            date: field("date", date)?,
            content: field("content", optional(Some(form.content.as_str()), SanitizedText::new))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_sanitized() {
        let form = CommunicationForm {
            contact_id: 3,
            subject: "Follow-up".to_string(),
            medium: "Email".to_string(),
            date: "2024-03-01".to_string(),
            content: "<script>x</script>Call back".to_string(),
        };

        let communication = NewCommunication::try_from(&form).expect("valid form");

        assert_eq!(communication.medium, Medium::Email);
        assert_eq!(
            communication.content.map(String::from),
            Some("Call back".to_string())
        );
    }

    #[test]
    fn missing_contact_is_not_a_field_error() {
        let form = CommunicationForm {
            contact_id: 0,
            subject: "Call".to_string(),
            medium: "phone".to_string(),
            date: "2024-03-01".to_string(),
            content: String::new(),
        };

        let error = NewCommunication::try_from(&form).expect_err("no contact");

        assert_eq!(error.field_errors()[0].field, "$internal");
    }
}

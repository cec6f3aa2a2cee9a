use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::contact::{Contact, NewContact};
use crate::domain::types::{ContactEmail, ContactName, CountryCode, PhoneNumber, optional};
use crate::forms::{FormError, FormInputs, blank_as_none, field, optional_with, required};
use crate::list::filter::{FilterField, InputKind};
use crate::list::mutation::FormDraft;

#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
/// Form data for creating or editing a contact.
pub struct ContactForm {
    #[validate(custom(function = "required"))]
    pub name: String,
    #[validate(custom(function = "valid_email"))]
    pub email: String,
    #[validate(custom(function = "valid_phone"))]
    pub phone: String,
    pub organization: String,
    #[validate(custom(function = "valid_country"))]
    pub country: String,
    pub job_title: String,
}

fn valid_email(value: &str) -> Result<(), ValidationError> {
    optional_with(value, ContactEmail::new, "email", "Enter a valid email address.")
}

fn valid_phone(value: &str) -> Result<(), ValidationError> {
    optional_with(value, PhoneNumber::new, "phone", "Enter a phone number with country code.")
}

fn valid_country(value: &str) -> Result<(), ValidationError> {
    optional_with(value, CountryCode::new, "country", "Use a two or three letter country code.")
}

impl FormDraft for ContactForm {
    const FIELDS: &'static [&'static str] =
        &["name", "email", "phone", "organization", "country", "job_title"];
}

impl FormInputs for ContactForm {
    const REQUIRED: &'static [&'static str] = &["name"];
    const INPUTS: &'static [FilterField] = &[
        FilterField::new("name", "Name", InputKind::Text),
        FilterField::new("email", "Email", InputKind::Text),
        FilterField::new("phone", "Phone", InputKind::Text),
        FilterField::new("organization", "Organization", InputKind::Text),
        FilterField::new("country", "Country code", InputKind::Text),
        FilterField::new("job_title", "Job title", InputKind::Text),
    ];
}

impl From<&Contact> for ContactForm {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.to_string(),
            email: contact.email.as_ref().map(ToString::to_string).unwrap_or_default(),
            phone: contact.phone.as_ref().map(ToString::to_string).unwrap_or_default(),
            organization: contact.organization.clone().unwrap_or_default(),
            country: contact.country.as_ref().map(ToString::to_string).unwrap_or_default(),
            job_title: contact.job_title.clone().unwrap_or_default(),
        }
    }
}

impl TryFrom<&ContactForm> for NewContact {
    type Error = FormError;

    fn try_from(form: &ContactForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            name: field("name", ContactName::new(form.name.as_str()))?,
            email: field("email", optional(Some(form.email.as_str()), ContactEmail::new))?,
            phone: field("phone", optional(Some(form.phone.as_str()), PhoneNumber::new))?,
            organization: blank_as_none(&form.organization).map(str::to_string),
            country: field("country", optional(Some(form.country.as_str()), CountryCode::new))?,
            job_title: blank_as_none(&form.job_title).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::mutation::EntityForm;

    fn form() -> ContactForm {
        ContactForm {
            name: " Amina Yusuf ".to_string(),
            email: "AMINA@example.org".to_string(),
            phone: "+2348031234567".to_string(),
            organization: String::new(),
            country: "ng".to_string(),
            job_title: "Field officer".to_string(),
        }
    }

    #[test]
    fn valid_form_converts_into_normalized_values() {
        let contact = NewContact::try_from(&form()).expect("valid form");

        assert_eq!(contact.name.as_str(), "Amina Yusuf");
        assert_eq!(contact.email.map(String::from), Some("amina@example.org".to_string()));
        assert_eq!(contact.country.map(String::from), Some("NG".to_string()));
        assert_eq!(contact.organization, None);
    }

    #[test]
    fn invalid_fields_fill_their_own_slots() {
        let mut entity_form = EntityForm::edited(ContactForm {
            name: "  ".to_string(),
            email: "not-an-email".to_string(),
            country: "N1".to_string(),
            ..form()
        });

        assert!(!entity_form.validate());
        assert_eq!(entity_form.errors().get("name").len(), 1);
        assert_eq!(
            entity_form.errors().get("email"),
            ["Enter a valid email address.".to_string()]
        );
        assert_eq!(entity_form.errors().get("country").len(), 1);
        assert!(entity_form.errors().get("phone").is_empty());
    }
}

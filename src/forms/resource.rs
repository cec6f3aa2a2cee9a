use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::resource::{NewResource, Resource};
use crate::domain::types::{ResourceName, ResourceUrl};
use crate::forms::{FormError, FormInputs, blank_as_none, field, invalid, required};
use crate::list::filter::{FilterField, InputKind};
use crate::list::mutation::FormDraft;
use crate::models::resource::split_countries;

#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ResourceForm {
    #[validate(custom(function = "required"))]
    pub name: String,
    #[validate(url(message = "Enter a full URL."))]
    pub url: String,
    pub group: String,
    /// Comma separated country codes.
    #[validate(custom(function = "valid_countries"))]
    pub countries: String,
}

fn valid_countries(value: &str) -> Result<(), ValidationError> {
    split_countries(value)
        .map(|_| ())
        .map_err(|_| invalid("countries", "Separate two or three letter country codes with commas."))
}

impl FormDraft for ResourceForm {
    const FIELDS: &'static [&'static str] = &["name", "url", "group", "countries"];
}

impl FormInputs for ResourceForm {
    const REQUIRED: &'static [&'static str] = &["name", "url"];
    const INPUTS: &'static [FilterField] = &[
        FilterField::new("name", "Name", InputKind::Text),
        FilterField::new("url", "URL", InputKind::Text),
        FilterField::new("group", "Group", InputKind::Text),
        FilterField::new("countries", "Countries", InputKind::Text),
    ];
}

impl From<&Resource> for ResourceForm {
    fn from(resource: &Resource) -> Self {
        Self {
            name: resource.name.to_string(),
            url: resource.url.to_string(),
            group: resource.group.clone().unwrap_or_default(),
            countries: resource.countries_label(),
        }
    }
}

impl TryFrom<&ResourceForm> for NewResource {
    type Error = FormError;

    fn try_from(form: &ResourceForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            name: field("name", ResourceName::new(form.name.as_str()))?,
            url: field("url", ResourceUrl::new(form.url.as_str()))?,
            group: blank_as_none(&form.group).map(str::to_string),
            countries: field("countries", split_countries(&form.countries))?,
        })
    }
}

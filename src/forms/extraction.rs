use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::event::EventFilter;
use crate::domain::extraction::NewExtractionQuery;
use crate::domain::types::QueryName;
use crate::forms::{FormError, FormInputs, field, required};
use crate::list::filter::{FilterField, InputKind, ListFilters};
use crate::list::mutation::FormDraft;

/// Name under which the events filter currently applied is saved.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ExtractionForm {
    #[validate(custom(function = "required"))]
    pub name: String,
}

impl FormDraft for ExtractionForm {
    const FIELDS: &'static [&'static str] = &["name"];
}

impl FormInputs for ExtractionForm {
    const REQUIRED: &'static [&'static str] = &["name"];
    const INPUTS: &'static [FilterField] = &[FilterField::new("name", "Name", InputKind::Text)];
}

impl ExtractionForm {
    pub fn into_query(&self, filters: &EventFilter) -> Result<NewExtractionQuery, FormError> {
        self.validate()?;
        Ok(NewExtractionQuery {
            name: field("name", QueryName::new(self.name.as_str()))?,
            filters: filters.purged(),
        })
    }
}

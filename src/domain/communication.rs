use std::fmt::Display;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{CommunicationId, ContactId, SanitizedText, Subject, TypeConstraintError};
use crate::list::filter::{
    FieldValue, FilterField, InputKind, ListFilters, OptionsRef, purge_list,
};
use crate::list::{EntityKey, ListEntity, ListSpec, QueryId};

/// Communications of one contact, latest first.
pub const COMMUNICATIONS: ListSpec = ListSpec {
    query: QueryId::new("communications"),
    label: "Communication",
    default_page_size: 10,
    default_ordering: "-date",
    sortable: &["subject", "date"],
};

pub const MEDIUM_OPTIONS: &[(&str, &str)] = &[
    ("phone", "Phone"),
    ("email", "Email"),
    ("meeting", "Meeting"),
    ("other", "Other"),
];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Phone,
    Email,
    Meeting,
    Other,
}

impl Medium {
    pub fn as_str(self) -> &'static str {
        match self {
            Medium::Phone => "phone",
            Medium::Email => "email",
            Medium::Meeting => "meeting",
            Medium::Other => "other",
        }
    }
}

impl Display for Medium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Medium {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "phone" => Ok(Medium::Phone),
            "email" => Ok(Medium::Email),
            "meeting" => Ok(Medium::Meeting),
            "other" => Ok(Medium::Other),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown medium {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Communication {
    pub id: CommunicationId,
    pub contact_id: ContactId,
    pub subject: Subject,
    pub medium: Medium,
    pub date: NaiveDate,
    pub content: Option<SanitizedText>,
    pub created_at: NaiveDateTime,
}

impl ListEntity for Communication {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.get())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewCommunication {
    pub contact_id: ContactId,
    pub subject: Subject,
    pub medium: Medium,
    pub date: NaiveDate,
    pub content: Option<SanitizedText>,
}

pub type UpdateCommunication = NewCommunication;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationFilter {
    /// Fixed by the page; never edited through the filter form.
    pub contact_id: Option<i32>,
    pub search: String,
    pub medium: Vec<String>,
}

impl CommunicationFilter {
    pub fn for_contact(contact_id: ContactId) -> Self {
        Self {
            contact_id: Some(contact_id.get()),
            ..Self::default()
        }
    }
}

impl ListFilters for CommunicationFilter {
    const FIELDS: &'static [FilterField] = &[
        FilterField::new("search", "Subject", InputKind::Text),
        FilterField::new("medium", "Medium", InputKind::MultiSelect)
            .with_options(OptionsRef::Static(MEDIUM_OPTIONS)),
    ];

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "search" => FieldValue::Text(&self.search),
            "medium" => FieldValue::List(&self.medium),
            _ => FieldValue::Absent,
        }
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(contact_id) = self.contact_id {
            pairs.push(("contact_id", contact_id.to_string()));
        }
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        pairs.extend(self.medium.iter().map(|m| ("medium", m.clone())));
        pairs
    }

    fn purged(&self) -> Self {
        Self {
            contact_id: self.contact_id,
            search: self.search.trim().to_string(),
            medium: purge_list(&self.medium),
        }
    }

    fn overlay(&mut self, fixed: &Self) {
        if fixed.contact_id.is_some() {
            self.contact_id = fixed.contact_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medium_parses_case_insensitively() {
        assert_eq!(Medium::try_from(" Email "), Ok(Medium::Email));
        assert!(Medium::try_from("fax").is_err());
    }

    #[test]
    fn fixed_contact_wins_over_the_query() {
        let contact = ContactId::new(4).expect("positive");
        let mut filter = CommunicationFilter {
            contact_id: Some(9),
            ..CommunicationFilter::default()
        };

        filter.overlay(&CommunicationFilter::for_contact(contact));

        assert_eq!(filter.contact_id, Some(4));
    }
}

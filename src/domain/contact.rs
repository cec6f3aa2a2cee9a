use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{ContactEmail, ContactId, ContactName, CountryCode, PhoneNumber};
use crate::list::filter::{FieldValue, FilterField, InputKind, ListFilters, OptionsRef, Rule, RuleSet};
use crate::list::{EntityKey, ListEntity, ListSpec, QueryId};

/// Contacts list: 25 rows, newest first.
pub const CONTACTS: ListSpec = ListSpec {
    query: QueryId::new("contacts"),
    label: "Contact",
    default_page_size: 25,
    default_ordering: "-created_at",
    sortable: &["name", "country", "created_at"],
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: ContactId,
    pub name: ContactName,
    pub email: Option<ContactEmail>,
    pub phone: Option<PhoneNumber>,
    pub organization: Option<String>,
    pub country: Option<CountryCode>,
    pub job_title: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ListEntity for Contact {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.get())
    }
}

/// Validated values of a contact to insert or to write over an existing one.
#[derive(Clone, Debug, PartialEq)]
pub struct NewContact {
    pub name: ContactName,
    pub email: Option<ContactEmail>,
    pub phone: Option<PhoneNumber>,
    pub organization: Option<String>,
    pub country: Option<CountryCode>,
    pub job_title: Option<String>,
}

pub type UpdateContact = NewContact;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactFilter {
    /// Matched against name, email and organization.
    pub search: String,
    pub country: String,
    pub organization: String,
}

impl ListFilters for ContactFilter {
    const FIELDS: &'static [FilterField] = &[
        FilterField::new("search", "Search", InputKind::Text),
        FilterField::new("country", "Country", InputKind::Select)
            .with_options(OptionsRef::Lazy("contact_countries")),
        FilterField::new("organization", "Organization", InputKind::Select)
            .with_options(OptionsRef::Lazy("organizations")),
    ];

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "search" => FieldValue::Text(&self.search),
            "country" => FieldValue::Text(&self.country),
            "organization" => FieldValue::Text(&self.organization),
            _ => FieldValue::Absent,
        }
    }

    fn rules(&self) -> RuleSet {
        RuleSet::new().field("search", Rule::MinLength(2))
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("search", &self.search),
            ("country", &self.country),
            ("organization", &self.organization),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key, value.clone()))
        .collect()
    }

    fn purged(&self) -> Self {
        Self {
            search: self.search.trim().to_string(),
            country: self.country.trim().to_uppercase(),
            organization: self.organization.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::variables::QueryVariables;

    #[test]
    fn purged_filter_drops_blank_pairs() {
        let filter = ContactFilter {
            search: "  ".to_string(),
            country: " npl ".to_string(),
            organization: String::new(),
        }
        .purged();

        assert_eq!(filter.query_pairs(), vec![("country", "NPL".to_string())]);
    }

    #[test]
    fn one_letter_search_is_rejected() {
        let filter = ContactFilter {
            search: "a".to_string(),
            ..ContactFilter::default()
        };

        assert_eq!(filter.rules().validate(&filter).get("search").len(), 1);
    }

    #[test]
    fn unsortable_ordering_falls_back_to_default() {
        let vars: QueryVariables<ContactFilter> =
            QueryVariables::from_query(&CONTACTS, "ordering=-email&page=2");

        assert_eq!(vars.ordering.map(|o| o.as_param()), Some("-created_at".to_string()));
        assert_eq!(vars.page, 2);
        assert_eq!(vars.page_size, 25);
    }
}

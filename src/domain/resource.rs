use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CountryCode, ResourceId, ResourceName, ResourceUrl};
use crate::list::filter::{FieldValue, FilterField, InputKind, ListFilters, OptionsRef};
use crate::list::{EntityKey, ListEntity, ListSpec, QueryId};

pub const RESOURCES: ListSpec = ListSpec {
    query: QueryId::new("resources"),
    label: "Resource",
    default_page_size: 25,
    default_ordering: "name",
    sortable: &["name", "created_at"],
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub name: ResourceName,
    pub url: ResourceUrl,
    pub group: Option<String>,
    pub countries: Vec<CountryCode>,
    pub created_at: NaiveDateTime,
}

impl Resource {
    pub fn countries_label(&self) -> String {
        self.countries
            .iter()
            .map(CountryCode::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl ListEntity for Resource {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.get())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewResource {
    pub name: ResourceName,
    pub url: ResourceUrl,
    pub group: Option<String>,
    pub countries: Vec<CountryCode>,
}

pub type UpdateResource = NewResource;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceFilter {
    pub search: String,
    pub group: String,
}

impl ListFilters for ResourceFilter {
    const FIELDS: &'static [FilterField] = &[
        FilterField::new("search", "Search", InputKind::Text),
        FilterField::new("group", "Group", InputKind::Select)
            .with_options(OptionsRef::Lazy("resource_groups")),
    ];

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "search" => FieldValue::Text(&self.search),
            "group" => FieldValue::Text(&self.group),
            _ => FieldValue::Absent,
        }
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [("search", &self.search), ("group", &self.group)]
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key, value.clone()))
            .collect()
    }

    fn purged(&self) -> Self {
        Self {
            search: self.search.trim().to_string(),
            group: self.group.trim().to_string(),
        }
    }
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::event::EventFilter;
use crate::domain::types::{ExtractionQueryId, QueryName};
use crate::list::filter::{FieldValue, FilterField, InputKind, ListFilters};
use crate::list::{EntityKey, ListEntity, ListSpec, QueryId};

pub const EXTRACTIONS: ListSpec = ListSpec {
    query: QueryId::new("extractions"),
    label: "Extraction query",
    default_page_size: 10,
    default_ordering: "-created_at",
    sortable: &["name", "created_at"],
};

/// Named event filter the events list can be seeded with.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExtractionQuery {
    pub id: ExtractionQueryId,
    pub name: QueryName,
    pub filters: EventFilter,
    pub created_at: NaiveDateTime,
}

impl ListEntity for ExtractionQuery {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.get())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewExtractionQuery {
    pub name: QueryName,
    pub filters: EventFilter,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionQueryFilter {
    pub search: String,
}

impl ListFilters for ExtractionQueryFilter {
    const FIELDS: &'static [FilterField] = &[FilterField::new("search", "Name", InputKind::Text)];

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "search" => FieldValue::Text(&self.search),
            _ => FieldValue::Absent,
        }
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        if self.search.is_empty() {
            Vec::new()
        } else {
            vec![("search", self.search.clone())]
        }
    }

    fn purged(&self) -> Self {
        Self {
            search: self.search.trim().to_string(),
        }
    }
}

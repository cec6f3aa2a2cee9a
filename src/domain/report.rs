use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{EventId, ReportId, ReportName, SanitizedText};
use crate::list::filter::{FieldValue, FilterField, InputKind, ListFilters, OptionsRef};
use crate::list::{EntityKey, ListEntity, ListSpec, QueryId};

pub const REPORTS: ListSpec = ListSpec {
    query: QueryId::new("reports"),
    label: "Report",
    default_page_size: 25,
    default_ordering: "-created_at",
    sortable: &["name", "created_at"],
};

pub const SIGN_OFF_OPTIONS: &[(&str, &str)] = &[("yes", "Signed off"), ("no", "Pending")];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: ReportId,
    pub name: ReportName,
    pub description: Option<SanitizedText>,
    pub event_id: Option<EventId>,
    pub is_signed_off: bool,
    pub signed_off_by: Option<String>,
    pub signed_off_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl ListEntity for Report {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.get())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewReport {
    pub name: ReportName,
    pub description: Option<SanitizedText>,
    pub event_id: Option<EventId>,
}

pub type UpdateReport = NewReport;

/// Who signed a report off and when.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportSignOff {
    pub signed_off_by: String,
    pub signed_off_at: NaiveDateTime,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportFilter {
    pub search: String,
    /// `yes`, `no` or empty for both.
    pub signed_off: String,
    /// Reports of one event, set by links from the events list.
    pub event_id: Option<i32>,
}

impl ReportFilter {
    pub fn signed_off(&self) -> Option<bool> {
        match self.signed_off.as_str() {
            "yes" => Some(true),
            "no" => Some(false),
            _ => None,
        }
    }
}

impl ListFilters for ReportFilter {
    const FIELDS: &'static [FilterField] = &[
        FilterField::new("search", "Name", InputKind::Text),
        FilterField::new("signed_off", "Status", InputKind::Select)
            .with_options(OptionsRef::Static(SIGN_OFF_OPTIONS)),
    ];

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "search" => FieldValue::Text(&self.search),
            "signed_off" => FieldValue::Text(&self.signed_off),
            _ => FieldValue::Absent,
        }
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        if !self.signed_off.is_empty() {
            pairs.push(("signed_off", self.signed_off.clone()));
        }
        if let Some(event_id) = self.event_id {
            pairs.push(("event_id", event_id.to_string()));
        }
        pairs
    }

    fn purged(&self) -> Self {
        let signed_off = self.signed_off.trim();
        Self {
            search: self.search.trim().to_string(),
            signed_off: if matches!(signed_off, "yes" | "no") {
                signed_off.to_string()
            } else {
                String::new()
            },
            event_id: self.event_id.filter(|id| *id > 0),
        }
    }
}

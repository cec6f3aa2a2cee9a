use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::{ApiType, ApiUsageId, ClientCode};
use crate::list::filter::{FieldValue, FilterField, InputKind, ListFilters, Rule, RuleSet};
use crate::list::{EntityKey, ListEntity, ListSpec, QueryId};

pub const API_USAGE: ListSpec = ListSpec {
    query: QueryId::new("api_usage"),
    label: "API usage",
    default_page_size: 25,
    default_ordering: "-usage_date",
    sortable: &["usage_date", "requests"],
};

/// Requests made by one client against one API on one day.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiUsage {
    pub id: ApiUsageId,
    pub client_code: ClientCode,
    pub api_type: ApiType,
    pub requests: i64,
    pub usage_date: NaiveDate,
}

impl ListEntity for ApiUsage {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.get())
    }
}

/// One request to count.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiUsageHit {
    pub client_code: ClientCode,
    pub api_type: ApiType,
    pub usage_date: NaiveDate,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiUsageFilter {
    pub client_code: String,
    pub api_type: String,
    pub date_from: String,
    pub date_to: String,
}

impl ListFilters for ApiUsageFilter {
    const FIELDS: &'static [FilterField] = &[
        FilterField::new("client_code", "Client", InputKind::Text),
        FilterField::new("api_type", "API", InputKind::Text),
        FilterField::new("date_from", "From", InputKind::Date),
        FilterField::new("date_to", "To", InputKind::Date),
    ];

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "client_code" => FieldValue::Text(&self.client_code),
            "api_type" => FieldValue::Text(&self.api_type),
            "date_from" => FieldValue::Text(&self.date_from),
            "date_to" => FieldValue::Text(&self.date_to),
            _ => FieldValue::Absent,
        }
    }

    fn rules(&self) -> RuleSet {
        RuleSet::new()
            .field("date_from", Rule::Date)
            .field("date_to", Rule::Date)
            .field("date_to", Rule::NotBefore("date_from"))
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("client_code", &self.client_code),
            ("api_type", &self.api_type),
            ("date_from", &self.date_from),
            ("date_to", &self.date_to),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key, value.clone()))
        .collect()
    }

    fn purged(&self) -> Self {
        Self {
            client_code: self.client_code.trim().to_string(),
            api_type: self.api_type.trim().to_string(),
            date_from: self.date_from.trim().to_string(),
            date_to: self.date_to.trim().to_string(),
        }
    }
}

//! Displacement events and the filter saved by extraction queries.

use std::fmt::Display;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{CountryCode, EventId, EventName, TypeConstraintError};
use crate::list::filter::{
    FieldValue, FilterField, InputKind, ListFilters, OptionsRef, Rule, RuleSet, purge_list,
};
use crate::list::{EntityKey, ListEntity, ListSpec, QueryId};

pub const EVENTS: ListSpec = ListSpec {
    query: QueryId::new("events"),
    label: "Event",
    default_page_size: 10,
    default_ordering: "-start_date",
    sortable: &["name", "start_date", "created_at"],
};

pub const CRISIS_TYPE_OPTIONS: &[(&str, &str)] = &[
    ("conflict", "Conflict"),
    ("disaster", "Disaster"),
    ("other", "Other"),
];

pub const VIOLENCE_SUBTYPE_OPTIONS: &[(&str, &str)] = &[
    ("armed_conflict", "Armed conflict"),
    ("communal_violence", "Communal violence"),
    ("criminal_violence", "Criminal violence"),
    ("political_violence", "Political violence"),
    ("other", "Other"),
];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CrisisType {
    Conflict,
    Disaster,
    Other,
}

impl CrisisType {
    pub fn as_str(self) -> &'static str {
        match self {
            CrisisType::Conflict => "conflict",
            CrisisType::Disaster => "disaster",
            CrisisType::Other => "other",
        }
    }
}

impl Display for CrisisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CrisisType {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "conflict" => Ok(CrisisType::Conflict),
            "disaster" => Ok(CrisisType::Disaster),
            "other" => Ok(CrisisType::Other),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown crisis type {other}"
            ))),
        }
    }
}

/// Checks a violence subtype against the known options.
pub fn parse_violence_subtype(value: &str) -> Result<String, TypeConstraintError> {
    let value = value.trim();
    VIOLENCE_SUBTYPE_OPTIONS
        .iter()
        .find(|(key, _)| *key == value)
        .map(|(key, _)| key.to_string())
        .ok_or_else(|| TypeConstraintError::InvalidValue(format!("unknown violence subtype {value}")))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub name: EventName,
    pub crisis_type: CrisisType,
    /// Only set for conflict events.
    pub violence_subtype: Option<String>,
    pub country: CountryCode,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

impl ListEntity for Event {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.get())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewEvent {
    pub name: EventName,
    pub crisis_type: CrisisType,
    pub violence_subtype: Option<String>,
    pub country: CountryCode,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

pub type UpdateEvent = NewEvent;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilter {
    pub search: String,
    pub crisis_types: Vec<String>,
    pub violence_subtypes: Vec<String>,
    pub countries: Vec<String>,
    /// Events starting on or after this date.
    pub date_from: String,
    /// Events starting on or before this date.
    pub date_to: String,
}

impl EventFilter {
    fn includes_conflict(&self) -> bool {
        self.crisis_types
            .iter()
            .any(|t| t.trim().eq_ignore_ascii_case(CrisisType::Conflict.as_str()))
    }
}

impl ListFilters for EventFilter {
    const FIELDS: &'static [FilterField] = &[
        FilterField::new("search", "Name", InputKind::Text),
        FilterField::new("crisis_types", "Crisis type", InputKind::MultiSelect)
            .with_options(OptionsRef::Static(CRISIS_TYPE_OPTIONS)),
        FilterField::new("violence_subtypes", "Violence subtype", InputKind::MultiSelect)
            .with_options(OptionsRef::Static(VIOLENCE_SUBTYPE_OPTIONS)),
        FilterField::new("countries", "Countries", InputKind::MultiSelect)
            .with_options(OptionsRef::Lazy("event_countries")),
        FilterField::new("date_from", "Started after", InputKind::Date),
        FilterField::new("date_to", "Started before", InputKind::Date),
    ];

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "search" => FieldValue::Text(&self.search),
            "crisis_types" => FieldValue::List(&self.crisis_types),
            "violence_subtypes" => FieldValue::List(&self.violence_subtypes),
            "countries" => FieldValue::List(&self.countries),
            "date_from" => FieldValue::Text(&self.date_from),
            "date_to" => FieldValue::Text(&self.date_to),
            _ => FieldValue::Absent,
        }
    }

    /// Violence subtypes are required as soon as conflict is among the
    /// selected crisis types.
    fn rules(&self) -> RuleSet {
        RuleSet::new()
            .when(self.includes_conflict(), "violence_subtypes", Rule::Required)
            .field("date_from", Rule::Date)
            .field("date_to", Rule::Date)
            .field("date_to", Rule::NotBefore("date_from"))
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        pairs.extend(self.crisis_types.iter().map(|v| ("crisis_types", v.clone())));
        pairs.extend(
            self.violence_subtypes
                .iter()
                .map(|v| ("violence_subtypes", v.clone())),
        );
        pairs.extend(self.countries.iter().map(|v| ("countries", v.clone())));
        if !self.date_from.is_empty() {
            pairs.push(("date_from", self.date_from.clone()));
        }
        if !self.date_to.is_empty() {
            pairs.push(("date_to", self.date_to.clone()));
        }
        pairs
    }

    fn purged(&self) -> Self {
        Self {
            search: self.search.trim().to_string(),
            crisis_types: purge_list(&self.crisis_types),
            violence_subtypes: purge_list(&self.violence_subtypes),
            countries: purge_list(&self.countries)
                .into_iter()
                .map(|c| c.to_uppercase())
                .collect(),
            date_from: self.date_from.trim().to_string(),
            date_to: self.date_to.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::filter::FilterForm;

    #[test]
    fn violence_subtypes_required_only_for_conflict() {
        let mut form = FilterForm::new(EventFilter::default());

        form.set_draft(EventFilter {
            crisis_types: vec!["disaster".to_string()],
            ..EventFilter::default()
        });
        assert!(form.required_fields().is_empty());
        assert!(form.apply().is_ok());

        form.set_draft(EventFilter {
            crisis_types: vec!["disaster".to_string(), "conflict".to_string()],
            ..EventFilter::default()
        });
        assert_eq!(form.required_fields(), vec!["violence_subtypes"]);
        let errors = form.apply().map(|_| ()).map_err(|e| e.clone());
        assert_eq!(
            errors.expect_err("subtype missing").get("violence_subtypes").len(),
            1
        );

        form.set_draft(EventFilter {
            crisis_types: vec!["conflict".to_string()],
            violence_subtypes: vec!["communal_violence".to_string()],
            ..EventFilter::default()
        });
        assert!(form.apply().is_ok());
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let filter = EventFilter {
            date_from: "2024-05-01".to_string(),
            date_to: "2024-04-01".to_string(),
            ..EventFilter::default()
        };

        let errors = filter.rules().validate(&filter);

        assert_eq!(errors.get("date_to").len(), 1);
        assert!(errors.get("date_from").is_empty());
    }

    #[test]
    fn violence_subtype_must_be_known() {
        assert_eq!(
            parse_violence_subtype("political_violence"),
            Ok("political_violence".to_string())
        );
        assert!(parse_violence_subtype("riots").is_err());
    }
}

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::event::{
    CRISIS_TYPE_OPTIONS, CrisisType, Event, NewEvent, VIOLENCE_SUBTYPE_OPTIONS,
    parse_violence_subtype,
};
use crate::domain::types::{CountryCode, EventName, TypeConstraintError};
use crate::forms::{FormError, FormInputs, blank_as_none, field, invalid};
use crate::list::filter::{FilterField, InputKind, OptionsRef, parse_date};
use crate::list::mutation::FormDraft;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
/// Form data for recording a displacement event.
pub struct EventForm {
    pub name: String,
    pub crisis_type: String,
    /// Required for conflict events and rejected for any other crisis type.
    pub violence_subtype: String,
    pub country: String,
    pub start_date: String,
    pub end_date: String,
}

impl Validate for EventForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if blank_as_none(&self.name).is_none() {
            errors.add("name", invalid("required", "This field is required."));
        }

        let crisis_type = CrisisType::try_from(self.crisis_type.as_str()).ok();
        if crisis_type.is_none() {
            errors.add("crisis_type", invalid("crisis_type", "Pick a crisis type."));
        }

        match (crisis_type, blank_as_none(&self.violence_subtype)) {
            (Some(CrisisType::Conflict), None) => errors.add(
                "violence_subtype",
                invalid("required", "Conflict events need a violence subtype."),
            ),
            (Some(CrisisType::Conflict), Some(subtype)) if parse_violence_subtype(subtype).is_err() => {
                errors.add(
                    "violence_subtype",
                    invalid("violence_subtype", "Pick a known violence subtype."),
                )
            }
            (Some(_), Some(_)) => errors.add(
                "violence_subtype",
                invalid("violence_subtype", "Only conflict events have a violence subtype."),
            ),
            _ => {}
        }

        if CountryCode::new(self.country.as_str()).is_err() {
            errors.add(
                "country",
                invalid("country", "Use a two or three letter country code."),
            );
        }

        let start = parse_date(&self.start_date);
        if start.is_none() {
            errors.add("start_date", invalid("date", "Enter a date as YYYY-MM-DD."));
        }
        if let Some(end) = blank_as_none(&self.end_date) {
            match (start, parse_date(end)) {
                (_, None) => errors.add("end_date", invalid("date", "Enter a date as YYYY-MM-DD.")),
                (Some(start), Some(end)) if end < start => errors.add(
                    "end_date",
                    invalid("not_before", "The end date cannot be before the start date."),
                ),
                _ => {}
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl FormDraft for EventForm {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "crisis_type",
        "violence_subtype",
        "country",
        "start_date",
        "end_date",
    ];
}

impl FormInputs for EventForm {
    const REQUIRED: &'static [&'static str] = &["name", "crisis_type", "country", "start_date"];
    const INPUTS: &'static [FilterField] = &[
        FilterField::new("name", "Name", InputKind::Text),
        FilterField::new("crisis_type", "Crisis type", InputKind::Select)
            .with_options(OptionsRef::Static(CRISIS_TYPE_OPTIONS)),
        FilterField::new("violence_subtype", "Violence subtype", InputKind::Select)
            .with_options(OptionsRef::Static(VIOLENCE_SUBTYPE_OPTIONS)),
        FilterField::new("country", "Country code", InputKind::Text),
        FilterField::new("start_date", "Start date", InputKind::Date),
        FilterField::new("end_date", "End date", InputKind::Date),
    ];
}

impl From<&Event> for EventForm {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.to_string(),
            crisis_type: event.crisis_type.as_str().to_string(),
            violence_subtype: event.violence_subtype.clone().unwrap_or_default(),
            country: event.country.to_string(),
            start_date: event.start_date.to_string(),
            end_date: event.end_date.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

fn date(value: &str) -> Result<chrono::NaiveDate, TypeConstraintError> {
    parse_date(value).ok_or_else(|| TypeConstraintError::InvalidValue(format!("date {value}")))
}

impl TryFrom<&EventForm> for NewEvent {
    type Error = FormError;

    fn try_from(form: &EventForm) -> Result<Self, Self::Error> {
        form.validate()?;
        let violence_subtype = match blank_as_none(&form.violence_subtype) {
            Some(subtype) => Some(field("violence_subtype", parse_violence_subtype(subtype))?),
            None => None,
        };
        let end_date = match blank_as_none(&form.end_date) {
            Some(end) => Some(field("end_date", date(end))?),
            None => None,
        };
        Ok(Self {
            name: field("name", EventName::new(form.name.as_str()))?,
            crisis_type: field("crisis_type", CrisisType::try_from(form.crisis_type.as_str()))?,
            violence_subtype,
            country: field("country", CountryCode::new(form.country.as_str()))?,
            start_date: field("start_date", date(&form.start_date))?,
            end_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::mutation::EntityForm;

    fn conflict() -> EventForm {
        EventForm {
            name: "Jos clashes".to_string(),
            crisis_type: "conflict".to_string(),
            violence_subtype: "communal_violence".to_string(),
            country: "ng".to_string(),
            start_date: "2024-01-10".to_string(),
            end_date: "2024-01-12".to_string(),
        }
    }

    #[test]
    fn conflict_event_converts() {
        let event = NewEvent::try_from(&conflict()).expect("valid form");

        assert_eq!(event.crisis_type, CrisisType::Conflict);
        assert_eq!(event.violence_subtype.as_deref(), Some("communal_violence"));
        assert_eq!(event.country.as_str(), "NG");
    }

    #[test]
    fn subtype_follows_crisis_type() {
        let mut missing = EntityForm::edited(EventForm {
            violence_subtype: String::new(),
            ..conflict()
        });
        assert!(!missing.validate());
        assert_eq!(missing.errors().get("violence_subtype").len(), 1);

        let mut disaster = EntityForm::edited(EventForm {
            crisis_type: "disaster".to_string(),
            ..conflict()
        });
        assert!(!disaster.validate());
        assert_eq!(
            disaster.errors().get("violence_subtype"),
            ["Only conflict events have a violence subtype.".to_string()]
        );
    }

    #[test]
    fn end_date_cannot_precede_start() {
        let mut form = EntityForm::edited(EventForm {
            end_date: "2024-01-01".to_string(),
            ..conflict()
        });

        assert!(!form.validate());
        assert_eq!(form.errors().get("end_date").len(), 1);
        assert!(form.errors().get("start_date").is_empty());
    }
}

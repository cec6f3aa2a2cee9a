use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::report::{NewReport, Report};
use crate::domain::types::{EventId, ReportName, SanitizedText, TypeConstraintError, optional};
use crate::forms::{FormError, FormInputs, blank_as_none, field, invalid, required};
use crate::list::filter::{FilterField, InputKind, OptionsRef};
use crate::list::mutation::FormDraft;

#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ReportForm {
    #[validate(custom(function = "required"))]
    pub name: String,
    pub description: String,
    /// Optional event the report covers.
    #[validate(custom(function = "valid_event"))]
    pub event_id: String,
}

fn event_id(value: &str) -> Result<Option<EventId>, TypeConstraintError> {
    match blank_as_none(value) {
        Some(raw) => raw
            .parse::<i32>()
            .map_err(|_| TypeConstraintError::NonPositiveId)
            .and_then(EventId::new)
            .map(Some),
        None => Ok(None),
    }
}

fn valid_event(value: &str) -> Result<(), ValidationError> {
    event_id(value)
        .map(|_| ())
        .map_err(|_| invalid("event_id", "Pick an event from the list."))
}

impl FormDraft for ReportForm {
    const FIELDS: &'static [&'static str] = &["name", "description", "event_id"];
}

impl FormInputs for ReportForm {
    const REQUIRED: &'static [&'static str] = &["name"];
    const INPUTS: &'static [FilterField] = &[
        FilterField::new("name", "Name", InputKind::Text),
        FilterField::new("description", "Description", InputKind::Text),
        FilterField::new("event_id", "Event", InputKind::Select)
            .with_options(OptionsRef::Lazy("events")),
    ];
}

impl From<&Report> for ReportForm {
    fn from(report: &Report) -> Self {
        Self {
            name: report.name.to_string(),
            description: report
                .description
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            event_id: report.event_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

impl TryFrom<&ReportForm> for NewReport {
    type Error = FormError;

    fn try_from(form: &ReportForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            name: field("name", ReportName::new(form.name.as_str()))?,
            description: field(
                "description",
                optional(Some(form.description.as_str()), SanitizedText::new),
            )?,
            event_id: field("event_id", event_id(&form.event_id))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_event_means_no_event() {
        let form = ReportForm {
            name: "Q1 summary".to_string(),
            description: String::new(),
            event_id: " ".to_string(),
        };

        let report = NewReport::try_from(&form).expect("valid form");

        assert_eq!(report.event_id, None);
        assert_eq!(report.description, None);
    }

    #[test]
    fn event_must_be_an_id() {
        let form = ReportForm {
            name: "Q1 summary".to_string(),
            description: String::new(),
            event_id: "abc".to_string(),
        };

        let error = NewReport::try_from(&form).expect_err("bad event id");

        assert_eq!(error.field_errors()[0].field, "event_id");
    }
}

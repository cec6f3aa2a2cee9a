use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::event::{CrisisType, Event as DomainEvent, NewEvent as DomainNewEvent};
use crate::domain::types::{CountryCode, EventId, EventName, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::events)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub crisis_type: String,
    pub violence_subtype: Option<String>,
    pub country: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::events)]
#[diesel(treat_none_as_null = true)]
pub struct NewEvent<'a> {
    pub name: &'a str,
    pub crisis_type: &'a str,
    pub violence_subtype: Option<&'a str>,
    pub country: &'a str,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<Event> for DomainEvent {
    type Error = TypeConstraintError;

    fn try_from(row: Event) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EventId::try_from(row.id)?,
            name: EventName::new(row.name)?,
            crisis_type: CrisisType::try_from(row.crisis_type.as_str())?,
            violence_subtype: row.violence_subtype,
            country: CountryCode::new(row.country)?,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewEvent> for NewEvent<'a> {
    fn from(value: &'a DomainNewEvent) -> Self {
        Self {
            name: value.name.as_str(),
            crisis_type: value.crisis_type.as_str(),
            violence_subtype: value.violence_subtype.as_deref(),
            country: value.country.as_str(),
            start_date: value.start_date,
            end_date: value.end_date,
        }
    }
}

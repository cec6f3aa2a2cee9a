use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::report::{
    NewReport as DomainNewReport, Report as DomainReport, ReportSignOff as DomainReportSignOff,
};
use crate::domain::types::{
    EventId, ReportId, ReportName, SanitizedText, TypeConstraintError, optional,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::reports)]
pub struct Report {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub event_id: Option<i32>,
    pub is_signed_off: bool,
    pub signed_off_by: Option<String>,
    pub signed_off_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::reports)]
#[diesel(treat_none_as_null = true)]
pub struct NewReport<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub event_id: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::reports)]
pub struct ReportSignOff<'a> {
    pub is_signed_off: bool,
    pub signed_off_by: &'a str,
    pub signed_off_at: NaiveDateTime,
}

impl TryFrom<Report> for DomainReport {
    type Error = TypeConstraintError;

    fn try_from(row: Report) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReportId::try_from(row.id)?,
            name: ReportName::new(row.name)?,
            description: optional(row.description.as_deref(), SanitizedText::new)?,
            event_id: row.event_id.map(EventId::try_from).transpose()?,
            is_signed_off: row.is_signed_off,
            signed_off_by: row.signed_off_by,
            signed_off_at: row.signed_off_at,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewReport> for NewReport<'a> {
    fn from(value: &'a DomainNewReport) -> Self {
        Self {
            name: value.name.as_str(),
            description: value.description.as_ref().map(SanitizedText::as_str),
            event_id: value.event_id.map(EventId::get),
        }
    }
}

impl<'a> From<&'a DomainReportSignOff> for ReportSignOff<'a> {
    fn from(value: &'a DomainReportSignOff) -> Self {
        Self {
            is_signed_off: true,
            signed_off_by: value.signed_off_by.as_str(),
            signed_off_at: value.signed_off_at,
        }
    }
}

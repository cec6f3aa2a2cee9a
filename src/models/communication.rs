use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::communication::{
    Communication as DomainCommunication, Medium, NewCommunication as DomainNewCommunication,
};
use crate::domain::types::{
    CommunicationId, ContactId, SanitizedText, Subject, TypeConstraintError, optional,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::communications)]
pub struct Communication {
    pub id: i32,
    pub contact_id: i32,
    pub subject: String,
    pub medium: String,
    pub date: NaiveDate,
    pub content: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::communications)]
#[diesel(treat_none_as_null = true)]
pub struct NewCommunication<'a> {
    pub contact_id: i32,
    pub subject: &'a str,
    pub medium: &'a str,
    pub date: NaiveDate,
    pub content: Option<&'a str>,
}

impl TryFrom<Communication> for DomainCommunication {
    type Error = TypeConstraintError;

    fn try_from(row: Communication) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CommunicationId::try_from(row.id)?,
            contact_id: ContactId::try_from(row.contact_id)?,
            subject: Subject::new(row.subject)?,
            medium: Medium::try_from(row.medium.as_str())?,
            date: row.date,
            content: optional(row.content.as_deref(), SanitizedText::new)?,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewCommunication> for NewCommunication<'a> {
    fn from(value: &'a DomainNewCommunication) -> Self {
        Self {
            contact_id: value.contact_id.get(),
            subject: value.subject.as_str(),
            medium: value.medium.as_str(),
            date: value.date,
            content: value.content.as_ref().map(SanitizedText::as_str),
        }
    }
}

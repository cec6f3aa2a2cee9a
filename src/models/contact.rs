use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::contact::{Contact as DomainContact, NewContact as DomainNewContact};
use crate::domain::types::{
    ContactEmail, ContactId, ContactName, CountryCode, PhoneNumber, TypeConstraintError, optional,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::contacts)]
/// Diesel model for [`crate::domain::contact::Contact`].
pub struct Contact {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub country: Option<String>,
    pub job_title: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::contacts)]
#[diesel(treat_none_as_null = true)]
/// Insertable and update form of [`Contact`].
pub struct NewContact<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub organization: Option<&'a str>,
    pub country: Option<&'a str>,
    pub job_title: Option<&'a str>,
}

impl TryFrom<Contact> for DomainContact {
    type Error = TypeConstraintError;

    fn try_from(contact: Contact) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ContactId::try_from(contact.id)?,
            name: ContactName::new(contact.name)?,
            email: optional(contact.email.as_deref(), ContactEmail::new)?,
            phone: optional(contact.phone.as_deref(), PhoneNumber::new)?,
            organization: contact.organization,
            country: optional(contact.country.as_deref(), CountryCode::new)?,
            job_title: contact.job_title,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewContact> for NewContact<'a> {
    fn from(contact: &'a DomainNewContact) -> Self {
        Self {
            name: contact.name.as_str(),
            email: contact.email.as_ref().map(ContactEmail::as_str),
            phone: contact.phone.as_ref().map(PhoneNumber::as_str),
            organization: contact.organization.as_deref(),
            country: contact.country.as_ref().map(CountryCode::as_str),
            job_title: contact.job_title.as_deref(),
        }
    }
}

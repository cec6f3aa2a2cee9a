use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::contact::{Contact, ContactFilter, NewContact, UpdateContact};
use crate::domain::types::ContactId;
use crate::models::contact::{Contact as DbContact, NewContact as DbNewContact};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    ContactReader, ContactWriter, DieselRepository, ListQuery, Listed, like_pattern, sort_by,
};
use crate::schema::contacts;

fn filtered(filter: &ContactFilter) -> contacts::BoxedQuery<'static, Sqlite> {
    let mut query = contacts::table.into_boxed();
    if !filter.search.is_empty() {
        let pattern = like_pattern(&filter.search);
        query = query.filter(
            contacts::name
                .like(pattern.clone())
                .or(contacts::email.like(pattern.clone()))
                .or(contacts::organization.like(pattern)),
        );
    }
    if !filter.country.is_empty() {
        query = query.filter(contacts::country.eq(filter.country.clone()));
    }
    if !filter.organization.is_empty() {
        query = query.filter(contacts::organization.eq(filter.organization.clone()));
    }
    query
}

impl ContactReader for DieselRepository {
    fn get_contact_by_id(&self, id: ContactId) -> RepositoryResult<Option<Contact>> {
        let mut conn = self.conn()?;
        let contact = contacts::table
            .find(id.get())
            .first::<DbContact>(&mut conn)
            .optional()?;

        Ok(contact.map(Contact::try_from).transpose()?)
    }

    fn list_contacts(&self, query: &ListQuery<ContactFilter>) -> RepositoryResult<Listed<Contact>> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query.filters).count().get_result(&mut conn)?;

        let rows = sort_by!(filtered(&query.filters), query.ordering.as_ref(), contacts::id, {
            "name" => contacts::name,
            "country" => contacts::country,
            "created_at" => contacts::created_at,
        })
        .limit(query.pagination.limit())
        .offset(query.pagination.offset())
        .load::<DbContact>(&mut conn)?;

        let items = rows
            .into_iter()
            .map(Contact::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as usize, items))
    }

    fn list_contact_countries(&self) -> RepositoryResult<Vec<String>> {
        let mut conn = self.conn()?;
        let countries = contacts::table
            .select(contacts::country)
            .filter(contacts::country.is_not_null())
            .distinct()
            .order(contacts::country.asc())
            .load::<Option<String>>(&mut conn)?;

        Ok(countries.into_iter().flatten().collect())
    }

    fn list_organizations(&self) -> RepositoryResult<Vec<String>> {
        let mut conn = self.conn()?;
        let organizations = contacts::table
            .select(contacts::organization)
            .filter(contacts::organization.is_not_null())
            .distinct()
            .order(contacts::organization.asc())
            .load::<Option<String>>(&mut conn)?;

        Ok(organizations.into_iter().flatten().collect())
    }
}

impl ContactWriter for DieselRepository {
    fn create_contact(&self, contact: &NewContact) -> RepositoryResult<Contact> {
        let mut conn = self.conn()?;
        let insertable = DbNewContact::from(contact);

        let created = diesel::insert_into(contacts::table)
            .values(&insertable)
            .get_result::<DbContact>(&mut conn)?;

        Ok(Contact::try_from(created)?)
    }

    fn update_contact(&self, id: ContactId, contact: &UpdateContact) -> RepositoryResult<Contact> {
        let mut conn = self.conn()?;
        let changes = DbNewContact::from(contact);

        let updated = diesel::update(contacts::table.find(id.get()))
            .set((&changes, contacts::updated_at.eq(Utc::now().naive_utc())))
            .get_result::<DbContact>(&mut conn)?;

        Ok(Contact::try_from(updated)?)
    }

    fn delete_contact(&self, id: ContactId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(contacts::table.find(id.get())).execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

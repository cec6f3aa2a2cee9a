use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::communication::{
    Communication, CommunicationFilter, NewCommunication, UpdateCommunication,
};
use crate::domain::types::CommunicationId;
use crate::models::communication::{
    Communication as DbCommunication, NewCommunication as DbNewCommunication,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    CommunicationReader, CommunicationWriter, DieselRepository, ListQuery, Listed, like_pattern,
    sort_by,
};
use crate::schema::communications;

fn filtered(filter: &CommunicationFilter) -> communications::BoxedQuery<'static, Sqlite> {
    let mut query = communications::table.into_boxed();
    if let Some(contact_id) = filter.contact_id {
        query = query.filter(communications::contact_id.eq(contact_id));
    }
    if !filter.search.is_empty() {
        let pattern = like_pattern(&filter.search);
        query = query.filter(
            communications::subject
                .like(pattern.clone())
                .or(communications::content.like(pattern)),
        );
    }
    if !filter.medium.is_empty() {
        query = query.filter(communications::medium.eq_any(filter.medium.clone()));
    }
    query
}

impl CommunicationReader for DieselRepository {
    fn get_communication_by_id(
        &self,
        id: CommunicationId,
    ) -> RepositoryResult<Option<Communication>> {
        let mut conn = self.conn()?;
        let row = communications::table
            .find(id.get())
            .first::<DbCommunication>(&mut conn)
            .optional()?;

        Ok(row.map(Communication::try_from).transpose()?)
    }

    fn list_communications(
        &self,
        query: &ListQuery<CommunicationFilter>,
    ) -> RepositoryResult<Listed<Communication>> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query.filters).count().get_result(&mut conn)?;

        let rows = sort_by!(filtered(&query.filters), query.ordering.as_ref(), communications::id, {
            "subject" => communications::subject,
            "date" => communications::date,
        })
        .limit(query.pagination.limit())
        .offset(query.pagination.offset())
        .load::<DbCommunication>(&mut conn)?;

        let items = rows
            .into_iter()
            .map(Communication::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as usize, items))
    }
}

impl CommunicationWriter for DieselRepository {
    fn create_communication(
        &self,
        communication: &NewCommunication,
    ) -> RepositoryResult<Communication> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(communications::table)
            .values(&DbNewCommunication::from(communication))
            .get_result::<DbCommunication>(&mut conn)?;

        Ok(Communication::try_from(created)?)
    }

    fn update_communication(
        &self,
        id: CommunicationId,
        communication: &UpdateCommunication,
    ) -> RepositoryResult<Communication> {
        let mut conn = self.conn()?;
        let updated = diesel::update(communications::table.find(id.get()))
            .set(&DbNewCommunication::from(communication))
            .get_result::<DbCommunication>(&mut conn)?;

        Ok(Communication::try_from(updated)?)
    }

    fn delete_communication(&self, id: CommunicationId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        match diesel::delete(communications::table.find(id.get())).execute(&mut conn)? {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }
}

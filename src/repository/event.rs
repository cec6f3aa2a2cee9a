use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::event::{Event, EventFilter, NewEvent, UpdateEvent};
use crate::domain::types::EventId;
use crate::list::filter::parse_date;
use crate::models::event::{Event as DbEvent, NewEvent as DbNewEvent};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, EventReader, EventWriter, ListQuery, Listed, like_pattern, sort_by,
};
use crate::schema::events;

fn filtered(filter: &EventFilter) -> events::BoxedQuery<'static, Sqlite> {
    let mut query = events::table.into_boxed();
    if !filter.search.is_empty() {
        query = query.filter(events::name.like(like_pattern(&filter.search)));
    }
    if !filter.crisis_types.is_empty() {
        let crisis_types: Vec<String> =
            filter.crisis_types.iter().map(|t| t.to_lowercase()).collect();
        query = query.filter(events::crisis_type.eq_any(crisis_types));
    }
    if !filter.violence_subtypes.is_empty() {
        query = query.filter(events::violence_subtype.eq_any(filter.violence_subtypes.clone()));
    }
    if !filter.countries.is_empty() {
        query = query.filter(events::country.eq_any(filter.countries.clone()));
    }
    if let Some(from) = parse_date(&filter.date_from) {
        query = query.filter(events::start_date.ge(from));
    }
    if let Some(to) = parse_date(&filter.date_to) {
        query = query.filter(events::start_date.le(to));
    }
    query
}

impl EventReader for DieselRepository {
    fn get_event_by_id(&self, id: EventId) -> RepositoryResult<Option<Event>> {
        let mut conn = self.conn()?;
        let row = events::table
            .find(id.get())
            .first::<DbEvent>(&mut conn)
            .optional()?;

        Ok(row.map(Event::try_from).transpose()?)
    }

    fn list_events(&self, query: &ListQuery<EventFilter>) -> RepositoryResult<Listed<Event>> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query.filters).count().get_result(&mut conn)?;

        let rows = sort_by!(filtered(&query.filters), query.ordering.as_ref(), events::id, {
            "name" => events::name,
            "start_date" => events::start_date,
            "created_at" => events::created_at,
        })
        .limit(query.pagination.limit())
        .offset(query.pagination.offset())
        .load::<DbEvent>(&mut conn)?;

        let items = rows
            .into_iter()
            .map(Event::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as usize, items))
    }

    fn list_event_countries(&self) -> RepositoryResult<Vec<String>> {
        let mut conn = self.conn()?;
        let countries = events::table
            .select(events::country)
            .distinct()
            .order(events::country.asc())
            .load::<String>(&mut conn)?;

        Ok(countries)
    }

    fn list_event_choices(&self) -> RepositoryResult<Vec<(i32, String)>> {
        let mut conn = self.conn()?;
        let choices = events::table
            .select((events::id, events::name))
            .order(events::start_date.desc())
            .then_order_by(events::id.desc())
            .load::<(i32, String)>(&mut conn)?;

        Ok(choices)
    }
}

impl EventWriter for DieselRepository {
    fn create_event(&self, event: &NewEvent) -> RepositoryResult<Event> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(events::table)
            .values(&DbNewEvent::from(event))
            .get_result::<DbEvent>(&mut conn)?;

        Ok(Event::try_from(created)?)
    }

    fn update_event(&self, id: EventId, event: &UpdateEvent) -> RepositoryResult<Event> {
        let mut conn = self.conn()?;
        let updated = diesel::update(events::table.find(id.get()))
            .set(&DbNewEvent::from(event))
            .get_result::<DbEvent>(&mut conn)?;

        Ok(Event::try_from(updated)?)
    }

    fn delete_event(&self, id: EventId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        match diesel::delete(events::table.find(id.get())).execute(&mut conn)? {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }
}

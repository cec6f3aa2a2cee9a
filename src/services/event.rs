//! Displacement events.

use crate::domain::event::{CrisisType, Event, EventFilter, NewEvent};
use crate::domain::types::EventId;
use crate::forms::event::EventForm;
use crate::list::mutation::TransportError;
use crate::list::table::{ActionColumn, ActionKind, Cell, Column, Table};
use crate::list::variables::QueryVariables;
use crate::list::{EntityKey, ListResult};
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::{EventReader, EventWriter};
use crate::services::list::fetch_page;
use crate::services::{
    MutationResult, ServiceError, ServiceResult, forbidden, rejected_form, respond, unknown,
};

fn edit_href(event: &Event) -> String {
    format!("/events/{}", event.id)
}

fn delete_href(event: &Event) -> String {
    format!("/events/{}/delete", event.id)
}

fn crisis_badge(crisis_type: CrisisType) -> &'static str {
    match crisis_type {
        CrisisType::Conflict => "danger",
        CrisisType::Disaster => "warning",
        CrisisType::Other => "secondary",
    }
}

pub fn events_table(permissions: &Permissions) -> Table<Event> {
    let flags = permissions.flags(PermissionEntity::Event);
    Table::new(
        vec![
            Column::new("name", "Name", |e: &Event| {
                Cell::link(e.name.as_str(), format!("/reports?event_id={}", e.id))
            }),
            Column::new("crisis_type", "Crisis", |e: &Event| {
                Cell::status(e.crisis_type.as_str(), crisis_badge(e.crisis_type))
            }),
            Column::new("violence_subtype", "Violence", |e: &Event| {
                Cell::optional(e.violence_subtype.as_deref())
            }),
            Column::new("country", "Country", |e: &Event| Cell::text(e.country.as_str())),
            Column::new("start_date", "Start", |e: &Event| Cell::date(e.start_date)),
            Column::new("end_date", "End", |e: &Event| match e.end_date {
                Some(end) => Cell::date(end),
                None => Cell::optional(None),
            }),
        ],
        ActionColumn::new()
            .with(ActionKind::Edit, flags.change, Some(edit_href))
            .with(ActionKind::Delete, flags.delete, Some(delete_href)),
    )
}

pub fn list_events<R>(
    repo: &R,
    variables: &QueryVariables<EventFilter>,
) -> Result<ListResult<Event>, TransportError>
where
    R: EventReader + ?Sized,
{
    fetch_page(variables, |query| repo.list_events(query))
}

pub fn get_event<R>(repo: &R, event_id: i32) -> ServiceResult<Event>
where
    R: EventReader + ?Sized,
{
    let id = EventId::new(event_id)?;
    repo.get_event_by_id(id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

pub fn create_event<R>(repo: &R, permissions: &Permissions, form: &EventForm) -> MutationResult<Event>
where
    R: EventWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Event, Capability::Add) {
        return Ok(refused);
    }
    let event = match NewEvent::try_from(form) {
        Ok(event) => event,
        Err(err) => return Ok(rejected_form(&err)),
    };
    log::info!("Recording event {}", event.name.as_str());
    respond(repo.create_event(&event), None)
}

pub fn update_event<R>(
    repo: &R,
    permissions: &Permissions,
    event_id: i32,
    form: &EventForm,
) -> MutationResult<Event>
where
    R: EventWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Event, Capability::Change) {
        return Ok(refused);
    }
    let Ok(id) = EventId::new(event_id) else {
        return Ok(unknown("event"));
    };
    let event = match NewEvent::try_from(form) {
        Ok(event) => event,
        Err(err) => return Ok(rejected_form(&err)),
    };
    respond(repo.update_event(id, &event), None)
}

pub fn delete_event<R>(
    repo: &R,
    permissions: &Permissions,
    key: EntityKey,
) -> MutationResult<EntityKey>
where
    R: EventWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Event, Capability::Delete) {
        return Ok(refused);
    }
    let Ok(id) = EventId::new(key.get()) else {
        return Ok(unknown("event"));
    };
    log::info!("Deleting event {id}");
    respond(repo.delete_event(id).map(|()| key), None)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;

    #[test]
    fn conflict_without_subtype_is_rejected_before_saving() {
        let mut repo = MockRepository::new();
        repo.expect_create_event().times(0);
        let form = EventForm {
            name: "Jos clashes".to_string(),
            crisis_type: "conflict".to_string(),
            country: "NG".to_string(),
            start_date: "2024-01-10".to_string(),
            ..EventForm::default()
        };

        let response = create_event(&repo, &Permissions::all(), &form).expect("response");

        assert_eq!(response.errors[0].field, "violence_subtype");
    }

    #[test]
    fn viewers_only_get_rows() {
        assert!(events_table(&Permissions::viewer()).actions().is_empty());
    }
}

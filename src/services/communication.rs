//! Communications logged against one contact.

use crate::domain::communication::{Communication, CommunicationFilter, NewCommunication};
use crate::domain::types::{CommunicationId, ContactId};
use crate::forms::communication::CommunicationForm;
use crate::list::mutation::TransportError;
use crate::list::table::{ActionColumn, ActionKind, Cell, Column, Table};
use crate::list::variables::QueryVariables;
use crate::list::{EntityKey, ListResult};
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::{CommunicationReader, CommunicationWriter};
use crate::services::list::fetch_page;
use crate::services::{
    MutationResult, ServiceError, ServiceResult, forbidden, rejected_form, respond, unknown,
};

/// Path of the communications list of a contact.
pub fn communications_base(contact_id: ContactId) -> String {
    format!("/contacts/{contact_id}/communications")
}

fn edit_href(communication: &Communication) -> String {
    format!("/communications/{}", communication.id)
}

fn delete_href(communication: &Communication) -> String {
    format!("/communications/{}/delete", communication.id)
}

pub fn communications_table(permissions: &Permissions) -> Table<Communication> {
    let flags = permissions.flags(PermissionEntity::Communication);
    Table::new(
        vec![
            Column::new("date", "Date", |c: &Communication| Cell::date(c.date)),
            Column::new("subject", "Subject", |c: &Communication| {
                Cell::text(c.subject.as_str())
            }),
            Column::new("medium", "Medium", |c: &Communication| {
                Cell::status(c.medium.as_str(), "secondary")
            }),
            Column::new("content", "Notes", |c: &Communication| {
                Cell::custom(c.content.as_ref().map(|t| t.as_str()).unwrap_or_default())
            }),
        ],
        ActionColumn::new()
            .with(ActionKind::Edit, flags.change, Some(edit_href))
            .with(ActionKind::Delete, flags.delete, Some(delete_href)),
    )
}

pub fn list_communications<R>(
    repo: &R,
    variables: &QueryVariables<CommunicationFilter>,
) -> Result<ListResult<Communication>, TransportError>
where
    R: CommunicationReader + ?Sized,
{
    fetch_page(variables, |query| repo.list_communications(query))
}

pub fn get_communication<R>(repo: &R, communication_id: i32) -> ServiceResult<Communication>
where
    R: CommunicationReader + ?Sized,
{
    let id = CommunicationId::new(communication_id)?;
    repo.get_communication_by_id(id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

pub fn create_communication<R>(
    repo: &R,
    permissions: &Permissions,
    form: &CommunicationForm,
) -> MutationResult<Communication>
where
    R: CommunicationWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Communication, Capability::Add)
    {
        return Ok(refused);
    }
    let communication = match NewCommunication::try_from(form) {
        Ok(communication) => communication,
        Err(err) => return Ok(rejected_form(&err)),
    };
    log::info!(
        "Logging communication for contact {}",
        communication.contact_id
    );
    respond(repo.create_communication(&communication), None)
}

pub fn update_communication<R>(
    repo: &R,
    permissions: &Permissions,
    communication_id: i32,
    form: &CommunicationForm,
) -> MutationResult<Communication>
where
    R: CommunicationWriter + ?Sized,
{
    if let Some(refused) = forbidden(
        permissions,
        PermissionEntity::Communication,
        Capability::Change,
    ) {
        return Ok(refused);
    }
    let Ok(id) = CommunicationId::new(communication_id) else {
        return Ok(unknown("communication"));
    };
    let communication = match NewCommunication::try_from(form) {
        Ok(communication) => communication,
        Err(err) => return Ok(rejected_form(&err)),
    };
    respond(repo.update_communication(id, &communication), None)
}

pub fn delete_communication<R>(
    repo: &R,
    permissions: &Permissions,
    key: EntityKey,
) -> MutationResult<EntityKey>
where
    R: CommunicationWriter + ?Sized,
{
    if let Some(refused) = forbidden(
        permissions,
        PermissionEntity::Communication,
        Capability::Delete,
    ) {
        return Ok(refused);
    }
    let Ok(id) = CommunicationId::new(key.get()) else {
        return Ok(unknown("communication"));
    };
    respond(repo.delete_communication(id).map(|()| key), None)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;

    #[test]
    fn rows_get_edit_and_delete_for_editors() {
        let table = communications_table(&Permissions::all());

        assert_eq!(
            table.actions().kinds(),
            vec![ActionKind::Edit, ActionKind::Delete]
        );
        assert!(communications_table(&Permissions::viewer()).actions().is_empty());
    }

    #[test]
    fn listing_passes_the_fixed_contact() {
        let mut repo = MockRepository::new();
        repo.expect_list_communications()
            .withf(|query| query.filters.contact_id == Some(4))
            .times(1)
            .returning(|_| Ok((0, Vec::new())));
        let contact = ContactId::new(4).expect("valid id");
        let variables = QueryVariables::initial(
            &crate::domain::communication::COMMUNICATIONS,
            CommunicationFilter::for_contact(contact),
        );

        let page = list_communications(&repo, &variables).expect("page");

        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn missing_row_on_delete_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_delete_communication()
            .returning(|_| Err(crate::repository::errors::RepositoryError::NotFound));

        let response = delete_communication(&repo, &Permissions::all(), EntityKey::new(3))
            .expect("response");

        assert!(response.result.is_none());
        assert_eq!(response.errors.len(), 1);
    }
}

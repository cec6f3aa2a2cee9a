//! Contacts list, form and mutations.

use crate::domain::contact::{Contact, ContactFilter, NewContact};
use crate::domain::types::ContactId;
use crate::forms::contact::ContactForm;
use crate::list::mutation::TransportError;
use crate::list::table::{ActionColumn, ActionKind, Cell, Column, Table};
use crate::list::variables::QueryVariables;
use crate::list::{EntityKey, ListResult};
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::{ContactReader, ContactWriter};
use crate::services::list::fetch_page;
use crate::services::{
    MutationResult, ServiceError, ServiceResult, forbidden, rejected_form, respond, unknown,
};

fn edit_href(contact: &Contact) -> String {
    format!("/contacts/{}", contact.id)
}

fn delete_href(contact: &Contact) -> String {
    format!("/contacts/{}/delete", contact.id)
}

pub fn contacts_table(permissions: &Permissions) -> Table<Contact> {
    let flags = permissions.flags(PermissionEntity::Contact);
    Table::new(
        vec![
            Column::new("name", "Name", |c: &Contact| {
                Cell::link(c.name.as_str(), format!("/contacts/{}/communications", c.id))
            }),
            Column::new("email", "Email", |c: &Contact| {
                Cell::optional(c.email.as_ref().map(|e| e.as_str()))
            }),
            Column::new("phone", "Phone", |c: &Contact| {
                Cell::optional(c.phone.as_ref().map(|p| p.as_str()))
            }),
            Column::new("organization", "Organization", |c: &Contact| {
                Cell::optional(c.organization.as_deref())
            }),
            Column::new("country", "Country", |c: &Contact| {
                Cell::optional(c.country.as_ref().map(|code| code.as_str()))
            }),
            Column::new("created_at", "Created", |c: &Contact| {
                Cell::timestamp(c.created_at)
            }),
        ],
        ActionColumn::new()
            .with(ActionKind::Edit, flags.change, Some(edit_href))
            .with(ActionKind::Delete, flags.delete, Some(delete_href)),
    )
}

pub fn list_contacts<R>(
    repo: &R,
    variables: &QueryVariables<ContactFilter>,
) -> Result<ListResult<Contact>, TransportError>
where
    R: ContactReader + ?Sized,
{
    fetch_page(variables, |query| repo.list_contacts(query))
}

pub fn get_contact<R>(repo: &R, contact_id: i32) -> ServiceResult<Contact>
where
    R: ContactReader + ?Sized,
{
    let id = ContactId::new(contact_id)?;
    repo.get_contact_by_id(id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

pub fn create_contact<R>(
    repo: &R,
    permissions: &Permissions,
    form: &ContactForm,
) -> MutationResult<Contact>
where
    R: ContactWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Contact, Capability::Add) {
        return Ok(refused);
    }
    let contact = match NewContact::try_from(form) {
        Ok(contact) => contact,
        Err(err) => return Ok(rejected_form(&err)),
    };
    log::info!("Creating contact {}", contact.name.as_str());
    respond(repo.create_contact(&contact), Some("email"))
}

pub fn update_contact<R>(
    repo: &R,
    permissions: &Permissions,
    contact_id: i32,
    form: &ContactForm,
) -> MutationResult<Contact>
where
    R: ContactWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Contact, Capability::Change) {
        return Ok(refused);
    }
    let Ok(id) = ContactId::new(contact_id) else {
        return Ok(unknown("contact"));
    };
    let contact = match NewContact::try_from(form) {
        Ok(contact) => contact,
        Err(err) => return Ok(rejected_form(&err)),
    };
    respond(repo.update_contact(id, &contact), Some("email"))
}

pub fn delete_contact<R>(
    repo: &R,
    permissions: &Permissions,
    key: EntityKey,
) -> MutationResult<EntityKey>
where
    R: ContactWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Contact, Capability::Delete) {
        return Ok(refused);
    }
    let Ok(id) = ContactId::new(key.get()) else {
        return Ok(unknown("contact"));
    };
    log::info!("Deleting contact {id}");
    respond(repo.delete_contact(id).map(|()| key), None)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::types::{ContactEmail, ContactName};
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    fn contact(id: i32, name: &str) -> Contact {
        let created_at = NaiveDate::from_ymd_opt(2024, 2, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid timestamp");
        Contact {
            id: ContactId::new(id).expect("valid id"),
            name: ContactName::new(name).expect("valid name"),
            email: Some(ContactEmail::new("amina@example.org").expect("valid email")),
            phone: None,
            organization: None,
            country: None,
            job_title: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn form() -> ContactForm {
        ContactForm {
            name: "Amina Yusuf".to_string(),
            email: "amina@example.org".to_string(),
            ..ContactForm::default()
        }
    }

    #[test]
    fn create_requires_add_capability() {
        let mut repo = MockRepository::new();
        repo.expect_create_contact().times(0);

        let response = create_contact(&repo, &Permissions::viewer(), &form()).expect("response");

        assert!(response.result.is_none());
        assert_eq!(response.errors.len(), 1);
    }

    #[test]
    fn duplicate_email_is_a_field_error() {
        let mut repo = MockRepository::new();
        repo.expect_create_contact()
            .times(1)
            .returning(|_| Err(RepositoryError::Conflict("UNIQUE constraint failed".into())));

        let response = create_contact(&repo, &Permissions::all(), &form()).expect("response");

        assert_eq!(response.errors[0].field, "email");
    }

    #[test]
    fn invalid_form_never_reaches_the_repository() {
        let mut repo = MockRepository::new();
        repo.expect_create_contact().times(0);
        let form = ContactForm {
            email: "nope".to_string(),
            ..form()
        };

        let response = create_contact(&repo, &Permissions::all(), &form).expect("response");

        assert_eq!(response.errors[0].field, "email");
    }

    #[test]
    fn update_returns_the_saved_contact() {
        let mut repo = MockRepository::new();
        repo.expect_update_contact()
            .withf(|id, contact| id.get() == 4 && contact.name.as_str() == "Amina Yusuf")
            .times(1)
            .returning(|id, _| Ok(contact(id.get(), "Amina Yusuf")));

        let response =
            update_contact(&repo, &Permissions::all(), 4, &form()).expect("response");

        assert!(response.is_ok());
        assert_eq!(response.result.map(|c| c.id.get()), Some(4));
    }

    #[test]
    fn delete_echoes_the_key() {
        let mut repo = MockRepository::new();
        repo.expect_delete_contact().times(1).returning(|_| Ok(()));

        let response = delete_contact(&repo, &Permissions::all(), EntityKey::new(9))
            .expect("response");

        assert_eq!(response.result, Some(EntityKey::new(9)));
    }

    #[test]
    fn failed_listing_is_a_transport_error() {
        let mut repo = MockRepository::new();
        repo.expect_list_contacts()
            .returning(|_| Err(RepositoryError::ConnectionError("down".into())));
        let variables = QueryVariables::initial(
            &crate::domain::contact::CONTACTS,
            ContactFilter::default(),
        );

        assert!(list_contacts(&repo, &variables).is_err());
    }
}

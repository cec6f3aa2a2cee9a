use crate::domain::resource::{NewResource, Resource, ResourceFilter};
use crate::domain::types::ResourceId;
use crate::forms::resource::ResourceForm;
use crate::list::mutation::TransportError;
use crate::list::table::{ActionColumn, ActionKind, Cell, Column, Table};
use crate::list::variables::QueryVariables;
use crate::list::{EntityKey, ListResult};
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::{ResourceReader, ResourceWriter};
use crate::services::list::fetch_page;
use crate::services::{
    MutationResult, ServiceError, ServiceResult, forbidden, rejected_form, respond, unknown,
};

fn edit_href(resource: &Resource) -> String {
    format!("/resources/{}", resource.id)
}

fn delete_href(resource: &Resource) -> String {
    format!("/resources/{}/delete", resource.id)
}

pub fn resources_table(permissions: &Permissions) -> Table<Resource> {
    let flags = permissions.flags(PermissionEntity::Resource);
    Table::new(
        vec![
            Column::new("name", "Name", |r: &Resource| Cell::text(r.name.as_str())),
            Column::new("url", "Link", |r: &Resource| {
                Cell::link(r.url.as_str(), r.url.as_str())
            }),
            Column::new("group", "Group", |r: &Resource| Cell::optional(r.group.as_deref())),
            Column::new("countries", "Countries", |r: &Resource| {
                Cell::text(r.countries_label())
            }),
            Column::new("created_at", "Created", |r: &Resource| {
                Cell::timestamp(r.created_at)
            }),
        ],
        ActionColumn::new()
            .with(ActionKind::Edit, flags.change, Some(edit_href))
            .with(ActionKind::Delete, flags.delete, Some(delete_href)),
    )
}

pub fn list_resources<R>(
    repo: &R,
    variables: &QueryVariables<ResourceFilter>,
) -> Result<ListResult<Resource>, TransportError>
where
    R: ResourceReader + ?Sized,
{
    fetch_page(variables, |query| repo.list_resources(query))
}

pub fn get_resource<R>(repo: &R, resource_id: i32) -> ServiceResult<Resource>
where
    R: ResourceReader + ?Sized,
{
    let id = ResourceId::new(resource_id)?;
    repo.get_resource_by_id(id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

pub fn create_resource<R>(
    repo: &R,
    permissions: &Permissions,
    form: &ResourceForm,
) -> MutationResult<Resource>
where
    R: ResourceWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Resource, Capability::Add) {
        return Ok(refused);
    }
    let resource = match NewResource::try_from(form) {
        Ok(resource) => resource,
        Err(err) => return Ok(rejected_form(&err)),
    };
    respond(repo.create_resource(&resource), None)
}

pub fn update_resource<R>(
    repo: &R,
    permissions: &Permissions,
    resource_id: i32,
    form: &ResourceForm,
) -> MutationResult<Resource>
where
    R: ResourceWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Resource, Capability::Change)
    {
        return Ok(refused);
    }
    let Ok(id) = ResourceId::new(resource_id) else {
        return Ok(unknown("resource"));
    };
    let resource = match NewResource::try_from(form) {
        Ok(resource) => resource,
        Err(err) => return Ok(rejected_form(&err)),
    };
    respond(repo.update_resource(id, &resource), None)
}

pub fn delete_resource<R>(
    repo: &R,
    permissions: &Permissions,
    key: EntityKey,
) -> MutationResult<EntityKey>
where
    R: ResourceWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Resource, Capability::Delete)
    {
        return Ok(refused);
    }
    let Ok(id) = ResourceId::new(key.get()) else {
        return Ok(unknown("resource"));
    };
    respond(repo.delete_resource(id).map(|()| key), None)
}

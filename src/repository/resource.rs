use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::resource::{NewResource, Resource, ResourceFilter, UpdateResource};
use crate::domain::types::ResourceId;
use crate::models::resource::{NewResource as DbNewResource, Resource as DbResource};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, ListQuery, Listed, ResourceReader, ResourceWriter, like_pattern, sort_by,
};
use crate::schema::resources;

fn filtered(filter: &ResourceFilter) -> resources::BoxedQuery<'static, Sqlite> {
    let mut query = resources::table.into_boxed();
    if !filter.search.is_empty() {
        let pattern = like_pattern(&filter.search);
        query = query.filter(resources::name.like(pattern.clone()).or(resources::url.like(pattern)));
    }
    if !filter.group.is_empty() {
        query = query.filter(resources::group_name.eq(filter.group.clone()));
    }
    query
}

impl ResourceReader for DieselRepository {
    fn get_resource_by_id(&self, id: ResourceId) -> RepositoryResult<Option<Resource>> {
        let mut conn = self.conn()?;
        let row = resources::table
            .find(id.get())
            .first::<DbResource>(&mut conn)
            .optional()?;

        Ok(row.map(Resource::try_from).transpose()?)
    }

    fn list_resources(
        &self,
        query: &ListQuery<ResourceFilter>,
    ) -> RepositoryResult<Listed<Resource>> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query.filters).count().get_result(&mut conn)?;

        let rows = sort_by!(filtered(&query.filters), query.ordering.as_ref(), resources::id, {
            "name" => resources::name,
            "created_at" => resources::created_at,
        })
        .limit(query.pagination.limit())
        .offset(query.pagination.offset())
        .load::<DbResource>(&mut conn)?;

        let items = rows
            .into_iter()
            .map(Resource::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as usize, items))
    }

    fn list_resource_groups(&self) -> RepositoryResult<Vec<String>> {
        let mut conn = self.conn()?;
        let groups = resources::table
            .select(resources::group_name)
            .filter(resources::group_name.is_not_null())
            .distinct()
            .order(resources::group_name.asc())
            .load::<Option<String>>(&mut conn)?;

        Ok(groups.into_iter().flatten().collect())
    }
}

impl ResourceWriter for DieselRepository {
    fn create_resource(&self, resource: &NewResource) -> RepositoryResult<Resource> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(resources::table)
            .values(&DbNewResource::from(resource))
            .get_result::<DbResource>(&mut conn)?;

        Ok(Resource::try_from(created)?)
    }

    fn update_resource(
        &self,
        id: ResourceId,
        resource: &UpdateResource,
    ) -> RepositoryResult<Resource> {
        let mut conn = self.conn()?;
        let updated = diesel::update(resources::table.find(id.get()))
            .set(&DbNewResource::from(resource))
            .get_result::<DbResource>(&mut conn)?;

        Ok(Resource::try_from(updated)?)
    }

    fn delete_resource(&self, id: ResourceId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        match diesel::delete(resources::table.find(id.get())).execute(&mut conn)? {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }
}

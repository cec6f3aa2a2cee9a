use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::api_usage::{ApiUsage, ApiUsageFilter, ApiUsageHit};
use crate::list::filter::parse_date;
use crate::models::api_usage::{ApiUsage as DbApiUsage, NewApiUsage as DbNewApiUsage};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    ApiUsageReader, ApiUsageWriter, DieselRepository, ListQuery, Listed, sort_by,
};
use crate::schema::api_usage;

fn filtered(filter: &ApiUsageFilter) -> api_usage::BoxedQuery<'static, Sqlite> {
    let mut query = api_usage::table.into_boxed();
    if !filter.client_code.is_empty() {
        query = query.filter(api_usage::client_code.eq(filter.client_code.clone()));
    }
    if !filter.api_type.is_empty() {
        query = query.filter(api_usage::api_type.eq(filter.api_type.clone()));
    }
    if let Some(from) = parse_date(&filter.date_from) {
        query = query.filter(api_usage::usage_date.ge(from));
    }
    if let Some(to) = parse_date(&filter.date_to) {
        query = query.filter(api_usage::usage_date.le(to));
    }
    query
}

impl ApiUsageReader for DieselRepository {
    fn list_api_usage(
        &self,
        query: &ListQuery<ApiUsageFilter>,
    ) -> RepositoryResult<Listed<ApiUsage>> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query.filters).count().get_result(&mut conn)?;

        let rows = sort_by!(filtered(&query.filters), query.ordering.as_ref(), api_usage::id, {
            "usage_date" => api_usage::usage_date,
            "requests" => api_usage::requests,
        })
        .limit(query.pagination.limit())
        .offset(query.pagination.offset())
        .load::<DbApiUsage>(&mut conn)?;

        let items = rows
            .into_iter()
            .map(ApiUsage::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as usize, items))
    }
}

impl ApiUsageWriter for DieselRepository {
    fn record_api_usage(&self, hit: &ApiUsageHit) -> RepositoryResult<ApiUsage> {
        let mut conn = self.conn()?;
        let row = diesel::insert_into(api_usage::table)
            .values(&DbNewApiUsage::from(hit))
            .on_conflict((
                api_usage::client_code,
                api_usage::api_type,
                api_usage::usage_date,
            ))
            .do_update()
            .set(api_usage::requests.eq(api_usage::requests + 1_i64))
            .get_result::<DbApiUsage>(&mut conn)?;

        Ok(ApiUsage::try_from(row)?)
    }
}

use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::extraction::{ExtractionQuery, ExtractionQueryFilter, NewExtractionQuery};
use crate::domain::types::ExtractionQueryId;
use crate::models::extraction::{
    ExtractionQuery as DbExtractionQuery, NewExtractionQuery as DbNewExtractionQuery,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, ExtractionQueryReader, ExtractionQueryWriter, ListQuery, Listed,
    like_pattern, sort_by,
};
use crate::schema::extraction_queries;

fn filtered(filter: &ExtractionQueryFilter) -> extraction_queries::BoxedQuery<'static, Sqlite> {
    let mut query = extraction_queries::table.into_boxed();
    if !filter.search.is_empty() {
        query = query.filter(extraction_queries::name.like(like_pattern(&filter.search)));
    }
    query
}

impl ExtractionQueryReader for DieselRepository {
    fn get_extraction_query_by_id(
        &self,
        id: ExtractionQueryId,
    ) -> RepositoryResult<Option<ExtractionQuery>> {
        let mut conn = self.conn()?;
        let row = extraction_queries::table
            .find(id.get())
            .first::<DbExtractionQuery>(&mut conn)
            .optional()?;

        Ok(row.map(ExtractionQuery::try_from).transpose()?)
    }

    fn list_extraction_queries(
        &self,
        query: &ListQuery<ExtractionQueryFilter>,
    ) -> RepositoryResult<Listed<ExtractionQuery>> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query.filters).count().get_result(&mut conn)?;

        let rows = sort_by!(
            filtered(&query.filters),
            query.ordering.as_ref(),
            extraction_queries::id,
            {
                "name" => extraction_queries::name,
                "created_at" => extraction_queries::created_at,
            }
        )
        .limit(query.pagination.limit())
        .offset(query.pagination.offset())
        .load::<DbExtractionQuery>(&mut conn)?;

        let items = rows
            .into_iter()
            .map(ExtractionQuery::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as usize, items))
    }
}

impl ExtractionQueryWriter for DieselRepository {
    fn create_extraction_query(
        &self,
        extraction: &NewExtractionQuery,
    ) -> RepositoryResult<ExtractionQuery> {
        let mut conn = self.conn()?;
        let insertable = DbNewExtractionQuery::try_from(extraction)?;
        let created = diesel::insert_into(extraction_queries::table)
            .values(&insertable)
            .get_result::<DbExtractionQuery>(&mut conn)?;

        Ok(ExtractionQuery::try_from(created)?)
    }

    fn delete_extraction_query(&self, id: ExtractionQueryId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        match diesel::delete(extraction_queries::table.find(id.get())).execute(&mut conn)? {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }
}

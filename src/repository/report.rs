use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::report::{NewReport, Report, ReportFilter, ReportSignOff, UpdateReport};
use crate::domain::types::ReportId;
use crate::models::report::{
    NewReport as DbNewReport, Report as DbReport, ReportSignOff as DbReportSignOff,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, ListQuery, Listed, ReportReader, ReportWriter, like_pattern, sort_by,
};
use crate::schema::reports;

fn filtered(filter: &ReportFilter) -> reports::BoxedQuery<'static, Sqlite> {
    let mut query = reports::table.into_boxed();
    if !filter.search.is_empty() {
        query = query.filter(reports::name.like(like_pattern(&filter.search)));
    }
    if let Some(signed_off) = filter.signed_off() {
        query = query.filter(reports::is_signed_off.eq(signed_off));
    }
    if let Some(event_id) = filter.event_id {
        query = query.filter(reports::event_id.eq(event_id));
    }
    query
}

impl ReportReader for DieselRepository {
    fn get_report_by_id(&self, id: ReportId) -> RepositoryResult<Option<Report>> {
        let mut conn = self.conn()?;
        let row = reports::table
            .find(id.get())
            .first::<DbReport>(&mut conn)
            .optional()?;

        Ok(row.map(Report::try_from).transpose()?)
    }

    fn list_reports(&self, query: &ListQuery<ReportFilter>) -> RepositoryResult<Listed<Report>> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query.filters).count().get_result(&mut conn)?;

        let rows = sort_by!(filtered(&query.filters), query.ordering.as_ref(), reports::id, {
            "name" => reports::name,
            "created_at" => reports::created_at,
        })
        .limit(query.pagination.limit())
        .offset(query.pagination.offset())
        .load::<DbReport>(&mut conn)?;

        let items = rows
            .into_iter()
            .map(Report::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as usize, items))
    }
}

impl ReportWriter for DieselRepository {
    fn create_report(&self, report: &NewReport) -> RepositoryResult<Report> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(reports::table)
            .values(&DbNewReport::from(report))
            .get_result::<DbReport>(&mut conn)?;

        Ok(Report::try_from(created)?)
    }

    fn update_report(&self, id: ReportId, report: &UpdateReport) -> RepositoryResult<Report> {
        let mut conn = self.conn()?;
        let updated = diesel::update(reports::table.find(id.get()))
            .set(&DbNewReport::from(report))
            .get_result::<DbReport>(&mut conn)?;

        Ok(Report::try_from(updated)?)
    }

    fn sign_off_report(&self, id: ReportId, sign_off: &ReportSignOff) -> RepositoryResult<Report> {
        let mut conn = self.conn()?;
        conn.transaction(|conn| {
            let current = reports::table.find(id.get()).first::<DbReport>(conn)?;
            if current.is_signed_off {
                return Err(RepositoryError::ConstraintViolation(
                    "Report is already signed off".to_string(),
                ));
            }
            let updated = diesel::update(reports::table.find(id.get()))
                .set(&DbReportSignOff::from(sign_off))
                .get_result::<DbReport>(conn)?;
            Ok(Report::try_from(updated)?)
        })
    }

    fn delete_report(&self, id: ReportId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        match diesel::delete(reports::table.find(id.get())).execute(&mut conn)? {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }
}

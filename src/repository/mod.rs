//! Persistence traits and their Diesel implementation.
//!
//! Every list is read through a [`ListQuery`] built from the query variables
//! of the controller that asked for it, so paging, ordering and filters reach
//! the database exactly as the user sees them.

use crate::db::{DbConnection, DbPool};
use crate::domain::api_usage::{ApiUsage, ApiUsageFilter, ApiUsageHit};
use crate::domain::communication::{
    Communication, CommunicationFilter, NewCommunication, UpdateCommunication,
};
use crate::domain::contact::{Contact, ContactFilter, NewContact, UpdateContact};
use crate::domain::event::{Event, EventFilter, NewEvent, UpdateEvent};
use crate::domain::export::{Export, NewExport};
use crate::domain::extraction::{ExtractionQuery, ExtractionQueryFilter, NewExtractionQuery};
use crate::domain::report::{NewReport, Report, ReportFilter, ReportSignOff, UpdateReport};
use crate::domain::resource::{NewResource, Resource, ResourceFilter, UpdateResource};
use crate::domain::types::{
    CommunicationId, ContactId, EventId, ExtractionQueryId, ReportId, ResourceId,
};
use crate::list::filter::ListFilters;
use crate::list::variables::{Ordering, QueryVariables};
use crate::repository::errors::RepositoryResult;

pub mod api_usage;
pub mod communication;
pub mod contact;
pub mod errors;
pub mod event;
pub mod export;
pub mod extraction;
#[cfg(feature = "test-mocks")]
pub mod mock;
pub mod report;
pub mod resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        i64::try_from(self.per_page).unwrap_or(i64::MAX)
    }

    /// Saturates instead of wrapping for absurd page numbers.
    pub fn offset(&self) -> i64 {
        let skipped = i64::try_from(self.page.max(1) - 1).unwrap_or(i64::MAX);
        skipped.saturating_mul(self.limit())
    }
}

/// Page of a filtered, ordered list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<F> {
    pub filters: F,
    pub ordering: Option<Ordering>,
    pub pagination: Pagination,
}

impl<F: ListFilters> ListQuery<F> {
    pub fn new(filters: F) -> Self {
        Self {
            filters,
            ordering: None,
            pagination: Pagination {
                page: 1,
                per_page: 25,
            },
        }
    }

    pub fn order(mut self, ordering: Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Pagination { page, per_page };
        self
    }
}

impl<F: ListFilters> From<&QueryVariables<F>> for ListQuery<F> {
    fn from(variables: &QueryVariables<F>) -> Self {
        Self {
            filters: variables.filters.clone(),
            ordering: variables.ordering.clone(),
            pagination: Pagination {
                page: variables.page,
                per_page: variables.page_size,
            },
        }
    }
}

/// `(total_count, rows of the requested page)`.
pub type Listed<T> = (usize, Vec<T>);

pub trait ContactReader {
    fn get_contact_by_id(&self, id: ContactId) -> RepositoryResult<Option<Contact>>;
    fn list_contacts(&self, query: &ListQuery<ContactFilter>) -> RepositoryResult<Listed<Contact>>;
    /// Distinct country codes used by contacts.
    fn list_contact_countries(&self) -> RepositoryResult<Vec<String>>;
    fn list_organizations(&self) -> RepositoryResult<Vec<String>>;
}

pub trait ContactWriter {
    fn create_contact(&self, contact: &NewContact) -> RepositoryResult<Contact>;
    fn update_contact(&self, id: ContactId, contact: &UpdateContact) -> RepositoryResult<Contact>;
    fn delete_contact(&self, id: ContactId) -> RepositoryResult<()>;
}

pub trait CommunicationReader {
    fn get_communication_by_id(
        &self,
        id: CommunicationId,
    ) -> RepositoryResult<Option<Communication>>;
    fn list_communications(
        &self,
        query: &ListQuery<CommunicationFilter>,
    ) -> RepositoryResult<Listed<Communication>>;
}

pub trait CommunicationWriter {
    fn create_communication(
        &self,
        communication: &NewCommunication,
    ) -> RepositoryResult<Communication>;
    fn update_communication(
        &self,
        id: CommunicationId,
        communication: &UpdateCommunication,
    ) -> RepositoryResult<Communication>;
    fn delete_communication(&self, id: CommunicationId) -> RepositoryResult<()>;
}

pub trait ResourceReader {
    fn get_resource_by_id(&self, id: ResourceId) -> RepositoryResult<Option<Resource>>;
    fn list_resources(&self, query: &ListQuery<ResourceFilter>)
    -> RepositoryResult<Listed<Resource>>;
    fn list_resource_groups(&self) -> RepositoryResult<Vec<String>>;
}

pub trait ResourceWriter {
    fn create_resource(&self, resource: &NewResource) -> RepositoryResult<Resource>;
    fn update_resource(&self, id: ResourceId, resource: &UpdateResource)
    -> RepositoryResult<Resource>;
    fn delete_resource(&self, id: ResourceId) -> RepositoryResult<()>;
}

pub trait EventReader {
    fn get_event_by_id(&self, id: EventId) -> RepositoryResult<Option<Event>>;
    fn list_events(&self, query: &ListQuery<EventFilter>) -> RepositoryResult<Listed<Event>>;
    fn list_event_countries(&self) -> RepositoryResult<Vec<String>>;
    /// `(id, name)` of every event, newest first.
    fn list_event_choices(&self) -> RepositoryResult<Vec<(i32, String)>>;
}

pub trait EventWriter {
    fn create_event(&self, event: &NewEvent) -> RepositoryResult<Event>;
    fn update_event(&self, id: EventId, event: &UpdateEvent) -> RepositoryResult<Event>;
    fn delete_event(&self, id: EventId) -> RepositoryResult<()>;
}

pub trait ExtractionQueryReader {
    fn get_extraction_query_by_id(
        &self,
        id: ExtractionQueryId,
    ) -> RepositoryResult<Option<ExtractionQuery>>;
    fn list_extraction_queries(
        &self,
        query: &ListQuery<ExtractionQueryFilter>,
    ) -> RepositoryResult<Listed<ExtractionQuery>>;
}

pub trait ExtractionQueryWriter {
    fn create_extraction_query(
        &self,
        extraction: &NewExtractionQuery,
    ) -> RepositoryResult<ExtractionQuery>;
    fn delete_extraction_query(&self, id: ExtractionQueryId) -> RepositoryResult<()>;
}

pub trait ReportReader {
    fn get_report_by_id(&self, id: ReportId) -> RepositoryResult<Option<Report>>;
    fn list_reports(&self, query: &ListQuery<ReportFilter>) -> RepositoryResult<Listed<Report>>;
}

pub trait ReportWriter {
    fn create_report(&self, report: &NewReport) -> RepositoryResult<Report>;
    fn update_report(&self, id: ReportId, report: &UpdateReport) -> RepositoryResult<Report>;
    fn sign_off_report(&self, id: ReportId, sign_off: &ReportSignOff) -> RepositoryResult<Report>;
    fn delete_report(&self, id: ReportId) -> RepositoryResult<()>;
}

pub trait ApiUsageReader {
    fn list_api_usage(&self, query: &ListQuery<ApiUsageFilter>) -> RepositoryResult<Listed<ApiUsage>>;
}

pub trait ApiUsageWriter {
    /// Counts one request, creating the day's record on first use.
    fn record_api_usage(&self, hit: &ApiUsageHit) -> RepositoryResult<ApiUsage>;
}

pub trait ExportWriter {
    fn create_export(&self, export: &NewExport) -> RepositoryResult<Export>;
}

/// Diesel-backed implementation of every repository trait.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Orders a boxed query by the first matching sortable column, then by
/// descending id so pages stay stable under equal sort keys.
macro_rules! sort_by {
    ($query:expr, $ordering:expr, $id:expr, { $($name:literal => $column:expr),+ $(,)? }) => {{
        use crate::list::variables::Direction;

        let mut query = $query;
        if let Some(ordering) = $ordering {
            match (ordering.name.as_str(), ordering.direction) {
                $(
                    ($name, Direction::Asc) => query = query.order_by($column.asc()),
                    ($name, Direction::Desc) => query = query.order_by($column.desc()),
                )+
                (other, _) => log::debug!("Ignoring unknown ordering {other}"),
            }
        }
        query.then_order_by($id.desc())
    }};
}

pub(crate) use sort_by;

/// `%term%` pattern for a `LIKE` search.
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contact::CONTACTS;

    #[test]
    fn list_query_follows_query_variables() {
        let mut variables = QueryVariables::initial(&CONTACTS, ContactFilter::default());
        variables.page = 3;

        let query = ListQuery::from(&variables);

        assert_eq!(query.pagination.offset(), 50);
        assert_eq!(query.pagination.limit(), 25);
        assert_eq!(query.ordering, Some(Ordering::desc("created_at")));
    }

    #[test]
    fn offset_saturates_on_huge_pages() {
        let pagination = Pagination {
            page: usize::MAX,
            per_page: 100,
        };
        assert_eq!(pagination.offset(), i64::MAX);

        let first = Pagination {
            page: 0,
            per_page: 100,
        };
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn like_pattern_trims_the_term() {
        assert_eq!(like_pattern(" kano "), "%kano%");
    }
}

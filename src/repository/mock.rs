//! Mock repository implementations for isolating services in tests.

use mockall::mock;

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
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    ApiUsageReader, ApiUsageWriter, CommunicationReader, CommunicationWriter, ContactReader,
    ContactWriter, EventReader, EventWriter, ExportWriter, ExtractionQueryReader,
    ExtractionQueryWriter, ListQuery, Listed, ReportReader, ReportWriter, ResourceReader,
    ResourceWriter,
};

mock! {
    pub Repository {}

    impl ContactReader for Repository {
        fn get_contact_by_id(&self, id: ContactId) -> RepositoryResult<Option<Contact>>;
        fn list_contacts(&self, query: &ListQuery<ContactFilter>) -> RepositoryResult<Listed<Contact>>;
        fn list_contact_countries(&self) -> RepositoryResult<Vec<String>>;
        fn list_organizations(&self) -> RepositoryResult<Vec<String>>;
    }

    impl ContactWriter for Repository {
        fn create_contact(&self, contact: &NewContact) -> RepositoryResult<Contact>;
        fn update_contact(&self, id: ContactId, contact: &UpdateContact) -> RepositoryResult<Contact>;
        fn delete_contact(&self, id: ContactId) -> RepositoryResult<()>;
    }

    impl CommunicationReader for Repository {
        fn get_communication_by_id(
            &self,
            id: CommunicationId,
        ) -> RepositoryResult<Option<Communication>>;
        fn list_communications(
            &self,
            query: &ListQuery<CommunicationFilter>,
        ) -> RepositoryResult<Listed<Communication>>;
    }

    impl CommunicationWriter for Repository {
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

    impl ResourceReader for Repository {
        fn get_resource_by_id(&self, id: ResourceId) -> RepositoryResult<Option<Resource>>;
        fn list_resources(
            &self,
            query: &ListQuery<ResourceFilter>,
        ) -> RepositoryResult<Listed<Resource>>;
        fn list_resource_groups(&self) -> RepositoryResult<Vec<String>>;
    }

    impl ResourceWriter for Repository {
        fn create_resource(&self, resource: &NewResource) -> RepositoryResult<Resource>;
        fn update_resource(
            &self,
            id: ResourceId,
            resource: &UpdateResource,
        ) -> RepositoryResult<Resource>;
        fn delete_resource(&self, id: ResourceId) -> RepositoryResult<()>;
    }

    impl EventReader for Repository {
        fn get_event_by_id(&self, id: EventId) -> RepositoryResult<Option<Event>>;
        fn list_events(&self, query: &ListQuery<EventFilter>) -> RepositoryResult<Listed<Event>>;
        fn list_event_countries(&self) -> RepositoryResult<Vec<String>>;
        fn list_event_choices(&self) -> RepositoryResult<Vec<(i32, String)>>;
    }

    impl EventWriter for Repository {
        fn create_event(&self, event: &NewEvent) -> RepositoryResult<Event>;
        fn update_event(&self, id: EventId, event: &UpdateEvent) -> RepositoryResult<Event>;
        fn delete_event(&self, id: EventId) -> RepositoryResult<()>;
    }

    impl ExtractionQueryReader for Repository {
        fn get_extraction_query_by_id(
            &self,
            id: ExtractionQueryId,
        ) -> RepositoryResult<Option<ExtractionQuery>>;
        fn list_extraction_queries(
            &self,
            query: &ListQuery<ExtractionQueryFilter>,
        ) -> RepositoryResult<Listed<ExtractionQuery>>;
    }

    impl ExtractionQueryWriter for Repository {
        fn create_extraction_query(
            &self,
            extraction: &NewExtractionQuery,
        ) -> RepositoryResult<ExtractionQuery>;
        fn delete_extraction_query(&self, id: ExtractionQueryId) -> RepositoryResult<()>;
    }

    impl ReportReader for Repository {
        fn get_report_by_id(&self, id: ReportId) -> RepositoryResult<Option<Report>>;
        fn list_reports(&self, query: &ListQuery<ReportFilter>) -> RepositoryResult<Listed<Report>>;
    }

    impl ReportWriter for Repository {
        fn create_report(&self, report: &NewReport) -> RepositoryResult<Report>;
        fn update_report(&self, id: ReportId, report: &UpdateReport) -> RepositoryResult<Report>;
        fn sign_off_report(&self, id: ReportId, sign_off: &ReportSignOff) -> RepositoryResult<Report>;
        fn delete_report(&self, id: ReportId) -> RepositoryResult<()>;
    }

    impl ApiUsageReader for Repository {
        fn list_api_usage(
            &self,
            query: &ListQuery<ApiUsageFilter>,
        ) -> RepositoryResult<Listed<ApiUsage>>;
    }

    impl ApiUsageWriter for Repository {
        fn record_api_usage(&self, hit: &ApiUsageHit) -> RepositoryResult<ApiUsage>;
    }

    impl ExportWriter for Repository {
        fn create_export(&self, export: &NewExport) -> RepositoryResult<Export>;
    }
}

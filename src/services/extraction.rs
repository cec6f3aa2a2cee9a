//! Saved event filters.

use crate::domain::event::EventFilter;
use crate::domain::extraction::{ExtractionQuery, ExtractionQueryFilter};
use crate::domain::types::ExtractionQueryId;
use crate::forms::extraction::ExtractionForm;
use crate::list::filter::ListFilters;
use crate::list::mutation::{FieldError, MutationResponse, TransportError};
use crate::list::table::{ActionColumn, ActionKind, Cell, Column, Table};
use crate::list::variables::QueryVariables;
use crate::list::{EntityKey, ListResult};
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::{ExtractionQueryReader, ExtractionQueryWriter};
use crate::services::list::fetch_page;
use crate::services::{
    MutationResult, ServiceError, ServiceResult, forbidden, rejected_form, respond, unknown,
};

fn open_href(extraction: &ExtractionQuery) -> String {
    format!("/extractions/{}", extraction.id)
}

fn delete_href(extraction: &ExtractionQuery) -> String {
    format!("/extractions/{}/delete", extraction.id)
}

pub fn extractions_table(permissions: &Permissions) -> Table<ExtractionQuery> {
    let flags = permissions.flags(PermissionEntity::ExtractionQuery);
    Table::new(
        vec![
            Column::new("name", "Name", |q: &ExtractionQuery| {
                Cell::link(q.name.as_str(), open_href(q))
            }),
            Column::new("filters", "Filters", |q: &ExtractionQuery| {
                Cell::custom(describe(&q.filters))
            }),
            Column::new("created_at", "Saved", |q: &ExtractionQuery| {
                Cell::timestamp(q.created_at)
            }),
        ],
        ActionColumn::new().with(ActionKind::Delete, flags.delete, Some(delete_href)),
    )
}

/// Short summary of a saved filter.
pub fn describe(filter: &EventFilter) -> String {
    let mut parts = Vec::new();
    if !filter.search.is_empty() {
        parts.push(format!("name contains \"{}\"", filter.search));
    }
    for (label, values) in [
        ("crisis", &filter.crisis_types),
        ("violence", &filter.violence_subtypes),
        ("countries", &filter.countries),
    ] {
        if !values.is_empty() {
            parts.push(format!("{label}: {}", values.join(", ")));
        }
    }
    match (filter.date_from.as_str(), filter.date_to.as_str()) {
        ("", "") => {}
        (from, "") => parts.push(format!("from {from}")),
        ("", to) => parts.push(format!("until {to}")),
        (from, to) => parts.push(format!("{from} to {to}")),
    }
    if parts.is_empty() {
        "All events".to_string()
    } else {
        parts.join("; ")
    }
}

pub fn list_extractions<R>(
    repo: &R,
    variables: &QueryVariables<ExtractionQueryFilter>,
) -> Result<ListResult<ExtractionQuery>, TransportError>
where
    R: ExtractionQueryReader + ?Sized,
{
    fetch_page(variables, |query| repo.list_extraction_queries(query))
}

pub fn get_extraction<R>(repo: &R, extraction_id: i32) -> ServiceResult<ExtractionQuery>
where
    R: ExtractionQueryReader + ?Sized,
{
    let id = ExtractionQueryId::new(extraction_id)?;
    repo.get_extraction_query_by_id(id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

/// Saves the events filter currently applied under the name from `form`.
/// A filter that breaks its own rules is never stored.
pub fn save_extraction<R>(
    repo: &R,
    permissions: &Permissions,
    form: &ExtractionForm,
    filters: &EventFilter,
) -> MutationResult<ExtractionQuery>
where
    R: ExtractionQueryWriter + ?Sized,
{
    if let Some(refused) =
        forbidden(permissions, PermissionEntity::ExtractionQuery, Capability::Add)
    {
        return Ok(refused);
    }
    let extraction = match form.into_query(filters) {
        Ok(extraction) => extraction,
        Err(err) => return Ok(rejected_form(&err)),
    };
    let errors = extraction.filters.validation_errors();
    if !errors.is_empty() {
        log::warn!("Refusing to save invalid events filter: {errors}");
        let errors = errors
            .fields()
            .flat_map(|(field, messages)| {
                messages
                    .iter()
                    .map(move |message| FieldError::internal(format!("{field}: {message}")))
            })
            .collect();
        return Ok(MutationResponse::rejected(errors));
    }
    log::info!("Saving extraction query {}", extraction.name.as_str());
    respond(repo.create_extraction_query(&extraction), Some("name"))
}

pub fn delete_extraction<R>(
    repo: &R,
    permissions: &Permissions,
    key: EntityKey,
) -> MutationResult<EntityKey>
where
    R: ExtractionQueryWriter + ?Sized,
{
    if let Some(refused) = forbidden(
        permissions,
        PermissionEntity::ExtractionQuery,
        Capability::Delete,
    ) {
        return Ok(refused);
    }
    let Ok(id) = ExtractionQueryId::new(key.get()) else {
        return Ok(unknown("extraction query"));
    };
    respond(repo.delete_extraction_query(id).map(|()| key), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_describes_all_events() {
        assert_eq!(describe(&EventFilter::default()), "All events");
    }

    #[test]
    fn filter_summary_lists_applied_parts() {
        let filter = EventFilter {
            crisis_types: vec!["conflict".to_string()],
            countries: vec!["NG".to_string(), "TD".to_string()],
            date_from: "2024-01-01".to_string(),
            ..EventFilter::default()
        };

        assert_eq!(
            describe(&filter),
            "crisis: conflict; countries: NG, TD; from 2024-01-01"
        );
    }
}

#[cfg(all(test, feature = "test-mocks"))]
mod mock_tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::types::QueryName;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    #[test]
    fn saved_filter_is_purged() {
        let mut repo = MockRepository::new();
        repo.expect_create_extraction_query()
            .withf(|q| q.filters.countries == vec!["NG".to_string()])
            .times(1)
            .returning(|q| {
                Ok(ExtractionQuery {
                    id: ExtractionQueryId::new(1).expect("valid id"),
                    name: QueryName::new(q.name.as_str()).expect("valid name"),
                    filters: q.filters.clone(),
                    created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .expect("valid timestamp"),
                })
            });
        let form = ExtractionForm {
            name: "Nigeria".to_string(),
        };
        let filters = EventFilter {
            countries: vec![" ng ".to_string(), String::new()],
            ..EventFilter::default()
        };

        let response =
            save_extraction(&repo, &Permissions::all(), &form, &filters).expect("response");

        assert!(response.is_ok());
    }

    #[test]
    fn invalid_filter_is_never_saved() {
        let mut repo = MockRepository::new();
        repo.expect_create_extraction_query().times(0);
        let form = ExtractionForm {
            name: "Broken dates".to_string(),
        };
        let filters = EventFilter {
            date_from: "2024-05-01".to_string(),
            date_to: "2024-01-01".to_string(),
            ..EventFilter::default()
        };

        let response =
            save_extraction(&repo, &Permissions::all(), &form, &filters).expect("response");

        assert!(!response.is_ok());
        assert!(response.errors[0].messages[0].starts_with("date_to: "));
    }

    #[test]
    fn duplicate_name_is_a_field_error() {
        let mut repo = MockRepository::new();
        repo.expect_create_extraction_query()
            .returning(|_| Err(RepositoryError::Conflict("UNIQUE".into())));
        let form = ExtractionForm {
            name: "Nigeria".to_string(),
        };

        let response = save_extraction(&repo, &Permissions::all(), &form, &EventFilter::default())
            .expect("response");

        assert_eq!(response.errors[0].field, "name");
    }
}

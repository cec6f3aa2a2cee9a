//! Export jobs. Requesting an export only queues it.

use crate::domain::auth::AuthenticatedUser;
use crate::domain::export::{Export, NewExport};
use crate::domain::types::PublicId;
use crate::list::ListSpec;
use crate::list::filter::ListFilters;
use crate::list::mutation::{FieldError, MutationResponse};
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::ExportWriter;
use crate::services::{MutationResult, forbidden, respond};

/// Queues an export of the list described by `spec` with the filters the
/// user currently has applied.
pub fn request_export<R, F>(
    repo: &R,
    permissions: &Permissions,
    entity: PermissionEntity,
    spec: &ListSpec,
    filters: &F,
    user: &AuthenticatedUser,
) -> MutationResult<Export>
where
    R: ExportWriter + ?Sized,
    F: ListFilters,
{
    if let Some(refused) = forbidden(permissions, entity, Capability::Export) {
        return Ok(refused);
    }
    let filters = match serde_json::to_value(filters.purged()) {
        Ok(filters) => filters,
        Err(err) => {
            log::error!("Failed to serialize {} filters: {err}", spec.query);
            return Ok(MutationResponse::rejected(vec![FieldError::internal(
                "The filters could not be saved with the export.",
            )]));
        }
    };
    let export = NewExport {
        public_id: PublicId::new(),
        export_type: spec.query.as_str().to_string(),
        filters,
        requested_by: user.email.clone(),
    };
    respond(repo.create_export(&export), None)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::contact::{CONTACTS, ContactFilter};
    use crate::repository::mock::MockRepository;

    #[test]
    fn viewers_cannot_export() {
        let mut repo = MockRepository::new();
        repo.expect_create_export().times(0);
        let user = AuthenticatedUser::default();

        let response = request_export(
            &repo,
            &Permissions::viewer(),
            PermissionEntity::Contact,
            &CONTACTS,
            &ContactFilter::default(),
            &user,
        )
        .expect("response");

        assert!(!response.is_ok());
    }

    #[test]
    fn export_carries_list_name_and_filters() {
        let mut repo = MockRepository::new();
        repo.expect_create_export()
            .withf(|export| {
                export.export_type == "contacts"
                    && export.filters["country"] == "NG"
                    && export.requested_by == "officer@example.org"
            })
            .times(1)
            .returning(|_| Err(crate::repository::errors::RepositoryError::NotFound));
        let user = AuthenticatedUser {
            email: "officer@example.org".to_string(),
            ..AuthenticatedUser::default()
        };
        let filters = ContactFilter {
            country: " NG ".to_string(),
            ..ContactFilter::default()
        };

        let _ = request_export(
            &repo,
            &Permissions::all(),
            PermissionEntity::Contact,
            &CONTACTS,
            &filters,
            &user,
        );
    }
}

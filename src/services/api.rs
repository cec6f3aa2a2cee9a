//! JSON list endpoint for external clients. Every call is counted in the
//! API usage records of the calling client.

use chrono::Utc;

use crate::domain::api_usage::ApiUsageHit;
use crate::domain::auth::AuthenticatedUser;
use crate::domain::contact::{CONTACTS, Contact, ContactFilter};
use crate::domain::types::{ApiType, ClientCode};
use crate::list::ListResult;
use crate::list::variables::QueryVariables;
use crate::repository::{ApiUsageWriter, ContactReader};
use crate::services::contact::list_contacts;
use crate::services::{ServiceError, ServiceResult, ensure_viewer};

pub const CONTACTS_API: &str = "contacts";

/// Lists contacts with the variables carried by `raw_query` and counts the
/// request for `client_code`, falling back to the user's subject.
pub fn contacts<R>(
    repo: &R,
    user: &AuthenticatedUser,
    client_code: Option<&str>,
    raw_query: &str,
) -> ServiceResult<ListResult<Contact>>
where
    R: ContactReader + ApiUsageWriter + ?Sized,
{
    ensure_viewer(user)?;

    let variables = QueryVariables::<ContactFilter>::from_query(&CONTACTS, raw_query);
    let page = list_contacts(repo, &variables).map_err(|err| {
        log::error!("API contacts listing failed: {err}");
        ServiceError::Internal
    })?;

    let client = client_code
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .unwrap_or(user.sub.as_str());
    record_hit(repo, client, CONTACTS_API);

    Ok(page)
}

/// Counting never fails the request it counts.
fn record_hit<R>(repo: &R, client: &str, api: &str)
where
    R: ApiUsageWriter + ?Sized,
{
    let hit = match (ClientCode::new(client), ApiType::new(api)) {
        (Ok(client_code), Ok(api_type)) => ApiUsageHit {
            client_code,
            api_type,
            usage_date: Utc::now().date_naive(),
        },
        _ => {
            log::warn!("Not counting {api} request without a client code");
            return;
        }
    };
    if let Err(err) = repo.record_api_usage(&hit) {
        log::error!("Failed to record API usage for {client}: {err}");
    }
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    fn user(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "partner-7".to_string(),
            email: "api@example.org".to_string(),
            name: "Partner".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            exp: 0,
        }
    }

    #[test]
    fn unauthorized_callers_are_not_counted() {
        let mut repo = MockRepository::new();
        repo.expect_list_contacts().times(0);
        repo.expect_record_api_usage().times(0);

        let result = contacts(&repo, &user(&[]), Some("acme"), "");

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn request_is_counted_for_the_client_code() {
        let mut repo = MockRepository::new();
        repo.expect_list_contacts()
            .withf(|query| query.pagination.page == 2 && query.filters.country == "NG")
            .times(1)
            .returning(|_| Ok((0, Vec::new())));
        repo.expect_record_api_usage()
            .withf(|hit| hit.client_code.as_str() == "acme" && hit.api_type.as_str() == "contacts")
            .times(1)
            .returning(|_| Err(RepositoryError::DatabaseError("locked".into())));

        let page = contacts(&repo, &user(&["helix"]), Some("acme"), "page=2&country=NG")
            .expect("counting failures do not fail the request");

        assert_eq!(page.page, 2);
    }

    #[test]
    fn subject_is_the_default_client() {
        let mut repo = MockRepository::new();
        repo.expect_list_contacts().returning(|_| Ok((0, Vec::new())));
        repo.expect_record_api_usage()
            .withf(|hit| hit.client_code.as_str() == "partner-7")
            .times(1)
            .returning(|_| Err(RepositoryError::NotFound));

        assert!(contacts(&repo, &user(&["helix"]), None, "").is_ok());
    }
}

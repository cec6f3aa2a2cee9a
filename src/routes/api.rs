use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use serde::Deserialize;

use crate::domain::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::services::ServiceError;
use crate::services::api::contacts;

#[derive(Deserialize)]
struct ApiV1ContactsQueryParams {
    #[serde(rename = "clientId")]
    client_id: Option<String>,
}

/// Contacts as JSON. Takes the same query variables as the contacts list.
#[get("/v1/contacts")]
pub async fn api_v1_contacts(
    req: HttpRequest,
    params: web::Query<ApiV1ContactsQueryParams>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match contacts(
        repo.get_ref(),
        &user,
        params.client_id.as_deref(),
        req.query_string(),
    ) {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(ServiceError::Unauthorized) => HttpResponse::Unauthorized().finish(),
        Err(err) => {
            log::error!("Failed to list contacts: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use crate::domain::api_usage::{API_USAGE, ApiUsage, ApiUsageFilter};
use crate::domain::auth::AuthenticatedUser;
use crate::list::QueryCache;
use crate::list::controller::ListController;
use crate::list::variables::QueryVariables;
use crate::models::config::ServerConfig;
use crate::permissions::{PermissionEntity, Permissions};
use crate::repository::DieselRepository;
use crate::routes::ensure_viewer;
use crate::routes::list::{self, Page, list_url};
use crate::services::api_usage::{api_usage_table, list_api_usage};
use crate::services::export::request_export;
use crate::services::list::{ListView, RepositoryOptions, list_page};

const BASE: &str = "/api-usage";

type Usage<'c> = ListController<'c, ApiUsage, ApiUsageFilter>;

fn render_list(
    page: &Page<'_>,
    controller: &Usage<'_>,
    repo: &DieselRepository,
    permissions: &Permissions,
) -> HttpResponse {
    let flags = permissions.flags(PermissionEntity::ApiUsage);
    let source = |variables: &QueryVariables<ApiUsageFilter>| list_api_usage(repo, variables);
    let data = list_page(
        controller,
        &source,
        &RepositoryOptions(repo),
        ListView {
            title: "API usage",
            base: BASE,
            table: api_usage_table(),
            permissions: flags,
            add: None,
            export: flags.export,
            links: Vec::new(),
        },
    );
    page.list(&data)
}

#[get("/api-usage")]
pub async fn show_api_usage(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "api_usage",
    };
    let controller = Usage::new(&cache, API_USAGE).owned_by(&user.sub).restore(req.query_string());
    render_list(&page, &controller, &repo, &permissions)
}

#[get("/api-usage/filter")]
pub async fn filter_api_usage(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "api_usage",
    };
    list::apply_filter(
        Usage::new(&cache, API_USAGE).owned_by(&user.sub),
        req.query_string(),
        BASE,
        |controller| render_list(&page, controller, &repo, &permissions),
    )
}

#[get("/api-usage/reset")]
pub async fn reset_api_usage(
    req: HttpRequest,
    user: AuthenticatedUser,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    list::reset_filters(Usage::new(&cache, API_USAGE)
            .owned_by(&user.sub)
            .restore(req.query_string()), BASE)
}

#[get("/api-usage/refresh")]
pub async fn refresh_api_usage(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    let controller = Usage::new(&cache, API_USAGE).owned_by(&user.sub).restore(req.query_string());
    let source =
        |variables: &QueryVariables<ApiUsageFilter>| list_api_usage(repo.get_ref(), variables);
    list::refresh(&controller, &source, BASE)
}

#[post("/api-usage/export")]
pub async fn export_api_usage(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let controller = Usage::new(&cache, API_USAGE).owned_by(&user.sub).restore(req.query_string());
    let response = request_export(
        repo.get_ref(),
        &permissions,
        PermissionEntity::ApiUsage,
        &API_USAGE,
        &controller.variables().filters,
        &user,
    );
    list::export(response, &list_url(&controller, BASE))
}

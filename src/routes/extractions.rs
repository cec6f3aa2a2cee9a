//! Saved extraction queries and the events lists they open.

use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::event::{EVENTS, EventFilter};
use crate::domain::extraction::{EXTRACTIONS, ExtractionQuery, ExtractionQueryFilter};
use crate::forms::ConfirmForm;
use crate::forms::extraction::ExtractionForm;
use crate::list::controller::ListController;
use crate::list::mutation::{EntityForm, MutationKind};
use crate::list::table::with_query;
use crate::list::variables::QueryVariables;
use crate::list::{EntityKey, QueryCache};
use crate::models::config::ServerConfig;
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::DieselRepository;
use crate::routes::events::{Events, render_list as render_events};
use crate::routes::list::{self, Page, list_url};
use crate::routes::{ensure_capability, ensure_viewer, redirect};
use crate::services::event::list_events;
use crate::services::extraction::{
    delete_extraction, describe, extractions_table, get_extraction, list_extractions,
    save_extraction,
};
use crate::services::list::{ListView, RepositoryOptions, form_page, list_page};

const BASE: &str = "/extractions";

type Extractions<'c> = ListController<'c, ExtractionQuery, ExtractionQueryFilter>;

fn render_list(
    page: &Page<'_>,
    controller: &Extractions<'_>,
    repo: &DieselRepository,
    permissions: &Permissions,
) -> HttpResponse {
    let source =
        |variables: &QueryVariables<ExtractionQueryFilter>| list_extractions(repo, variables);
    let data = list_page(
        controller,
        &source,
        &RepositoryOptions(repo),
        ListView {
            title: "Extraction queries",
            base: BASE,
            table: extractions_table(permissions),
            permissions: permissions.flags(PermissionEntity::ExtractionQuery),
            add: None,
            export: false,
            links: Vec::new(),
        },
    );
    page.list(&data)
}

/// Saved query a request refers to, or a redirect back to the list.
fn find_extraction(repo: &DieselRepository, extraction_id: i32) -> Result<ExtractionQuery, HttpResponse> {
    get_extraction(repo, extraction_id).map_err(|err| {
        log::warn!("Failed to open extraction query {extraction_id}: {err}");
        FlashMessage::error("Extraction query not found.").send();
        redirect(BASE)
    })
}

/// Events list seeded with the saved filters. Reset returns to them.
fn seeded_events<'c>(
    cache: &'c QueryCache,
    user: &AuthenticatedUser,
    extraction: &ExtractionQuery,
    raw_query: &str,
) -> Events<'c> {
    Events::new(cache, EVENTS)
        .owned_by(&user.sub)
        .seeded(extraction.filters.clone())
        .restore(raw_query)
}

fn events_base(extraction: &ExtractionQuery) -> String {
    format!("{BASE}/{}", extraction.id)
}

#[get("/extractions")]
pub async fn show_extractions(
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
        current_page: "extractions",
    };
    let controller = Extractions::new(&cache, EXTRACTIONS)
            .owned_by(&user.sub)
            .restore(req.query_string());
    render_list(&page, &controller, &repo, &permissions)
}

#[get("/extractions/filter")]
pub async fn filter_extractions(
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
        current_page: "extractions",
    };
    list::apply_filter(
        Extractions::new(&cache, EXTRACTIONS).owned_by(&user.sub),
        req.query_string(),
        BASE,
        |controller| render_list(&page, controller, &repo, &permissions),
    )
}

#[get("/extractions/reset")]
pub async fn reset_extractions(
    req: HttpRequest,
    user: AuthenticatedUser,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    list::reset_filters(
        Extractions::new(&cache, EXTRACTIONS).owned_by(&user.sub).restore(req.query_string()),
        BASE,
    )
}

#[get("/extractions/refresh")]
pub async fn refresh_extractions(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    let controller = Extractions::new(&cache, EXTRACTIONS)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let source = |variables: &QueryVariables<ExtractionQueryFilter>| {
        list_extractions(repo.get_ref(), variables)
    };
    list::refresh(&controller, &source, BASE)
}

/// Name form for saving the events filter carried in the query string.
#[get("/extractions/save")]
pub async fn new_extraction(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) =
        ensure_capability(&user, PermissionEntity::ExtractionQuery, Capability::Add)
    {
        return response;
    }
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "events",
    };
    let events = Events::new(&cache, EVENTS).owned_by(&user.sub).restore(req.query_string());
    let filters: EventFilter = events.variables().filters;
    page.form(&form_page(
        format!("Save filters: {}", describe(&filters)),
        with_query(&format!("{BASE}/save"), req.query_string()),
        list_url(&events, "/events"),
        &EntityForm::edited(ExtractionForm::default()),
        &RepositoryOptions(repo.get_ref()),
    ))
}

#[post("/extractions/save")]
pub async fn add_extraction(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ExtractionForm>,
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
        current_page: "events",
    };
    let events = Events::new(&cache, EVENTS).owned_by(&user.sub).restore(req.query_string());
    let filters = events.variables().filters;
    let extractions = Extractions::new(&cache, EXTRACTIONS).owned_by(&user.sub);
    list::submit(
        &extractions,
        form,
        MutationKind::Create,
        BASE,
        |form| save_extraction(repo.get_ref(), &permissions, form, &filters),
        |form| {
            page.form(&form_page(
                format!("Save filters: {}", describe(&filters)),
                with_query(&format!("{BASE}/save"), req.query_string()),
                list_url(&events, "/events"),
                form,
                &RepositoryOptions(repo.get_ref()),
            ))
        },
    )
}

#[post("/extractions/{extraction_id:\\d+}/delete")]
pub async fn remove_extraction(
    req: HttpRequest,
    extraction_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    web::Form(confirm): web::Form<ConfirmForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let controller = Extractions::new(&cache, EXTRACTIONS)
            .owned_by(&user.sub)
            .restore(req.query_string());
    list::delete(
        &controller,
        EntityKey::new(extraction_id.into_inner()),
        &confirm,
        &list_url(&controller, BASE),
        |key| delete_extraction(repo.get_ref(), &permissions, key),
    )
}

#[get("/extractions/{extraction_id:\\d+}")]
pub async fn show_extraction(
    req: HttpRequest,
    extraction_id: web::Path<i32>,
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
    let extraction = match find_extraction(&repo, extraction_id.into_inner()) {
        Ok(extraction) => extraction,
        Err(response) => return response,
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "extractions",
    };
    let controller = seeded_events(&cache, &user, &extraction, req.query_string());
    render_events(&page, &controller, &events_base(&extraction), &repo, &permissions)
}

#[get("/extractions/{extraction_id:\\d+}/filter")]
pub async fn filter_extraction(
    req: HttpRequest,
    extraction_id: web::Path<i32>,
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
    let extraction = match find_extraction(&repo, extraction_id.into_inner()) {
        Ok(extraction) => extraction,
        Err(response) => return response,
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "extractions",
    };
    let base = events_base(&extraction);
    list::apply_filter(
        seeded_events(&cache, &user, &extraction, ""),
        req.query_string(),
        &base,
        |controller| render_events(&page, controller, &base, &repo, &permissions),
    )
}

#[get("/extractions/{extraction_id:\\d+}/reset")]
pub async fn reset_extraction(
    req: HttpRequest,
    extraction_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    let extraction = match find_extraction(&repo, extraction_id.into_inner()) {
        Ok(extraction) => extraction,
        Err(response) => return response,
    };
    list::reset_filters(
        seeded_events(&cache, &user, &extraction, req.query_string()),
        &events_base(&extraction),
    )
}

#[get("/extractions/{extraction_id:\\d+}/refresh")]
pub async fn refresh_extraction(
    req: HttpRequest,
    extraction_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    let extraction = match find_extraction(&repo, extraction_id.into_inner()) {
        Ok(extraction) => extraction,
        Err(response) => return response,
    };
    let controller = seeded_events(&cache, &user, &extraction, req.query_string());
    let source = |variables: &QueryVariables<EventFilter>| list_events(repo.get_ref(), variables);
    list::refresh(&controller, &source, &events_base(&extraction))
}

use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::report::REPORTS;
use crate::domain::event::{EVENTS, Event, EventFilter};
use crate::forms::ConfirmForm;
use crate::forms::event::EventForm;
use crate::list::controller::ListController;
use crate::list::mutation::{EntityForm, MutationKind};
use crate::list::table::with_query;
use crate::list::variables::QueryVariables;
use crate::list::{EntityKey, QueryCache};
use crate::models::config::ServerConfig;
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::DieselRepository;
use crate::routes::list::{self, Page, list_url};
use crate::routes::{ensure_capability, ensure_viewer, redirect};
use crate::services::event::{
    create_event, delete_event, events_table, get_event, list_events, update_event,
};
use crate::services::export::request_export;
use crate::services::list::{ListView, RepositoryOptions, form_page, list_page};

const BASE: &str = "/events";

pub(crate) type Events<'c> = ListController<'c, Event, EventFilter>;

/// Events list under `base`. The full list offers adding and exporting;
/// lists opened from a saved extraction query only browse.
pub(crate) fn render_list(
    page: &Page<'_>,
    controller: &Events<'_>,
    base: &str,
    repo: &DieselRepository,
    permissions: &Permissions,
) -> HttpResponse {
    let flags = permissions.flags(PermissionEntity::Event);
    let full = base == BASE;
    let source = |variables: &QueryVariables<EventFilter>| list_events(repo, variables);
    let mut links = Vec::new();
    if permissions.allows(PermissionEntity::ExtractionQuery, Capability::Add) {
        links.push(("Save filters", "/extractions/save".to_string()));
    }
    let data = list_page(
        controller,
        &source,
        &RepositoryOptions(repo),
        ListView {
            title: "Events",
            base,
            table: events_table(permissions),
            permissions: flags,
            add: (full && flags.add).then(|| format!("{BASE}/add")),
            export: full && flags.export,
            links,
        },
    );
    page.list(&data)
}

fn render_form(
    page: &Page<'_>,
    title: String,
    action: String,
    cancel: String,
    form: &EntityForm<EventForm>,
    repo: &DieselRepository,
) -> HttpResponse {
    page.form(&form_page(title, action, cancel, form, &RepositoryOptions(repo)))
}

#[get("/events")]
pub async fn show_events(
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
        current_page: "events",
    };
    let controller = Events::new(&cache, EVENTS).owned_by(&user.sub).restore(req.query_string());
    render_list(&page, &controller, BASE, &repo, &permissions)
}

#[get("/events/filter")]
pub async fn filter_events(
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
        current_page: "events",
    };
    list::apply_filter(
        Events::new(&cache, EVENTS).owned_by(&user.sub),
        req.query_string(),
        BASE,
        |controller| render_list(&page, controller, BASE, &repo, &permissions),
    )
}

#[get("/events/reset")]
pub async fn reset_events(
    req: HttpRequest,
    user: AuthenticatedUser,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    list::reset_filters(
        Events::new(&cache, EVENTS).owned_by(&user.sub).restore(req.query_string()),
        BASE,
    )
}

#[get("/events/refresh")]
pub async fn refresh_events(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    let controller = Events::new(&cache, EVENTS).owned_by(&user.sub).restore(req.query_string());
    let source = |variables: &QueryVariables<EventFilter>| list_events(repo.get_ref(), variables);
    list::refresh(&controller, &source, BASE)
}

#[post("/events/export")]
pub async fn export_events(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let controller = Events::new(&cache, EVENTS).owned_by(&user.sub).restore(req.query_string());
    let response = request_export(
        repo.get_ref(),
        &permissions,
        PermissionEntity::Event,
        &EVENTS,
        &controller.variables().filters,
        &user,
    );
    list::export(response, &list_url(&controller, BASE))
}

#[get("/events/add")]
pub async fn new_event(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) = ensure_capability(&user, PermissionEntity::Event, Capability::Add) {
        return response;
    }
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "events",
    };
    let controller = Events::new(&cache, EVENTS).owned_by(&user.sub).restore(req.query_string());
    let query = controller.variables().to_query();
    render_form(
        &page,
        "New event".to_string(),
        with_query(&format!("{BASE}/add"), &query),
        list_url(&controller, BASE),
        &EntityForm::edited(EventForm::default()),
        &repo,
    )
}

#[post("/events/add")]
pub async fn add_event(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<EventForm>,
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
    let controller = Events::new(&cache, EVENTS).owned_by(&user.sub).restore(req.query_string());
    let back = list_url(&controller, BASE);
    list::submit(
        &controller,
        form,
        MutationKind::Create,
        &back,
        |form| create_event(repo.get_ref(), &permissions, form),
        |form| {
            render_form(
                &page,
                "New event".to_string(),
                with_query(&format!("{BASE}/add"), req.query_string()),
                back.clone(),
                form,
                &repo,
            )
        },
    )
}

#[get("/events/{event_id:\\d+}")]
pub async fn show_event(
    req: HttpRequest,
    event_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) = ensure_capability(&user, PermissionEntity::Event, Capability::Change) {
        return response;
    }
    let controller = Events::new(&cache, EVENTS).owned_by(&user.sub).restore(req.query_string());
    let event = match get_event(repo.get_ref(), event_id.into_inner()) {
        Ok(event) => event,
        Err(err) => {
            log::warn!("Failed to open event: {err}");
            FlashMessage::error("Event not found.").send();
            return redirect(&list_url(&controller, BASE));
        }
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "events",
    };
    render_form(
        &page,
        format!("Edit {}", event.name),
        with_query(&format!("{BASE}/{}", event.id), req.query_string()),
        list_url(&controller, BASE),
        &EntityForm::edited(EventForm::from(&event)),
        &repo,
    )
}

#[post("/events/{event_id:\\d+}")]
pub async fn save_event(
    req: HttpRequest,
    event_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<EventForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let event_id = event_id.into_inner();
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "events",
    };
    let controller = Events::new(&cache, EVENTS).owned_by(&user.sub).restore(req.query_string());
    let back = list_url(&controller, BASE);
    list::submit(
        &controller,
        form,
        MutationKind::Update,
        &back,
        |form| update_event(repo.get_ref(), &permissions, event_id, form),
        |form| {
            render_form(
                &page,
                "Edit event".to_string(),
                with_query(&format!("{BASE}/{event_id}"), req.query_string()),
                back.clone(),
                form,
                &repo,
            )
        },
    )
}

#[post("/events/{event_id:\\d+}/delete")]
pub async fn remove_event(
    req: HttpRequest,
    event_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    web::Form(confirm): web::Form<ConfirmForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let controller = Events::new(&cache, EVENTS)
        .owned_by(&user.sub)
        .invalidates(&[REPORTS.query])
        .restore(req.query_string());
    list::delete(
        &controller,
        EntityKey::new(event_id.into_inner()),
        &confirm,
        &list_url(&controller, BASE),
        |key| delete_event(repo.get_ref(), &permissions, key),
    )
}

use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::resource::{RESOURCES, Resource, ResourceFilter};
use crate::forms::ConfirmForm;
use crate::forms::resource::ResourceForm;
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
use crate::services::resource::{
    create_resource, delete_resource, get_resource, list_resources, resources_table, update_resource,
};
use crate::services::list::{ListView, RepositoryOptions, form_page, list_page};

const BASE: &str = "/resources";

type Resources<'c> = ListController<'c, Resource, ResourceFilter>;

fn render_list(
    page: &Page<'_>,
    controller: &Resources<'_>,
    repo: &DieselRepository,
    permissions: &Permissions,
) -> HttpResponse {
    let flags = permissions.flags(PermissionEntity::Resource);
    let source = |variables: &QueryVariables<ResourceFilter>| list_resources(repo, variables);
    let data = list_page(
        controller,
        &source,
        &RepositoryOptions(repo),
        ListView {
            title: "Resources",
            base: BASE,
            table: resources_table(permissions),
            permissions: flags,
            add: flags.add.then(|| format!("{BASE}/add")),
            export: false,
            links: Vec::new(),
        },
    );
    page.list(&data)
}

fn render_form(
    page: &Page<'_>,
    title: String,
    action: String,
    cancel: String,
    form: &EntityForm<ResourceForm>,
    repo: &DieselRepository,
) -> HttpResponse {
    page.form(&form_page(title, action, cancel, form, &RepositoryOptions(repo)))
}

#[get("/resources")]
pub async fn show_resources(
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
        current_page: "resources",
    };
    let controller = Resources::new(&cache, RESOURCES)
            .owned_by(&user.sub)
            .restore(req.query_string());
    render_list(&page, &controller, &repo, &permissions)
}

#[get("/resources/filter")]
pub async fn filter_resources(
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
        current_page: "resources",
    };
    list::apply_filter(
        Resources::new(&cache, RESOURCES).owned_by(&user.sub),
        req.query_string(),
        BASE,
        |controller| render_list(&page, controller, &repo, &permissions),
    )
}

#[get("/resources/reset")]
pub async fn reset_resources(
    req: HttpRequest,
    user: AuthenticatedUser,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    list::reset_filters(
        Resources::new(&cache, RESOURCES).owned_by(&user.sub).restore(req.query_string()),
        BASE,
    )
}

#[get("/resources/refresh")]
pub async fn refresh_resources(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    let controller = Resources::new(&cache, RESOURCES)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let source = |variables: &QueryVariables<ResourceFilter>| list_resources(repo.get_ref(), variables);
    list::refresh(&controller, &source, BASE)
}

#[get("/resources/add")]
pub async fn new_resource(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) = ensure_capability(&user, PermissionEntity::Resource, Capability::Add) {
        return response;
    }
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "resources",
    };
    let controller = Resources::new(&cache, RESOURCES)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let query = controller.variables().to_query();
    render_form(
        &page,
        "New resource".to_string(),
        with_query(&format!("{BASE}/add"), &query),
        list_url(&controller, BASE),
        &EntityForm::edited(ResourceForm::default()),
        &repo,
    )
}

#[post("/resources/add")]
pub async fn add_resource(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ResourceForm>,
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
        current_page: "resources",
    };
    let controller = Resources::new(&cache, RESOURCES)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let back = list_url(&controller, BASE);
    list::submit(
        &controller,
        form,
        MutationKind::Create,
        &back,
        |form| create_resource(repo.get_ref(), &permissions, form),
        |form| {
            render_form(
                &page,
                "New resource".to_string(),
                with_query(&format!("{BASE}/add"), req.query_string()),
                back.clone(),
                form,
                &repo,
            )
        },
    )
}

#[get("/resources/{resource_id:\\d+}")]
pub async fn show_resource(
    req: HttpRequest,
    resource_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) = ensure_capability(&user, PermissionEntity::Resource, Capability::Change) {
        return response;
    }
    let controller = Resources::new(&cache, RESOURCES)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let resource = match get_resource(repo.get_ref(), resource_id.into_inner()) {
        Ok(resource) => resource,
        Err(err) => {
            log::warn!("Failed to open resource: {err}");
            FlashMessage::error("Resource not found.").send();
            return redirect(&list_url(&controller, BASE));
        }
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "resources",
    };
    render_form(
        &page,
        format!("Edit {}", resource.name),
        with_query(&format!("{BASE}/{}", resource.id), req.query_string()),
        list_url(&controller, BASE),
        &EntityForm::edited(ResourceForm::from(&resource)),
        &repo,
    )
}

#[post("/resources/{resource_id:\\d+}")]
pub async fn save_resource(
    req: HttpRequest,
    resource_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ResourceForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let resource_id = resource_id.into_inner();
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "resources",
    };
    let controller = Resources::new(&cache, RESOURCES)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let back = list_url(&controller, BASE);
    list::submit(
        &controller,
        form,
        MutationKind::Update,
        &back,
        |form| update_resource(repo.get_ref(), &permissions, resource_id, form),
        |form| {
            render_form(
                &page,
                "Edit resource".to_string(),
                with_query(&format!("{BASE}/{resource_id}"), req.query_string()),
                back.clone(),
                form,
                &repo,
            )
        },
    )
}

#[post("/resources/{resource_id:\\d+}/delete")]
pub async fn remove_resource(
    req: HttpRequest,
    resource_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    web::Form(confirm): web::Form<ConfirmForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let controller = Resources::new(&cache, RESOURCES)
            .owned_by(&user.sub)
            .restore(req.query_string());
    list::delete(
        &controller,
        EntityKey::new(resource_id.into_inner()),
        &confirm,
        &list_url(&controller, BASE),
        |key| delete_resource(repo.get_ref(), &permissions, key),
    )
}

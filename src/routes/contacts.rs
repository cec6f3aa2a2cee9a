use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::communication::COMMUNICATIONS;
use crate::domain::contact::{CONTACTS, Contact, ContactFilter};
use crate::forms::ConfirmForm;
use crate::forms::contact::ContactForm;
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
use crate::services::contact::{
    contacts_table, create_contact, delete_contact, get_contact, list_contacts, update_contact,
};
use crate::services::export::request_export;
use crate::services::list::{ListView, RepositoryOptions, form_page, list_page};

const BASE: &str = "/contacts";

type Contacts<'c> = ListController<'c, Contact, ContactFilter>;

fn render_list(
    page: &Page<'_>,
    controller: &Contacts<'_>,
    repo: &DieselRepository,
    permissions: &Permissions,
) -> HttpResponse {
    let flags = permissions.flags(PermissionEntity::Contact);
    let source = |variables: &QueryVariables<ContactFilter>| list_contacts(repo, variables);
    let data = list_page(
        controller,
        &source,
        &RepositoryOptions(repo),
        ListView {
            title: "Contacts",
            base: BASE,
            table: contacts_table(permissions),
            permissions: flags,
            add: flags.add.then(|| format!("{BASE}/add")),
            export: flags.export,
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
    form: &EntityForm<ContactForm>,
    repo: &DieselRepository,
) -> HttpResponse {
    page.form(&form_page(title, action, cancel, form, &RepositoryOptions(repo)))
}

#[get("/contacts")]
pub async fn show_contacts(
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
        current_page: "contacts",
    };
    let controller = Contacts::new(&cache, CONTACTS)
            .owned_by(&user.sub)
            .restore(req.query_string());
    render_list(&page, &controller, &repo, &permissions)
}

#[get("/contacts/filter")]
pub async fn filter_contacts(
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
        current_page: "contacts",
    };
    list::apply_filter(
        Contacts::new(&cache, CONTACTS).owned_by(&user.sub),
        req.query_string(),
        BASE,
        |controller| render_list(&page, controller, &repo, &permissions),
    )
}

#[get("/contacts/reset")]
pub async fn reset_contacts(
    req: HttpRequest,
    user: AuthenticatedUser,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    list::reset_filters(
        Contacts::new(&cache, CONTACTS).owned_by(&user.sub).restore(req.query_string()),
        BASE,
    )
}

#[get("/contacts/refresh")]
pub async fn refresh_contacts(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    let controller = Contacts::new(&cache, CONTACTS)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let source = |variables: &QueryVariables<ContactFilter>| list_contacts(repo.get_ref(), variables);
    list::refresh(&controller, &source, BASE)
}

#[post("/contacts/export")]
pub async fn export_contacts(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let controller = Contacts::new(&cache, CONTACTS)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let response = request_export(
        repo.get_ref(),
        &permissions,
        PermissionEntity::Contact,
        &CONTACTS,
        &controller.variables().filters,
        &user,
    );
    list::export(response, &list_url(&controller, BASE))
}

#[get("/contacts/add")]
pub async fn new_contact(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) = ensure_capability(&user, PermissionEntity::Contact, Capability::Add) {
        return response;
    }
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "contacts",
    };
    let controller = Contacts::new(&cache, CONTACTS)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let query = controller.variables().to_query();
    render_form(
        &page,
        "New contact".to_string(),
        with_query(&format!("{BASE}/add"), &query),
        list_url(&controller, BASE),
        &EntityForm::edited(ContactForm::default()),
        &repo,
    )
}

#[post("/contacts/add")]
pub async fn add_contact(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ContactForm>,
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
        current_page: "contacts",
    };
    let controller = Contacts::new(&cache, CONTACTS)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let back = list_url(&controller, BASE);
    list::submit(
        &controller,
        form,
        MutationKind::Create,
        &back,
        |form| create_contact(repo.get_ref(), &permissions, form),
        |form| {
            render_form(
                &page,
                "New contact".to_string(),
                with_query(&format!("{BASE}/add"), req.query_string()),
                back.clone(),
                form,
                &repo,
            )
        },
    )
}

#[get("/contacts/{contact_id:\\d+}")]
pub async fn show_contact(
    req: HttpRequest,
    contact_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) = ensure_capability(&user, PermissionEntity::Contact, Capability::Change) {
        return response;
    }
    let controller = Contacts::new(&cache, CONTACTS)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let contact = match get_contact(repo.get_ref(), contact_id.into_inner()) {
        Ok(contact) => contact,
        Err(err) => {
            log::warn!("Failed to open contact: {err}");
            FlashMessage::error("Contact not found.").send();
            return redirect(&list_url(&controller, BASE));
        }
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "contacts",
    };
    render_form(
        &page,
        format!("Edit {}", contact.name),
        with_query(&format!("{BASE}/{}", contact.id), req.query_string()),
        list_url(&controller, BASE),
        &EntityForm::edited(ContactForm::from(&contact)),
        &repo,
    )
}

#[post("/contacts/{contact_id:\\d+}")]
pub async fn save_contact(
    req: HttpRequest,
    contact_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ContactForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let contact_id = contact_id.into_inner();
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "contacts",
    };
    let controller = Contacts::new(&cache, CONTACTS)
            .owned_by(&user.sub)
            .restore(req.query_string());
    let back = list_url(&controller, BASE);
    list::submit(
        &controller,
        form,
        MutationKind::Update,
        &back,
        |form| update_contact(repo.get_ref(), &permissions, contact_id, form),
        |form| {
            render_form(
                &page,
                "Edit contact".to_string(),
                with_query(&format!("{BASE}/{contact_id}"), req.query_string()),
                back.clone(),
                form,
                &repo,
            )
        },
    )
}

#[post("/contacts/{contact_id:\\d+}/delete")]
pub async fn remove_contact(
    req: HttpRequest,
    contact_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    web::Form(confirm): web::Form<ConfirmForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let controller = Contacts::new(&cache, CONTACTS)
        .owned_by(&user.sub)
        .invalidates(&[COMMUNICATIONS.query])
        .restore(req.query_string());
    list::delete(
        &controller,
        EntityKey::new(contact_id.into_inner()),
        &confirm,
        &list_url(&controller, BASE),
        |key| delete_contact(repo.get_ref(), &permissions, key),
    )
}

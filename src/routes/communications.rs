use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::communication::{COMMUNICATIONS, Communication, CommunicationFilter};
use crate::domain::contact::Contact;
use crate::forms::ConfirmForm;
use crate::forms::communication::CommunicationForm;
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
use crate::services::communication::{
    communications_base, communications_table, create_communication, delete_communication,
    get_communication, list_communications, update_communication,
};
use crate::services::contact::get_contact;
use crate::services::list::{ListView, RepositoryOptions, form_page, list_page};

type Communications<'c> = ListController<'c, Communication, CommunicationFilter>;

/// Communications list of one contact. The contact can't be filtered away.
fn controller<'c>(
    cache: &'c QueryCache,
    user: &AuthenticatedUser,
    contact: &Contact,
    raw_query: &str,
) -> Communications<'c> {
    Communications::new(cache, COMMUNICATIONS)
        .owned_by(&user.sub)
        .fixed(CommunicationFilter::for_contact(contact.id))
        .restore(raw_query)
}

/// Contact a request refers to, or a redirect back to the contacts list.
fn find_contact(repo: &DieselRepository, contact_id: i32) -> Result<Contact, HttpResponse> {
    get_contact(repo, contact_id).map_err(|err| {
        log::warn!("Failed to open contact {contact_id}: {err}");
        FlashMessage::error("Contact not found.").send();
        redirect("/contacts")
    })
}

/// Communication with the contact it belongs to.
fn find_communication(
    repo: &DieselRepository,
    communication_id: i32,
) -> Result<(Communication, Contact), HttpResponse> {
    let communication = get_communication(repo, communication_id).map_err(|err| {
        log::warn!("Failed to open communication {communication_id}: {err}");
        FlashMessage::error("Communication not found.").send();
        redirect("/contacts")
    })?;
    let contact = find_contact(repo, communication.contact_id.get())?;
    Ok((communication, contact))
}

fn render_list(
    page: &Page<'_>,
    controller: &Communications<'_>,
    contact: &Contact,
    repo: &DieselRepository,
    permissions: &Permissions,
) -> HttpResponse {
    let base = communications_base(contact.id);
    let flags = permissions.flags(PermissionEntity::Communication);
    let source =
        |variables: &QueryVariables<CommunicationFilter>| list_communications(repo, variables);
    let data = list_page(
        controller,
        &source,
        &RepositoryOptions(repo),
        ListView {
            title: "Communications",
            base: &base,
            table: communications_table(permissions),
            permissions: flags,
            add: flags.add.then(|| format!("{base}/add")),
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
    form: &EntityForm<CommunicationForm>,
    repo: &DieselRepository,
) -> HttpResponse {
    let mut data = form_page(title, action, cancel, form, &RepositoryOptions(repo));
    data.hidden
        .push(("contact_id", form.value().contact_id.to_string()));
    page.form(&data)
}

#[get("/contacts/{contact_id:\\d+}/communications")]
pub async fn show_communications(
    req: HttpRequest,
    contact_id: web::Path<i32>,
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
    let contact = match find_contact(&repo, contact_id.into_inner()) {
        Ok(contact) => contact,
        Err(response) => return response,
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "contacts",
    };
    let controller = controller(&cache, &user, &contact, req.query_string());
    render_list(&page, &controller, &contact, &repo, &permissions)
}

#[get("/contacts/{contact_id:\\d+}/communications/filter")]
pub async fn filter_communications(
    req: HttpRequest,
    contact_id: web::Path<i32>,
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
    let contact = match find_contact(&repo, contact_id.into_inner()) {
        Ok(contact) => contact,
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
        controller(&cache, &user, &contact, ""),
        req.query_string(),
        &communications_base(contact.id),
        |controller| render_list(&page, controller, &contact, &repo, &permissions),
    )
}

#[get("/contacts/{contact_id:\\d+}/communications/reset")]
pub async fn reset_communications(
    req: HttpRequest,
    contact_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    let contact = match find_contact(&repo, contact_id.into_inner()) {
        Ok(contact) => contact,
        Err(response) => return response,
    };
    list::reset_filters(
        controller(&cache, &user, &contact, req.query_string()),
        &communications_base(contact.id),
    )
}

#[get("/contacts/{contact_id:\\d+}/communications/refresh")]
pub async fn refresh_communications(
    req: HttpRequest,
    contact_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    let contact = match find_contact(&repo, contact_id.into_inner()) {
        Ok(contact) => contact,
        Err(response) => return response,
    };
    let controller = controller(&cache, &user, &contact, req.query_string());
    let source = |variables: &QueryVariables<CommunicationFilter>| {
        list_communications(repo.get_ref(), variables)
    };
    list::refresh(&controller, &source, &communications_base(contact.id))
}

#[get("/contacts/{contact_id:\\d+}/communications/add")]
pub async fn new_communication(
    req: HttpRequest,
    contact_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) =
        ensure_capability(&user, PermissionEntity::Communication, Capability::Add)
    {
        return response;
    }
    let contact = match find_contact(&repo, contact_id.into_inner()) {
        Ok(contact) => contact,
        Err(response) => return response,
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "contacts",
    };
    let base = communications_base(contact.id);
    let controller = controller(&cache, &user, &contact, req.query_string());
    let form = CommunicationForm {
        contact_id: contact.id.get(),
        date: chrono::Utc::now().date_naive().to_string(),
        ..CommunicationForm::default()
    };
    render_form(
        &page,
        format!("New communication with {}", contact.name),
        with_query(&format!("{base}/add"), req.query_string()),
        list_url(&controller, &base),
        &EntityForm::edited(form),
        &repo,
    )
}

#[post("/contacts/{contact_id:\\d+}/communications/add")]
pub async fn add_communication(
    req: HttpRequest,
    contact_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(mut form): web::Form<CommunicationForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let contact = match find_contact(&repo, contact_id.into_inner()) {
        Ok(contact) => contact,
        Err(response) => return response,
    };
    form.contact_id = contact.id.get();
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "contacts",
    };
    let base = communications_base(contact.id);
    let controller = controller(&cache, &user, &contact, req.query_string());
    let back = list_url(&controller, &base);
    list::submit(
        &controller,
        form,
        MutationKind::Create,
        &back,
        |form| create_communication(repo.get_ref(), &permissions, form),
        |form| {
            render_form(
                &page,
                format!("New communication with {}", contact.name),
                with_query(&format!("{base}/add"), req.query_string()),
                back.clone(),
                form,
                &repo,
            )
        },
    )
}

#[get("/communications/{communication_id:\\d+}")]
pub async fn show_communication(
    req: HttpRequest,
    communication_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) =
        ensure_capability(&user, PermissionEntity::Communication, Capability::Change)
    {
        return response;
    }
    let (communication, contact) = match find_communication(&repo, communication_id.into_inner())
    {
        Ok(found) => found,
        Err(response) => return response,
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "contacts",
    };
    let controller = controller(&cache, &user, &contact, req.query_string());
    render_form(
        &page,
        format!("Edit communication with {}", contact.name),
        with_query(
            &format!("/communications/{}", communication.id),
            req.query_string(),
        ),
        list_url(&controller, &communications_base(contact.id)),
        &EntityForm::edited(CommunicationForm::from(&communication)),
        &repo,
    )
}

#[post("/communications/{communication_id:\\d+}")]
pub async fn save_communication(
    req: HttpRequest,
    communication_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(mut form): web::Form<CommunicationForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let (communication, contact) = match find_communication(&repo, communication_id.into_inner())
    {
        Ok(found) => found,
        Err(response) => return response,
    };
    // A communication stays with the contact it was logged for.
    form.contact_id = contact.id.get();
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "contacts",
    };
    let communication_id = communication.id.get();
    let controller = controller(&cache, &user, &contact, req.query_string());
    let back = list_url(&controller, &communications_base(contact.id));
    list::submit(
        &controller,
        form,
        MutationKind::Update,
        &back,
        |form| update_communication(repo.get_ref(), &permissions, communication_id, form),
        |form| {
            render_form(
                &page,
                format!("Edit communication with {}", contact.name),
                with_query(
                    &format!("/communications/{communication_id}"),
                    req.query_string(),
                ),
                back.clone(),
                form,
                &repo,
            )
        },
    )
}

#[post("/communications/{communication_id:\\d+}/delete")]
pub async fn remove_communication(
    req: HttpRequest,
    communication_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    web::Form(confirm): web::Form<ConfirmForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let (communication, contact) = match find_communication(&repo, communication_id.into_inner())
    {
        Ok(found) => found,
        Err(response) => return response,
    };
    let controller = controller(&cache, &user, &contact, req.query_string());
    list::delete(
        &controller,
        EntityKey::new(communication.id.get()),
        &confirm,
        &list_url(&controller, &communications_base(contact.id)),
        |key| delete_communication(repo.get_ref(), &permissions, key),
    )
}

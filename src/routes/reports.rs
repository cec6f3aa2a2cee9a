use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::report::{REPORTS, Report, ReportFilter};
use crate::forms::ConfirmForm;
use crate::forms::report::ReportForm;
use crate::list::controller::ListController;
use crate::list::mutation::{EntityForm, MutationKind};
use crate::list::table::with_query;
use crate::list::variables::QueryVariables;
use crate::list::{EntityKey, QueryCache};
use crate::models::config::ServerConfig;
use crate::notify::FlashNotifier;
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::DieselRepository;
use crate::routes::list::{self, Page, list_url};
use crate::routes::{ensure_capability, ensure_viewer, redirect};
use crate::services::report::{
    create_report, delete_report, get_report, list_reports, reports_table, sign_off_report,
    update_report,
};
use crate::services::list::{ListView, RepositoryOptions, form_page, list_page};

const BASE: &str = "/reports";

type Reports<'c> = ListController<'c, Report, ReportFilter>;

fn render_list(
    page: &Page<'_>,
    controller: &Reports<'_>,
    repo: &DieselRepository,
    permissions: &Permissions,
) -> HttpResponse {
    let flags = permissions.flags(PermissionEntity::Report);
    let source = |variables: &QueryVariables<ReportFilter>| list_reports(repo, variables);
    let data = list_page(
        controller,
        &source,
        &RepositoryOptions(repo),
        ListView {
            title: "Reports",
            base: BASE,
            table: reports_table(permissions),
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
    form: &EntityForm<ReportForm>,
    repo: &DieselRepository,
) -> HttpResponse {
    page.form(&form_page(title, action, cancel, form, &RepositoryOptions(repo)))
}

#[get("/reports")]
pub async fn show_reports(
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
        current_page: "reports",
    };
    let controller = Reports::new(&cache, REPORTS).owned_by(&user.sub).restore(req.query_string());
    render_list(&page, &controller, &repo, &permissions)
}

#[get("/reports/filter")]
pub async fn filter_reports(
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
        current_page: "reports",
    };
    list::apply_filter(
        Reports::new(&cache, REPORTS).owned_by(&user.sub),
        req.query_string(),
        BASE,
        |controller| render_list(&page, controller, &repo, &permissions),
    )
}

#[get("/reports/reset")]
pub async fn reset_reports(
    req: HttpRequest,
    user: AuthenticatedUser,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    list::reset_filters(
        Reports::new(&cache, REPORTS).owned_by(&user.sub).restore(req.query_string()),
        BASE,
    )
}

#[get("/reports/refresh")]
pub async fn refresh_reports(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    if let Err(response) = ensure_viewer(&user) {
        return response;
    }
    let controller = Reports::new(&cache, REPORTS).owned_by(&user.sub).restore(req.query_string());
    let source = |variables: &QueryVariables<ReportFilter>| list_reports(repo.get_ref(), variables);
    list::refresh(&controller, &source, BASE)
}

#[post("/reports/{report_id:\\d+}/sign-off")]
pub async fn sign_off(
    req: HttpRequest,
    report_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let key = EntityKey::new(report_id.into_inner());
    let controller = Reports::new(&cache, REPORTS).owned_by(&user.sub).restore(req.query_string());
    controller.replace_row(&FlashNotifier, "signed off", || {
        sign_off_report(repo.get_ref(), &permissions, &user, key)
    });
    redirect(&list_url(&controller, BASE))
}

#[get("/reports/add")]
pub async fn new_report(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) = ensure_capability(&user, PermissionEntity::Report, Capability::Add) {
        return response;
    }
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "reports",
    };
    let controller = Reports::new(&cache, REPORTS).owned_by(&user.sub).restore(req.query_string());
    let query = controller.variables().to_query();
    render_form(
        &page,
        "New report".to_string(),
        with_query(&format!("{BASE}/add"), &query),
        list_url(&controller, BASE),
        &EntityForm::edited(ReportForm::default()),
        &repo,
    )
}

#[post("/reports/add")]
pub async fn add_report(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ReportForm>,
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
        current_page: "reports",
    };
    let controller = Reports::new(&cache, REPORTS).owned_by(&user.sub).restore(req.query_string());
    let back = list_url(&controller, BASE);
    list::submit(
        &controller,
        form,
        MutationKind::Create,
        &back,
        |form| create_report(repo.get_ref(), &permissions, form),
        |form| {
            render_form(
                &page,
                "New report".to_string(),
                with_query(&format!("{BASE}/add"), req.query_string()),
                back.clone(),
                form,
                &repo,
            )
        },
    )
}

#[get("/reports/{report_id:\\d+}")]
pub async fn show_report(
    req: HttpRequest,
    report_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if let Err(response) = ensure_capability(&user, PermissionEntity::Report, Capability::Change) {
        return response;
    }
    let controller = Reports::new(&cache, REPORTS).owned_by(&user.sub).restore(req.query_string());
    let report = match get_report(repo.get_ref(), report_id.into_inner()) {
        Ok(report) => report,
        Err(err) => {
            log::warn!("Failed to open report: {err}");
            FlashMessage::error("Report not found.").send();
            return redirect(&list_url(&controller, BASE));
        }
    };
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "reports",
    };
    render_form(
        &page,
        format!("Edit {}", report.name),
        with_query(&format!("{BASE}/{}", report.id), req.query_string()),
        list_url(&controller, BASE),
        &EntityForm::edited(ReportForm::from(&report)),
        &repo,
    )
}

#[post("/reports/{report_id:\\d+}")]
pub async fn save_report(
    req: HttpRequest,
    report_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ReportForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let report_id = report_id.into_inner();
    let page = Page {
        tera: &tera,
        flash_messages: &flash_messages,
        user: &user,
        config: &server_config,
        current_page: "reports",
    };
    let controller = Reports::new(&cache, REPORTS).owned_by(&user.sub).restore(req.query_string());
    let back = list_url(&controller, BASE);
    list::submit(
        &controller,
        form,
        MutationKind::Update,
        &back,
        |form| update_report(repo.get_ref(), &permissions, report_id, form),
        |form| {
            render_form(
                &page,
                "Edit report".to_string(),
                with_query(&format!("{BASE}/{report_id}"), req.query_string()),
                back.clone(),
                form,
                &repo,
            )
        },
    )
}

#[post("/reports/{report_id:\\d+}/delete")]
pub async fn remove_report(
    req: HttpRequest,
    report_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    cache: web::Data<QueryCache>,
    web::Form(confirm): web::Form<ConfirmForm>,
) -> impl Responder {
    let permissions = match ensure_viewer(&user) {
        Ok(permissions) => permissions,
        Err(response) => return response,
    };
    let controller = Reports::new(&cache, REPORTS).owned_by(&user.sub).restore(req.query_string());
    list::delete(
        &controller,
        EntityKey::new(report_id.into_inner()),
        &confirm,
        &list_url(&controller, BASE),
        |key| delete_report(repo.get_ref(), &permissions, key),
    )
}

use actix_identity::{Identity, IdentityMiddleware};
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::{StatusCode, header};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, get, web};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::{FlashMessagesFramework, Level};
use helix_admin::db::PoolSettings;
use helix_admin::domain::auth::AuthenticatedUser;
use helix_admin::domain::contact::{CONTACTS, NewContact};
use helix_admin::domain::event::EventFilter;
use helix_admin::domain::extraction::NewExtractionQuery;
use helix_admin::domain::types::{ContactEmail, ContactName, CountryCode, QueryName};
use helix_admin::list::QueryCache;
use helix_admin::models::auth::encode_token;
use helix_admin::models::config::ServerConfig;
use helix_admin::repository::{ContactReader, ContactWriter, DieselRepository, ExtractionQueryWriter};
use helix_admin::routes::alert_level_to_str;
use helix_admin::{SERVICE_ACCESS_ROLE, SERVICE_ADMIN_ROLE};

mod common;

const SUBJECT: &str = "user-1";

fn server_config() -> ServerConfig {
    ServerConfig {
        domain: "localhost".into(),
        address: "127.0.0.1".into(),
        port: 8080,
        database_url: ":memory:".into(),
        templates_dir: "templates/**/*".into(),
        secret: "secret".into(),
        auth_service_url: "http://localhost:8000".into(),
        database: PoolSettings::default(),
        cache_pages_per_list: 64,
    }
}

fn editor() -> AuthenticatedUser {
    AuthenticatedUser {
        sub: SUBJECT.into(),
        email: "editor@example.org".into(),
        name: "Editor".into(),
        roles: vec![SERVICE_ACCESS_ROLE.into(), SERVICE_ADMIN_ROLE.into()],
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    }
}

/// Signs the editor in; the session cookie is reused by later requests.
#[get("/test-login")]
async fn test_login(req: HttpRequest, config: web::Data<ServerConfig>) -> HttpResponse {
    let token = encode_token(&editor(), &config.secret).expect("token");
    Identity::login(&req.extensions(), token).expect("login");
    HttpResponse::Ok().finish()
}

/// Full application stack around the routes under test.
macro_rules! test_app {
    ($repo:expr, $cache:expr) => {{
        use helix_admin::routes::contacts::{
            add_contact, filter_contacts, remove_contact, show_contacts,
        };
        use helix_admin::routes::extractions::{reset_extraction, show_extraction};

        let key = Key::from(&[7u8; 64]);
        let message_store = CookieMessageStore::builder(key.clone()).build();
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(FlashMessagesFramework::builder(message_store).build())
                .wrap(IdentityMiddleware::default())
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), key)
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new(
                    tera::Tera::new("templates/**/*").expect("templates parse"),
                ))
                .app_data(web::Data::new($repo))
                .app_data($cache)
                .app_data(web::Data::new(server_config()))
                .service(test_login)
                .service(show_contacts)
                .service(filter_contacts)
                .service(add_contact)
                .service(remove_contact)
                .service(show_extraction)
                .service(reset_extraction),
        )
        .await
    }};
}

macro_rules! sign_in {
    ($app:expr) => {{
        let resp = actix_web::test::call_service(
            &$app,
            actix_web::test::TestRequest::get().uri("/test-login").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.response()
            .cookies()
            .map(Cookie::into_owned)
            .collect::<Vec<_>>()
    }};
}

fn with_cookies(
    mut request: actix_web::test::TestRequest,
    cookies: &[Cookie<'static>],
) -> actix_web::test::TestRequest {
    for cookie in cookies {
        request = request.cookie(cookie.clone());
    }
    request
}

fn contact(name: &str, email: &str) -> NewContact {
    NewContact {
        name: ContactName::new(name).unwrap(),
        email: Some(ContactEmail::new(email).unwrap()),
        phone: None,
        organization: None,
        country: Some(CountryCode::new("NPL").unwrap()),
        job_title: None,
    }
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[test]
fn test_alert_level_to_str_mappings() {
    assert_eq!(alert_level_to_str(&Level::Error), "danger");
    assert_eq!(alert_level_to_str(&Level::Warning), "warning");
    assert_eq!(alert_level_to_str(&Level::Success), "success");
    assert_eq!(alert_level_to_str(&Level::Info), "info");
    assert_eq!(alert_level_to_str(&Level::Debug), "info");
}

#[test]
fn test_templates_parse_and_render_not_assigned() {
    use tera::{Context, Tera};

    let tera = Tera::new("templates/**/*").expect("templates parse");
    let mut context = Context::new();
    context.insert("alerts", &Vec::<(String, &str)>::new());
    context.insert("current_user", &AuthenticatedUser::default());
    context.insert("current_page", "index");
    context.insert("home_url", "http://portal.example.org");

    let body = tera
        .render("main/not_assigned.html", &context)
        .expect("renders");

    assert!(body.contains("http://portal.example.org"));
}

#[actix_web::test]
async fn test_signed_out_index_redirects_to_sign_in() {
    use actix_web::{App, test};
    use helix_admin::middleware::RedirectUnauthorized;
    use helix_admin::routes::main::show_index;

    let config = server_config();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .service(web::scope("").wrap(RedirectUnauthorized).service(show_index)),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/auth/signin");
}

#[actix_web::test]
async fn test_contacts_list_renders_rows_with_pristine_filter() {
    let test_db = common::TestDb::new("test_contacts_list_renders_rows.db");
    let repo = DieselRepository::new(test_db.pool());
    repo.create_contact(&contact("Alice", "alice@example.org")).unwrap();
    let app = test_app!(repo, web::Data::new(QueryCache::new()));
    let cookies = sign_in!(app);

    let req = with_cookies(actix_web::test::TestRequest::get().uri("/contacts"), &cookies);
    let resp = actix_web::test::call_service(&app, req.to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(actix_web::test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Alice"));
    assert!(body.contains("data-pristine"));
    assert!(!body.contains("apply.disabled = false"));
}

#[actix_web::test]
async fn test_filter_submission_redirects_to_first_page() {
    let test_db = common::TestDb::new("test_filter_submission_redirects.db");
    let repo = DieselRepository::new(test_db.pool());
    let app = test_app!(repo, web::Data::new(QueryCache::new()));
    let cookies = sign_in!(app);

    let req = with_cookies(
        actix_web::test::TestRequest::get()
            .uri("/contacts/filter?applied=page%3D3%26pageSize%3D10&search=alice"),
        &cookies,
    );
    let resp = actix_web::test::call_service(&app, req.to_request()).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let target = location(&resp);
    assert!(target.starts_with("/contacts?"));
    assert!(target.contains("page=1&pageSize=10"));
    assert!(target.contains("search=alice"));
}

#[actix_web::test]
async fn test_contact_is_deleted_only_when_confirmed() {
    let test_db = common::TestDb::new("test_contact_is_deleted_only_when_confirmed.db");
    let repo = DieselRepository::new(test_db.pool());
    let alice = repo.create_contact(&contact("Alice", "alice@example.org")).unwrap();
    let app = test_app!(repo.clone(), web::Data::new(QueryCache::new()));
    let cookies = sign_in!(app);
    let uri = format!("/contacts/{}/delete", alice.id);

    let req = with_cookies(
        actix_web::test::TestRequest::post().uri(&uri).set_form([("confirm", "false")]),
        &cookies,
    );
    let resp = actix_web::test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(repo.get_contact_by_id(alice.id).unwrap().is_some());

    let req = with_cookies(
        actix_web::test::TestRequest::post().uri(&uri).set_form([("confirm", "true")]),
        &cookies,
    );
    let resp = actix_web::test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(repo.get_contact_by_id(alice.id).unwrap().is_none());

    let req = with_cookies(actix_web::test::TestRequest::get().uri("/contacts"), &cookies);
    let resp = actix_web::test::call_service(&app, req.to_request()).await;
    let body = String::from_utf8(actix_web::test::read_body(resp).await.to_vec()).unwrap();
    assert!(!body.contains("Alice"));
}

#[actix_web::test]
async fn test_busy_submission_keeps_the_draft() {
    let test_db = common::TestDb::new("test_busy_submission_keeps_the_draft.db");
    let repo = DieselRepository::new(test_db.pool());
    let cache = web::Data::new(QueryCache::new());
    let app = test_app!(repo.clone(), cache.clone());
    let cookies = sign_in!(app);
    let running = cache.in_flight(CONTACTS.query, SUBJECT);
    let _guard = running.begin();

    let req = with_cookies(
        actix_web::test::TestRequest::post()
            .uri("/contacts/add")
            .set_form([("name", "Carol"), ("email", "carol@example.org")]),
        &cookies,
    );
    let resp = actix_web::test::call_service(&app, req.to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(actix_web::test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("carol@example.org"));
    assert!(body.contains("Another request is still running."));
    let other = cache.in_flight(CONTACTS.query, "user-2");
    assert!(!other.is_busy());
}

#[actix_web::test]
async fn test_extraction_reset_restores_saved_filters() {
    let test_db = common::TestDb::new("test_extraction_reset_restores_saved_filters.db");
    let repo = DieselRepository::new(test_db.pool());
    let saved = repo
        .create_extraction_query(&NewExtractionQuery {
            name: QueryName::new("Nepal").unwrap(),
            filters: EventFilter {
                countries: vec!["NPL".into()],
                ..EventFilter::default()
            },
        })
        .unwrap();
    let app = test_app!(repo, web::Data::new(QueryCache::new()));
    let cookies = sign_in!(app);

    let req = with_cookies(
        actix_web::test::TestRequest::get().uri(&format!(
            "/extractions/{}/reset?search=flood&page=2&pageSize=10",
            saved.id
        )),
        &cookies,
    );
    let resp = actix_web::test::call_service(&app, req.to_request()).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let target = location(&resp);
    assert!(target.starts_with(&format!("/extractions/{}?", saved.id)));
    assert!(target.contains("page=1"));
    assert!(target.contains("countries=NPL"));
    assert!(!target.contains("search="));
}

//! Admin dashboard for a displacement monitoring team: contacts and their
//! communications, resources, events with saved extraction queries, reports
//! and API usage, all browsed through one generic list core.

#[cfg(feature = "server")]
use actix_cors::Cors;
#[cfg(feature = "server")]
use actix_files::Files;
#[cfg(feature = "server")]
use actix_identity::IdentityMiddleware;
#[cfg(feature = "server")]
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
#[cfg(feature = "server")]
use actix_web::cookie::Key;
#[cfg(feature = "server")]
use actix_web::{App, HttpServer, middleware as actix_middleware, web};
#[cfg(feature = "server")]
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
#[cfg(feature = "server")]
use tera::Tera;

pub mod db;
pub mod domain;
pub mod dto;
pub mod error_conversions;
pub mod forms;
pub mod list;
#[cfg(feature = "server")]
pub mod middleware;
pub mod models;
pub mod notify;
pub mod permissions;
pub mod repository;
#[cfg(feature = "server")]
pub mod routes;
pub mod schema;
pub mod services;

/// Role required to open the dashboard at all.
pub const SERVICE_ACCESS_ROLE: &str = "helix";
/// Role allowed to add, change and delete records.
pub const SERVICE_EDITOR_ROLE: &str = "helix_editor";
/// Role holding every capability, including report sign-off.
pub const SERVICE_ADMIN_ROLE: &str = "helix_admin";

/// Builds and runs the Actix-Web HTTP server using the provided configuration.
#[cfg(feature = "server")]
pub async fn run(server_config: models::config::ServerConfig) -> std::io::Result<()> {
    use crate::list::QueryCache;
    use crate::middleware::RedirectUnauthorized;
    use crate::repository::DieselRepository;
    use crate::routes::api::api_v1_contacts;
    use crate::routes::api_usage::{
        export_api_usage, filter_api_usage, refresh_api_usage, reset_api_usage, show_api_usage,
    };
    use crate::routes::communications::{
        add_communication, filter_communications, new_communication, refresh_communications,
        remove_communication, reset_communications, save_communication, show_communication,
        show_communications,
    };
    use crate::routes::contacts::{
        add_contact, export_contacts, filter_contacts, new_contact, refresh_contacts,
        remove_contact, reset_contacts, save_contact, show_contact, show_contacts,
    };
    use crate::routes::events::{
        add_event, export_events, filter_events, new_event, refresh_events, remove_event,
        reset_events, save_event, show_event, show_events,
    };
    use crate::routes::extractions::{
        add_extraction, filter_extraction, filter_extractions, new_extraction, refresh_extraction,
        refresh_extractions, remove_extraction, reset_extraction, reset_extractions,
        show_extraction, show_extractions,
    };
    use crate::routes::main::{logout, not_assigned, show_index};
    use crate::routes::reports::{
        add_report, filter_reports, new_report, refresh_reports, remove_report, reset_reports,
        save_report, show_report, show_reports, sign_off,
    };
    use crate::routes::resources::{
        add_resource, filter_resources, new_resource, refresh_resources, remove_resource,
        reset_resources, save_resource, show_resource, show_resources,
    };

    let pool = db::establish_connection_pool(&server_config.database_url, &server_config.database)
        .map_err(|e| {
            std::io::Error::other(format!("Failed to establish database connection: {e}"))
        })?;

    let repo = DieselRepository::new(pool);

    // Every worker shares one list cache.
    let cache = web::Data::new(QueryCache::with_capacity(server_config.cache_pages_per_list));

    // Keys and stores for identity, sessions, and flash messages.
    let secret_key = Key::from(server_config.secret.as_bytes());

    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = Tera::new(&server_config.templates_dir)
        .map_err(|e| std::io::Error::other(format!("Template parsing error(s): {e}")))?;

    let bind_address = (server_config.address.clone(), server_config.port);
    log::info!("Listening on {}:{}", bind_address.0, bind_address.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(message_framework.clone())
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false) // set to true in prod
                    .cookie_domain(Some(format!(".{}", server_config.domain)))
                    .build(),
            )
            .wrap(actix_middleware::Compress::default())
            .wrap(actix_middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .service(not_assigned)
            .service(web::scope("/api").service(api_v1_contacts))
            .service(
                web::scope("")
                    .wrap(RedirectUnauthorized)
                    .service(show_index)
                    .service(logout)
                    // contacts
                    .service(show_contacts)
                    .service(filter_contacts)
                    .service(reset_contacts)
                    .service(refresh_contacts)
                    .service(export_contacts)
                    .service(new_contact)
                    .service(add_contact)
                    .service(show_contact)
                    .service(save_contact)
                    .service(remove_contact)
                    // communications
                    .service(show_communications)
                    .service(filter_communications)
                    .service(reset_communications)
                    .service(refresh_communications)
                    .service(new_communication)
                    .service(add_communication)
                    .service(show_communication)
                    .service(save_communication)
                    .service(remove_communication)
                    // resources
                    .service(show_resources)
                    .service(filter_resources)
                    .service(reset_resources)
                    .service(refresh_resources)
                    .service(new_resource)
                    .service(add_resource)
                    .service(show_resource)
                    .service(save_resource)
                    .service(remove_resource)
                    // events
                    .service(show_events)
                    .service(filter_events)
                    .service(reset_events)
                    .service(refresh_events)
                    .service(export_events)
                    .service(new_event)
                    .service(add_event)
                    .service(show_event)
                    .service(save_event)
                    .service(remove_event)
                    // extraction queries
                    .service(show_extractions)
                    .service(filter_extractions)
                    .service(reset_extractions)
                    .service(refresh_extractions)
                    .service(new_extraction)
                    .service(add_extraction)
                    .service(remove_extraction)
                    .service(show_extraction)
                    .service(filter_extraction)
                    .service(reset_extraction)
                    .service(refresh_extraction)
                    // reports
                    .service(show_reports)
                    .service(filter_reports)
                    .service(reset_reports)
                    .service(refresh_reports)
                    .service(new_report)
                    .service(add_report)
                    .service(show_report)
                    .service(save_report)
                    .service(sign_off)
                    .service(remove_report)
                    // api usage
                    .service(show_api_usage)
                    .service(filter_api_usage)
                    .service(reset_api_usage)
                    .service(refresh_api_usage)
                    .service(export_api_usage),
            )
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(repo.clone()))
            .app_data(cache.clone())
            .app_data(web::Data::new(server_config.clone()))
    })
    .bind(bind_address)?
    .run()
    .await
}

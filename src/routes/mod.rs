//! HTTP handlers and the helpers they share.

use actix_web::{HttpResponse, http::header};
use actix_web_flash_messages::{IncomingFlashMessages, Level};
use tera::{Context, Tera};

use crate::domain::auth::AuthenticatedUser;
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::services;

pub mod api;
pub mod api_usage;
pub mod communications;
pub mod contacts;
pub mod events;
pub mod extractions;
pub mod list;
pub mod main;
pub mod reports;
pub mod resources;

/// Bootstrap alert class of a flash message level.
pub fn alert_level_to_str(level: &Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        _ => "info",
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template {template}: {err:?}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Context shared by every page: alerts, the signed in user and navigation.
pub fn base_context(
    flash_messages: &IncomingFlashMessages,
    user: &AuthenticatedUser,
    current_page: &str,
    home_url: &str,
) -> Context {
    let alerts = flash_messages
        .iter()
        .map(|f| (f.content(), alert_level_to_str(&f.level())))
        .collect::<Vec<_>>();

    let mut context = Context::new();
    context.insert("alerts", &alerts);
    context.insert("current_user", user);
    context.insert("current_page", current_page);
    context.insert("home_url", home_url);
    context
}

/// Permissions of a dashboard user. Anyone else is sent to `/na`.
pub fn ensure_viewer(user: &AuthenticatedUser) -> Result<Permissions, HttpResponse> {
    services::ensure_viewer(user).map_err(|_| redirect("/na"))
}

pub fn ensure_capability(
    user: &AuthenticatedUser,
    entity: PermissionEntity,
    capability: Capability,
) -> Result<Permissions, HttpResponse> {
    services::ensure_capability(user, entity, capability).map_err(|_| redirect("/na"))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;

    use super::*;

    #[test]
    fn redirect_uses_see_other() {
        let response = redirect("/contacts?page=2");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/contacts?page=2"
        );
    }

    #[test]
    fn users_without_the_service_role_go_to_na() {
        let user = AuthenticatedUser {
            roles: vec!["other".to_string()],
            ..AuthenticatedUser::default()
        };

        let response = ensure_viewer(&user).expect_err("not a viewer");

        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/na");
    }

    #[test]
    fn editors_pass_capability_checks() {
        let user = AuthenticatedUser {
            roles: vec!["helix".to_string(), "helix_editor".to_string()],
            ..AuthenticatedUser::default()
        };

        assert!(ensure_capability(&user, PermissionEntity::Contact, Capability::Add).is_ok());
        assert!(ensure_capability(&user, PermissionEntity::Report, Capability::SignOff).is_err());
    }
}

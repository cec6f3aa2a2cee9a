//! Handler plumbing shared by every list page: rendering, the filter round
//! trip and the mutation flows that report back through flash messages.

use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;
use serde::Deserialize;
use tera::Tera;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::export::Export;
use crate::dto::list::{FormPageData, ListPageData};
use crate::forms::ConfirmForm;
use crate::list::controller::{ListController, ListSource, ListState, SubmitOutcome};
use crate::list::filter::ListFilters;
use crate::list::mutation::{Confirmed, EntityForm, FormDraft, MutationKind, MutationResponse};
use crate::list::table::with_query;
use crate::list::{EntityKey, ListEntity};
use crate::models::config::ServerConfig;
use crate::notify::{FlashNotifier, Level, Notifier};
use crate::routes::{base_context, redirect, render_template};
use crate::services::MutationResult;

/// Request pieces every rendered page needs.
pub struct Page<'a> {
    pub tera: &'a Tera,
    pub flash_messages: &'a IncomingFlashMessages,
    pub user: &'a AuthenticatedUser,
    pub config: &'a ServerConfig,
    pub current_page: &'static str,
}

impl Page<'_> {
    pub fn list(&self, data: &ListPageData) -> HttpResponse {
        let mut context = base_context(
            self.flash_messages,
            self.user,
            self.current_page,
            &self.config.auth_service_url,
        );
        context.insert("page", data);
        render_template(self.tera, "list.html", &context)
    }

    pub fn form(&self, data: &FormPageData) -> HttpResponse {
        let mut context = base_context(
            self.flash_messages,
            self.user,
            self.current_page,
            &self.config.auth_service_url,
        );
        context.insert("page", data);
        render_template(self.tera, "form.html", &context)
    }
}

/// URL of the list as `controller` currently shows it.
pub fn list_url<E: ListEntity, F: ListFilters>(
    controller: &ListController<'_, E, F>,
    base: &str,
) -> String {
    with_query(base, &controller.variables().to_query())
}

#[derive(Debug, Default, Deserialize)]
struct AppliedQuery {
    #[serde(default)]
    applied: String,
}

/// Splits a submitted filter form into the query of the list it was edited
/// on and the draft itself.
pub fn filter_submission<F: ListFilters>(raw: &str) -> (String, F) {
    let applied = serde_html_form::from_str::<AppliedQuery>(raw)
        .map(|query| query.applied)
        .unwrap_or_default();
    let draft = serde_html_form::from_str::<F>(raw).unwrap_or_else(|err| {
        log::warn!("Malformed filter draft: {err}");
        F::default()
    });
    (applied, draft)
}

/// Applies a submitted draft. A valid draft redirects to the first page of
/// the filtered list, an invalid one renders the list again with its errors.
pub fn apply_filter<'c, E, F, R>(
    controller: ListController<'c, E, F>,
    raw: &str,
    base: &str,
    render: R,
) -> HttpResponse
where
    E: ListEntity,
    F: ListFilters,
    R: FnOnce(&ListController<'c, E, F>) -> HttpResponse,
{
    let (applied, draft) = filter_submission::<F>(raw);
    let mut controller = controller.restore(&applied);
    controller.set_draft(draft);
    match controller.apply_filters() {
        Ok(()) => redirect(&list_url(&controller, base)),
        Err(errors) => {
            log::debug!("Filter draft rejected: {errors:?}");
            render(&controller)
        }
    }
}

pub fn reset_filters<E, F>(mut controller: ListController<'_, E, F>, base: &str) -> HttpResponse
where
    E: ListEntity,
    F: ListFilters,
{
    controller.reset_filters();
    redirect(&list_url(&controller, base))
}

/// Refetches the current page, bypassing the cache.
pub fn refresh<E, F, S>(controller: &ListController<'_, E, F>, source: &S, base: &str) -> HttpResponse
where
    E: ListEntity,
    F: ListFilters,
    S: ListSource<E, F> + ?Sized,
{
    if let ListState::Failed(message) = controller.refetch(source) {
        FlashNotifier.notify(Level::Error, &message);
    }
    redirect(&list_url(controller, base))
}

/// Create/update submission. Saving returns to the list. Any other outcome
/// renders the form again with the submitted values, so a draft refused
/// while another request runs is not lost.
pub fn submit<E, F, D, M, R>(
    controller: &ListController<'_, E, F>,
    draft: D,
    kind: MutationKind,
    back: &str,
    mutate: M,
    render_form: R,
) -> HttpResponse
where
    E: ListEntity,
    F: ListFilters,
    D: FormDraft,
    M: FnOnce(&D) -> MutationResult<E>,
    R: FnOnce(&EntityForm<D>) -> HttpResponse,
{
    let mut form = EntityForm::edited(draft);
    match controller.submit(&mut form, kind, &FlashNotifier, mutate) {
        SubmitOutcome::Saved(_) => redirect(back),
        SubmitOutcome::Busy => {
            form.fail("Another request is still running. Submit again once it finishes.");
            render_form(&form)
        }
        SubmitOutcome::Invalid | SubmitOutcome::Rejected | SubmitOutcome::Failed => {
            render_form(&form)
        }
    }
}

/// Deletes one row once the user confirmed it.
pub fn delete<E, F, M>(
    controller: &ListController<'_, E, F>,
    key: EntityKey,
    confirm: &ConfirmForm,
    back: &str,
    mutate: M,
) -> HttpResponse
where
    E: ListEntity,
    F: ListFilters,
    M: FnOnce(EntityKey) -> MutationResult<EntityKey>,
{
    match Confirmed::from_flag(confirm.confirm) {
        Some(confirmed) => {
            controller.delete(key, confirmed, &FlashNotifier, mutate);
        }
        None => FlashNotifier.notify(Level::Warning, "Deletion was not confirmed."),
    }
    redirect(back)
}

/// Reports the outcome of an export request and returns to the list.
pub fn export(response: MutationResult<Export>, back: &str) -> HttpResponse {
    match response {
        Ok(MutationResponse {
            result: Some(export),
            errors,
        }) if errors.is_empty() => {
            log::info!("Queued {} export {}", export.export_type, export.public_id);
            FlashNotifier.notify(Level::Success, "Export queued.");
        }
        Ok(MutationResponse { errors, .. }) => {
            let details = errors
                .iter()
                .flat_map(|e| e.messages.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            FlashNotifier.notify(Level::Error, &format!("Export was not queued. {details}"));
        }
        Err(err) => FlashNotifier.notify(Level::Error, &format!("Export failed: {err}")),
    }
    redirect(back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventFilter;

    #[test]
    fn filter_submission_separates_the_applied_query() {
        let raw = "applied=page%3D3%26pageSize%3D10&search=flood&crisis_types=conflict&crisis_types=disaster";

        let (applied, draft) = filter_submission::<EventFilter>(raw);

        assert_eq!(applied, "page=3&pageSize=10");
        assert_eq!(draft.search, "flood");
        assert_eq!(draft.crisis_types, vec!["conflict", "disaster"]);
    }

    #[test]
    fn filter_submission_without_applied_query_starts_fresh() {
        let (applied, draft) = filter_submission::<EventFilter>("search=storm");

        assert!(applied.is_empty());
        assert_eq!(draft.search, "storm");
    }
}

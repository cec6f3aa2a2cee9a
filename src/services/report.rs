//! Reports and their sign-off.

use chrono::Utc;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::report::{NewReport, Report, ReportFilter, ReportSignOff};
use crate::domain::types::ReportId;
use crate::forms::report::ReportForm;
use crate::list::mutation::TransportError;
use crate::list::table::{ActionColumn, ActionKind, Cell, Column, Table};
use crate::list::variables::QueryVariables;
use crate::list::{EntityKey, ListResult};
use crate::permissions::{Capability, PermissionEntity, Permissions};
use crate::repository::{ReportReader, ReportWriter};
use crate::services::list::fetch_page;
use crate::services::{
    MutationResult, ServiceError, ServiceResult, forbidden, rejected_form, respond, unknown,
};

fn edit_href(report: &Report) -> String {
    format!("/reports/{}", report.id)
}

fn delete_href(report: &Report) -> String {
    format!("/reports/{}/delete", report.id)
}

fn sign_off_href(report: &Report) -> String {
    format!("/reports/{}/sign-off", report.id)
}

fn status(report: &Report) -> Cell {
    if report.is_signed_off {
        let by = report.signed_off_by.as_deref().unwrap_or("unknown");
        Cell::status(format!("Signed off by {by}"), "success")
    } else {
        Cell::status("Pending", "warning")
    }
}

pub fn reports_table(permissions: &Permissions) -> Table<Report> {
    let flags = permissions.flags(PermissionEntity::Report);
    Table::new(
        vec![
            Column::new("name", "Name", |r: &Report| Cell::text(r.name.as_str())),
            Column::new("event", "Event", |r: &Report| match r.event_id {
                Some(id) => Cell::link(format!("#{id}"), format!("/reports?event_id={id}")),
                None => Cell::optional(None),
            }),
            Column::new("status", "Status", status),
            Column::new("created_at", "Created", |r: &Report| {
                Cell::timestamp(r.created_at)
            }),
        ],
        ActionColumn::new()
            .with(ActionKind::Edit, flags.change, Some(edit_href))
            .with(ActionKind::SignOff, flags.sign_off, Some(sign_off_href))
            .with(ActionKind::Delete, flags.delete, Some(delete_href)),
    )
}

pub fn list_reports<R>(
    repo: &R,
    variables: &QueryVariables<ReportFilter>,
) -> Result<ListResult<Report>, TransportError>
where
    R: ReportReader + ?Sized,
{
    fetch_page(variables, |query| repo.list_reports(query))
}

pub fn get_report<R>(repo: &R, report_id: i32) -> ServiceResult<Report>
where
    R: ReportReader + ?Sized,
{
    let id = ReportId::new(report_id)?;
    repo.get_report_by_id(id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

pub fn create_report<R>(repo: &R, permissions: &Permissions, form: &ReportForm) -> MutationResult<Report>
where
    R: ReportWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Report, Capability::Add) {
        return Ok(refused);
    }
    let report = match NewReport::try_from(form) {
        Ok(report) => report,
        Err(err) => return Ok(rejected_form(&err)),
    };
    respond(repo.create_report(&report), None)
}

pub fn update_report<R>(
    repo: &R,
    permissions: &Permissions,
    report_id: i32,
    form: &ReportForm,
) -> MutationResult<Report>
where
    R: ReportWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Report, Capability::Change) {
        return Ok(refused);
    }
    let Ok(id) = ReportId::new(report_id) else {
        return Ok(unknown("report"));
    };
    let report = match NewReport::try_from(form) {
        Ok(report) => report,
        Err(err) => return Ok(rejected_form(&err)),
    };
    respond(repo.update_report(id, &report), None)
}

/// Signs a report off in the name of `user`. A report is signed off once.
pub fn sign_off_report<R>(
    repo: &R,
    permissions: &Permissions,
    user: &AuthenticatedUser,
    key: EntityKey,
) -> MutationResult<Report>
where
    R: ReportWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Report, Capability::SignOff) {
        return Ok(refused);
    }
    let Ok(id) = ReportId::new(key.get()) else {
        return Ok(unknown("report"));
    };
    let sign_off = ReportSignOff {
        signed_off_by: user.email.clone(),
        signed_off_at: Utc::now().naive_utc(),
    };
    log::info!("Report {id} signed off by {}", user.email);
    respond(repo.sign_off_report(id, &sign_off), None)
}

pub fn delete_report<R>(
    repo: &R,
    permissions: &Permissions,
    key: EntityKey,
) -> MutationResult<EntityKey>
where
    R: ReportWriter + ?Sized,
{
    if let Some(refused) = forbidden(permissions, PermissionEntity::Report, Capability::Delete) {
        return Ok(refused);
    }
    let Ok(id) = ReportId::new(key.get()) else {
        return Ok(unknown("report"));
    };
    respond(repo.delete_report(id).map(|()| key), None)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    fn admin() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".to_string(),
            email: "lead@example.org".to_string(),
            name: "Lead".to_string(),
            roles: vec![crate::SERVICE_ADMIN_ROLE.to_string()],
            exp: 0,
        }
    }

    #[test]
    fn sign_off_records_the_signer() {
        let mut repo = MockRepository::new();
        repo.expect_sign_off_report()
            .withf(|id, sign_off| id.get() == 5 && sign_off.signed_off_by == "lead@example.org")
            .times(1)
            .returning(|_, _| Err(RepositoryError::ConstraintViolation("already signed off".into())));
        let user = admin();

        let response = sign_off_report(
            &repo,
            &Permissions::for_user(&user),
            &user,
            EntityKey::new(5),
        )
        .expect("response");

        assert!(response.result.is_none());
        assert_eq!(response.errors.len(), 1);
    }

    #[test]
    fn editors_cannot_sign_off() {
        let mut repo = MockRepository::new();
        repo.expect_sign_off_report().times(0);
        let editor = AuthenticatedUser {
            roles: vec![crate::SERVICE_EDITOR_ROLE.to_string()],
            ..admin()
        };

        let response = sign_off_report(
            &repo,
            &Permissions::for_user(&editor),
            &editor,
            EntityKey::new(5),
        )
        .expect("response");

        assert!(!response.is_ok());
        assert!(
            !reports_table(&Permissions::for_user(&editor))
                .actions()
                .kinds()
                .contains(&ActionKind::SignOff)
        );
    }
}

use diesel::prelude::*;

use crate::domain::export::{Export, NewExport};
use crate::models::export::{Export as DbExport, NewExport as DbNewExport};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, ExportWriter};
use crate::schema::exports;

impl ExportWriter for DieselRepository {
    fn create_export(&self, export: &NewExport) -> RepositoryResult<Export> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(exports::table)
            .values(&DbNewExport::from(export))
            .get_result::<DbExport>(&mut conn)?;

        log::info!(
            "Queued {} export {} for {}",
            export.export_type,
            export.public_id,
            export.requested_by
        );
        Ok(Export::try_from(created)?)
    }
}

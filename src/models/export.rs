use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::export::{Export as DomainExport, ExportStatus, NewExport as DomainNewExport};
use crate::domain::types::{ExportId, PublicId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::exports)]
pub struct Export {
    pub id: i32,
    pub public_id: String,
    pub export_type: String,
    pub filters: String,
    pub status: String,
    pub requested_by: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::exports)]
pub struct NewExport<'a> {
    pub public_id: String,
    pub export_type: &'a str,
    pub filters: String,
    pub status: &'static str,
    pub requested_by: &'a str,
}

impl TryFrom<Export> for DomainExport {
    type Error = TypeConstraintError;

    fn try_from(row: Export) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ExportId::try_from(row.id)?,
            public_id: row.public_id.parse::<PublicId>()?,
            export_type: row.export_type,
            filters: serde_json::from_str(&row.filters)
                .map_err(|e| TypeConstraintError::InvalidValue(format!("export filters: {e}")))?,
            status: ExportStatus::try_from(row.status.as_str())?,
            requested_by: row.requested_by,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewExport> for NewExport<'a> {
    fn from(value: &'a DomainNewExport) -> Self {
        Self {
            public_id: value.public_id.to_string(),
            export_type: value.export_type.as_str(),
            filters: value.filters.to_string(),
            status: ExportStatus::Queued.as_str(),
            requested_by: value.requested_by.as_str(),
        }
    }
}

use std::fmt::Display;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::types::{ExportId, PublicId, TypeConstraintError};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Queued,
    Running,
    Finished,
    Failed,
}

impl ExportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportStatus::Queued => "queued",
            ExportStatus::Running => "running",
            ExportStatus::Finished => "finished",
            ExportStatus::Failed => "failed",
        }
    }
}

impl Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ExportStatus {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "queued" => Ok(ExportStatus::Queued),
            "running" => Ok(ExportStatus::Running),
            "finished" => Ok(ExportStatus::Finished),
            "failed" => Ok(ExportStatus::Failed),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown export status {other}"
            ))),
        }
    }
}

/// Export job. Only the enqueue is handled here; a separate worker picks
/// queued jobs up.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Export {
    pub id: ExportId,
    pub public_id: PublicId,
    /// Name of the list the export was requested from.
    pub export_type: String,
    /// Filters applied to that list, as sent in its query variables.
    pub filters: Value,
    pub status: ExportStatus,
    pub requested_by: String,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewExport {
    pub public_id: PublicId,
    pub export_type: String,
    pub filters: Value,
    pub requested_by: String,
}

use chrono::NaiveDate;
use diesel::prelude::*;

use crate::domain::api_usage::{ApiUsage as DomainApiUsage, ApiUsageHit};
use crate::domain::types::{ApiType, ApiUsageId, ClientCode, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::api_usage)]
pub struct ApiUsage {
    pub id: i32,
    pub client_code: String,
    pub api_type: String,
    pub requests: i64,
    pub usage_date: NaiveDate,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::api_usage)]
pub struct NewApiUsage<'a> {
    pub client_code: &'a str,
    pub api_type: &'a str,
    pub requests: i64,
    pub usage_date: NaiveDate,
}

impl TryFrom<ApiUsage> for DomainApiUsage {
    type Error = TypeConstraintError;

    fn try_from(row: ApiUsage) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ApiUsageId::try_from(row.id)?,
            client_code: ClientCode::new(row.client_code)?,
            api_type: ApiType::new(row.api_type)?,
            requests: row.requests,
            usage_date: row.usage_date,
        })
    }
}

impl<'a> From<&'a ApiUsageHit> for NewApiUsage<'a> {
    fn from(hit: &'a ApiUsageHit) -> Self {
        Self {
            client_code: hit.client_code.as_str(),
            api_type: hit.api_type.as_str(),
            requests: 1,
            usage_date: hit.usage_date,
        }
    }
}

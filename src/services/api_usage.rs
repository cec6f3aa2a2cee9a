use crate::domain::api_usage::{ApiUsage, ApiUsageFilter};
use crate::list::ListResult;
use crate::list::mutation::TransportError;
use crate::list::table::{ActionColumn, Cell, Column, Table};
use crate::list::variables::QueryVariables;
use crate::repository::ApiUsageReader;
use crate::services::list::fetch_page;

/// Read-only table of API usage counters.
pub fn api_usage_table() -> Table<ApiUsage> {
    Table::new(
        vec![
            Column::new("usage_date", "Date", |u: &ApiUsage| Cell::date(u.usage_date)),
            Column::new("client_code", "Client", |u: &ApiUsage| {
                Cell::text(u.client_code.as_str())
            }),
            Column::new("api_type", "API", |u: &ApiUsage| Cell::text(u.api_type.as_str())),
            Column::new("requests", "Requests", |u: &ApiUsage| Cell::number(u.requests)),
        ],
        ActionColumn::new(),
    )
}

pub fn list_api_usage<R>(
    repo: &R,
    variables: &QueryVariables<ApiUsageFilter>,
) -> Result<ListResult<ApiUsage>, TransportError>
where
    R: ApiUsageReader + ?Sized,
{
    fetch_page(variables, |query| repo.list_api_usage(query))
}

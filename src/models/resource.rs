use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::resource::{NewResource as DomainNewResource, Resource as DomainResource};
use crate::domain::types::{CountryCode, ResourceId, ResourceName, ResourceUrl, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::resources)]
pub struct Resource {
    pub id: i32,
    pub name: String,
    pub url: String,
    pub group_name: Option<String>,
    /// Comma separated country codes.
    pub countries: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::resources)]
#[diesel(treat_none_as_null = true)]
pub struct NewResource<'a> {
    pub name: &'a str,
    pub url: &'a str,
    pub group_name: Option<&'a str>,
    pub countries: String,
}

pub fn join_countries(countries: &[CountryCode]) -> String {
    countries
        .iter()
        .map(CountryCode::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn split_countries(raw: &str) -> Result<Vec<CountryCode>, TypeConstraintError> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(CountryCode::new)
        .collect()
}

impl TryFrom<Resource> for DomainResource {
    type Error = TypeConstraintError;

    fn try_from(row: Resource) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ResourceId::try_from(row.id)?,
            name: ResourceName::new(row.name)?,
            url: ResourceUrl::new(row.url)?,
            group: row.group_name.filter(|g| !g.trim().is_empty()),
            countries: split_countries(&row.countries)?,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewResource> for NewResource<'a> {
    fn from(value: &'a DomainNewResource) -> Self {
        Self {
            name: value.name.as_str(),
            url: value.url.as_str(),
            group_name: value.group.as_deref(),
            countries: join_countries(&value.countries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countries_column_skips_blank_entries() {
        let codes = split_countries("NG, ,td,").expect("valid codes");

        assert_eq!(join_countries(&codes), "NG,TD");
        assert!(split_countries("N1").is_err());
    }
}

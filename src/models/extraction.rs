use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::event::EventFilter;
use crate::domain::extraction::{
    ExtractionQuery as DomainExtractionQuery, NewExtractionQuery as DomainNewExtractionQuery,
};
use crate::domain::types::{ExtractionQueryId, QueryName, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::extraction_queries)]
pub struct ExtractionQuery {
    pub id: i32,
    pub name: String,
    /// JSON encoded [`EventFilter`].
    pub filters: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::extraction_queries)]
pub struct NewExtractionQuery<'a> {
    pub name: &'a str,
    pub filters: String,
}

impl TryFrom<ExtractionQuery> for DomainExtractionQuery {
    type Error = TypeConstraintError;

    fn try_from(row: ExtractionQuery) -> Result<Self, Self::Error> {
        let filters: EventFilter = serde_json::from_str(&row.filters)
            .map_err(|e| TypeConstraintError::InvalidValue(format!("saved filters: {e}")))?;
        Ok(Self {
            id: ExtractionQueryId::try_from(row.id)?,
            name: QueryName::new(row.name)?,
            filters,
            created_at: row.created_at,
        })
    }
}

impl<'a> TryFrom<&'a DomainNewExtractionQuery> for NewExtractionQuery<'a> {
    type Error = TypeConstraintError;

    fn try_from(value: &'a DomainNewExtractionQuery) -> Result<Self, Self::Error> {
        let filters = serde_json::to_string(&value.filters)
            .map_err(|e| TypeConstraintError::InvalidValue(format!("saved filters: {e}")))?;
        Ok(Self {
            name: value.name.as_str(),
            filters,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn saved_filters_survive_storage() {
        let filters = EventFilter {
            crisis_types: vec!["conflict".to_string()],
            violence_subtypes: vec!["armed_conflict".to_string()],
            countries: vec!["SD".to_string()],
            ..EventFilter::default()
        };
        let new = DomainNewExtractionQuery {
            name: QueryName::new("Sudan conflict").expect("name"),
            filters: filters.clone(),
        };
        let insertable = NewExtractionQuery::try_from(&new).expect("serializable");

        let row = ExtractionQuery {
            id: 1,
            name: insertable.name.to_string(),
            filters: insertable.filters,
            created_at: Utc::now().naive_utc(),
        };
        let stored = DomainExtractionQuery::try_from(row).expect("valid row");

        assert_eq!(stored.filters, filters);
    }

    #[test]
    fn unreadable_filters_are_a_constraint_error() {
        let row = ExtractionQuery {
            id: 1,
            name: "broken".to_string(),
            filters: "{not json".to_string(),
            created_at: Utc::now().naive_utc(),
        };

        assert!(matches!(
            DomainExtractionQuery::try_from(row),
            Err(TypeConstraintError::InvalidValue(_))
        ));
    }
}

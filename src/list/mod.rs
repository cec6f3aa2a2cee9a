//! Generic list-state core shared by every table in the dashboard.
//!
//! A list page is described by a static [`ListSpec`], driven by a
//! [`controller::ListController`] that owns paging, sorting and filter state,
//! and backed by the shared [`cache::QueryCache`] whose slots are keyed by the
//! exact [`variables::QueryVariables`] of the request that produced them.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub mod cache;
pub mod controller;
pub mod filter;
pub mod mutation;
pub mod table;
pub mod variables;

pub use cache::{CachePatch, InsertAt, PatchOutcome, QueryCache};
pub use controller::{ListController, ListSource, ListState};
pub use filter::{FilterForm, ListFilters};
pub use mutation::{FieldError, FormErrors, MutationResponse, TransportError};
pub use variables::{Direction, Ordering, QueryVariables};

/// Opaque identifier of a list row, used as the row key and the cache-patch pivot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey(i32);

impl EntityKey {
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record that can be shown as a row of a list.
pub trait ListEntity: Clone + Send + Sync + 'static {
    fn key(&self) -> EntityKey;
}

/// Identity of a list query. Two lists never share cache slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueryId(&'static str);

impl QueryId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for QueryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Static description of one list instantiation.
#[derive(Clone, Copy, Debug)]
pub struct ListSpec {
    pub query: QueryId,
    /// Human readable entity label used in notifications.
    pub label: &'static str,
    pub default_page_size: usize,
    /// Wire form of the default ordering (`name` or `-name`), empty for none.
    pub default_ordering: &'static str,
    /// Field names accepted as ordering keys.
    pub sortable: &'static [&'static str],
}

impl ListSpec {
    pub fn is_sortable(&self, name: &str) -> bool {
        self.sortable.contains(&name)
    }

    pub fn default_ordering(&self) -> Option<Ordering> {
        Ordering::parse(self.default_ordering).filter(|o| self.is_sortable(&o.name))
    }
}

/// One page of a list query.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<E> {
    pub results: Vec<E>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<E> ListResult<E> {
    pub fn new(results: Vec<E>, total_count: usize, page: usize, page_size: usize) -> Self {
        Self {
            results,
            total_count,
            page,
            page_size,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size.max(1))
    }

    pub fn map<T, M: FnMut(E) -> T>(self, f: M) -> ListResult<T> {
        ListResult {
            results: self.results.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

impl<E: ListEntity> ListResult<E> {
    pub fn contains(&self, key: EntityKey) -> bool {
        self.results.iter().any(|row| row.key() == key)
    }

    pub fn find(&self, key: EntityKey) -> Option<&E> {
        self.results.iter().find(|row| row.key() == key)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal entity and filter used by the list-core unit tests.

    use serde::{Deserialize, Serialize};

    use super::filter::{FieldValue, FilterField, InputKind, ListFilters, Rule, RuleSet};
    use super::{EntityKey, ListEntity, ListSpec, QueryId};

    #[derive(Clone, Debug, PartialEq)]
    pub struct Row {
        pub id: i32,
        pub name: String,
    }

    impl Row {
        pub fn new(id: i32, name: &str) -> Self {
            Self {
                id,
                name: name.to_string(),
            }
        }
    }

    impl ListEntity for Row {
        fn key(&self) -> EntityKey {
            EntityKey::new(self.id)
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct RowFilter {
        pub name: String,
        pub email: String,
        pub kind: Vec<String>,
        pub owner: Option<i32>,
    }

    impl ListFilters for RowFilter {
        const FIELDS: &'static [FilterField] = &[
            FilterField::new("name", "Name", InputKind::Text),
            FilterField::new("email", "Email", InputKind::Text),
        ];

        fn value(&self, field: &str) -> FieldValue<'_> {
            match field {
                "name" => FieldValue::Text(&self.name),
                "email" => FieldValue::Text(&self.email),
                "kind" => FieldValue::List(&self.kind),
                _ => FieldValue::Absent,
            }
        }

        fn rules(&self) -> RuleSet {
            RuleSet::new()
                .field("email", Rule::Email)
                .when(self.kind.iter().any(|k| k == "special"), "name", Rule::Required)
        }

        fn query_pairs(&self) -> Vec<(&'static str, String)> {
            let mut pairs = Vec::new();
            if !self.name.is_empty() {
                pairs.push(("name", self.name.clone()));
            }
            if !self.email.is_empty() {
                pairs.push(("email", self.email.clone()));
            }
            pairs.extend(self.kind.iter().map(|k| ("kind", k.clone())));
            if let Some(owner) = self.owner {
                pairs.push(("owner", owner.to_string()));
            }
            pairs
        }

        fn purged(&self) -> Self {
            Self {
                name: self.name.trim().to_string(),
                email: self.email.trim().to_string(),
                kind: super::filter::purge_list(&self.kind),
                owner: self.owner,
            }
        }

        fn overlay(&mut self, fixed: &Self) {
            if fixed.owner.is_some() {
                self.owner = fixed.owner;
            }
        }
    }

    pub const ROWS: ListSpec = ListSpec {
        query: QueryId::new("rows"),
        label: "Row",
        default_page_size: 10,
        default_ordering: "-created_at",
        sortable: &["name", "created_at"],
    };
}

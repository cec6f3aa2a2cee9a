//! Query variables: the key identifying which page of which filtered and
//! sorted list is displayed.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::list::ListSpec;
use crate::list::filter::ListFilters;

/// Page sizes a user may pick from.
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

/// Highest page number a list accepts. Larger requests are clamped.
pub const MAX_PAGE: usize = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }
}

/// Sort key of a list. Encoded on the wire as `name` when ascending and
/// `-name` when descending.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ordering {
    pub name: String,
    pub direction: Direction,
}

impl Ordering {
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Desc,
        }
    }

    /// Parses the wire form. Returns `None` for empty input or a bare `-`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (name, direction) = match raw.strip_prefix('-') {
            Some(rest) => (rest, Direction::Desc),
            None => (raw, Direction::Asc),
        };
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            direction,
        })
    }

    pub fn as_param(&self) -> String {
        match self.direction {
            Direction::Asc => self.name.clone(),
            Direction::Desc => format!("-{}", self.name),
        }
    }
}

impl Display for Ordering {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_param())
    }
}

#[derive(Debug, Default, Deserialize)]
struct PagingParams {
    ordering: Option<String>,
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

/// `{ ordering, page, pageSize, ...filters }`.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryVariables<F> {
    pub ordering: Option<Ordering>,
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
    pub filters: F,
}

impl<F: ListFilters> QueryVariables<F> {
    /// Variables of a freshly mounted list.
    pub fn initial(spec: &ListSpec, filters: F) -> Self {
        Self {
            ordering: spec.default_ordering(),
            page: 1,
            page_size: spec.default_page_size,
            filters,
        }
    }

    /// Reads variables from a raw URL query string.
    ///
    /// Malformed paging values and orderings on undeclared fields fall back
    /// to the `ListSpec` defaults, so whatever comes out of here is safe to hand to
    /// a repository.
    pub fn from_query(spec: &ListSpec, raw: &str) -> Self {
        let paging: PagingParams = serde_html_form::from_str(raw).unwrap_or_else(|err| {
            log::warn!("Ignoring malformed paging parameters for {}: {err}", spec.query);
            PagingParams::default()
        });
        let filters: F = serde_html_form::from_str(raw).unwrap_or_else(|err| {
            log::warn!("Ignoring malformed filters for {}: {err}", spec.query);
            F::default()
        });

        // An explicit empty ordering means unsorted; a name the `ListSpec` does not
        // declare sortable falls back to the default.
        let ordering = match paging.ordering.as_deref().map(str::trim) {
            Some("") => None,
            Some(raw) => match Ordering::parse(raw) {
                Some(o) if spec.is_sortable(&o.name) => Some(o),
                _ => spec.default_ordering(),
            },
            None => spec.default_ordering(),
        };
        let page = paging
            .page
            .and_then(|p| p.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_PAGE);
        let page_size = paging
            .page_size
            .and_then(|p| p.trim().parse::<usize>().ok())
            .filter(|size| PAGE_SIZES.contains(size) || *size == spec.default_page_size)
            .unwrap_or(spec.default_page_size);

        Self {
            ordering,
            page,
            page_size,
            filters,
        }
    }

    /// Ordered key/value pairs of these variables.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        // An explicit empty ordering keeps "unsorted" distinct from "default".
        pairs.push((
            "ordering",
            self.ordering
                .as_ref()
                .map(Ordering::as_param)
                .unwrap_or_default(),
        ));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("pageSize", self.page_size.to_string()));
        pairs.extend(self.filters.query_pairs());
        pairs
    }

    /// URL query string encoding of these variables.
    pub fn to_query(&self) -> String {
        encode_pairs(&self.pairs())
    }

    /// Canonical cache key. Identical variables always produce identical keys.
    pub fn cache_key(&self) -> String {
        self.to_query()
    }
}

/// Percent-encodes key/value pairs as an `application/x-www-form-urlencoded` string.
pub fn encode_pairs(pairs: &[(&'static str, String)]) -> String {
    serde_html_form::to_string(pairs).unwrap_or_else(|err| {
        log::error!("Failed to encode query pairs: {err}");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::testing::{ROWS, RowFilter};

    #[test]
    fn ordering_wire_form_follows_direction() {
        assert_eq!(Ordering::asc("name").as_param(), "name");
        assert_eq!(Ordering::desc("name").as_param(), "-name");
        assert_eq!(Ordering::parse("-date"), Some(Ordering::desc("date")));
        assert_eq!(Ordering::parse("date"), Some(Ordering::asc("date")));
        assert_eq!(Ordering::parse("-"), None);
        assert_eq!(Ordering::parse(""), None);
    }

    #[test]
    fn from_query_reads_paging_and_filters() {
        let vars: QueryVariables<RowFilter> =
            QueryVariables::from_query(&ROWS, "ordering=-name&page=3&pageSize=25&name=abc&kind=a&kind=b");

        assert_eq!(vars.ordering, Some(Ordering::desc("name")));
        assert_eq!(vars.page, 3);
        assert_eq!(vars.page_size, 25);
        assert_eq!(vars.filters.name, "abc");
        assert_eq!(vars.filters.kind, vec!["a", "b"]);
    }

    #[test]
    fn from_query_falls_back_to_defaults() {
        let vars: QueryVariables<RowFilter> =
            QueryVariables::from_query(&ROWS, "ordering=password&page=zero&pageSize=7");

        assert_eq!(vars.ordering, Some(Ordering::desc("created_at")));
        assert_eq!(vars.page, 1);
        assert_eq!(vars.page_size, ROWS.default_page_size);

        let vars: QueryVariables<RowFilter> = QueryVariables::from_query(&ROWS, "");
        assert_eq!(vars.ordering, Some(Ordering::desc("created_at")));

        let vars: QueryVariables<RowFilter> = QueryVariables::from_query(&ROWS, "ordering=");
        assert_eq!(vars.ordering, None);
    }

    #[test]
    fn from_query_caps_huge_pages() {
        let vars: QueryVariables<RowFilter> =
            QueryVariables::from_query(&ROWS, "page=18446744073709551615");
        assert_eq!(vars.page, MAX_PAGE);

        let vars: QueryVariables<RowFilter> =
            QueryVariables::from_query(&ROWS, "page=99999999999999999999999");
        assert_eq!(vars.page, 1);
    }

    #[test]
    fn query_string_survives_a_round_trip() {
        let vars = QueryVariables {
            ordering: Some(Ordering::asc("name")),
            page: 2,
            page_size: 50,
            filters: RowFilter {
                name: "a b&c".to_string(),
                kind: vec!["x".to_string()],
                ..RowFilter::default()
            },
        };

        let parsed: QueryVariables<RowFilter> = QueryVariables::from_query(&ROWS, &vars.to_query());

        assert_eq!(parsed, vars);
    }

    #[test]
    fn cache_key_distinguishes_pages() {
        let first = QueryVariables::initial(&ROWS, RowFilter::default());
        let mut second = first.clone();
        second.page = 2;

        assert_ne!(first.cache_key(), second.cache_key());
        assert_eq!(first.cache_key(), first.clone().cache_key());
    }
}

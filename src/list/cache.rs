//! Query cache keyed by exact query variables, and the generic patcher that
//! keeps a cached page consistent with the outcome of a mutation.
//!
//! Patching is best effort: a slot that was never fetched is left alone and
//! an explicit refetch is the fallback correctness mechanism. Each query keeps
//! a bounded number of pages, least recently used first out.

use std::any::Any;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use lru::LruCache;

use crate::list::filter::ListFilters;
use crate::list::variables::QueryVariables;
use crate::list::{EntityKey, ListEntity, ListResult, QueryId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertAt {
    Front,
    Back,
}

/// Patch operation applied to a cached page.
#[derive(Clone, Debug, PartialEq)]
pub enum CachePatch<E> {
    Insert(E, InsertAt),
    Replace(E),
    Remove(EntityKey),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    /// The target slot or row was not present; nothing changed.
    Missed,
}

/// Applies `patch` to one page.
///
/// Insert never duplicates a key: inserting an entity that is already on the
/// page replaces it in place. `total_count` is left as observed.
pub fn apply_patch<E: ListEntity>(page: &mut ListResult<E>, patch: CachePatch<E>) -> PatchOutcome {
    match patch {
        CachePatch::Insert(entity, at) => {
            if let Some(index) = position(page, entity.key()) {
                page.results[index] = entity;
                return PatchOutcome::Applied;
            }
            match at {
                InsertAt::Front => page.results.insert(0, entity),
                InsertAt::Back => page.results.push(entity),
            }
            PatchOutcome::Applied
        }
        CachePatch::Replace(entity) => match position(page, entity.key()) {
            Some(index) => {
                page.results[index] = entity;
                PatchOutcome::Applied
            }
            None => PatchOutcome::Missed,
        },
        CachePatch::Remove(key) => {
            let before = page.results.len();
            page.results.retain(|row| row.key() != key);
            if page.results.len() == before {
                PatchOutcome::Missed
            } else {
                PatchOutcome::Applied
            }
        }
    }
}

fn position<E: ListEntity>(page: &ListResult<E>, key: EntityKey) -> Option<usize> {
    page.results.iter().position(|row| row.key() == key)
}

type Slots<E> = LruCache<String, ListResult<E>>;

/// Pages kept per query unless configured otherwise.
pub const DEFAULT_PAGES_PER_QUERY: usize = 64;

/// Counter of requests in flight for one list and one owner. The list is
/// disabled while the counter is non-zero.
#[derive(Clone, Debug, Default)]
pub struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    pub fn begin(&self) -> InFlightGuard {
        self.0.fetch_add(1, AtomicOrdering::SeqCst);
        InFlightGuard(Arc::clone(&self.0))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(AtomicOrdering::SeqCst) > 0
    }
}

/// Marks a request as finished when dropped.
#[derive(Debug)]
pub struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, AtomicOrdering::SeqCst);
    }
}

/// Shared cache of list pages, one slot per `(query, variables)` pair.
pub struct QueryCache {
    slots: RwLock<HashMap<QueryId, Box<dyn Any + Send + Sync>>>,
    pages_per_query: NonZeroUsize,
    in_flight: Mutex<HashMap<(QueryId, String), InFlight>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_PAGES_PER_QUERY)
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache keeping at most `pages_per_query` pages of every query.
    pub fn with_capacity(pages_per_query: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            pages_per_query: NonZeroUsize::new(pages_per_query).unwrap_or(NonZeroUsize::MIN),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Reading a page marks it as recently used.
    pub fn read<E: ListEntity, F: ListFilters>(
        &self,
        query: QueryId,
        variables: &QueryVariables<F>,
    ) -> Option<ListResult<E>> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots
            .get_mut(&query)?
            .downcast_mut::<Slots<E>>()?
            .get(&variables.cache_key())
            .cloned()
    }

    /// Number of pages currently cached for `query`.
    pub fn cached_pages<E: ListEntity>(&self, query: QueryId) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(&query)
            .and_then(|entry| entry.downcast_ref::<Slots<E>>())
            .map_or(0, LruCache::len)
    }

    pub fn write<E: ListEntity, F: ListFilters>(
        &self,
        query: QueryId,
        variables: &QueryVariables<F>,
        page: ListResult<E>,
    ) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let capacity = self.pages_per_query;
        let entry = slots
            .entry(query)
            .or_insert_with(|| Box::new(Slots::<E>::new(capacity)));
        if !entry.is::<Slots<E>>() {
            log::warn!("Replacing cache slots of {query} holding a different row type");
            *entry = Box::new(Slots::<E>::new(capacity));
        }
        if let Some(typed) = entry.downcast_mut::<Slots<E>>() {
            let key = variables.cache_key();
            let evicted = typed.push(key.clone(), page).filter(|(evicted, _)| *evicted != key);
            if let Some((evicted, _)) = evicted {
                log::debug!("Dropped least recently used page {evicted} of {query}");
            }
        }
    }

    /// Patches the page cached for `variables`. A missing page is a no-op.
    pub fn patch<E: ListEntity, F: ListFilters>(
        &self,
        query: QueryId,
        variables: &QueryVariables<F>,
        patch: CachePatch<E>,
    ) -> PatchOutcome {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let page = slots
            .get_mut(&query)
            .and_then(|entry| entry.downcast_mut::<Slots<E>>())
            .and_then(|typed| typed.get_mut(&variables.cache_key()));
        let outcome = match page {
            Some(page) => apply_patch(page, patch),
            None => PatchOutcome::Missed,
        };
        if outcome == PatchOutcome::Missed {
            log::debug!("Cache patch missed for {query} at {}", variables.cache_key());
        }
        outcome
    }

    /// Drops the page cached for `variables` so the next load refetches it.
    pub fn evict<E: ListEntity, F: ListFilters>(&self, query: QueryId, variables: &QueryVariables<F>) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(typed) = slots
            .get_mut(&query)
            .and_then(|entry| entry.downcast_mut::<Slots<E>>())
        {
            typed.pop(&variables.cache_key());
        }
    }

    /// Drops every cached page of `query` except the one for `variables`.
    ///
    /// After a mutation only the page it was made from can be patched; other
    /// pages may now hold rows in the wrong place or rows that are gone.
    pub fn evict_others<E: ListEntity, F: ListFilters>(
        &self,
        query: QueryId,
        variables: &QueryVariables<F>,
    ) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(typed) = slots
            .get_mut(&query)
            .and_then(|entry| entry.downcast_mut::<Slots<E>>())
        {
            let key = variables.cache_key();
            let kept = typed.pop(&key);
            typed.clear();
            if let Some(page) = kept {
                typed.put(key, page);
            }
        }
    }

    /// Drops every cached page of `query`.
    pub fn evict_query(&self, query: QueryId) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.remove(&query);
    }

    /// In-flight counter shared by the controllers of `query` acting for
    /// `owner`. Other owners never see it.
    pub fn in_flight(&self, query: QueryId, owner: &str) -> InFlight {
        let mut counters = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Idle counters nobody holds are dropped.
        counters.retain(|_, counter| counter.is_busy() || Arc::strong_count(&counter.0) > 1);
        counters
            .entry((query, owner.to_string()))
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::testing::{ROWS, Row, RowFilter};

    fn page(rows: Vec<Row>) -> ListResult<Row> {
        let total = rows.len();
        ListResult::new(rows, total, 1, 10)
    }

    fn vars() -> QueryVariables<RowFilter> {
        QueryVariables::initial(&ROWS, RowFilter::default())
    }

    #[test]
    fn insert_adds_exactly_once() {
        let mut current = page(vec![Row::new(1, "a")]);

        apply_patch(&mut current, CachePatch::Insert(Row::new(2, "b"), InsertAt::Front));
        apply_patch(&mut current, CachePatch::Insert(Row::new(2, "b2"), InsertAt::Back));

        let ids: Vec<i32> = current.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(current.results[0].name, "b2");
        // total_count stays as last observed
        assert_eq!(current.total_count, 1);
    }

    #[test]
    fn replace_keeps_position_and_misses_unknown_rows() {
        let mut current = page(vec![Row::new(1, "a"), Row::new(2, "b"), Row::new(3, "c")]);

        let hit = apply_patch(&mut current, CachePatch::Replace(Row::new(2, "B")));
        let miss = apply_patch(&mut current, CachePatch::Replace(Row::new(9, "z")));

        assert_eq!(hit, PatchOutcome::Applied);
        assert_eq!(miss, PatchOutcome::Missed);
        assert_eq!(current.results[1], Row::new(2, "B"));
        assert_eq!(current.results.len(), 3);
    }

    #[test]
    fn remove_filters_by_key() {
        let mut current = page(vec![Row::new(1, "a"), Row::new(2, "b")]);

        let outcome = apply_patch(&mut current, CachePatch::Remove(EntityKey::new(1)));

        assert_eq!(outcome, PatchOutcome::Applied);
        assert!(!current.contains(EntityKey::new(1)));
        assert!(current.contains(EntityKey::new(2)));
    }

    #[test]
    fn patching_an_unfetched_query_is_a_no_op() {
        let cache = QueryCache::new();

        let outcome = cache.patch(ROWS.query, &vars(), CachePatch::Remove(EntityKey::new(1)));

        assert_eq!(outcome, PatchOutcome::Missed);
        assert!(cache.read::<Row, _>(ROWS.query, &vars()).is_none());
    }

    #[test]
    fn slots_are_keyed_by_exact_variables() {
        let cache = QueryCache::new();
        let first = vars();
        let mut second = vars();
        second.page = 2;
        cache.write(ROWS.query, &first, page(vec![Row::new(1, "a")]));
        cache.write(ROWS.query, &second, page(vec![Row::new(2, "b")]));

        cache.patch(ROWS.query, &second, CachePatch::Remove(EntityKey::new(2)));

        let first_page = cache.read::<Row, _>(ROWS.query, &first).expect("cached");
        let second_page = cache.read::<Row, _>(ROWS.query, &second).expect("cached");
        assert_eq!(first_page.results.len(), 1);
        assert!(second_page.results.is_empty());

        cache.evict::<Row, _>(ROWS.query, &first);
        assert!(cache.read::<Row, _>(ROWS.query, &first).is_none());

        cache.evict_query(ROWS.query);
        assert!(cache.read::<Row, _>(ROWS.query, &second).is_none());
    }

    #[test]
    fn in_flight_counter_is_shared_per_owner() {
        let cache = QueryCache::new();
        let a = cache.in_flight(ROWS.query, "alice");
        let b = cache.in_flight(ROWS.query, "alice");
        let other = cache.in_flight(ROWS.query, "bob");

        let guard = a.begin();
        assert!(b.is_busy());
        assert!(!other.is_busy());
        drop(guard);
        assert!(!b.is_busy());
    }

    #[test]
    fn pages_per_query_are_bounded() {
        let cache = QueryCache::with_capacity(3);
        let mut variables = vars();
        for page_number in 1..=10 {
            variables.page = page_number;
            cache.write(ROWS.query, &variables, page(vec![Row::new(page_number as i32, "a")]));
        }

        assert_eq!(cache.cached_pages::<Row>(ROWS.query), 3);
        variables.page = 1;
        assert!(cache.read::<Row, _>(ROWS.query, &variables).is_none());
        variables.page = 10;
        assert!(cache.read::<Row, _>(ROWS.query, &variables).is_some());
    }

    #[test]
    fn evict_others_keeps_only_the_given_page() {
        let cache = QueryCache::new();
        let first = vars();
        let mut second = vars();
        second.page = 2;
        cache.write(ROWS.query, &first, page(vec![Row::new(1, "a")]));
        cache.write(ROWS.query, &second, page(vec![Row::new(2, "b")]));

        cache.evict_others::<Row, _>(ROWS.query, &first);

        assert!(cache.read::<Row, _>(ROWS.query, &first).is_some());
        assert!(cache.read::<Row, _>(ROWS.query, &second).is_none());
    }
}

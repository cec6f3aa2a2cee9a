//! List controller: paging, sorting and filter state composed into one set
//! of query variables, plus the create/update/delete flows that report back
//! into the query cache.

use std::marker::PhantomData;

use crate::list::cache::{CachePatch, InFlight, InsertAt, PatchOutcome, QueryCache};
use crate::list::filter::{FilterForm, ListFilters};
use crate::list::mutation::{
    Confirmed, EntityForm, FieldError, FormDraft, FormErrors, MutationKind, MutationResponse,
    TransportError,
};
use crate::list::variables::{Direction, MAX_PAGE, Ordering, PAGE_SIZES, QueryVariables};
use crate::list::{EntityKey, ListEntity, ListResult, ListSpec, QueryId};
use crate::notify::{Level, Notifier};

/// Paginated list query.
pub trait ListSource<E, F> {
    fn fetch(&self, variables: &QueryVariables<F>) -> Result<ListResult<E>, TransportError>;
}

impl<E, F, T> ListSource<E, F> for T
where
    T: Fn(&QueryVariables<F>) -> Result<ListResult<E>, TransportError>,
{
    fn fetch(&self, variables: &QueryVariables<F>) -> Result<ListResult<E>, TransportError> {
        self(variables)
    }
}

/// Outcome of loading the current page.
#[derive(Clone, Debug, PartialEq)]
pub enum ListState<E> {
    Ready(ListResult<E>),
    /// Fetch failed; rendered inline instead of the table.
    Failed(String),
}

#[derive(Debug, PartialEq)]
pub enum SubmitOutcome<E> {
    Saved(E),
    /// Client validation failed; nothing was sent.
    Invalid,
    /// The server answered with field errors.
    Rejected,
    /// Transport failure.
    Failed,
    /// Another request for this list is in flight.
    Busy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Rejected,
    Failed,
    Busy,
}

#[derive(Clone)]
pub struct ListController<'c, E, F> {
    cache: &'c QueryCache,
    spec: ListSpec,
    ordering: Option<Ordering>,
    page: usize,
    page_size: usize,
    filter: FilterForm<F>,
    initial: F,
    fixed: Option<F>,
    dependents: Vec<QueryId>,
    in_flight: InFlight,
    _rows: PhantomData<fn() -> E>,
}

impl<'c, E: ListEntity, F: ListFilters> ListController<'c, E, F> {
    /// A freshly mounted list with empty filters.
    pub fn new(cache: &'c QueryCache, spec: ListSpec) -> Self {
        Self {
            cache,
            spec,
            ordering: spec.default_ordering(),
            page: 1,
            page_size: spec.default_page_size,
            filter: FilterForm::new(F::default()),
            initial: F::default(),
            fixed: None,
            dependents: Vec::new(),
            in_flight: InFlight::default(),
            _rows: PhantomData,
        }
    }

    /// Shares the in-flight state with every list of the same query acting
    /// for `owner`. Without an owner the list only blocks itself.
    pub fn owned_by(mut self, owner: &str) -> Self {
        self.in_flight = self.cache.in_flight(self.spec.query, owner);
        self
    }

    /// Other lists showing data this list's mutations change. Their cached
    /// pages are dropped after every successful mutation.
    pub fn invalidates(mut self, queries: &[QueryId]) -> Self {
        self.dependents.extend_from_slice(queries);
        self
    }

    /// Seeds the list with previously saved filters. Reset returns here.
    /// A seed that breaks the filter rules is replaced by empty filters.
    pub fn seeded(mut self, initial: F) -> Self {
        let mut initial = initial.purged();
        let errors = initial.validation_errors();
        if !errors.is_empty() {
            log::warn!("Ignoring invalid saved filters for {}: {errors}", self.spec.query);
            initial = F::default();
        }
        self.filter = FilterForm::new(initial.clone());
        self.initial = initial;
        self
    }

    /// Filters merged into every query and never editable by the user.
    pub fn fixed(mut self, fixed: F) -> Self {
        self.fixed = Some(fixed);
        self
    }

    /// Restores state carried in a URL query string. Every URL the
    /// controller builds carries the paging keys, so an empty query string is
    /// a fresh mount and keeps the seeded state.
    pub fn restore(self, raw_query: &str) -> Self {
        if raw_query.trim().is_empty() {
            return self;
        }
        let variables = QueryVariables::<F>::from_query(&self.spec, raw_query);
        self.restore_variables(variables)
    }

    pub fn restore_variables(mut self, variables: QueryVariables<F>) -> Self {
        self.ordering = variables
            .ordering
            .filter(|o| self.spec.is_sortable(&o.name));
        self.page = variables.page.clamp(1, MAX_PAGE);
        self.page_size = variables.page_size;
        let filters = variables.filters.purged();
        let errors = filters.validation_errors();
        self.filter = if errors.is_empty() {
            FilterForm::new(filters)
        } else {
            log::warn!("Ignoring invalid filters in URL for {}: {errors}", self.spec.query);
            FilterForm::new(self.initial.clone())
        };
        self
    }

    pub fn spec(&self) -> &ListSpec {
        &self.spec
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn sort(&self) -> Option<&Ordering> {
        self.ordering.as_ref()
    }

    /// Wire form of the current ordering.
    pub fn ordering(&self) -> String {
        self.ordering
            .as_ref()
            .map(Ordering::as_param)
            .unwrap_or_default()
    }

    pub fn filter_form(&self) -> &FilterForm<F> {
        &self.filter
    }

    pub fn initial_filters(&self) -> &F {
        &self.initial
    }

    /// True while a query or mutation of this list is in flight for the
    /// same owner.
    pub fn disabled(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// The single live set of variables of this list.
    pub fn variables(&self) -> QueryVariables<F> {
        let mut filters = self.filter.applied().clone();
        if let Some(fixed) = &self.fixed {
            filters.overlay(fixed);
        }
        QueryVariables {
            ordering: self.ordering.clone(),
            page: self.page,
            page_size: self.page_size,
            filters,
        }
    }

    /// Variables the list would have after `change`, leaving this one intact.
    pub fn peek<G: FnOnce(&mut Self)>(&self, change: G) -> QueryVariables<F> {
        let mut next = self.clone();
        change(&mut next);
        next.variables()
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, MAX_PAGE);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        if page_size == 0 {
            return;
        }
        if !PAGE_SIZES.contains(&page_size) && page_size != self.spec.default_page_size {
            log::warn!("Ignoring unsupported page size {page_size} for {}", self.spec.query);
            return;
        }
        self.page_size = page_size;
        self.page = 1;
    }

    /// Unsorted or another column: ascending. Ascending: descending.
    /// Descending: ascending.
    pub fn toggle_sort(&mut self, name: &str) {
        let direction = match &self.ordering {
            Some(current) if current.name == name => current.direction.flipped(),
            _ => Direction::Asc,
        };
        self.set_sort(name, direction);
    }

    pub fn set_sort(&mut self, name: &str, direction: Direction) {
        if !self.spec.is_sortable(name) {
            log::warn!("Ignoring sort on {name} for {}", self.spec.query);
            return;
        }
        self.ordering = Some(Ordering {
            name: name.to_string(),
            direction,
        });
        self.page = 1;
    }

    pub fn set_draft(&mut self, draft: F) {
        self.filter.set_draft(draft);
    }

    /// Applies the filter draft. Only a valid draft replaces the applied
    /// filter, and doing so returns to the first page.
    pub fn apply_filters(&mut self) -> Result<(), FormErrors> {
        match self.filter.apply() {
            Ok(_) => {
                self.page = 1;
                Ok(())
            }
            Err(errors) => Err(errors.clone()),
        }
    }

    /// Restores the filter snapshot captured when the list was mounted.
    pub fn reset_filters(&mut self) {
        self.filter.reset_to(self.initial.clone());
        self.page = 1;
    }

    /// Returns the cached page for the current variables, fetching it on a
    /// miss.
    pub fn load<S: ListSource<E, F> + ?Sized>(&self, source: &S) -> ListState<E> {
        let variables = self.variables();
        if let Some(page) = self.cache.read::<E, F>(self.spec.query, &variables) {
            return ListState::Ready(page);
        }
        let _guard = self.in_flight.begin();
        match source.fetch(&variables) {
            Ok(page) => {
                self.cache.write(self.spec.query, &variables, page.clone());
                ListState::Ready(page)
            }
            Err(err) => {
                log::error!("Failed to load {}: {err}", self.spec.query);
                ListState::Failed(err.to_string())
            }
        }
    }

    /// Drops the cached page for the current variables and fetches it again.
    pub fn refetch<S: ListSource<E, F> + ?Sized>(&self, source: &S) -> ListState<E> {
        self.cache.evict::<E, F>(self.spec.query, &self.variables());
        self.load(source)
    }

    /// Patches the current page and drops every other cached page of the
    /// query; those refetch on their next load.
    fn patch(&self, patch: CachePatch<E>) -> PatchOutcome {
        let variables = self.variables();
        let outcome = self.cache.patch(self.spec.query, &variables, patch);
        self.cache.evict_others::<E, F>(self.spec.query, &variables);
        for query in &self.dependents {
            self.cache.evict_query(*query);
        }
        outcome
    }

    /// Create/update flow. Client validation runs first and an invalid draft
    /// is never sent. On success the cached page is patched and the form is
    /// closed.
    pub fn submit<D, M>(
        &self,
        form: &mut EntityForm<D>,
        kind: MutationKind,
        notifier: &dyn Notifier,
        mutate: M,
    ) -> SubmitOutcome<E>
    where
        D: FormDraft,
        M: FnOnce(&D) -> Result<MutationResponse<E>, TransportError>,
    {
        if self.disabled() {
            notifier.notify(Level::Warning, "Another request is still running.");
            return SubmitOutcome::Busy;
        }
        if !form.validate() {
            return SubmitOutcome::Invalid;
        }

        let response = {
            let _guard = self.in_flight.begin();
            mutate(form.value())
        };

        let label = self.spec.label;
        match response {
            Err(err) => {
                form.fail(err.message());
                notifier.notify(Level::Error, &format!("Failed to save {label}: {err}"));
                SubmitOutcome::Failed
            }
            Ok(MutationResponse { errors, .. }) if !errors.is_empty() => {
                form.absorb_server_errors(errors);
                notifier.notify(Level::Error, &format!("{label} was not saved."));
                SubmitOutcome::Rejected
            }
            Ok(MutationResponse {
                result: Some(entity),
                ..
            }) => {
                let patch = match kind {
                    MutationKind::Create => CachePatch::Insert(entity.clone(), InsertAt::Front),
                    MutationKind::Update => CachePatch::Replace(entity.clone()),
                };
                self.patch(patch);
                form.mark_saved();
                let verb = match kind {
                    MutationKind::Create => "created",
                    MutationKind::Update => "updated",
                };
                notifier.notify(Level::Success, &format!("{label} {verb}."));
                SubmitOutcome::Saved(entity)
            }
            Ok(_) => {
                form.fail("The server returned an empty response.");
                notifier.notify(Level::Error, &format!("Failed to save {label}."));
                SubmitOutcome::Failed
            }
        }
    }

    /// Server-side change of one row outside a form (sign-off and the like).
    /// A successful response replaces the row in the cached page.
    pub fn replace_row<M>(&self, notifier: &dyn Notifier, done: &str, mutate: M) -> SubmitOutcome<E>
    where
        M: FnOnce() -> Result<MutationResponse<E>, TransportError>,
    {
        if self.disabled() {
            notifier.notify(Level::Warning, "Another request is still running.");
            return SubmitOutcome::Busy;
        }

        let response = {
            let _guard = self.in_flight.begin();
            mutate()
        };

        let label = self.spec.label;
        match response {
            Ok(MutationResponse {
                result: Some(entity),
                errors,
            }) if errors.is_empty() => {
                self.patch(CachePatch::Replace(entity.clone()));
                notifier.notify(Level::Success, &format!("{label} {done}."));
                SubmitOutcome::Saved(entity)
            }
            Ok(MutationResponse { errors, .. }) => {
                let details = join_messages(&errors);
                notifier.notify(Level::Error, &format!("{label} was not {done}. {details}"));
                SubmitOutcome::Rejected
            }
            Err(err) => {
                notifier.notify(Level::Error, &format!("{label} was not {done}: {err}"));
                SubmitOutcome::Failed
            }
        }
    }

    /// Delete flow. Requires confirmation; the row is removed from the cached
    /// page only after the server confirms.
    pub fn delete<M>(
        &self,
        key: EntityKey,
        _confirmed: Confirmed,
        notifier: &dyn Notifier,
        mutate: M,
    ) -> DeleteOutcome
    where
        M: FnOnce(EntityKey) -> Result<MutationResponse<EntityKey>, TransportError>,
    {
        if self.disabled() {
            notifier.notify(Level::Warning, "Another request is still running.");
            return DeleteOutcome::Busy;
        }

        let response = {
            let _guard = self.in_flight.begin();
            mutate(key)
        };

        let label = self.spec.label;
        match response {
            Ok(MutationResponse {
                result: Some(deleted),
                errors,
            }) if errors.is_empty() => {
                self.patch(CachePatch::Remove(deleted));
                notifier.notify(Level::Success, &format!("{label} deleted."));
                DeleteOutcome::Deleted
            }
            Ok(MutationResponse { errors, .. }) => {
                let details = join_messages(&errors);
                notifier.notify(Level::Error, &format!("Failed to delete {label}. {details}"));
                DeleteOutcome::Rejected
            }
            Err(err) => {
                notifier.notify(Level::Error, &format!("Failed to delete {label}: {err}"));
                DeleteOutcome::Failed
            }
        }
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .flat_map(|e| e.messages.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

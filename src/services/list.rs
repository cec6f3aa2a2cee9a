//! Shared list page assembly: loading through the controller, filter and
//! form inputs with their option lists, and the table.

use std::collections::HashMap;

use serde::Serialize;

use crate::dto::list::{FilterView, FormPageData, InputView, ListPageData, OptionView};
use crate::forms::FormInputs;
use crate::list::controller::{ListController, ListSource, ListState};
use crate::list::filter::{
    FieldValue, FilterField, InputKind, LazyOptions, ListFilters, OptionsRef, SelectOption,
};
use crate::list::mutation::{EntityForm, FormDraft, FormErrors, INTERNAL_FIELD, TransportError};
use crate::list::table::{Table, with_query};
use crate::list::variables::QueryVariables;
use crate::list::{ListEntity, ListResult};
use crate::permissions::CapabilityFlags;
use crate::repository::errors::RepositoryResult;
use crate::repository::{ContactReader, EventReader, ListQuery, Listed, ResourceReader};

/// Loads enumerated option lists by key.
pub trait OptionsSource {
    fn load_options(&self, key: &str) -> Result<Vec<SelectOption>, TransportError>;
}

/// Option lists backed by the repository.
pub struct RepositoryOptions<'a, R: ?Sized>(pub &'a R);

impl<R> OptionsSource for RepositoryOptions<'_, R>
where
    R: ContactReader + ResourceReader + EventReader + ?Sized,
{
    fn load_options(&self, key: &str) -> Result<Vec<SelectOption>, TransportError> {
        let repo = self.0;
        let values = match key {
            "contact_countries" => repo.list_contact_countries(),
            "organizations" => repo.list_organizations(),
            "resource_groups" => repo.list_resource_groups(),
            "event_countries" => repo.list_event_countries(),
            "events" => {
                return repo
                    .list_event_choices()
                    .map(|choices| {
                        choices
                            .into_iter()
                            .map(|(id, name)| SelectOption::new(id.to_string(), name))
                            .collect()
                    })
                    .map_err(|err| TransportError::new(err.to_string()));
            }
            other => return Err(TransportError::new(format!("unknown option list {other}"))),
        };
        values
            .map(|values| values.into_iter().map(SelectOption::same).collect())
            .map_err(|err| TransportError::new(err.to_string()))
    }
}

/// Option lists of one rendered page. Each list is loaded at most once,
/// however many inputs use it.
#[derive(Debug, Default)]
pub struct PageOptions {
    lists: HashMap<&'static str, LazyOptions>,
}

impl PageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for an input and whether it must render disabled.
    pub fn resolve<O: OptionsSource + ?Sized>(
        &mut self,
        options: OptionsRef,
        source: &O,
    ) -> (Vec<SelectOption>, bool) {
        match options {
            OptionsRef::None => (Vec::new(), false),
            OptionsRef::Static(pairs) => (
                pairs
                    .iter()
                    .map(|(value, label)| SelectOption::new(*value, *label))
                    .collect(),
                false,
            ),
            OptionsRef::Lazy(key) => {
                let lazy = self.lists.entry(key).or_default();
                match lazy.get_or_load(|| source.load_options(key)) {
                    Ok(options) => (options.to_vec(), false),
                    Err(err) => {
                        log::error!("Failed to load {key} options: {err}");
                        (Vec::new(), lazy.disabled())
                    }
                }
            }
        }
    }
}

fn input_view(
    field: &FilterField,
    value: FieldValue<'_>,
    options: (Vec<SelectOption>, bool),
    required: bool,
    errors: &FormErrors,
) -> InputView {
    let (value, values) = match value {
        FieldValue::Text(text) => (text.to_string(), vec![text.to_string()]),
        FieldValue::List(items) => (items.first().cloned().unwrap_or_default(), items.to_vec()),
        FieldValue::Absent => (String::new(), Vec::new()),
    };
    let (options, disabled) = options;
    let options = options
        .iter()
        .map(|option| {
            let selected = match field.input {
                InputKind::MultiSelect => values.contains(&option.value),
                _ => option.value == value,
            };
            OptionView::from_option(option, selected)
        })
        .collect();

    InputView {
        name: field.name,
        label: field.label,
        input: field.input,
        value,
        values,
        options,
        required,
        disabled,
        errors: errors.get(field.name).to_vec(),
    }
}

/// Filter form of a list, showing the draft and its errors.
pub fn filter_view<E, F, O>(
    controller: &ListController<'_, E, F>,
    source: &O,
    page_options: &mut PageOptions,
    base: &str,
) -> FilterView
where
    E: ListEntity,
    F: ListFilters,
    O: OptionsSource + ?Sized,
{
    let form = controller.filter_form();
    let required = form.required_fields();
    let disabled = controller.disabled();
    let query = controller.variables().to_query();

    let inputs = F::FIELDS
        .iter()
        .map(|field| {
            let options = page_options.resolve(field.options, source);
            let mut input = input_view(
                field,
                form.draft().value(field.name),
                options,
                required.contains(&field.name),
                form.errors(),
            );
            input.disabled |= disabled;
            input
        })
        .collect();

    FilterView {
        inputs,
        pristine: form.is_pristine(),
        disabled,
        action: format!("{base}/filter"),
        applied: query.clone(),
        reset: with_query(&format!("{base}/reset"), &query),
    }
}

/// Everything a list page shows beyond the rows themselves.
pub struct ListView<'a, E> {
    pub title: &'static str,
    pub base: &'a str,
    pub table: Table<E>,
    pub permissions: CapabilityFlags,
    pub add: Option<String>,
    pub export: bool,
    /// Extra `(label, path)` links; the current query is appended.
    pub links: Vec<(&'static str, String)>,
}

/// Loads the current page of `controller` and renders it.
pub fn list_page<E, F, S, O>(
    controller: &ListController<'_, E, F>,
    source: &S,
    options: &O,
    view: ListView<'_, E>,
) -> ListPageData
where
    E: ListEntity,
    F: ListFilters,
    S: ListSource<E, F> + ?Sized,
    O: OptionsSource + ?Sized,
{
    let base = view.base;
    let query = controller.variables().to_query();
    let mut page_options = PageOptions::new();
    let filter = filter_view(controller, options, &mut page_options, base);

    let (table, error) = match controller.load(source) {
        ListState::Ready(result) => (Some(view.table.render(&result, controller, base)), None),
        ListState::Failed(message) => (None, Some(message)),
    };

    ListPageData {
        title: view.title,
        base: base.to_string(),
        table,
        error,
        filter,
        permissions: view.permissions,
        add: view.add.map(|add| with_query(&add, &query)),
        export: view
            .export
            .then(|| with_query(&format!("{base}/export"), &query)),
        refresh: with_query(&format!("{base}/refresh"), &query),
        links: view
            .links
            .into_iter()
            .map(|(label, href)| (label, with_query(&href, &query)))
            .collect(),
        query,
    }
}

/// Create/update form page. Values come from the serialized form so the
/// same inputs render for a blank form and for a rejected submission.
pub fn form_page<D, O>(
    title: String,
    action: String,
    cancel: String,
    form: &EntityForm<D>,
    source: &O,
) -> FormPageData
where
    D: FormDraft + FormInputs + Serialize,
    O: OptionsSource + ?Sized,
{
    let values = serde_json::to_value(form.value()).unwrap_or_default();
    let mut page_options = PageOptions::new();

    let inputs = D::INPUTS
        .iter()
        .map(|field| {
            let raw = values.get(field.name);
            let text = match raw {
                Some(serde_json::Value::String(text)) => text.clone(),
                Some(serde_json::Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            let options = page_options.resolve(field.options, source);
            input_view(
                field,
                FieldValue::Text(&text),
                options,
                D::REQUIRED.contains(&field.name),
                form.errors(),
            )
        })
        .collect();

    FormPageData {
        title,
        action,
        cancel,
        inputs,
        errors: form.errors().get(INTERNAL_FIELD).to_vec(),
        hidden: Vec::new(),
    }
}

/// Runs a repository list call for the given variables.
pub fn fetch_page<E, F, L>(variables: &QueryVariables<F>, list: L) -> Result<ListResult<E>, TransportError>
where
    F: ListFilters,
    L: FnOnce(&ListQuery<F>) -> RepositoryResult<Listed<E>>,
{
    let query = ListQuery::from(variables);
    let (total, results) = list(&query).map_err(|err| {
        log::error!("Failed to list {}: {err}", std::any::type_name::<E>());
        TransportError::new(err.to_string())
    })?;
    Ok(ListResult::new(
        results,
        total,
        variables.page,
        variables.page_size,
    ))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::domain::contact::ContactFilter;
    use crate::list::filter::FilterForm;

    struct CountingOptions {
        calls: Cell<usize>,
        fail: bool,
    }

    impl OptionsSource for CountingOptions {
        fn load_options(&self, _key: &str) -> Result<Vec<SelectOption>, TransportError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(TransportError::new("offline"))
            } else {
                Ok(vec![SelectOption::same("NG"), SelectOption::same("TD")])
            }
        }
    }

    #[test]
    fn lazy_options_load_once_per_page() {
        let source = CountingOptions {
            calls: Cell::new(0),
            fail: false,
        };
        let mut page = PageOptions::new();

        let (first, disabled) = page.resolve(OptionsRef::Lazy("contact_countries"), &source);
        let (second, _) = page.resolve(OptionsRef::Lazy("contact_countries"), &source);

        assert_eq!(source.calls.get(), 1);
        assert!(!disabled);
        assert_eq!(first, second);
    }

    #[test]
    fn failed_options_disable_the_input() {
        let source = CountingOptions {
            calls: Cell::new(0),
            fail: true,
        };
        let mut page = PageOptions::new();

        let (options, disabled) = page.resolve(OptionsRef::Lazy("organizations"), &source);

        assert!(options.is_empty());
        assert!(disabled);
    }

    #[test]
    fn selected_options_follow_the_value() {
        let form = FilterForm::new(ContactFilter {
            country: "TD".to_string(),
            ..ContactFilter::default()
        });
        let field = ContactFilter::FIELDS
            .iter()
            .find(|f| f.name == "country")
            .expect("country field");
        let options = vec![SelectOption::same("NG"), SelectOption::same("TD")];

        let input = input_view(
            field,
            form.draft().value("country"),
            (options, false),
            false,
            form.errors(),
        );

        assert_eq!(input.value, "TD");
        assert!(input.options[1].selected);
        assert!(!input.options[0].selected);
    }

    #[test]
    fn fetch_page_keeps_requested_paging() {
        let mut variables =
            QueryVariables::initial(&crate::domain::contact::CONTACTS, ContactFilter::default());
        variables.page = 2;

        let page = fetch_page(&variables, |query: &ListQuery<ContactFilter>| {
            assert_eq!(query.pagination.offset(), 25);
            Ok((30, vec![41_i32]))
        })
        .expect("page");

        assert_eq!(page.total_count, 30);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages(), 2);
    }
}

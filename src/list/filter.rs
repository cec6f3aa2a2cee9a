//! Filter drafts, their declarative validation rules and lazily loaded
//! option lists.

use std::fmt::Debug;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::{ValidateEmail, ValidateUrl};

use crate::list::mutation::FormErrors;

/// Date format accepted by date inputs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Read-only view of a single filter field used by rule evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Absent,
}

impl FieldValue<'_> {
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|item| item.trim().is_empty()),
            FieldValue::Absent => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Date,
    Select,
    MultiSelect,
}

/// Where a select input takes its options from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "values")]
pub enum OptionsRef {
    None,
    Static(&'static [(&'static str, &'static str)]),
    /// Loaded on demand by the owning service under the given key.
    Lazy(&'static str),
}

/// Descriptor of one input of a filter or entity form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FilterField {
    pub name: &'static str,
    pub label: &'static str,
    pub input: InputKind,
    pub options: OptionsRef,
}

impl FilterField {
    pub const fn new(name: &'static str, label: &'static str, input: InputKind) -> Self {
        Self {
            name,
            label,
            input,
            options: OptionsRef::None,
        }
    }

    pub const fn with_options(mut self, options: OptionsRef) -> Self {
        self.options = options;
        self
    }
}

/// Filter value carried in query variables.
pub trait ListFilters:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Inputs rendered by the filter form.
    const FIELDS: &'static [FilterField];

    fn value(&self, field: &str) -> FieldValue<'_>;

    /// Validation rules for the current value. Recomputed on every
    /// validation, so rules may depend on other fields of the draft.
    fn rules(&self) -> RuleSet {
        RuleSet::new()
    }

    /// Errors of this value against its own rules. Empty when valid.
    fn validation_errors(&self) -> FormErrors {
        self.rules().validate(self)
    }

    /// URL key/value pairs, omitting empty values.
    fn query_pairs(&self) -> Vec<(&'static str, String)>;

    /// Trimmed copy with empty strings and empty list entries removed.
    fn purged(&self) -> Self;

    /// Writes externally fixed values over this filter. Fixed values win.
    fn overlay(&mut self, _fixed: &Self) {}
}

/// Trims every entry, drops the empty ones and removes duplicates while
/// keeping the first occurrence.
pub fn purge_list(items: &[String]) -> Vec<String> {
    let mut purged: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !purged.iter().any(|p| p == item) {
            purged.push(item.to_string());
        }
    }
    purged
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    Url,
    MinLength(usize),
    Date,
    /// Date that must not precede the date held by another field.
    NotBefore(&'static str),
}

impl Rule {
    fn check<F: ListFilters>(&self, value: FieldValue<'_>, draft: &F) -> Option<String> {
        if let Rule::Required = self {
            return value
                .is_blank()
                .then(|| "This field is required.".to_string());
        }
        // Format rules only look at values that are present.
        let text = match value {
            FieldValue::Text(text) if !text.trim().is_empty() => text.trim(),
            _ => return None,
        };
        match self {
            Rule::Required => None,
            Rule::Email => (!text.validate_email()).then(|| "Enter a valid email address.".to_string()),
            Rule::Url => (!text.validate_url()).then(|| "Enter a valid URL.".to_string()),
            Rule::MinLength(min) => (text.chars().count() < *min)
                .then(|| format!("Ensure this value has at least {min} characters.")),
            Rule::Date => parse_date(text)
                .is_none()
                .then(|| "Enter a valid date (YYYY-MM-DD).".to_string()),
            Rule::NotBefore(other) => {
                let date = parse_date(text)?;
                let other_date = match draft.value(other) {
                    FieldValue::Text(other_text) => parse_date(other_text)?,
                    _ => return None,
                };
                (date < other_date).then(|| format!("Must not be earlier than {other}."))
            }
        }
    }
}

/// Per-field rule table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet {
    rows: Vec<(&'static str, Rule)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, rule: Rule) -> Self {
        self.rows.push((name, rule));
        self
    }

    /// Adds the rule only when `condition` holds for the current draft.
    pub fn when(self, condition: bool, name: &'static str, rule: Rule) -> Self {
        if condition { self.field(name, rule) } else { self }
    }

    pub fn rules_for(&self, name: &str) -> impl Iterator<Item = &Rule> {
        self.rows
            .iter()
            .filter(move |(field, _)| *field == name)
            .map(|(_, rule)| rule)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.rules_for(name).any(|rule| *rule == Rule::Required)
    }

    pub fn validate<F: ListFilters>(&self, draft: &F) -> FormErrors {
        let mut errors = FormErrors::new();
        for (field, rule) in &self.rows {
            if let Some(message) = rule.check(draft.value(field), draft) {
                errors.add(*field, message);
            }
        }
        errors
    }
}

/// Filter draft held independently from the applied filter.
#[derive(Clone, Debug)]
pub struct FilterForm<F> {
    draft: F,
    applied: F,
    errors: FormErrors,
}

impl<F: ListFilters> FilterForm<F> {
    pub fn new(applied: F) -> Self {
        Self {
            draft: applied.clone(),
            applied,
            errors: FormErrors::new(),
        }
    }

    pub fn draft(&self) -> &F {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: F) {
        self.draft = draft;
        self.errors.clear();
    }

    pub fn applied(&self) -> &F {
        &self.applied
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    /// Whether the draft structurally equals the applied filter.
    pub fn is_pristine(&self) -> bool {
        self.draft.purged() == self.applied.purged()
    }

    /// Fields required by the rules computed for the current draft.
    pub fn required_fields(&self) -> Vec<&'static str> {
        let rules = self.draft.rules();
        F::FIELDS
            .iter()
            .filter(|field| rules.is_required(field.name))
            .map(|field| field.name)
            .collect()
    }

    /// Validates the draft and, when valid, makes its purged value the
    /// applied filter. An invalid draft leaves the applied filter untouched.
    pub fn apply(&mut self) -> Result<&F, &FormErrors> {
        let errors = self.draft.rules().validate(&self.draft);
        if !errors.is_empty() {
            self.errors = errors;
            return Err(&self.errors);
        }
        self.applied = self.draft.purged();
        self.draft = self.applied.clone();
        self.errors.clear();
        Ok(&self.applied)
    }

    /// Replaces both draft and applied filter with `snapshot`.
    pub fn reset_to(&mut self, snapshot: F) {
        self.draft = snapshot.clone();
        self.applied = snapshot;
        self.errors.clear();
    }
}

/// Display option of a select input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Option list fetched on first use and kept for the lifetime of the form.
#[derive(Clone, Debug, Default)]
pub struct LazyOptions {
    loaded: Option<Vec<SelectOption>>,
}

impl LazyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Inputs depending on these options stay disabled until they load.
    pub fn disabled(&self) -> bool {
        !self.is_loaded()
    }

    pub fn options(&self) -> &[SelectOption] {
        self.loaded.as_deref().unwrap_or_default()
    }

    /// Returns the cached options, running `load` only on the first call.
    /// A failed load is not cached so the next call retries.
    pub fn get_or_load<E, L>(&mut self, load: L) -> Result<&[SelectOption], E>
    where
        L: FnOnce() -> Result<Vec<SelectOption>, E>,
    {
        if self.loaded.is_none() {
            self.loaded = Some(load()?);
        }
        Ok(self.options())
    }
}

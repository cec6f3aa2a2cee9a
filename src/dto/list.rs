//! Template data of list pages and entity forms.

use serde::Serialize;

use crate::list::filter::{InputKind, SelectOption};
use crate::list::table::RenderedTable;
use crate::permissions::CapabilityFlags;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl OptionView {
    pub fn from_option(option: &SelectOption, selected: bool) -> Self {
        Self {
            value: option.value.clone(),
            label: option.label.clone(),
            selected,
        }
    }
}

/// One rendered input of a filter or entity form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputView {
    pub name: &'static str,
    pub label: &'static str,
    pub input: InputKind,
    /// Current value of text, date and single select inputs.
    pub value: String,
    /// Current values of multi select inputs.
    pub values: Vec<String>,
    pub options: Vec<OptionView>,
    pub required: bool,
    pub disabled: bool,
    pub errors: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilterView {
    pub inputs: Vec<InputView>,
    /// Apply stays disabled while the draft equals the applied filter.
    pub pristine: bool,
    pub disabled: bool,
    /// Target of the filter form.
    pub action: String,
    /// Query string of the list the draft was edited on.
    pub applied: String,
    pub reset: String,
}

/// Everything a list page renders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListPageData {
    pub title: &'static str,
    pub base: String,
    /// Query string of the current variables.
    pub query: String,
    pub table: Option<RenderedTable>,
    /// Inline error shown instead of the table when loading failed.
    pub error: Option<String>,
    pub filter: FilterView,
    pub permissions: CapabilityFlags,
    pub add: Option<String>,
    pub export: Option<String>,
    pub refresh: String,
    pub links: Vec<(&'static str, String)>,
}

/// Create/update form page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormPageData {
    pub title: String,
    pub action: String,
    pub cancel: String,
    pub inputs: Vec<InputView>,
    /// Messages of the `$internal` slot.
    pub errors: Vec<String>,
    pub hidden: Vec<(&'static str, String)>,
}

//! Table rendering: columns with cell renderers, permission-gated row actions
//! and the pager.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::list::controller::ListController;
use crate::list::filter::ListFilters;
use crate::list::variables::{Direction, PAGE_SIZES};
use crate::list::{ListEntity, ListResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Text,
    Date,
    Number,
    Link,
    Status,
    Custom,
}

/// Rendered table cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub kind: CellKind,
    pub text: String,
    pub href: Option<String>,
    /// Badge style of a status cell.
    pub badge: Option<&'static str>,
}

impl Cell {
    fn plain(kind: CellKind, text: String) -> Self {
        Self {
            kind,
            text,
            href: None,
            badge: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::plain(CellKind::Text, value.into())
    }

    pub fn optional(value: Option<&str>) -> Self {
        Self::text(value.unwrap_or_default())
    }

    pub fn date(value: NaiveDate) -> Self {
        Self::plain(CellKind::Date, value.format("%Y-%m-%d").to_string())
    }

    pub fn timestamp(value: NaiveDateTime) -> Self {
        Self::plain(CellKind::Date, value.format("%Y-%m-%d %H:%M").to_string())
    }

    pub fn number(value: i64) -> Self {
        Self::plain(CellKind::Number, value.to_string())
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::plain(CellKind::Link, text.into())
        }
    }

    pub fn status(text: impl Into<String>, badge: &'static str) -> Self {
        Self {
            badge: Some(badge),
            ..Self::plain(CellKind::Status, text.into())
        }
    }

    pub fn custom(text: impl Into<String>) -> Self {
        Self::plain(CellKind::Custom, text.into())
    }
}

/// Column of a table. Sortability comes from the list spec.
pub struct Column<E> {
    pub key: &'static str,
    pub header: &'static str,
    pub cell: fn(&E) -> Cell,
}

impl<E> Column<E> {
    pub const fn new(key: &'static str, header: &'static str, cell: fn(&E) -> Cell) -> Self {
        Self { key, header, cell }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Open,
    Edit,
    Delete,
    SignOff,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Open => "Open",
            ActionKind::Edit => "Edit",
            ActionKind::Delete => "Delete",
            ActionKind::SignOff => "Sign off",
        }
    }

    /// Actions that change data are posted; the rest are links.
    pub fn is_post(self) -> bool {
        matches!(self, ActionKind::Delete | ActionKind::SignOff)
    }

    pub fn needs_confirmation(self) -> bool {
        matches!(self, ActionKind::Delete)
    }
}

/// Builds the target path of an action for one row.
pub type ActionHandler<E> = fn(&E) -> String;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowAction {
    pub kind: ActionKind,
    pub label: &'static str,
    pub href: String,
    pub post: bool,
    pub confirm: bool,
}

/// Row actions available for the current user.
pub struct ActionColumn<E> {
    actions: Vec<(ActionKind, ActionHandler<E>)>,
}

impl<E> Default for ActionColumn<E> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
        }
    }
}

impl<E> ActionColumn<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the action only when it is permitted and a handler exists. A
    /// missing handler means the button is absent, not disabled.
    pub fn with(mut self, kind: ActionKind, permitted: bool, handler: Option<ActionHandler<E>>) -> Self {
        if let (true, Some(handler)) = (permitted, handler) {
            self.actions.push((kind, handler));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.iter().map(|(kind, _)| *kind).collect()
    }

    fn render(&self, row: &E, query: &str) -> Vec<RowAction> {
        self.actions
            .iter()
            .map(|(kind, handler)| RowAction {
                kind: *kind,
                label: kind.label(),
                href: with_query(&handler(row), query),
                post: kind.is_post(),
                confirm: kind.needs_confirmation(),
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeaderCell {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    /// Link applying the next sort state of this column.
    pub href: Option<String>,
    pub direction: Option<Direction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    pub key: i32,
    pub cells: Vec<Cell>,
    pub actions: Vec<RowAction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageLink {
    /// `None` renders an ellipsis.
    pub number: Option<usize>,
    pub href: Option<String>,
    pub current: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageSizeOption {
    pub size: usize,
    pub href: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub page: usize,
    pub total_pages: usize,
    pub links: Vec<PageLink>,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub sizes: Vec<PageSizeOption>,
}

/// Template-ready table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedTable {
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<RenderedRow>,
    pub has_actions: bool,
    pub disabled: bool,
    pub total_count: usize,
    pub pager: Pager,
}

pub struct Table<E> {
    columns: Vec<Column<E>>,
    actions: ActionColumn<E>,
}

impl<E: ListEntity> Table<E> {
    pub fn new(columns: Vec<Column<E>>, actions: ActionColumn<E>) -> Self {
        Self { columns, actions }
    }

    pub fn actions(&self) -> &ActionColumn<E> {
        &self.actions
    }

    /// Renders one page. `base` is the path the list is mounted at; links
    /// keep every other variable of the controller.
    pub fn render<F: ListFilters>(
        &self,
        result: &ListResult<E>,
        controller: &ListController<'_, E, F>,
        base: &str,
    ) -> RenderedTable {
        let query = controller.variables().to_query();

        let headers = self
            .columns
            .iter()
            .map(|column| {
                let sortable = controller.spec().is_sortable(column.key);
                let direction = controller
                    .sort()
                    .filter(|o| o.name == column.key)
                    .map(|o| o.direction);
                let href = sortable.then(|| {
                    let next = controller.peek(|c| c.toggle_sort(column.key));
                    with_query(base, &next.to_query())
                });
                HeaderCell {
                    key: column.key,
                    label: column.header,
                    sortable,
                    href,
                    direction,
                }
            })
            .collect();

        let rows = result
            .results
            .iter()
            .map(|row| RenderedRow {
                key: row.key().get(),
                cells: self.columns.iter().map(|column| (column.cell)(row)).collect(),
                actions: self.actions.render(row, &query),
            })
            .collect();

        RenderedTable {
            headers,
            rows,
            has_actions: !self.actions.is_empty(),
            disabled: controller.disabled(),
            total_count: result.total_count,
            pager: pager(result, controller, base),
        }
    }
}

fn pager<E: ListEntity, F: ListFilters>(
    result: &ListResult<E>,
    controller: &ListController<'_, E, F>,
    base: &str,
) -> Pager {
    let page = controller.page();
    let total_pages = result.total_pages();
    let link_to = |n: usize| with_query(base, &controller.peek(|c| c.set_page(n)).to_query());

    let links = page_numbers(total_pages, page, 2, 2, 4, 2)
        .into_iter()
        .map(|number| PageLink {
            number,
            href: number.filter(|n| *n != page).map(link_to),
            current: number == Some(page),
        })
        .collect();

    let mut sizes: Vec<usize> = PAGE_SIZES.to_vec();
    if !sizes.contains(&controller.spec().default_page_size) {
        sizes.push(controller.spec().default_page_size);
        sizes.sort_unstable();
    }
    let sizes = sizes
        .into_iter()
        .map(|size| PageSizeOption {
            size,
            href: with_query(base, &controller.peek(|c| c.set_page_size(size)).to_query()),
            selected: size == controller.page_size(),
        })
        .collect();

    Pager {
        page,
        total_pages,
        links,
        previous: (page > 1).then(|| link_to(page - 1)),
        next: (page < total_pages).then(|| link_to(page + 1)),
        sizes,
    }
}

/// Page numbers to show around the current page, `None` marking a gap.
fn page_numbers(
    total_pages: usize,
    current_page: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> Vec<Option<usize>> {
    let last_page = total_pages;
    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = left_edge.saturating_add(1).min(last_page.saturating_add(1));
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = current_page
        .saturating_add(right_current)
        .saturating_add(1)
        .min(last_page.saturating_add(1));

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge).saturating_add(1));
    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::QueryCache;
    use crate::list::testing::{ROWS, Row, RowFilter};
    use crate::list::variables::QueryVariables;

    fn columns() -> Vec<Column<Row>> {
        vec![
            Column::new("name", "Name", |row: &Row| Cell::text(&row.name)),
            Column::new("id", "Id", |row: &Row| Cell::number(row.id.into())),
        ]
    }

    fn edit(row: &Row) -> String {
        format!("/rows/{}", row.id)
    }

    fn delete(row: &Row) -> String {
        format!("/rows/{}/delete", row.id)
    }

    #[test]
    fn actions_require_permission_and_handler() {
        let actions = ActionColumn::<Row>::new()
            .with(ActionKind::Edit, true, Some(edit))
            .with(ActionKind::Delete, false, Some(delete))
            .with(ActionKind::SignOff, true, None);

        assert_eq!(actions.kinds(), vec![ActionKind::Edit]);
    }

    #[test]
    fn render_builds_sort_links_and_row_actions() {
        let cache = QueryCache::new();
        let mut controller = ListController::<Row, RowFilter>::new(&cache, ROWS);
        controller.set_sort("name", Direction::Asc);
        let table = Table::new(
            columns(),
            ActionColumn::new()
                .with(ActionKind::Edit, true, Some(edit))
                .with(ActionKind::Delete, true, Some(delete)),
        );
        let result = ListResult::new(vec![Row::new(1, "a"), Row::new(2, "b")], 2, 1, 10);

        let rendered = table.render(&result, &controller, "/rows");

        let name = &rendered.headers[0];
        assert!(name.sortable);
        assert_eq!(name.direction, Some(Direction::Asc));
        let next: QueryVariables<RowFilter> = QueryVariables::from_query(
            &ROWS,
            name.href.as_deref().and_then(|h| h.split_once('?')).map(|(_, q)| q).unwrap_or(""),
        );
        assert_eq!(next.ordering.map(|o| o.as_param()), Some("-name".to_string()));
        assert!(!rendered.headers[1].sortable);
        assert!(rendered.headers[1].href.is_none());

        let actions = &rendered.rows[1].actions;
        assert_eq!(actions.len(), 2);
        assert!(actions[0].href.starts_with("/rows/2?"));
        assert!(actions[1].post);
        assert!(actions[1].confirm);
        assert!(!rendered.disabled);
    }

    #[test]
    fn pager_marks_current_page_and_gaps() {
        let cache = QueryCache::new();
        let mut controller = ListController::<Row, RowFilter>::new(&cache, ROWS);
        controller.set_page(6);
        let table = Table::new(columns(), ActionColumn::new());
        let result = ListResult::new(Vec::new(), 200, 6, 10);

        let rendered = table.render(&result, &controller, "/rows");

        let numbers: Vec<Option<usize>> = rendered.pager.links.iter().map(|l| l.number).collect();
        assert_eq!(
            numbers,
            vec![
                Some(1),
                Some(2),
                None,
                Some(4),
                Some(5),
                Some(6),
                Some(7),
                Some(8),
                Some(9),
                Some(10),
                None,
                Some(19),
                Some(20)
            ]
        );
        let current = rendered.pager.links.iter().find(|l| l.current).expect("current");
        assert_eq!(current.number, Some(6));
        assert!(current.href.is_none());
        assert!(rendered.pager.previous.is_some());
        assert!(rendered.pager.next.is_some());
        assert!(!rendered.has_actions);
    }

    #[test]
    fn page_size_links_reset_to_first_page() {
        let cache = QueryCache::new();
        let mut controller = ListController::<Row, RowFilter>::new(&cache, ROWS);
        controller.set_page(3);
        let table = Table::new(columns(), ActionColumn::new());
        let result = ListResult::new(Vec::new(), 100, 3, 10);

        let rendered = table.render(&result, &controller, "/rows");

        let fifty = rendered
            .pager
            .sizes
            .iter()
            .find(|s| s.size == 50)
            .expect("50 offered");
        assert!(fifty.href.contains("page=1&pageSize=50"));
        assert!(rendered.pager.sizes.iter().any(|s| s.size == 10 && s.selected));
    }

    #[test]
    fn no_pages_for_empty_result() {
        assert!(page_numbers(0, 1, 2, 2, 4, 2).is_empty());
        assert_eq!(page_numbers(3, 1, 2, 2, 4, 2), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn page_numbers_do_not_overflow() {
        let pages = page_numbers(3, usize::MAX, 2, 2, 4, 2);
        assert_eq!(pages, vec![Some(1), Some(2), Some(3)]);

        let pages = page_numbers(usize::MAX, usize::MAX, 2, 2, 4, 2);
        assert_eq!(pages.last(), Some(&Some(usize::MAX)));
    }
}

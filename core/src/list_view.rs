//! Paginated items table with a status toggle and per-row mutations.
//!
//! # Design
//! The view is a read-through window onto the shared `QueryClient`: it
//! never owns authoritative item state. `sync` loads the current
//! `(page, status)` key and prefetches the next page when the current one
//! is full. Until the current key has data, the last page the view showed
//! stays on screen as dimmed placeholder data; only the first load renders
//! a skeleton.
//!
//! The view subscribes to its current key and flags itself for a sync when
//! that key is invalidated, e.g. by the create form sharing the client.

use std::cell::Cell;
use std::rc::Rc;

use chrono::DateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::ItemsApi;
use crate::error::ApiError;
use crate::notify::{NotificationService, ToastKind};
use crate::pagination::PaginationController;
use crate::query::{QueryClient, QueryEvent, QueryKey, SubscriptionId, ITEMS};
use crate::translate::{error_message, handle_error};
use crate::types::{Item, ItemStatus, ItemsPage, PageQuery, PER_PAGE};

const COLUMNS: [&str; 4] = ["Title", "Description", "Due Date", "Actions"];
const MISSING: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: String,
    /// Whether the row carries a "Complete" button.
    pub can_complete: bool,
}

impl ItemRow {
    fn from_item(item: &Item, status: ItemStatus) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            description: item
                .description
                .as_deref()
                .filter(|text| !text.is_empty())
                .unwrap_or(MISSING)
                .to_string(),
            due_date: item
                .due_date
                .as_deref()
                .map(display_date)
                .unwrap_or_else(|| MISSING.to_string()),
            can_complete: status == ItemStatus::Todo,
        }
    }
}

fn display_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableBody {
    /// First load: one row of placeholder cells.
    Skeleton { cells: usize },
    Rows(Vec<ItemRow>),
}

/// Everything needed to draw the table and its footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemsTable {
    pub columns: Vec<&'static str>,
    pub body: TableBody,
    pub dimmed: bool,
    pub page: u32,
    pub status: ItemStatus,
    pub toggle_label: &'static str,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub error: Option<String>,
}

pub struct ItemsListView {
    api: Rc<dyn ItemsApi>,
    queries: QueryClient<ItemsPage>,
    notifier: Rc<dyn NotificationService>,
    pagination: PaginationController,
    status: ItemStatus,
    shown: Option<ItemsPage>,
    error: Option<String>,
    needs_sync: Rc<Cell<bool>>,
    subscription: Option<(QueryKey, SubscriptionId)>,
}

impl ItemsListView {
    pub fn new(
        api: Rc<dyn ItemsApi>,
        queries: QueryClient<ItemsPage>,
        notifier: Rc<dyn NotificationService>,
        pagination: PaginationController,
    ) -> Self {
        let mut view = Self {
            api,
            queries,
            notifier,
            pagination,
            status: ItemStatus::Todo,
            shown: None,
            error: None,
            needs_sync: Rc::new(Cell::new(true)),
            subscription: None,
        };
        view.watch_current_key();
        view
    }

    pub fn query(&self) -> PageQuery {
        PageQuery::new(self.pagination.page(), self.status)
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    /// True after a key change or an invalidation of the current key.
    pub fn needs_sync(&self) -> bool {
        self.needs_sync.get()
    }

    /// Load the current key (from cache when fresh), then prefetch the next
    /// page if this one is full.
    pub fn sync(&mut self) {
        self.watch_current_key();
        self.needs_sync.set(false);
        let query = self.query();
        let api = Rc::clone(&self.api);
        let result = self.queries.fetch_query(QueryKey::items(query), || {
            api.read_items(query.skip(), query.limit(), query.status)
        });
        match result {
            Ok(page) => {
                self.shown = Some(page);
                self.error = None;
            }
            Err(err) => {
                warn!(page = query.page, status = %query.status, error = %err, "failed to load items");
                self.error = Some(error_message(&err));
            }
        }
        if self.has_next_page() {
            let next = query.next();
            self.queries.prefetch_query(QueryKey::items(next), || {
                api.read_items(next.skip(), next.limit(), next.status)
            });
        }
    }

    /// Data for the current key, or the previously shown page as
    /// placeholder. The flag is true for placeholder data.
    fn data(&self) -> Option<(ItemsPage, bool)> {
        match self.queries.get_query_data(&QueryKey::items(self.query())) {
            Some(page) => Some((page, false)),
            None => self.shown.clone().map(|page| (page, true)),
        }
    }

    /// Full record of a row currently on screen.
    pub fn item(&self, id: Uuid) -> Option<Item> {
        let (page, _) = self.data()?;
        page.data.into_iter().find(|item| item.id == id)
    }

    pub fn is_placeholder_data(&self) -> bool {
        matches!(self.data(), Some((_, true)))
    }

    pub fn has_next_page(&self) -> bool {
        matches!(self.data(), Some((page, false)) if page.data.len() == PER_PAGE as usize)
    }

    pub fn has_previous_page(&self) -> bool {
        self.pagination.has_previous_page()
    }

    /// Flip between to-do and completed items. The page is kept.
    pub fn toggle_status(&mut self) {
        self.status = self.status.toggled();
        self.needs_sync.set(true);
    }

    pub fn set_page(&mut self, page: u32) -> String {
        let search = self.pagination.set_page(page);
        self.needs_sync.set(true);
        search
    }

    pub fn next_page(&mut self) -> Option<String> {
        if !self.has_next_page() {
            return None;
        }
        let page = self.query().page.saturating_add(1);
        Some(self.set_page(page))
    }

    pub fn previous_page(&mut self) -> Option<String> {
        if !self.has_previous_page() {
            return None;
        }
        let page = self.query().page - 1;
        Some(self.set_page(page))
    }

    pub fn render(&self) -> ItemsTable {
        let mut columns = COLUMNS.to_vec();
        if self.status == ItemStatus::Todo {
            columns.push("");
        }
        let (body, dimmed) = match self.data() {
            Some((page, placeholder)) => (
                TableBody::Rows(
                    page.data
                        .iter()
                        .map(|item| ItemRow::from_item(item, self.status))
                        .collect(),
                ),
                placeholder,
            ),
            None => (TableBody::Skeleton { cells: COLUMNS.len() }, false),
        };
        ItemsTable {
            columns,
            body,
            dimmed,
            page: self.query().page,
            status: self.status,
            toggle_label: match self.status {
                ItemStatus::Todo => "Show Completed",
                ItemStatus::Complete => "Show To Do",
            },
            has_next_page: self.has_next_page(),
            has_previous_page: self.has_previous_page(),
            error: self.error.clone(),
        }
    }

    /// Mark `item` complete by sending the full record back with the new
    /// status. Returns whether the server accepted it.
    pub fn complete_item(&self, item: &Item) -> bool {
        let record = Item {
            status: ItemStatus::Complete,
            ..item.clone()
        };
        let result = self.api.update_item(item.id, &record);
        self.settle(result, "Task completed.")
    }

    /// Save an edited record.
    pub fn edit_item(&self, item: &Item) -> bool {
        let result = self.api.update_item(item.id, item);
        self.settle(result, "Item updated successfully.")
    }

    pub fn delete_item(&self, id: Uuid) -> bool {
        let result = self.api.delete_item(id);
        self.settle(result, "The item was deleted successfully.")
    }

    fn settle<T>(&self, result: Result<T, ApiError>, success: &str) -> bool {
        let ok = match result {
            Ok(_) => {
                info!(message = success, "items mutation succeeded");
                self.notifier.show_toast("Success!", success, ToastKind::Success);
                true
            }
            Err(err) => {
                handle_error(&err, self.notifier.as_ref());
                false
            }
        };
        self.queries.invalidate_queries(ITEMS);
        ok
    }

    fn watch_current_key(&mut self) {
        let key = QueryKey::items(self.query());
        if let Some((watched, id)) = self.subscription {
            if watched == key {
                return;
            }
            self.queries.unsubscribe(id);
        }
        let flag = Rc::clone(&self.needs_sync);
        let id = self.queries.subscribe(key, move |event| {
            if let QueryEvent::Invalidated(_) = event {
                flag.set(true);
            }
        });
        self.subscription = Some((key, id));
    }
}

impl Drop for ItemsListView {
    fn drop(&mut self) {
        if let Some((_, id)) = self.subscription.take() {
            self.queries.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastQueue;
    use crate::query::QueryConfig;
    use crate::testing::{Call, FakeApi};

    fn view_with(api: &Rc<FakeApi>, search: &str) -> (ItemsListView, QueryClient<ItemsPage>, Rc<ToastQueue>) {
        let queries = QueryClient::new(QueryConfig::default());
        let toasts = Rc::new(ToastQueue::new());
        let view = ItemsListView::new(
            api.clone(),
            queries.clone(),
            toasts.clone(),
            PaginationController::from_search(search),
        );
        (view, queries, toasts)
    }

    fn rows(table: &ItemsTable) -> &[ItemRow] {
        match &table.body {
            TableBody::Rows(rows) => rows,
            TableBody::Skeleton { .. } => panic!("expected rows, got skeleton"),
        }
    }

    #[test]
    fn first_load_shows_skeleton() {
        let api = Rc::new(FakeApi::with_todos(2));
        let (view, _, _) = view_with(&api, "");
        let table = view.render();
        assert_eq!(table.body, TableBody::Skeleton { cells: 4 });
        assert!(!table.dimmed);
        assert!(view.needs_sync());
        assert_eq!(api.call_count(), 0);
    }

    #[test]
    fn sync_reads_window_for_page() {
        let api = Rc::new(FakeApi::with_todos(12));
        let (mut view, _, _) = view_with(&api, "?page=3");
        view.sync();
        assert_eq!(api.reads()[0], (10, ItemStatus::Todo));
        assert_eq!(rows(&view.render()).len(), 2);
        assert!(!view.needs_sync());
    }

    #[test]
    fn page_far_past_the_end_renders_empty() {
        let api = Rc::new(FakeApi::with_todos(3));
        let (mut view, _, _) = view_with(&api, "?page=4294967295");
        view.sync();
        assert_eq!(
            api.reads(),
            [(u64::from(u32::MAX - 1) * 5, ItemStatus::Todo)]
        );
        let table = view.render();
        assert_eq!(table.page, u32::MAX);
        assert!(rows(&table).is_empty());
        assert!(table.error.is_none());
        assert!(!table.has_next_page);
        assert!(table.has_previous_page);
    }

    #[test]
    fn partial_page_has_no_next_page() {
        let api = Rc::new(FakeApi::with_todos(4));
        let (mut view, _, _) = view_with(&api, "");
        view.sync();
        assert!(!view.has_next_page());
        assert!(view.next_page().is_none());
        assert_eq!(api.reads(), [(0, ItemStatus::Todo)]);
    }

    #[test]
    fn full_page_prefetches_next_and_navigation_hits_cache() {
        let api = Rc::new(FakeApi::with_todos(6));
        let (mut view, _, _) = view_with(&api, "?tab=all");
        view.sync();
        assert!(view.has_next_page());
        assert_eq!(api.reads(), [(0, ItemStatus::Todo), (5, ItemStatus::Todo)]);

        assert_eq!(view.next_page().as_deref(), Some("?tab=all&page=2"));
        let table = view.render();
        assert!(!table.dimmed);
        assert_eq!(rows(&table).len(), 1);
        assert!(table.has_previous_page);

        view.sync();
        assert_eq!(api.call_count(), 2);
    }

    #[test]
    fn failed_load_is_reported_inline_without_toast() {
        let api = Rc::new(FakeApi::with_todos(5));
        let (mut view, _, toasts) = view_with(&api, "");
        api.fail_next(ApiError::Transport("offline".to_string()));

        view.sync();
        let table = view.render();
        assert_eq!(table.error.as_deref(), Some("Something went wrong."));
        assert!(!table.has_next_page);
        assert!(toasts.is_empty());
        assert_eq!(api.call_count(), 1);
    }

    #[test]
    fn failed_prefetch_after_success_leaves_view_usable() {
        let api = Rc::new(FakeApi::with_todos(5));
        let (mut view, queries, toasts) = view_with(&api, "");
        let current = QueryKey::items(PageQuery::new(1, ItemStatus::Todo));
        queries.set_query_data(current, api.read_items(0, 5, ItemStatus::Todo).unwrap());
        api.fail_next(ApiError::Transport("offline".to_string()));

        view.sync();
        let table = view.render();
        assert!(table.has_next_page);
        assert!(table.error.is_none());
        assert!(toasts.is_empty());
        assert!(queries
            .get_query_data(&QueryKey::items(PageQuery::new(2, ItemStatus::Todo)))
            .is_none());
    }

    #[test]
    fn new_key_shows_previous_rows_dimmed_until_synced() {
        let api = Rc::new(FakeApi::with_todos(5));
        let (mut view, _, _) = view_with(&api, "");
        view.sync();
        view.toggle_status();

        let table = view.render();
        assert!(table.dimmed);
        assert_eq!(rows(&table).len(), 5);
        assert!(!table.has_next_page);
        assert!(view.is_placeholder_data());
        assert_eq!(table.toggle_label, "Show To Do");
        assert_eq!(table.columns, ["Title", "Description", "Due Date", "Actions"]);

        view.sync();
        let table = view.render();
        assert!(!table.dimmed);
        assert!(rows(&table).is_empty());
    }

    #[test]
    fn returning_to_cached_key_skips_network() {
        let api = Rc::new(FakeApi::with_todos(7));
        let (mut view, _, _) = view_with(&api, "?page=2");
        view.sync();
        view.toggle_status();
        view.set_page(1);
        view.sync();
        view.toggle_status();
        view.set_page(2);
        view.sync();

        assert_eq!(api.reads(), [(5, ItemStatus::Todo), (0, ItemStatus::Complete)]);
        assert_eq!(rows(&view.render()).len(), 2);
    }

    #[test]
    fn toggling_status_keeps_page() {
        let api = Rc::new(FakeApi::with_todos(1));
        let (mut view, _, _) = view_with(&api, "?page=3");
        view.toggle_status();
        view.sync();
        assert_eq!(view.query(), PageQuery::new(3, ItemStatus::Complete));
        assert_eq!(api.reads(), [(10, ItemStatus::Complete)]);
    }

    #[test]
    fn complete_sends_full_record_and_invalidates_everything() {
        let api = Rc::new(FakeApi::with_todos(3));
        let (mut view, queries, toasts) = view_with(&api, "");
        view.sync();
        let other = QueryKey::items(PageQuery::new(4, ItemStatus::Complete));
        queries.set_query_data(other, ItemsPage { data: Vec::new(), count: 0 });
        let item = api.items.borrow()[1].clone();

        assert!(view.complete_item(&item));

        let expected = Item {
            status: ItemStatus::Complete,
            ..item.clone()
        };
        assert!(api.calls.borrow().contains(&Call::Update(item.id, expected)));
        assert!(queries.is_stale(&QueryKey::items(view.query())));
        assert!(queries.is_stale(&other));
        assert!(view.needs_sync());
        // no optimistic removal before the refetch
        assert_eq!(rows(&view.render()).len(), 3);
        assert_eq!(toasts.drain()[0].message, "Task completed.");

        view.sync();
        assert_eq!(rows(&view.render()).len(), 2);
    }

    #[test]
    fn failed_complete_toasts_error_and_still_invalidates() {
        let api = Rc::new(FakeApi::with_todos(1));
        let (mut view, queries, toasts) = view_with(&api, "");
        view.sync();
        let mut item = api.items.borrow()[0].clone();
        item.id = Uuid::nil();

        assert!(!view.complete_item(&item));
        let toasts = toasts.drain();
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert_eq!(toasts[0].message, "Item not found");
        assert!(queries.is_stale(&QueryKey::items(view.query())));
    }

    #[test]
    fn edit_and_delete_row_actions() {
        let api = Rc::new(FakeApi::with_todos(2));
        let (mut view, _, toasts) = view_with(&api, "");
        view.sync();
        let first_id = api.items.borrow()[0].id;
        let mut item = view.item(first_id).unwrap();
        assert!(view.item(Uuid::nil()).is_none());
        item.title = "Renamed".to_string();

        assert!(view.edit_item(&item));
        assert!(view.delete_item(item.id));
        let messages: Vec<String> = toasts.drain().into_iter().map(|t| t.message).collect();
        assert_eq!(
            messages,
            ["Item updated successfully.", "The item was deleted successfully."]
        );

        view.sync();
        let table = view.render();
        assert_eq!(rows(&table).len(), 1);
        assert_eq!(rows(&table)[0].title, "Item 1");
    }

    #[test]
    fn rows_render_missing_values_and_dates() {
        let item = Item {
            id: Uuid::nil(),
            title: "Dentist".to_string(),
            description: Some(String::new()),
            due_date: Some("2024-05-01T00:00:00.000Z".to_string()),
            status: ItemStatus::Todo,
        };
        let row = ItemRow::from_item(&item, ItemStatus::Todo);
        assert_eq!(row.description, "N/A");
        assert_eq!(row.due_date, "2024-05-01");
        assert!(row.can_complete);

        let bare = Item {
            description: None,
            due_date: None,
            ..item
        };
        let row = ItemRow::from_item(&bare, ItemStatus::Complete);
        assert_eq!(row.due_date, "N/A");
        assert!(!row.can_complete);
    }

    #[test]
    fn external_invalidation_flags_view() {
        let api = Rc::new(FakeApi::with_todos(1));
        let (mut view, queries, _) = view_with(&api, "");
        view.sync();
        assert!(!view.needs_sync());

        queries.invalidate_queries(ITEMS);
        assert!(view.needs_sync());
        view.sync();
        assert_eq!(api.reads().len(), 2);
    }
}

//! Client core for the items screens of the admin dashboard.
//!
//! # Overview
//! A paginated items table, an "Add Item" form and the mutations behind
//! them, written against a shared query cache instead of a UI framework.
//! The core never touches the network: HTTP requests are built as plain
//! data and executed by a host-supplied [`Transport`].
//!
//! # Design
//! - `ItemsClient` builds and parses requests; `HttpItemsApi` pairs it with
//!   a transport behind the `ItemsApi` trait.
//! - `QueryClient` is the one shared cache, injected into every component.
//! - `ItemsListView` and `ItemFormModal` only ever talk to `ItemsApi`,
//!   `QueryClient` and `NotificationService`.
//! - Everything is single-threaded (`Rc`/`RefCell`), like the UI event loop
//!   it stands in for.

pub mod client;
pub mod error;
pub mod form;
pub mod http;
pub mod list_view;
pub mod notify;
pub mod pagination;
pub mod query;
pub mod translate;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{HttpItemsApi, ItemsApi, ItemsClient};
pub use error::ApiError;
pub use form::{Field, ItemFormModal, SubmitBlocked, SubmitOutcome};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use list_view::{ItemRow, ItemsListView, ItemsTable, TableBody};
pub use notify::{NotificationService, Toast, ToastKind, ToastQueue};
pub use pagination::{PaginationController, SearchParams};
pub use query::{QueryClient, QueryConfig, QueryEvent, QueryKey, ITEMS};
pub use translate::handle_error;
pub use types::{Item, ItemCreate, ItemStatus, ItemsPage, PageQuery, UnknownStatus, PER_PAGE};

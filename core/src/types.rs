//! Domain DTOs for the items API.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently;
//! the integration test catches drift between the two crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Items shown per list page.
pub const PER_PAGE: u32 = 5;

/// Workflow state of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Todo,
    Complete,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Todo => "todo",
            ItemStatus::Complete => "complete",
        }
    }

    /// The other status; drives the list view's toggle.
    pub fn toggled(self) -> Self {
        match self {
            ItemStatus::Todo => ItemStatus::Complete,
            ItemStatus::Complete => ItemStatus::Todo,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string other than `todo` or `complete`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ItemStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(ItemStatus::Todo),
            "complete" => Ok(ItemStatus::Complete),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A single item returned by the API. Also the body of an update: the
/// client always sends the full record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: ItemStatus,
}

/// Request payload for creating an item. `due_date` is serialized as
/// `null` when absent, never omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemCreate {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

/// One page of the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemsPage {
    pub data: Vec<Item>,
    #[serde(default)]
    pub count: u64,
}

/// Page number plus status filter. Doubles as the cache key parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageQuery {
    pub page: u32,
    pub status: ItemStatus,
}

impl PageQuery {
    /// Pages below 1 are clamped to 1.
    pub fn new(page: u32, status: ItemStatus) -> Self {
        Self {
            page: page.max(1),
            status,
        }
    }

    /// Offset of the first item on this page. Widened so that any `u32`
    /// page maps to a window without overflow.
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(PER_PAGE)
    }

    pub fn limit(&self) -> u32 {
        PER_PAGE
    }

    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ItemStatus::Complete).unwrap(), "complete");
        let parsed: ItemStatus = serde_json::from_str(r#""todo""#).unwrap();
        assert_eq!(parsed, ItemStatus::Todo);
    }

    #[test]
    fn status_from_str_rejects_unknown() {
        assert_eq!("complete".parse::<ItemStatus>(), Ok(ItemStatus::Complete));
        assert_eq!(
            "done".parse::<ItemStatus>(),
            Err(UnknownStatus("done".to_string()))
        );
        assert_eq!(
            UnknownStatus("done".to_string()).to_string(),
            "unknown item status: done"
        );
    }

    #[test]
    fn item_create_keeps_null_due_date() {
        let body = serde_json::to_value(ItemCreate {
            title: "Plan".to_string(),
            description: Some(String::new()),
            due_date: None,
        })
        .unwrap();
        let object = body.as_object().unwrap();
        assert!(object.contains_key("due_date"));
        assert!(body["due_date"].is_null());
        assert_eq!(body["description"], "");
    }

    #[test]
    fn page_query_computes_window() {
        let query = PageQuery::new(3, ItemStatus::Todo);
        assert_eq!(query.skip(), 10);
        assert_eq!(query.limit(), 5);
        assert_eq!(query.next().page, 4);
        assert_eq!(PageQuery::new(0, ItemStatus::Todo).page, 1);
    }

    #[test]
    fn last_representable_page_does_not_overflow() {
        let query = PageQuery::new(u32::MAX, ItemStatus::Complete);
        assert_eq!(query.skip(), u64::from(u32::MAX - 1) * 5);
        assert_eq!(query.next().page, u32::MAX);
    }

    #[test]
    fn items_page_count_defaults_to_zero() {
        let page: ItemsPage = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert_eq!(page.count, 0);
    }
}

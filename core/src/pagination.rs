//! Page number carried in bookmarkable URL search parameters.

use std::fmt;

use tracing::debug;

use crate::http::{decode_query, encode_query};

/// Ordered, decoded URL search parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    pub fn parse(query: &str) -> Self {
        Self {
            pairs: decode_query(query),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace `key` in place (dropping duplicates) or append it.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(index) => {
                self.pairs[index].1 = value;
                let mut seen = 0;
                self.pairs.retain(|(k, _)| {
                    if k != key {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Renders as `?a=1&b=2`, or an empty string without parameters.
impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pairs.is_empty() {
            return Ok(());
        }
        write!(f, "?{}", encode_query(&self.pairs))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaginationController {
    search: SearchParams,
}

impl PaginationController {
    pub fn from_search(query: &str) -> Self {
        Self {
            search: SearchParams::parse(query),
        }
    }

    /// Current page. Missing, non-numeric and non-positive values mean 1.
    pub fn page(&self) -> u32 {
        match self.search.get("page").map(|raw| raw.trim().parse::<u32>()) {
            Some(Ok(page)) if page >= 1 => page,
            Some(_) => {
                debug!(raw = ?self.search.get("page"), "unusable page parameter, using 1");
                1
            }
            None => 1,
        }
    }

    pub fn has_previous_page(&self) -> bool {
        self.page() > 1
    }

    /// Navigate to `page`, keeping every other parameter. Returns the new
    /// search string.
    pub fn set_page(&mut self, page: u32) -> String {
        self.search.set("page", page.max(1).to_string());
        self.search.to_string()
    }

    pub fn search(&self) -> &SearchParams {
        &self.search
    }
}

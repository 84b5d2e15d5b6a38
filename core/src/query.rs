//! Session-scoped query cache shared by every items component.
//!
//! # Design
//! `QueryClient` is a cheap-to-clone handle over one `Rc<RefCell<..>>`, so a
//! list view and a form built from the same handle observe the same
//! entries. It is injected, never global. Entries are keyed by
//! `(entity, PageQuery)`; invalidation works on the entity prefix.
//!
//! Listeners are called after the internal borrow is released and may call
//! back into the client.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::types::PageQuery;

/// Entity name of every items list key.
pub const ITEMS: &str = "items";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub entity: &'static str,
    pub params: PageQuery,
}

impl QueryKey {
    pub fn items(params: PageQuery) -> Self {
        Self {
            entity: ITEMS,
            params,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[page={}, status={}]",
            self.entity, self.params.page, self.params.status
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueryConfig {
    /// Age after which an entry is refetched on the next read.
    pub stale_time: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryEvent {
    Updated(QueryKey),
    Invalidated(QueryKey),
}

impl QueryEvent {
    pub fn key(&self) -> &QueryKey {
        match self {
            QueryEvent::Updated(key) | QueryEvent::Invalidated(key) => key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(&QueryEvent)>;

struct Entry<V> {
    data: V,
    updated_at: Instant,
    invalidated: bool,
}

struct Subscriber {
    id: SubscriptionId,
    key: QueryKey,
    listener: Listener,
}

struct Inner<V> {
    config: QueryConfig,
    entries: HashMap<QueryKey, Entry<V>>,
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

pub struct QueryClient<V> {
    inner: Rc<RefCell<Inner<V>>>,
}

impl<V> Clone for QueryClient<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: Clone> Default for QueryClient<V> {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl<V: Clone> QueryClient<V> {
    pub fn new(config: QueryConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                config,
                entries: HashMap::new(),
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Cached data for `key`, fresh or not.
    pub fn get_query_data(&self, key: &QueryKey) -> Option<V> {
        self.inner.borrow().entries.get(key).map(|entry| entry.data.clone())
    }

    /// True when `key` has no entry, was invalidated, or outlived the stale
    /// time.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        let inner = self.inner.borrow();
        match inner.entries.get(key) {
            Some(entry) => {
                entry.invalidated || entry.updated_at.elapsed() >= inner.config.stale_time
            }
            None => true,
        }
    }

    pub fn set_query_data(&self, key: QueryKey, data: V) {
        self.inner.borrow_mut().entries.insert(
            key,
            Entry {
                data,
                updated_at: Instant::now(),
                invalidated: false,
            },
        );
        self.notify(QueryEvent::Updated(key));
    }

    /// Fresh cached data, or the result of `fetcher` stored under `key`.
    ///
    /// A failed fetch leaves any existing entry untouched.
    pub fn fetch_query<E>(
        &self,
        key: QueryKey,
        fetcher: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if !self.is_stale(&key) {
            if let Some(data) = self.get_query_data(&key) {
                debug!(%key, "query cache hit");
                return Ok(data);
            }
        }
        debug!(%key, "fetching query");
        let data = fetcher()?;
        self.set_query_data(key, data.clone());
        Ok(data)
    }

    /// Warm `key` in the background sense: same as `fetch_query`, but the
    /// outcome is discarded and failures are only logged.
    pub fn prefetch_query<E: fmt::Display>(
        &self,
        key: QueryKey,
        fetcher: impl FnOnce() -> Result<V, E>,
    ) {
        if let Err(err) = self.fetch_query(key, fetcher) {
            debug!(%key, error = %err, "prefetch failed");
        }
    }

    /// Mark every entry of `entity` stale. Returns how many were marked.
    pub fn invalidate_queries(&self, entity: &str) -> usize {
        let keys: Vec<QueryKey> = {
            let mut inner = self.inner.borrow_mut();
            inner
                .entries
                .iter_mut()
                .filter(|(key, _)| key.entity == entity)
                .map(|(key, entry)| {
                    entry.invalidated = true;
                    *key
                })
                .collect()
        };
        debug!(entity, count = keys.len(), "invalidated queries");
        for key in &keys {
            self.notify(QueryEvent::Invalidated(*key));
        }
        keys.len()
    }

    pub fn subscribe(
        &self,
        key: QueryKey,
        listener: impl Fn(&QueryEvent) + 'static,
    ) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            key,
            listener: Rc::new(listener),
        });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|subscriber| subscriber.id != id);
    }

    fn notify(&self, event: QueryEvent) {
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .filter(|subscriber| subscriber.key == *event.key())
            .map(|subscriber| Rc::clone(&subscriber.listener))
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }
}

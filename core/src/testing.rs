//! In-memory `ItemsApi` used by unit tests.

use std::cell::RefCell;

use uuid::Uuid;

use crate::client::ItemsApi;
use crate::error::ApiError;
use crate::types::{Item, ItemCreate, ItemStatus, ItemsPage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(ItemCreate),
    Read { skip: u64, limit: u32, status: ItemStatus },
    Update(Uuid, Item),
    Delete(Uuid),
}

#[derive(Default)]
pub struct FakeApi {
    pub items: RefCell<Vec<Item>>,
    pub calls: RefCell<Vec<Call>>,
    failures: RefCell<Vec<ApiError>>,
}

impl FakeApi {
    pub fn with_todos(count: usize) -> Self {
        let api = Self::default();
        for n in 0..count {
            api.items.borrow_mut().push(Item {
                id: Uuid::new_v4(),
                title: format!("Item {n}"),
                description: None,
                due_date: None,
                status: ItemStatus::Todo,
            });
        }
        api
    }

    /// The next call fails with `err` instead of touching the store.
    pub fn fail_next(&self, err: ApiError) {
        self.failures.borrow_mut().push(err);
    }

    pub fn reads(&self) -> Vec<(u64, ItemStatus)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Read { skip, status, .. } => Some((*skip, *status)),
                _ => None,
            })
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(call);
        match self.failures.borrow_mut().pop() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ItemsApi for FakeApi {
    fn create_item(&self, body: &ItemCreate) -> Result<Item, ApiError> {
        self.record(Call::Create(body.clone()))?;
        let item = Item {
            id: Uuid::new_v4(),
            title: body.title.clone(),
            description: body.description.clone(),
            due_date: body.due_date.clone(),
            status: ItemStatus::Todo,
        };
        self.items.borrow_mut().push(item.clone());
        Ok(item)
    }

    fn read_items(&self, skip: u64, limit: u32, status: ItemStatus) -> Result<ItemsPage, ApiError> {
        self.record(Call::Read { skip, limit, status })?;
        let items = self.items.borrow();
        let matching: Vec<&Item> = items.iter().filter(|item| item.status == status).collect();
        Ok(ItemsPage {
            data: matching
                .iter()
                .skip(usize::try_from(skip).unwrap_or(usize::MAX))
                .take(limit as usize)
                .map(|item| (*item).clone())
                .collect(),
            count: matching.len() as u64,
        })
    }

    fn update_item(&self, id: Uuid, body: &Item) -> Result<Item, ApiError> {
        self.record(Call::Update(id, body.clone()))?;
        let mut items = self.items.borrow_mut();
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| ApiError::NotFound {
                body: r#"{"detail":"Item not found"}"#.to_string(),
            })?;
        *item = body.clone();
        Ok(item.clone())
    }

    fn delete_item(&self, id: Uuid) -> Result<(), ApiError> {
        self.record(Call::Delete(id))?;
        let mut items = self.items.borrow_mut();
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(ApiError::NotFound {
                body: r#"{"detail":"Item not found"}"#.to_string(),
            });
        }
        Ok(())
    }
}

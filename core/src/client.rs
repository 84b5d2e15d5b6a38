//! Stateless HTTP request builder and response parser for the items API,
//! plus the `ItemsApi` seam the rest of the core talks to.
//!
//! # Design
//! `ItemsClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method producing an `HttpRequest` and a `parse_*` method
//! consuming an `HttpResponse`. `HttpItemsApi` glues the two halves to a
//! host `Transport`; views and forms only see the `ItemsApi` trait so tests
//! can substitute a fake.

use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::{Item, ItemCreate, ItemStatus, ItemsPage};

const ITEMS_PATH: &str = "/api/v1/items";

/// The calls the items screens make.
pub trait ItemsApi {
    fn create_item(&self, body: &ItemCreate) -> Result<Item, ApiError>;
    fn read_items(&self, skip: u64, limit: u32, status: ItemStatus) -> Result<ItemsPage, ApiError>;
    fn update_item(&self, id: Uuid, body: &Item) -> Result<Item, ApiError>;
    fn delete_item(&self, id: Uuid) -> Result<(), ApiError>;
}

/// Synchronous, stateless client for the items API.
#[derive(Debug, Clone)]
pub struct ItemsClient {
    base_url: String,
}

impl ItemsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_read_items(&self, skip: u64, limit: u32, status: ItemStatus) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.collection(),
            query: vec![
                ("skip".to_string(), skip.to_string()),
                ("limit".to_string(), limit.to_string()),
                ("status".to_string(), status.to_string()),
            ],
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_item(&self, input: &ItemCreate) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.collection(),
            query: Vec::new(),
            headers: json_headers(),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_update_item(&self, id: Uuid, input: &Item) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: self.member(id),
            query: Vec::new(),
            headers: json_headers(),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_delete_item(&self, id: Uuid) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.member(id),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_read_items(&self, response: HttpResponse) -> Result<ItemsPage, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_create_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        check_status(&response, 201)?;
        from_json(&response.body)
    }

    pub fn parse_update_item(&self, response: HttpResponse) -> Result<Item, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_delete_item(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    fn collection(&self) -> String {
        format!("{}{ITEMS_PATH}", self.base_url)
    }

    fn member(&self, id: Uuid) -> String {
        format!("{}{ITEMS_PATH}/{id}", self.base_url)
    }
}

/// `ItemsApi` over a host transport.
#[derive(Debug, Clone)]
pub struct HttpItemsApi<T> {
    client: ItemsClient,
    transport: T,
}

impl<T: Transport> HttpItemsApi<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            client: ItemsClient::new(base_url),
            transport,
        }
    }

    pub fn client(&self) -> &ItemsClient {
        &self.client
    }
}

impl<T: Transport> ItemsApi for HttpItemsApi<T> {
    fn create_item(&self, body: &ItemCreate) -> Result<Item, ApiError> {
        let request = self.client.build_create_item(body)?;
        debug!(url = %request.url(), "create item");
        self.client.parse_create_item(self.transport.execute(request)?)
    }

    fn read_items(&self, skip: u64, limit: u32, status: ItemStatus) -> Result<ItemsPage, ApiError> {
        let request = self.client.build_read_items(skip, limit, status);
        debug!(url = %request.url(), "read items");
        self.client.parse_read_items(self.transport.execute(request)?)
    }

    fn update_item(&self, id: Uuid, body: &Item) -> Result<Item, ApiError> {
        let request = self.client.build_update_item(id, body)?;
        debug!(url = %request.url(), "update item");
        self.client.parse_update_item(self.transport.execute(request)?)
    }

    fn delete_item(&self, id: Uuid) -> Result<(), ApiError> {
        let request = self.client.build_delete_item(id);
        debug!(url = %request.url(), "delete item");
        self.client.parse_delete_item(self.transport.execute(request)?)
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound {
            body: response.body.clone(),
        });
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

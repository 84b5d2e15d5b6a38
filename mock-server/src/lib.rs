use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Todo,
    Complete,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: Status,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsPage {
    pub data: Vec<Item>,
    pub count: usize,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Fields absent from the JSON are left untouched; `null` clears a nullable
/// field.
#[derive(Deserialize)]
pub struct UpdateItem {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
    pub status: Option<Status>,
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub status: Option<Status>,
}

fn default_limit() -> usize {
    100
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Insertion-ordered store.
pub type Db = Arc<RwLock<Vec<Item>>>;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/api/v1/items", get(list_items).post(create_item))
        .route(
            "/api/v1/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Item not found" })))
}

fn blank_title(input: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "detail": [{
                "type": "string_too_short",
                "loc": ["body", "title"],
                "msg": "String should have at least 1 character",
                "input": input,
            }]
        })),
    )
}

async fn list_items(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<ItemsPage> {
    let items = db.read().await;
    let matching: Vec<&Item> = items
        .iter()
        .filter(|item| params.status.is_none_or(|status| item.status == status))
        .collect();
    let data: Vec<Item> = matching
        .iter()
        .skip(params.skip)
        .take(params.limit)
        .map(|item| (*item).clone())
        .collect();
    debug!(skip = params.skip, limit = params.limit, returned = data.len(), "list items");
    Json(ItemsPage {
        data,
        count: matching.len(),
    })
}

async fn create_item(
    State(db): State<Db>,
    Json(input): Json<CreateItem>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    if input.title.trim().is_empty() {
        return Err(blank_title(&input.title));
    }
    let item = Item {
        id: Uuid::new_v4(),
        title: input.title,
        description: input.description,
        due_date: input.due_date,
        status: Status::Todo,
    };
    db.write().await.push(item.clone());
    debug!(id = %item.id, "created item");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<Json<Item>> {
    let items = db.read().await;
    items
        .iter()
        .find(|item| item.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateItem>,
) -> ApiResult<Json<Item>> {
    let mut items = db.write().await;
    let item = items
        .iter_mut()
        .find(|item| item.id == id)
        .ok_or_else(not_found)?;
    if let Some(title) = input.title {
        if title.trim().is_empty() {
            return Err(blank_title(&title));
        }
        item.title = title;
    }
    if let Some(description) = input.description {
        item.description = description;
    }
    if let Some(due_date) = input.due_date {
        item.due_date = due_date;
    }
    if let Some(status) = input.status {
        item.status = status;
    }
    Ok(Json(item.clone()))
}

async fn delete_item(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let mut items = db.write().await;
    let position = items
        .iter()
        .position(|item| item.id == id)
        .ok_or_else(not_found)?;
    items.remove(position);
    Ok(StatusCode::NO_CONTENT)
}

//! Item CRUD handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::Result;
use crate::extract::ValidatedJson;
use crate::item::{CreateItem, Item, UpdateItem};
use crate::server::AppState;

/// `GET /api/items`
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>> {
    Ok(Json(state.items.list().await?))
}

/// `GET /api/items/{id}`
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>> {
    Ok(Json(state.items.get(&id).await?))
}

/// `POST /api/items`
pub async fn create_item(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateItem>,
) -> Result<(StatusCode, Json<Item>)> {
    let item = state.items.create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /api/items/{id}`
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<UpdateItem>,
) -> Result<Json<Item>> {
    Ok(Json(state.items.update(&id, patch).await?))
}

/// `DELETE /api/items/{id}`
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.items.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

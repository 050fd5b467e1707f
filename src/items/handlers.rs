use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateItemRequest, DataResponse, UpdateItemRequest},
    error::ItemError,
    repo_types::{Item, ItemChanges, NewItem},
};
use crate::{
    auth::extractors::{require_auth, AuthUser},
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/items", get(list_items))
}

pub fn owner_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/items", post(create_item))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<Item>>>, ItemError> {
    let items = state.items.find_all().await?;
    Ok(Json(DataResponse { data: items }))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DataResponse<Item>>, ItemError> {
    let item = state
        .items
        .find_by_id(id, identity.user_id)
        .await?
        .ok_or(ItemError::NotFound)?;
    Ok(Json(DataResponse { data: item }))
}

#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<DataResponse<Item>>), ItemError> {
    let new = NewItem::try_from(payload).inspect_err(|e| warn!(error = %e, "invalid item"))?;
    let item = state.items.create(new, identity.user_id).await?;
    info!(item_id = %item.id, user_id = %identity.user_id, "item created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<DataResponse<Item>>, ItemError> {
    let changes = ItemChanges::try_from(payload)?;
    let item = state
        .items
        .update(id, identity.user_id, changes)
        .await?
        .ok_or(ItemError::NotFound)?;
    info!(item_id = %item.id, "item updated");
    Ok(Json(DataResponse { data: item }))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ItemError> {
    if !state.items.delete(id, identity.user_id).await? {
        return Err(ItemError::NotFound);
    }
    info!(item_id = %id, "item deleted");
    Ok(StatusCode::OK)
}

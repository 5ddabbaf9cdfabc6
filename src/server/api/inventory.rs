use super::{ApiJson, ApiPath, ApiQuery, created, message, SearchParams};
use crate::inventory::{InventoryItem, InventoryUpdate, NewInventoryItem};
use crate::server::error::ApiResult;
use crate::server::SharedState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
pub struct CheckParams {
    pub name: String,
}

pub async fn list(State(state): State<SharedState>) -> ApiResult<Json<Vec<InventoryItem>>> {
    Ok(Json(state.with_store(|store| store.list_inventory()).await?))
}

pub async fn search(
    State(state): State<SharedState>,
    WithRejection(Query(params), _): ApiQuery<SearchParams>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    Ok(Json(state.with_store(move |store| store.search_inventory(&params.q)).await?))
}

/// Stock level of a chemical by exact name; `in_stock` is false when the
/// name is unknown or the amount is zero.
pub async fn check(
    State(state): State<SharedState>,
    WithRejection(Query(params), _): ApiQuery<CheckParams>,
) -> ApiResult<Json<Value>> {
    let name = params.name.clone();
    let level = state.with_store(move |store| store.check_inventory(&name)).await?;
    let body = match level {
        Some(level) => json!({
            "name": params.name,
            "in_stock": level.amount > 0,
            "amount": level.amount,
            "unit": level.unit,
            "display": level.to_string(),
        }),
        None => json!({ "name": params.name, "in_stock": false }),
    };
    Ok(Json(body))
}

pub async fn create(
    State(state): State<SharedState>,
    WithRejection(Json(item), _): ApiJson<NewInventoryItem>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.with_store(move |store| store.insert_inventory(&item)).await?;
    Ok(created("Inventory item added", id))
}

pub async fn update(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Json(update), _): ApiJson<InventoryUpdate>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.update_inventory(id, &update)).await?;
    Ok(message("Inventory item updated"))
}

pub async fn remove(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.delete_inventory(id)).await?;
    Ok(message("Inventory item deleted"))
}

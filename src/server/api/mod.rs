//! JSON REST endpoints
//!
//! Creates answer `201 {"message", "id"}`, updates and deletes answer
//! `{"message"}`. Errors go through [`ApiError`](super::error::ApiError).

mod inventory;
mod lims;
mod molecules;
mod projects;
mod reactions;
mod timeseries;

use super::error::{ApiError, ApiResult};
use super::SharedState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/health", get(health))
        // Molecules
        .route("/api/molecules", get(molecules::list).post(molecules::create))
        .route("/api/molecules/search", get(molecules::search))
        .route("/api/molecules/render", get(molecules::render))
        .route("/api/molecules/{id}", get(molecules::get_one).put(molecules::update).delete(molecules::remove))
        .route("/api/molecules/{id}/image", get(molecules::image))
        // Inventory
        .route("/api/inventory", get(inventory::list).post(inventory::create))
        .route("/api/inventory/search", get(inventory::search))
        .route("/api/inventory/check", get(inventory::check))
        .route("/api/inventory/{id}", put(inventory::update).delete(inventory::remove))
        // Projects and tasks
        .route("/api/projects", get(projects::list).post(projects::create))
        .route("/api/projects/{id}", put(projects::update).delete(projects::remove))
        .route("/api/projects/{id}/tasks", get(projects::tasks_for_project))
        .route("/api/tasks", get(projects::list_tasks).post(projects::create_task))
        .route("/api/tasks/{id}", put(projects::update_task).delete(projects::remove_task))
        // Reactions
        .route("/api/reactions", get(reactions::list).post(reactions::create))
        .route("/api/reactions/{id}", get(reactions::get_one).put(reactions::update).delete(reactions::remove))
        .route(
            "/api/reactions/{id}/participants",
            get(reactions::participants).post(reactions::add_participant),
        )
        .route("/api/reactions/{id}/overview", get(reactions::overview))
        .route(
            "/api/participants/{reaction_id}/{molecule_id}/{role}",
            put(reactions::update_participant).delete(reactions::remove_participant),
        )
        // LIMS
        .route("/api/lims/experiments", get(lims::list_experiments).post(lims::create_experiment))
        .route("/api/lims/experiments/{id}", put(lims::update_experiment).delete(lims::remove_experiment))
        .route("/api/lims/experiments/{id}/samples", get(lims::samples_for_experiment))
        .route("/api/lims/samples", get(lims::list_samples).post(lims::create_sample))
        .route("/api/lims/samples/{id}", put(lims::update_sample).delete(lims::remove_sample))
        .route("/api/lims/samples/{id}/measurements", get(lims::measurements_for_sample))
        .route("/api/lims/measurements", get(lims::list_measurements).post(lims::create_measurement))
        .route(
            "/api/lims/measurements/{id}",
            put(lims::update_measurement).delete(lims::remove_measurement),
        )
        // Time series
        .route("/api/v1/timeseries/experiments", get(timeseries::experiments))
        .route("/api/v1/timeseries/{id}/series", get(timeseries::series))
        .route(
            "/api/v1/timeseries/{id}/data",
            get(timeseries::data).post(timeseries::insert).delete(timeseries::remove),
        )
        .route("/api/v1/timeseries/{id}/statistics", get(timeseries::statistics))
        .route("/api/v1/timeseries/{id}/export", get(timeseries::export))
}

// Extractors whose rejections render as `{"error": ...}` bodies
pub(crate) type ApiJson<T> = WithRejection<Json<T>, ApiError>;
pub(crate) type ApiPath<T> = WithRejection<Path<T>, ApiError>;
pub(crate) type ApiQuery<T> = WithRejection<Query<T>, ApiError>;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}

pub(crate) fn created(message: impl Into<String>, id: i64) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({ "message": message.into(), "id": id })))
}

pub(crate) fn message(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "message": message.into() }))
}

async fn health(State(state): State<SharedState>) -> ApiResult<Json<Value>> {
    let stats = state.with_store(|store| store.stats()).await?;
    let tables: Map<String, Value> =
        stats.tables.iter().map(|t| (t.name.to_string(), Value::from(t.rows))).collect();
    Ok(Json(json!({ "status": "ok", "tables": tables })))
}

use super::{ApiJson, ApiPath, created, message};
use crate::lims::{
    Experiment, ExperimentUpdate, MeasurementRow, MeasurementUpdate, NewExperiment, NewMeasurement, NewSample,
    SampleRow, SampleUpdate,
};
use crate::server::error::ApiResult;
use crate::server::SharedState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde_json::Value;

// ========== Experiments ==========

pub async fn list_experiments(State(state): State<SharedState>) -> ApiResult<Json<Vec<Experiment>>> {
    Ok(Json(state.with_store(|store| store.list_experiments()).await?))
}

pub async fn create_experiment(
    State(state): State<SharedState>,
    WithRejection(Json(experiment), _): ApiJson<NewExperiment>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.with_store(move |store| store.insert_experiment(&experiment)).await?;
    Ok(created("Experiment added", id))
}

pub async fn update_experiment(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Json(update), _): ApiJson<ExperimentUpdate>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.update_experiment(id, &update)).await?;
    Ok(message("Experiment updated"))
}

/// Cascades to samples, measurements and time series
pub async fn remove_experiment(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.delete_experiment(id)).await?;
    Ok(message("Experiment deleted"))
}

pub async fn samples_for_experiment(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Vec<SampleRow>>> {
    let samples = state
        .with_store(move |store| {
            store.get_experiment(id)?;
            store.list_samples_for_experiment(id)
        })
        .await?;
    Ok(Json(samples))
}

// ========== Samples ==========

pub async fn list_samples(State(state): State<SharedState>) -> ApiResult<Json<Vec<SampleRow>>> {
    Ok(Json(state.with_store(|store| store.list_samples()).await?))
}

pub async fn create_sample(
    State(state): State<SharedState>,
    WithRejection(Json(sample), _): ApiJson<NewSample>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.with_store(move |store| store.insert_sample(&sample)).await?;
    Ok(created("Sample added", id))
}

pub async fn update_sample(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Json(update), _): ApiJson<SampleUpdate>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.update_sample(id, &update)).await?;
    Ok(message("Sample updated"))
}

pub async fn remove_sample(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.delete_sample(id)).await?;
    Ok(message("Sample deleted"))
}

pub async fn measurements_for_sample(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Vec<MeasurementRow>>> {
    let measurements = state
        .with_store(move |store| {
            store.get_sample(id)?;
            store.list_measurements_for_sample(id)
        })
        .await?;
    Ok(Json(measurements))
}

// ========== Measurements ==========

pub async fn list_measurements(State(state): State<SharedState>) -> ApiResult<Json<Vec<MeasurementRow>>> {
    Ok(Json(state.with_store(|store| store.list_measurements()).await?))
}

pub async fn create_measurement(
    State(state): State<SharedState>,
    WithRejection(Json(measurement), _): ApiJson<NewMeasurement>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.with_store(move |store| store.insert_measurement(&measurement)).await?;
    Ok(created("Measurement added", id))
}

pub async fn update_measurement(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Json(update), _): ApiJson<MeasurementUpdate>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.update_measurement(id, &update)).await?;
    Ok(message("Measurement updated"))
}

pub async fn remove_measurement(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.delete_measurement(id)).await?;
    Ok(message("Measurement deleted"))
}

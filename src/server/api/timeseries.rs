use super::{ApiJson, ApiPath, message};
use crate::server::error::{ApiError, ApiResult};
use crate::server::SharedState;
use crate::timeseries::{
    ExportFormat, NewTimeSeriesPoint, ParameterStatistics, SeriesSummary, TimeSeriesExperiment, TimeSeriesPoint,
};
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::{Query, WithRejection};
use serde::Deserialize;
use serde_json::{json, Value};

type ApiMultiQuery<T> = WithRejection<Query<T>, ApiError>;

/// `?parameters=a&parameters=b`; no parameters selects all of them.
#[derive(Debug, Default, Deserialize)]
pub struct ParameterQuery {
    #[serde(default)]
    pub parameters: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

pub async fn experiments(State(state): State<SharedState>) -> ApiResult<Json<Vec<TimeSeriesExperiment>>> {
    Ok(Json(state.with_store(|store| store.list_timeseries_experiments()).await?))
}

pub async fn series(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Vec<SeriesSummary>>> {
    let series = state
        .with_store(move |store| {
            store.get_experiment(id)?;
            store.list_series(id)
        })
        .await?;
    Ok(Json(series))
}

pub async fn data(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Query(query), _): ApiMultiQuery<ParameterQuery>,
) -> ApiResult<Json<Vec<TimeSeriesPoint>>> {
    let points = state
        .with_store(move |store| {
            store.get_experiment(id)?;
            store.get_points(id, &query.parameters)
        })
        .await?;
    Ok(Json(points))
}

pub async fn insert(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Json(points), _): ApiJson<Vec<NewTimeSeriesPoint>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let inserted = state
        .with_store(move |store| {
            store.get_experiment(id)?;
            store.insert_points(id, &points)
        })
        .await?;
    tracing::debug!(experiment_id = id, inserted, "time-series points recorded");
    Ok((StatusCode::CREATED, Json(json!({ "message": "Data points added", "inserted": inserted }))))
}

pub async fn remove(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    let deleted = state
        .with_store(move |store| {
            store.get_experiment(id)?;
            store.delete_points(id)
        })
        .await?;
    Ok(message(format!("{deleted} data points deleted")))
}

pub async fn statistics(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Query(query), _): ApiMultiQuery<ParameterQuery>,
) -> ApiResult<Json<Vec<ParameterStatistics>>> {
    let stats = state
        .with_store(move |store| {
            store.get_experiment(id)?;
            store.statistics(id, &query.parameters)
        })
        .await?;
    Ok(Json(stats))
}

/// Points rendered as JSON, CSV, XML or a Plotly figure. CSV and XML are
/// offered as file downloads.
pub async fn export(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Query(query), _): ApiMultiQuery<ExportQuery>,
) -> ApiResult<Response> {
    let format: ExportFormat = query.format.as_deref().unwrap_or_default().parse()?;
    let parameters = query.parameters;
    let points = state
        .with_store(move |store| {
            store.get_experiment(id)?;
            store.get_points(id, &parameters)
        })
        .await?;
    let body = format.render(id, &points)?;

    let mut response = ([(header::CONTENT_TYPE, format.content_type())], body).into_response();
    if let Some(name) = format.attachment_name(id) {
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{name}\"")) {
            response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
        }
    }
    Ok(response)
}

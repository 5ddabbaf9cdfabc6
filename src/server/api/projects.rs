use super::{ApiJson, ApiPath, created, message};
use crate::project::{NewProject, NewTask, Project, Task, TaskUpdate};
use crate::server::error::ApiResult;
use crate::server::SharedState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde_json::Value;

pub async fn list(State(state): State<SharedState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.with_store(|store| store.list_projects()).await?))
}

pub async fn create(
    State(state): State<SharedState>,
    WithRejection(Json(project), _): ApiJson<NewProject>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.with_store(move |store| store.insert_project(&project)).await?;
    Ok(created("Project added", id))
}

pub async fn update(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Json(project), _): ApiJson<NewProject>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.update_project(id, &project)).await?;
    Ok(message("Project updated"))
}

/// Removes the project and its tasks
pub async fn remove(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.delete_project(id)).await?;
    Ok(message("Project and its tasks deleted"))
}

pub async fn tasks_for_project(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state
        .with_store(move |store| {
            store.get_project(id)?;
            store.list_tasks_for_project(id)
        })
        .await?;
    Ok(Json(tasks))
}

pub async fn list_tasks(State(state): State<SharedState>) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.with_store(|store| store.list_tasks()).await?))
}

pub async fn create_task(
    State(state): State<SharedState>,
    WithRejection(Json(task), _): ApiJson<NewTask>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.with_store(move |store| store.insert_task(&task)).await?;
    Ok(created("Task added", id))
}

pub async fn update_task(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Json(update), _): ApiJson<TaskUpdate>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.update_task(id, &update)).await?;
    Ok(message("Task updated"))
}

pub async fn remove_task(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.delete_task(id)).await?;
    Ok(message("Task deleted"))
}

use super::{status_line, unknown_action, CrudPage, Field, FormFields, FormSpec, SelectOption};
use crate::project::{NewProject, NewTask, TaskUpdate};
use crate::server::error::ApiResult;
use crate::server::{AppState, SharedState};
use axum::extract::State;
use axum::response::Html;
use axum::Form;

// ========== Projects ==========

pub async fn page(State(state): State<SharedState>) -> ApiResult<Html<String>> {
    show_projects(&state, None).await
}

pub async fn action(State(state): State<SharedState>, Form(form): Form<FormFields>) -> ApiResult<Html<String>> {
    let outcome = match form.action() {
        "add" => add_project(&state, &form).await,
        "update" => update_project(&state, &form).await,
        "delete" => delete_project(&state, &form).await,
        other => Err(unknown_action(other)),
    };
    show_projects(&state, Some(status_line(outcome))).await
}

async fn add_project(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let project = NewProject { name: form.required("name")? };
    let id = state.with_store(move |store| store.insert_project(&project)).await?;
    Ok(format!("Project {id} added"))
}

async fn update_project(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    let project = NewProject { name: form.required("name")? };
    state.with_store(move |store| store.update_project(id, &project)).await?;
    Ok(format!("Project {id} updated"))
}

async fn delete_project(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    state.with_store(move |store| store.delete_project(id)).await?;
    Ok(format!("Project {id} and its tasks deleted"))
}

async fn show_projects(state: &AppState, status: Option<String>) -> ApiResult<Html<String>> {
    let (projects, tasks) = state.with_store(|store| Ok((store.list_projects()?, store.list_tasks()?))).await?;

    let mut page = CrudPage::new("Projects", "/projects/", vec!["ID", "Name", "Tasks"]);
    page.rows = projects
        .iter()
        .map(|p| {
            let count = tasks.iter().filter(|t| t.project_id == p.id).count();
            vec![p.id.to_string(), p.name.clone(), count.to_string()]
        })
        .collect();
    page.forms = vec![
        FormSpec::post("add", "Add project", vec![Field::text("name", "Name").required()]),
        FormSpec::post(
            "update",
            "Rename project",
            vec![Field::integer("id", "ID").required(), Field::text("name", "New name").required()],
        ),
        FormSpec::post("delete", "Delete project", vec![Field::integer("id", "ID").required()]),
    ];
    page.status = status;
    page.render(state)
}

// ========== Tasks ==========

pub async fn tasks_page(State(state): State<SharedState>) -> ApiResult<Html<String>> {
    show_tasks(&state, None).await
}

pub async fn task_action(State(state): State<SharedState>, Form(form): Form<FormFields>) -> ApiResult<Html<String>> {
    let outcome = match form.action() {
        "add" => add_task(&state, &form).await,
        "update" => update_task(&state, &form).await,
        "delete" => delete_task(&state, &form).await,
        other => Err(unknown_action(other)),
    };
    show_tasks(&state, Some(status_line(outcome))).await
}

async fn add_task(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let task = NewTask {
        project_id: form.required_parsed("project_id")?,
        description: form.required("description")?,
        content: form.text("content"),
    };
    let id = state.with_store(move |store| store.insert_task(&task)).await?;
    Ok(format!("Task {id} added"))
}

async fn update_task(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    let update = TaskUpdate {
        project_id: form.parsed("project_id")?,
        description: form.text("description"),
        content: form.text("content"),
    };
    state.with_store(move |store| store.update_task(id, &update)).await?;
    Ok(format!("Task {id} updated"))
}

async fn delete_task(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    state.with_store(move |store| store.delete_task(id)).await?;
    Ok(format!("Task {id} deleted"))
}

async fn show_tasks(state: &AppState, status: Option<String>) -> ApiResult<Html<String>> {
    let (projects, tasks) = state.with_store(|store| Ok((store.list_projects()?, store.list_tasks()?))).await?;

    let project_name = |id: i64| projects.iter().find(|p| p.id == id).map(|p| p.name.clone()).unwrap_or_default();
    let options: Vec<SelectOption> = projects.iter().map(|p| SelectOption::new(p.id, &p.name)).collect();

    let mut page = CrudPage::new("Tasks", "/tasks/", vec!["ID", "Project", "Description", "Content"]);
    page.rows = tasks
        .iter()
        .map(|t| vec![t.id.to_string(), project_name(t.project_id), t.description.clone(), t.content_display()])
        .collect();
    page.forms = vec![
        FormSpec::post(
            "add",
            "Add task",
            vec![
                Field::select("project_id", "Project", options.clone()).required(),
                Field::text("description", "Description").required(),
                Field::textarea("content", "Content (text or JSON)"),
            ],
        ),
        FormSpec::post(
            "update",
            "Update task",
            vec![
                Field::integer("id", "ID").required(),
                Field::select("project_id", "Move to project", options),
                Field::text("description", "New description"),
                Field::textarea("content", "New content"),
            ],
        ),
        FormSpec::post("delete", "Delete task", vec![Field::integer("id", "ID").required()]),
    ];
    page.status = status;
    page.render(state)
}

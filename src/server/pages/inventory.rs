use super::molecules::SearchQuery;
use super::{opt_cell, status_line, unknown_action, CrudPage, Field, FormFields, FormSpec};
use crate::inventory::{InventoryUpdate, NewInventoryItem};
use crate::server::error::ApiResult;
use crate::server::{AppState, SharedState};
use axum::extract::{Query, State};
use axum::response::Html;
use axum::Form;

pub async fn page(State(state): State<SharedState>, Query(query): Query<SearchQuery>) -> ApiResult<Html<String>> {
    let q = query.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty());
    show(&state, q, None).await
}

pub async fn action(State(state): State<SharedState>, Form(form): Form<FormFields>) -> ApiResult<Html<String>> {
    let outcome = match form.action() {
        "add" => add(&state, &form).await,
        "update" => update(&state, &form).await,
        "delete" => delete(&state, &form).await,
        "check" => check(&state, &form).await,
        other => Err(unknown_action(other)),
    };
    show(&state, None, Some(status_line(outcome))).await
}

async fn add(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let item = NewInventoryItem {
        name: form.required("name")?,
        amount: form.required_parsed("amount")?,
        unit: form.text("unit"),
    };
    let id = state.with_store(move |store| store.insert_inventory(&item)).await?;
    Ok(format!("Inventory item {id} added"))
}

async fn update(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    let update = InventoryUpdate { name: form.text("name"), amount: form.parsed("amount")?, unit: form.text("unit") };
    state.with_store(move |store| store.update_inventory(id, &update)).await?;
    Ok(format!("Inventory item {id} updated"))
}

async fn delete(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    state.with_store(move |store| store.delete_inventory(id)).await?;
    Ok(format!("Inventory item {id} deleted"))
}

async fn check(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let name = form.required("name")?;
    let lookup = name.clone();
    let level = state.with_store(move |store| store.check_inventory(&lookup)).await?;
    Ok(match level {
        Some(level) if level.amount > 0 => format!("{name}: {level} in stock"),
        Some(_) => format!("{name}: out of stock"),
        None => format!("{name} is not in the inventory"),
    })
}

async fn show(state: &AppState, q: Option<String>, status: Option<String>) -> ApiResult<Html<String>> {
    let search = q.clone();
    let items = state
        .with_store(move |store| match search.as_deref() {
            Some(q) => store.search_inventory(q),
            None => store.list_inventory(),
        })
        .await?;

    let mut page = CrudPage::new("Inventory", "/inventory/", vec!["ID", "Name", "Amount", "Unit"]);
    page.rows = items
        .iter()
        .map(|item| vec![item.id.to_string(), item.name.clone(), item.amount.to_string(), opt_cell(&item.unit)])
        .collect();
    page.forms = vec![
        FormSpec::get("Search", vec![Field::text("q", "Name contains").value(q.unwrap_or_default())]),
        FormSpec::post(
            "add",
            "Add item",
            vec![
                Field::text("name", "Chemical").required(),
                Field::integer("amount", "Amount").required(),
                Field::text("unit", "Unit"),
            ],
        ),
        FormSpec::post(
            "update",
            "Update item",
            vec![
                Field::integer("id", "ID").required(),
                Field::text("name", "New name"),
                Field::integer("amount", "New amount"),
                Field::text("unit", "New unit"),
            ],
        ),
        FormSpec::post("delete", "Delete item", vec![Field::integer("id", "ID").required()]),
        FormSpec::post("check", "Check stock", vec![Field::text("name", "Chemical").required()]),
    ];
    page.status = status;
    page.render(state)
}

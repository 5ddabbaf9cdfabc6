//! Server-rendered pages
//!
//! Every record page is a table plus a set of forms posting back to the same
//! path with an `action` field. The result of an action is shown as a status
//! line above the table.

mod inventory;
mod lims;
mod molecules;
mod projects;
mod reactions;
mod timeseries;

use super::error::{ApiError, ApiResult};
use super::{AppState, SharedState};
use crate::{Error, Result};
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use minijinja::{context, Environment, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize)]
struct NavLink {
    href: &'static str,
    label: &'static str,
}

const NAV: &[NavLink] = &[
    NavLink { href: "/molecules/", label: "Molecules" },
    NavLink { href: "/inventory/", label: "Inventory" },
    NavLink { href: "/projects/", label: "Projects" },
    NavLink { href: "/tasks/", label: "Tasks" },
    NavLink { href: "/reactions/", label: "Reactions" },
    NavLink { href: "/experiments/", label: "Experiments" },
    NavLink { href: "/samples/", label: "Samples" },
    NavLink { href: "/measurements/", label: "Measurements" },
    NavLink { href: "/timeseries/", label: "Time Series" },
];

/// Template environment with every page template compiled in.
pub fn templates() -> std::result::Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("base.html", include_str!("templates/base.html"))?;
    env.add_template("login.html", include_str!("templates/login.html"))?;
    env.add_template("home.html", include_str!("templates/home.html"))?;
    env.add_template("crud.html", include_str!("templates/crud.html"))?;
    env.add_template("timeseries.html", include_str!("templates/timeseries.html"))?;
    env.add_global("nav", Value::from_serialize(NAV));
    Ok(env)
}

pub fn render(state: &AppState, name: &str, ctx: Value) -> ApiResult<Html<String>> {
    let template = state.templates.get_template(name).map_err(|e| ApiError::internal(e.to_string()))?;
    let html = template.render(ctx).map_err(|e| ApiError::internal(format!("rendering {name}: {e}")))?;
    Ok(Html(html))
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(home))
        .route("/molecules/", get(molecules::page).post(molecules::action))
        .route("/inventory/", get(inventory::page).post(inventory::action))
        .route("/projects/", get(projects::page).post(projects::action))
        .route("/tasks/", get(projects::tasks_page).post(projects::task_action))
        .route("/reactions/", get(reactions::page).post(reactions::action))
        .route(
            "/reactions/{id}/participants",
            get(reactions::participants_page).post(reactions::participant_action),
        )
        .route("/experiments/", get(lims::experiments_page).post(lims::experiment_action))
        .route("/samples/", get(lims::samples_page).post(lims::sample_action))
        .route("/measurements/", get(lims::measurements_page).post(lims::measurement_action))
        .route("/timeseries/", get(timeseries::page).post(timeseries::action))
}

async fn home(State(state): State<SharedState>) -> ApiResult<Html<String>> {
    let stats = state.with_store(|store| store.stats()).await?;
    render(&state, "home.html", context! { title => "Dashboard", active => "/", stats => stats })
}

// ========== Page model ==========

/// Context of `crud.html`
#[derive(Debug, Serialize)]
pub struct CrudPage {
    pub title: &'static str,
    pub active: &'static str,
    /// Where the forms post to
    pub path: String,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    pub forms: Vec<FormSpec>,
    pub status: Option<String>,
    pub preview: Option<Preview>,
    /// Related pages listed under the table
    pub links: Vec<Link>,
}

impl CrudPage {
    pub fn new(title: &'static str, active: &'static str, columns: Vec<&'static str>) -> Self {
        Self {
            title,
            active,
            path: active.to_string(),
            columns,
            rows: Vec::new(),
            forms: Vec::new(),
            status: None,
            preview: None,
            links: Vec::new(),
        }
    }

    pub fn render(self, state: &AppState) -> ApiResult<Html<String>> {
        render(state, "crud.html", Value::from_serialize(&self))
    }
}

#[derive(Debug, Serialize)]
pub struct Link {
    pub href: String,
    pub label: String,
}

/// Highlighted result shown above the table (a depiction, an equation)
#[derive(Debug, Default, Serialize)]
pub struct Preview {
    pub heading: String,
    pub image: Option<String>,
    pub lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FormSpec {
    pub action: &'static str,
    pub title: &'static str,
    pub method: &'static str,
    pub fields: Vec<Field>,
}

impl FormSpec {
    pub fn post(action: &'static str, title: &'static str, fields: Vec<Field>) -> Self {
        Self { action, title, method: "post", fields }
    }

    pub fn get(title: &'static str, fields: Vec<Field>) -> Self {
        Self { action: "", title, method: "get", fields }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
    pub required: bool,
    pub step: Option<&'static str>,
    pub value: Option<String>,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl ToString, label: impl Into<String>) -> Self {
        Self { value: value.to_string(), label: label.into() }
    }
}

impl Field {
    fn new(name: &'static str, label: &'static str, kind: &'static str) -> Self {
        Self { name, label, kind, required: false, step: None, value: None, options: Vec::new() }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, "text")
    }

    pub fn textarea(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, "textarea")
    }

    pub fn integer(name: &'static str, label: &'static str) -> Self {
        Self { step: Some("1"), ..Self::new(name, label, "number") }
    }

    pub fn decimal(name: &'static str, label: &'static str) -> Self {
        Self { step: Some("any"), ..Self::new(name, label, "number") }
    }

    pub fn date(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, "date")
    }

    pub fn datetime(name: &'static str, label: &'static str) -> Self {
        Self { step: Some("1"), ..Self::new(name, label, "datetime-local") }
    }

    pub fn select(name: &'static str, label: &'static str, options: Vec<SelectOption>) -> Self {
        Self { options, ..Self::new(name, label, "select") }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

// ========== Form input ==========

/// Submitted form fields
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn action(&self) -> &str {
        self.0.get("action").map(|s| s.trim()).unwrap_or("")
    }

    /// Trimmed value, `None` when missing or blank
    pub fn text(&self, name: &str) -> Option<String> {
        self.0.get(name).map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
    }

    pub fn required(&self, name: &str) -> Result<String> {
        self.text(name).ok_or_else(|| Error::validation(format!("{name} is required")))
    }

    pub fn parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        match self.text(name) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| Error::validation(format!("{name}: '{raw}' is not a valid value"))),
            None => Ok(None),
        }
    }

    pub fn required_parsed<T: FromStr>(&self, name: &str) -> Result<T> {
        self.parsed(name)?.ok_or_else(|| Error::validation(format!("{name} is required")))
    }

    /// `datetime-local` inputs submit `2025-03-02T10:00`; stored datetimes
    /// use a space and seconds.
    pub fn datetime(&self, name: &str) -> Result<Option<String>> {
        match self.text(name) {
            Some(raw) => {
                let parsed = crate::lims::parse_datetime(&raw)?;
                Ok(Some(parsed.format(crate::lims::DATETIME_FORMAT).to_string()))
            }
            None => Ok(None),
        }
    }
}

/// Status line for the outcome of a form action
pub fn status_line(outcome: ApiResult<String>) -> String {
    match outcome {
        Ok(message) => message,
        Err(err) => format!("Error: {}", err.message),
    }
}

pub(crate) fn unknown_action(action: &str) -> ApiError {
    ApiError::bad_request(format!("unknown action '{action}'"))
}

pub(crate) fn opt_cell<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

use super::{render, status_line, unknown_action, FormFields};
use crate::server::error::{ApiError, ApiResult};
use crate::server::{AppState, SharedState};
use crate::timeseries::{self, export, ExportFormat, MAX_CHART_PARAMETERS};
use axum::extract::State;
use axum::response::Html;
use axum::Form;
use axum_extra::extract::Query;
use minijinja::context;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    #[serde(default)]
    pub experiment_id: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

const FORMATS: [ExportFormat; 4] = [ExportFormat::Csv, ExportFormat::Xml, ExportFormat::Json, ExportFormat::Plotly];

pub async fn page(State(state): State<SharedState>, Query(query): Query<ChartQuery>) -> ApiResult<Html<String>> {
    let selected = match query.experiment_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| ApiError::bad_request(format!("bad experiment_id '{raw}'")))?),
        None => None,
    };
    show(&state, selected, query.parameters, None).await
}

pub async fn action(State(state): State<SharedState>, Form(form): Form<FormFields>) -> ApiResult<Html<String>> {
    let selected = form.parsed::<i64>("experiment_id").ok().flatten();
    let outcome = match form.action() {
        "delete" => delete(&state, &form).await,
        other => Err(unknown_action(other)),
    };
    show(&state, selected, Vec::new(), Some(status_line(outcome))).await
}

async fn delete(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("experiment_id")?;
    let deleted = state
        .with_store(move |store| {
            store.get_experiment(id)?;
            store.delete_points(id)
        })
        .await?;
    Ok(format!("{deleted} data points deleted"))
}

/// JSON for an inline `<script>`; `</` is escaped so data cannot close the
/// script element.
fn script_json(value: &serde_json::Value) -> ApiResult<String> {
    let json = serde_json::to_string(value).map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(json.replace("</", "<\\/"))
}

async fn show(
    state: &AppState,
    selected: Option<i64>,
    parameters: Vec<String>,
    mut status: Option<String>,
) -> ApiResult<Html<String>> {
    let experiments = state.with_store(|store| store.list_timeseries_experiments()).await?;

    let mut series = Vec::new();
    let mut figure = None;
    let mut stats = Vec::new();

    if let Some(id) = selected {
        series = state.with_store(move |store| store.list_series(id)).await?;

        match timeseries::check_chart_selection(&parameters) {
            Ok(()) => {
                let wanted = parameters.clone();
                let (points, statistics) = state
                    .with_store(move |store| Ok((store.get_points(id, &wanted)?, store.statistics(id, &wanted)?)))
                    .await?;
                if points.is_empty() {
                    status.get_or_insert_with(|| "No data points for the selected parameters".to_string());
                } else {
                    figure = Some(script_json(&export::plotly_figure(&points))?);
                }
                stats = statistics;
            }
            Err(crate::Error::Validation(message)) if status.is_none() && !series.is_empty() => {
                status = Some(message)
            }
            Err(_) => {}
        }
    }

    let formats: Vec<&str> = FORMATS.iter().map(|f| f.as_str()).collect();
    render(
        state,
        "timeseries.html",
        context! {
            title => "Time Series",
            active => "/timeseries/",
            status => status,
            experiments => experiments,
            selected => selected,
            series => series,
            parameters => parameters,
            max_parameters => MAX_CHART_PARAMETERS,
            figure => figure,
            stats => stats,
            formats => formats,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_script_json_cannot_close_script() {
        let value = json!({ "name": "</script><script>alert(1)</script>" });
        let out = script_json(&value).unwrap();
        assert!(!out.contains("</script>"));
        assert!(out.contains("<\\/script>"));
    }
}

use super::{opt_cell, status_line, unknown_action, CrudPage, Field, FormFields, FormSpec, SelectOption};
use crate::lims::{ExperimentUpdate, MeasurementUpdate, NewExperiment, NewMeasurement, NewSample, SampleUpdate};
use crate::server::error::ApiResult;
use crate::server::{AppState, SharedState};
use axum::extract::State;
use axum::response::Html;
use axum::Form;

// ========== Experiments ==========

pub async fn experiments_page(State(state): State<SharedState>) -> ApiResult<Html<String>> {
    show_experiments(&state, None).await
}

pub async fn experiment_action(
    State(state): State<SharedState>,
    Form(form): Form<FormFields>,
) -> ApiResult<Html<String>> {
    let outcome = match form.action() {
        "add" => add_experiment(&state, &form).await,
        "update" => update_experiment(&state, &form).await,
        "delete" => delete_experiment(&state, &form).await,
        other => Err(unknown_action(other)),
    };
    show_experiments(&state, Some(status_line(outcome))).await
}

async fn add_experiment(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let experiment = NewExperiment {
        experiment_name: form.required("experiment_name")?,
        description: form.text("description"),
        start_date: form.text("start_date"),
        end_date: form.text("end_date"),
    };
    let id = state.with_store(move |store| store.insert_experiment(&experiment)).await?;
    Ok(format!("Experiment {id} added"))
}

async fn update_experiment(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    let update = ExperimentUpdate {
        experiment_name: form.text("experiment_name"),
        description: form.text("description"),
        start_date: form.text("start_date"),
        end_date: form.text("end_date"),
    };
    state.with_store(move |store| store.update_experiment(id, &update)).await?;
    Ok(format!("Experiment {id} updated"))
}

async fn delete_experiment(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    state.with_store(move |store| store.delete_experiment(id)).await?;
    Ok(format!("Experiment {id} deleted with its samples, measurements and time series"))
}

async fn show_experiments(state: &AppState, status: Option<String>) -> ApiResult<Html<String>> {
    let experiments = state.with_store(|store| store.list_experiments()).await?;

    let mut page = CrudPage::new("Experiments", "/experiments/", vec!["ID", "Name", "Description", "Start", "End"]);
    page.rows = experiments
        .iter()
        .map(|e| {
            vec![
                e.experiment_id.to_string(),
                e.experiment_name.clone(),
                opt_cell(&e.description),
                opt_cell(&e.start_date),
                opt_cell(&e.end_date),
            ]
        })
        .collect();
    page.forms = vec![
        FormSpec::post(
            "add",
            "Add experiment",
            vec![
                Field::text("experiment_name", "Name").required(),
                Field::textarea("description", "Description"),
                Field::date("start_date", "Start date"),
                Field::date("end_date", "End date"),
            ],
        ),
        FormSpec::post(
            "update",
            "Update experiment",
            vec![
                Field::integer("id", "ID").required(),
                Field::text("experiment_name", "New name"),
                Field::textarea("description", "New description"),
                Field::date("start_date", "New start date"),
                Field::date("end_date", "New end date"),
            ],
        ),
        FormSpec::post("delete", "Delete experiment", vec![Field::integer("id", "ID").required()]),
    ];
    page.status = status;
    page.render(state)
}

// ========== Samples ==========

pub async fn samples_page(State(state): State<SharedState>) -> ApiResult<Html<String>> {
    show_samples(&state, None).await
}

pub async fn sample_action(State(state): State<SharedState>, Form(form): Form<FormFields>) -> ApiResult<Html<String>> {
    let outcome = match form.action() {
        "add" => add_sample(&state, &form).await,
        "update" => update_sample(&state, &form).await,
        "delete" => delete_sample(&state, &form).await,
        other => Err(unknown_action(other)),
    };
    show_samples(&state, Some(status_line(outcome))).await
}

async fn add_sample(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let sample = NewSample {
        experiment_id: form.required_parsed("experiment_id")?,
        sample_code: form.required("sample_code")?,
        sample_type: form.text("sample_type"),
        collection_date: form.text("collection_date"),
    };
    let id = state.with_store(move |store| store.insert_sample(&sample)).await?;
    Ok(format!("Sample {id} added"))
}

async fn update_sample(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    let update = SampleUpdate {
        experiment_id: form.parsed("experiment_id")?,
        sample_code: form.text("sample_code"),
        sample_type: form.text("sample_type"),
        collection_date: form.text("collection_date"),
    };
    state.with_store(move |store| store.update_sample(id, &update)).await?;
    Ok(format!("Sample {id} updated"))
}

async fn delete_sample(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    state.with_store(move |store| store.delete_sample(id)).await?;
    Ok(format!("Sample {id} deleted with its measurements"))
}

async fn show_samples(state: &AppState, status: Option<String>) -> ApiResult<Html<String>> {
    let (samples, experiments) =
        state.with_store(|store| Ok((store.list_samples()?, store.list_experiments()?))).await?;
    let experiment_options: Vec<SelectOption> = experiments
        .iter()
        .map(|e| SelectOption::new(e.experiment_id, &e.experiment_name))
        .collect();

    let mut page = CrudPage::new("Samples", "/samples/", vec!["ID", "Code", "Type", "Experiment", "Collected"]);
    page.rows = samples
        .iter()
        .map(|row| {
            let s = &row.sample;
            vec![
                s.sample_id.to_string(),
                s.sample_code.clone(),
                opt_cell(&s.sample_type),
                opt_cell(&row.experiment_name),
                opt_cell(&s.collection_date),
            ]
        })
        .collect();
    page.forms = vec![
        FormSpec::post(
            "add",
            "Add sample",
            vec![
                Field::select("experiment_id", "Experiment", experiment_options.clone()).required(),
                Field::text("sample_code", "Code").required(),
                Field::text("sample_type", "Type"),
                Field::date("collection_date", "Collection date"),
            ],
        ),
        FormSpec::post(
            "update",
            "Update sample",
            vec![
                Field::integer("id", "ID").required(),
                Field::select("experiment_id", "Move to experiment", experiment_options),
                Field::text("sample_code", "New code"),
                Field::text("sample_type", "New type"),
                Field::date("collection_date", "New collection date"),
            ],
        ),
        FormSpec::post("delete", "Delete sample", vec![Field::integer("id", "ID").required()]),
    ];
    page.status = status;
    page.render(state)
}

// ========== Measurements ==========

pub async fn measurements_page(State(state): State<SharedState>) -> ApiResult<Html<String>> {
    show_measurements(&state, None).await
}

pub async fn measurement_action(
    State(state): State<SharedState>,
    Form(form): Form<FormFields>,
) -> ApiResult<Html<String>> {
    let outcome = match form.action() {
        "add" => add_measurement(&state, &form).await,
        "update" => update_measurement(&state, &form).await,
        "delete" => delete_measurement(&state, &form).await,
        other => Err(unknown_action(other)),
    };
    show_measurements(&state, Some(status_line(outcome))).await
}

async fn add_measurement(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let measurement = NewMeasurement {
        sample_id: form.required_parsed("sample_id")?,
        parameter: form.required("parameter")?,
        value: form.required_parsed("value")?,
        unit: form.text("unit"),
        measurement_date: form.datetime("measurement_date")?,
    };
    let id = state.with_store(move |store| store.insert_measurement(&measurement)).await?;
    Ok(format!("Measurement {id} added"))
}

async fn update_measurement(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    let update = MeasurementUpdate {
        sample_id: form.parsed("sample_id")?,
        parameter: form.text("parameter"),
        value: form.parsed("value")?,
        unit: form.text("unit"),
        measurement_date: form.datetime("measurement_date")?,
    };
    state.with_store(move |store| store.update_measurement(id, &update)).await?;
    Ok(format!("Measurement {id} updated"))
}

async fn delete_measurement(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    state.with_store(move |store| store.delete_measurement(id)).await?;
    Ok(format!("Measurement {id} deleted"))
}

async fn show_measurements(state: &AppState, status: Option<String>) -> ApiResult<Html<String>> {
    let (measurements, samples) =
        state.with_store(|store| Ok((store.list_measurements()?, store.list_samples()?))).await?;
    let sample_options: Vec<SelectOption> = samples
        .iter()
        .map(|row| SelectOption::new(row.sample.sample_id, &row.sample.sample_code))
        .collect();

    let mut page = CrudPage::new(
        "Measurements",
        "/measurements/",
        vec!["ID", "Sample", "Experiment", "Parameter", "Value", "Unit", "Measured"],
    );
    page.rows = measurements
        .iter()
        .map(|row| {
            let m = &row.measurement;
            vec![
                m.measurement_id.to_string(),
                opt_cell(&row.sample_code),
                opt_cell(&row.experiment_name),
                m.parameter.clone(),
                m.value.to_string(),
                opt_cell(&m.unit),
                opt_cell(&m.measurement_date),
            ]
        })
        .collect();
    page.forms = vec![
        FormSpec::post(
            "add",
            "Add measurement",
            vec![
                Field::select("sample_id", "Sample", sample_options.clone()).required(),
                Field::text("parameter", "Parameter").required(),
                Field::decimal("value", "Value").required(),
                Field::text("unit", "Unit"),
                Field::datetime("measurement_date", "Measured at"),
            ],
        ),
        FormSpec::post(
            "update",
            "Update measurement",
            vec![
                Field::integer("id", "ID").required(),
                Field::select("sample_id", "Move to sample", sample_options),
                Field::text("parameter", "New parameter"),
                Field::decimal("value", "New value"),
                Field::text("unit", "New unit"),
                Field::datetime("measurement_date", "New measurement time"),
            ],
        ),
        FormSpec::post("delete", "Delete measurement", vec![Field::integer("id", "ID").required()]),
    ];
    page.status = status;
    page.render(state)
}

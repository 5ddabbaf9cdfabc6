use super::{opt_cell, status_line, unknown_action, CrudPage, Field, FormFields, FormSpec, Preview};
use crate::chem::{self, formula};
use crate::molecule::{MoleculeImage, MoleculeUpdate, NewMolecule};
use crate::server::error::ApiResult;
use crate::server::{AppState, SharedState};
use axum::extract::{Query, State};
use axum::response::Html;
use axum::Form;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

pub async fn page(State(state): State<SharedState>, Query(query): Query<SearchQuery>) -> ApiResult<Html<String>> {
    let q = query.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty());
    show(&state, q, None, None).await
}

pub async fn action(State(state): State<SharedState>, Form(form): Form<FormFields>) -> ApiResult<Html<String>> {
    let mut preview = None;
    let outcome = match form.action() {
        "add" => add(&state, &form).await,
        "update" => update(&state, &form).await,
        "delete" => delete(&state, &form).await,
        "render" => match depict(&state, &form).await {
            Ok(image) => {
                let message = format!("{} ({:.2} g/mol)", image.formula, image.molecular_weight);
                preview = Some(Preview {
                    heading: image.smiles.clone(),
                    image: Some(image.image),
                    lines: vec![format!("Formula: {}", image.formula)],
                });
                Ok(message)
            }
            Err(e) => Err(e),
        },
        other => Err(unknown_action(other)),
    };
    show(&state, None, Some(status_line(outcome)), preview).await
}

async fn add(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let molecule = NewMolecule { name: form.required("name")?, smiles: form.text("smiles") };
    let id = state.with_store(move |store| store.insert_molecule(&molecule)).await?;
    Ok(format!("Molecule {id} added"))
}

async fn update(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    let update = MoleculeUpdate { name: form.text("name"), smiles: form.text("smiles") };
    state.with_store(move |store| store.update_molecule(id, &update)).await?;
    Ok(format!("Molecule {id} updated"))
}

async fn delete(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    state.with_store(move |store| store.delete_molecule(id)).await?;
    Ok(format!("Molecule {id} deleted"))
}

/// Depict a stored molecule by id, or a SMILES string typed into the form
async fn depict(state: &AppState, form: &FormFields) -> ApiResult<MoleculeImage> {
    if let Some(smiles) = form.text("smiles") {
        let graph = chem::smiles::parse(&smiles).map_err(crate::Error::from)?;
        return Ok(MoleculeImage::from_graph(None, smiles, &graph));
    }
    let id: i64 = form.required_parsed("id")?;
    let molecule = state.with_store(move |store| store.get_molecule(id)).await?;
    Ok(molecule.depict()?)
}

async fn show(
    state: &AppState,
    q: Option<String>,
    status: Option<String>,
    preview: Option<Preview>,
) -> ApiResult<Html<String>> {
    let search = q.clone();
    let molecules = state
        .with_store(move |store| match search.as_deref() {
            Some(q) => store.search_molecules(q),
            None => store.list_molecules(),
        })
        .await?;

    let mut page =
        CrudPage::new("Molecules", "/molecules/", vec!["ID", "Name", "SMILES", "Formula", "MW (g/mol)"]);
    page.rows = molecules
        .iter()
        .map(|m| {
            let (hill, weight) = match m.graph() {
                Ok(graph) => (formula::hill_formula(&graph), format!("{:.2}", formula::molecular_weight(&graph))),
                Err(_) => (String::new(), String::new()),
            };
            vec![m.id.to_string(), m.name.clone(), opt_cell(&m.smiles), hill, weight]
        })
        .collect();
    page.forms = vec![
        FormSpec::get("Search", vec![Field::text("q", "Name contains").value(q.unwrap_or_default())]),
        FormSpec::post("add", "Add molecule", vec![Field::text("name", "Name").required(), Field::text("smiles", "SMILES")]),
        FormSpec::post(
            "update",
            "Update molecule",
            vec![Field::integer("id", "ID").required(), Field::text("name", "New name"), Field::text("smiles", "New SMILES")],
        ),
        FormSpec::post("delete", "Delete molecule", vec![Field::integer("id", "ID").required()]),
        FormSpec::post("render", "Render structure", vec![Field::integer("id", "ID"), Field::text("smiles", "or SMILES")]),
    ];
    page.status = status;
    page.preview = preview;
    page.render(state)
}

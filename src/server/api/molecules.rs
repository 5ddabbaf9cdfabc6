use super::{ApiJson, ApiPath, ApiQuery, created, message, SearchParams};
use crate::chem;
use crate::molecule::{Molecule, MoleculeImage, MoleculeUpdate, NewMolecule};
use crate::server::error::{ApiError, ApiResult};
use crate::server::SharedState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub struct RenderParams {
    pub smiles: String,
}

pub async fn list(State(state): State<SharedState>) -> ApiResult<Json<Vec<Molecule>>> {
    Ok(Json(state.with_store(|store| store.list_molecules()).await?))
}

pub async fn search(
    State(state): State<SharedState>,
    WithRejection(Query(params), _): ApiQuery<SearchParams>,
) -> ApiResult<Json<Vec<Molecule>>> {
    Ok(Json(state.with_store(move |store| store.search_molecules(&params.q)).await?))
}

pub async fn get_one(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Molecule>> {
    Ok(Json(state.with_store(move |store| store.get_molecule(id)).await?))
}

pub async fn create(
    State(state): State<SharedState>,
    WithRejection(Json(molecule), _): ApiJson<NewMolecule>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.with_store(move |store| store.insert_molecule(&molecule)).await?;
    Ok(created("Molecule added", id))
}

pub async fn update(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Json(update), _): ApiJson<MoleculeUpdate>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.update_molecule(id, &update)).await?;
    Ok(message("Molecule updated"))
}

pub async fn remove(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.delete_molecule(id)).await?;
    Ok(message("Molecule deleted"))
}

/// Depiction of a stored molecule
pub async fn image(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<MoleculeImage>> {
    let molecule = state.with_store(move |store| store.get_molecule(id)).await?;
    let image = molecule.depict().map_err(ApiError::unprocessable)?;
    Ok(Json(image))
}

/// Depiction of an ad-hoc SMILES string
pub async fn render(WithRejection(Query(params), _): ApiQuery<RenderParams>) -> ApiResult<Json<MoleculeImage>> {
    let smiles = params.smiles.trim().to_string();
    if smiles.is_empty() {
        return Err(ApiError::bad_request("smiles must not be empty"));
    }
    let graph = chem::smiles::parse(&smiles).map_err(|e| ApiError::unprocessable(e.into()))?;
    Ok(Json(MoleculeImage::from_graph(None, smiles, &graph)))
}

use super::{ApiJson, ApiPath, created, message};
use crate::reaction::{
    NewParticipant, NewReaction, ParticipantRole, ParticipantUpdate, Reaction, ReactionOverview,
    ReactionParticipant, ReactionUpdate,
};
use crate::server::error::ApiResult;
use crate::server::SharedState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

pub async fn list(State(state): State<SharedState>) -> ApiResult<Json<Vec<Reaction>>> {
    Ok(Json(state.with_store(|store| store.list_reactions()).await?))
}

pub async fn get_one(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Reaction>> {
    Ok(Json(state.with_store(move |store| store.get_reaction(id)).await?))
}

pub async fn create(
    State(state): State<SharedState>,
    WithRejection(Json(reaction), _): ApiJson<NewReaction>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.with_store(move |store| store.insert_reaction(&reaction)).await?;
    Ok(created("Reaction added", id))
}

pub async fn update(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Json(update), _): ApiJson<ReactionUpdate>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.update_reaction(id, &update)).await?;
    Ok(message("Reaction updated"))
}

pub async fn remove(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    state.with_store(move |store| store.delete_reaction(id)).await?;
    Ok(message("Reaction and its participants deleted"))
}

pub async fn participants(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<Vec<ReactionParticipant>>> {
    let participants = state
        .with_store(move |store| {
            store.get_reaction(id)?;
            store.list_participants(id)
        })
        .await?;
    Ok(Json(participants))
}

pub async fn add_participant(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
    WithRejection(Json(participant), _): ApiJson<NewParticipant>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let molecule_id = participant.molecule_id;
    let role = participant.role;
    state.with_store(move |store| store.insert_participant(id, &participant)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Participant added",
            "reaction_id": id,
            "molecule_id": molecule_id,
            "role": role,
        })),
    ))
}

pub async fn overview(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): ApiPath<i64>,
) -> ApiResult<Json<ReactionOverview>> {
    Ok(Json(state.with_store(move |store| store.reaction_overview(id)).await?))
}

pub async fn update_participant(
    State(state): State<SharedState>,
    WithRejection(Path((reaction_id, molecule_id, role)), _): ApiPath<(i64, i64, String)>,
    WithRejection(Json(update), _): ApiJson<ParticipantUpdate>,
) -> ApiResult<Json<Value>> {
    let role: ParticipantRole = role.parse()?;
    state
        .with_store(move |store| store.update_participant(reaction_id, molecule_id, role, &update))
        .await?;
    Ok(message("Participant updated"))
}

pub async fn remove_participant(
    State(state): State<SharedState>,
    WithRejection(Path((reaction_id, molecule_id, role)), _): ApiPath<(i64, i64, String)>,
) -> ApiResult<Json<Value>> {
    let role: ParticipantRole = role.parse()?;
    state.with_store(move |store| store.delete_participant(reaction_id, molecule_id, role)).await?;
    Ok(message("Participant deleted"))
}

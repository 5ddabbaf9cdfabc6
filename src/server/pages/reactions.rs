use super::{opt_cell, status_line, unknown_action, CrudPage, Field, FormFields, FormSpec, Link, Preview, SelectOption};
use crate::reaction::{NewParticipant, NewReaction, ParticipantRole, ParticipantUpdate, ReactionUpdate};
use crate::server::error::ApiResult;
use crate::server::{AppState, SharedState};
use axum::extract::{Path, State};
use axum::response::Html;
use axum::Form;

// ========== Reactions ==========

pub async fn page(State(state): State<SharedState>) -> ApiResult<Html<String>> {
    show_reactions(&state, None).await
}

pub async fn action(State(state): State<SharedState>, Form(form): Form<FormFields>) -> ApiResult<Html<String>> {
    let outcome = match form.action() {
        "add" => add_reaction(&state, &form).await,
        "update" => update_reaction(&state, &form).await,
        "delete" => delete_reaction(&state, &form).await,
        other => Err(unknown_action(other)),
    };
    show_reactions(&state, Some(status_line(outcome))).await
}

async fn add_reaction(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let reaction = NewReaction { name: form.required("name")?, description: form.text("description") };
    let id = state.with_store(move |store| store.insert_reaction(&reaction)).await?;
    Ok(format!("Reaction {id} added"))
}

async fn update_reaction(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    let update = ReactionUpdate { name: form.text("name"), description: form.text("description") };
    state.with_store(move |store| store.update_reaction(id, &update)).await?;
    Ok(format!("Reaction {id} updated"))
}

async fn delete_reaction(state: &AppState, form: &FormFields) -> ApiResult<String> {
    let id: i64 = form.required_parsed("id")?;
    state.with_store(move |store| store.delete_reaction(id)).await?;
    Ok(format!("Reaction {id} and its participants deleted"))
}

async fn show_reactions(state: &AppState, status: Option<String>) -> ApiResult<Html<String>> {
    let reactions = state.with_store(|store| store.list_reactions()).await?;

    let mut page = CrudPage::new("Reactions", "/reactions/", vec!["ID", "Name", "Description"]);
    page.rows = reactions
        .iter()
        .map(|r| vec![r.id.to_string(), opt_cell(&r.name), opt_cell(&r.description)])
        .collect();
    page.links = reactions
        .iter()
        .map(|r| Link {
            href: format!("/reactions/{}/participants", r.id),
            label: format!("Participants of {}", r.name.as_deref().unwrap_or("reaction")),
        })
        .collect();
    page.forms = vec![
        FormSpec::post(
            "add",
            "Add reaction",
            vec![Field::text("name", "Name").required(), Field::textarea("description", "Description")],
        ),
        FormSpec::post(
            "update",
            "Update reaction",
            vec![
                Field::integer("id", "ID").required(),
                Field::text("name", "New name"),
                Field::textarea("description", "New description"),
            ],
        ),
        FormSpec::post("delete", "Delete reaction", vec![Field::integer("id", "ID").required()]),
    ];
    page.status = status;
    page.render(state)
}

// ========== Participants ==========

pub async fn participants_page(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Html<String>> {
    show_participants(&state, id, None).await
}

pub async fn participant_action(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<FormFields>,
) -> ApiResult<Html<String>> {
    let outcome = match form.action() {
        "add" => add_participant(&state, id, &form).await,
        "update" => update_participant(&state, id, &form).await,
        "delete" => delete_participant(&state, id, &form).await,
        other => Err(unknown_action(other)),
    };
    show_participants(&state, id, Some(status_line(outcome))).await
}

async fn add_participant(state: &AppState, reaction_id: i64, form: &FormFields) -> ApiResult<String> {
    let participant = NewParticipant {
        molecule_id: form.required_parsed("molecule_id")?,
        role: form.required_parsed("role")?,
        stoichiometric_coefficient: form.parsed("coefficient")?.unwrap_or(1.0),
    };
    state.with_store(move |store| store.insert_participant(reaction_id, &participant)).await?;
    Ok("Participant added".to_string())
}

async fn update_participant(state: &AppState, reaction_id: i64, form: &FormFields) -> ApiResult<String> {
    let molecule_id: i64 = form.required_parsed("molecule_id")?;
    let role: ParticipantRole = form.required_parsed("role")?;
    let update = ParticipantUpdate {
        stoichiometric_coefficient: form.required_parsed("coefficient")?,
        molecule_id: form.parsed("new_molecule_id")?,
        role: form.parsed("new_role")?,
    };
    state
        .with_store(move |store| store.update_participant(reaction_id, molecule_id, role, &update))
        .await?;
    Ok("Participant updated".to_string())
}

async fn delete_participant(state: &AppState, reaction_id: i64, form: &FormFields) -> ApiResult<String> {
    let molecule_id: i64 = form.required_parsed("molecule_id")?;
    let role: ParticipantRole = form.required_parsed("role")?;
    state.with_store(move |store| store.delete_participant(reaction_id, molecule_id, role)).await?;
    Ok("Participant deleted".to_string())
}

async fn show_participants(state: &AppState, reaction_id: i64, status: Option<String>) -> ApiResult<Html<String>> {
    let (overview, molecules) = state
        .with_store(move |store| Ok((store.reaction_overview(reaction_id)?, store.list_molecules()?)))
        .await?;

    let molecule_options: Vec<SelectOption> =
        molecules.iter().map(|m| SelectOption::new(m.id, format!("{} ({})", m.name, m.id))).collect();
    let role_options: Vec<SelectOption> =
        ParticipantRole::all().iter().map(|r| SelectOption::new(r, r.as_str())).collect();

    let mut page = CrudPage::new(
        "Reaction Participants",
        "/reactions/",
        vec!["Molecule ID", "Name", "SMILES", "Role", "Coefficient"],
    );
    page.path = format!("/reactions/{reaction_id}/participants");
    page.rows = overview
        .reactants
        .iter()
        .chain(&overview.products)
        .chain(&overview.conditions)
        .map(|e| {
            vec![e.molecule_id.to_string(), e.name.clone(), opt_cell(&e.smiles), e.role.to_string(), e.coefficient.to_string()]
        })
        .collect();

    let mut lines = vec![overview.equation.clone()];
    if let Some(description) = overview.reaction.description.as_deref() {
        lines.push(description.to_string());
    }
    page.preview = Some(Preview {
        heading: overview.reaction.name.clone().unwrap_or_else(|| format!("Reaction {reaction_id}")),
        image: None,
        lines,
    });
    page.links = vec![Link { href: "/reactions/".into(), label: "All reactions".into() }];

    page.forms = vec![
        FormSpec::post(
            "add",
            "Add participant",
            vec![
                Field::select("molecule_id", "Molecule", molecule_options.clone()).required(),
                Field::select("role", "Role", role_options.clone()).required(),
                Field::decimal("coefficient", "Coefficient").value("1"),
            ],
        ),
        FormSpec::post(
            "update",
            "Update participant",
            vec![
                Field::select("molecule_id", "Molecule", molecule_options.clone()).required(),
                Field::select("role", "Role", role_options.clone()).required(),
                Field::decimal("coefficient", "New coefficient").required(),
                Field::select("new_molecule_id", "Replace molecule", molecule_options.clone()),
                Field::select("new_role", "Change role", role_options.clone()),
            ],
        ),
        FormSpec::post(
            "delete",
            "Remove participant",
            vec![
                Field::select("molecule_id", "Molecule", molecule_options).required(),
                Field::select("role", "Role", role_options).required(),
            ],
        ),
    ];
    page.status = status;
    page.render(state)
}

use std::collections::HashSet;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use famdash_shared::api::{
    AssignmentsReq, ChoreCompletionDto, ChoreDto, ChoreReq, ChoreTodayDto, MemberActionReq,
    UndoDto,
};
use serde::Deserialize;
use tracing::info;

use super::error::ApiJson;
use super::members::require_member;
use super::validate::{Validator, clean};
use super::{AppError, AppState, rfc3339};
use crate::storage::models::ChoreCompletion;
use crate::storage::{AssignedChore, ChoreFields, Once, UndoOutcome};

fn to_chore_dto(c: AssignedChore) -> ChoreDto {
    ChoreDto {
        id: c.chore.id,
        name: c.chore.name,
        description: c.chore.description,
        points: c.chore.points,
        active: c.chore.active,
        assigned_member_ids: c.member_ids,
    }
}

fn to_completion_dto(c: ChoreCompletion) -> ChoreCompletionDto {
    ChoreCompletionDto {
        id: c.id,
        chore_id: c.chore_id,
        member_id: c.member_id,
        completed_on: c.completed_on.to_string(),
        completed_at: rfc3339(c.completed_at),
        points_awarded: c.points_awarded,
    }
}

fn chore_fields(body: ChoreReq) -> Result<ChoreFields, AppError> {
    Validator::new()
        .non_empty("name", &body.name)
        .range("points", body.points, 0, 10_000)
        .finish()?;
    Ok(ChoreFields {
        name: body.name.trim().to_string(),
        description: clean(body.description),
        points: body.points,
        active: body.active.unwrap_or(true),
    })
}

async fn require_chore(state: &AppState, id: i32) -> Result<AssignedChore, AppError> {
    state
        .store
        .get_chore(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("chore not found: {id}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChoreQuery {
    #[serde(default)]
    include_inactive: bool,
}

pub(super) async fn api_list_chores(
    State(state): State<AppState>,
    Query(q): Query<ChoreQuery>,
) -> Result<Json<Vec<ChoreDto>>, AppError> {
    let rows = state.store.list_chores(q.include_inactive).await?;
    Ok(Json(rows.into_iter().map(to_chore_dto).collect()))
}

pub(super) async fn api_get_chore(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ChoreDto>, AppError> {
    Ok(Json(to_chore_dto(require_chore(&state, id).await?)))
}

pub(super) async fn api_create_chore(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChoreReq>,
) -> Result<(StatusCode, Json<ChoreDto>), AppError> {
    let chore = state.store.create_chore(chore_fields(body)?).await?;
    info!(chore_id = chore.chore.id, "chore created");
    Ok((StatusCode::CREATED, Json(to_chore_dto(chore))))
}

pub(super) async fn api_update_chore(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<ChoreReq>,
) -> Result<Json<ChoreDto>, AppError> {
    let chore = state
        .store
        .update_chore(id, chore_fields(body)?)
        .await?
        .ok_or_else(|| AppError::not_found(format!("chore not found: {id}")))?;
    Ok(Json(to_chore_dto(chore)))
}

pub(super) async fn api_delete_chore(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_chore(id).await? {
        return Err(AppError::not_found(format!("chore not found: {id}")));
    }
    info!(chore_id = id, "chore deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn api_set_assignments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<AssignmentsReq>,
) -> Result<Json<ChoreDto>, AppError> {
    let mut chore = require_chore(&state, id).await?;
    let known: HashSet<i32> = state
        .store
        .list_members()
        .await?
        .into_iter()
        .map(|m| m.id)
        .collect();
    if let Some(missing) = body.member_ids.iter().find(|m| !known.contains(m)) {
        return Err(AppError::not_found(format!("member not found: {missing}")));
    }
    chore.member_ids = state.store.set_assignments(id, body.member_ids).await?;
    info!(chore_id = id, assigned = chore.member_ids.len(), "chore assignments replaced");
    Ok(Json(to_chore_dto(chore)))
}

/// Active chores with today's completion, in the household time zone.
pub(super) async fn api_chores_today(
    State(state): State<AppState>,
) -> Result<Json<Vec<ChoreTodayDto>>, AppError> {
    let rows = state.store.chores_for_day(state.today()).await?;
    Ok(Json(
        rows.into_iter()
            .map(|(chore, done)| ChoreTodayDto {
                chore: to_chore_dto(chore),
                completion: done.map(to_completion_dto),
            })
            .collect(),
    ))
}

pub(super) async fn api_complete_chore(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<MemberActionReq>,
) -> Result<(StatusCode, Json<ChoreCompletionDto>), AppError> {
    let chore = require_chore(&state, id).await?;
    if !chore.chore.active {
        return Err(AppError::bad_request("chore is not active"));
    }
    require_member(&state, body.member_id).await?;
    if !chore.member_ids.is_empty() && !chore.member_ids.contains(&body.member_id) {
        return Err(AppError::forbidden("member is not assigned to this chore"));
    }
    let today = state.today();
    match state.store.complete_chore(id, body.member_id, today).await? {
        Once::Recorded(row) => {
            info!(
                chore_id = id,
                member_id = body.member_id,
                points = row.points_awarded,
                "chore completed"
            );
            Ok((StatusCode::CREATED, Json(to_completion_dto(row))))
        }
        Once::AlreadyDone => Err(AppError::conflict("chore already completed today")),
    }
}

pub(super) async fn api_undo_chore(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<MemberActionReq>,
) -> Result<Json<UndoDto>, AppError> {
    require_chore(&state, id).await?;
    require_member(&state, body.member_id).await?;
    match state
        .store
        .undo_chore(id, body.member_id, state.today())
        .await?
    {
        UndoOutcome::Reverted { points, balance } => {
            info!(chore_id = id, member_id = body.member_id, points, "chore completion undone");
            Ok(Json(UndoDto {
                points_reverted: points,
                balance,
            }))
        }
        UndoOutcome::NothingToUndo => Err(AppError::not_found(
            "no completion of this chore by this member today",
        )),
        UndoOutcome::Insufficient { balance, required } => {
            Err(AppError::InsufficientPoints { balance, required })
        }
    }
}

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use famdash_shared::api::{HabitDto, HabitLogDto, HabitReq, MemberActionReq, UndoDto};
use serde::Deserialize;
use tracing::info;

use super::error::ApiJson;
use super::members::require_member;
use super::validate::Validator;
use super::{AppError, AppState, rfc3339};
use crate::storage::models::{Habit, HabitLog};
use crate::storage::{HabitFields, Once, UndoOutcome};

fn to_habit_dto(h: Habit) -> HabitDto {
    HabitDto {
        id: h.id,
        name: h.name,
        points: h.points,
        member_id: h.member_id,
        active: h.active,
    }
}

fn to_log_dto(l: HabitLog) -> HabitLogDto {
    HabitLogDto {
        id: l.id,
        habit_id: l.habit_id,
        member_id: l.member_id,
        logged_on: l.logged_on.to_string(),
        created_at: rfc3339(l.created_at),
    }
}

async fn habit_fields(state: &AppState, body: HabitReq) -> Result<HabitFields, AppError> {
    Validator::new()
        .non_empty("name", &body.name)
        .range("points", body.points, 0, 10_000)
        .finish()?;
    if let Some(m) = body.member_id {
        require_member(state, m).await?;
    }
    Ok(HabitFields {
        name: body.name.trim().to_string(),
        points: body.points,
        member_id: body.member_id,
        active: body.active.unwrap_or(true),
    })
}

async fn require_habit(state: &AppState, id: i32) -> Result<Habit, AppError> {
    state
        .store
        .get_habit(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("habit not found: {id}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct HabitQuery {
    member_id: Option<i32>,
}

pub(super) async fn api_list_habits(
    State(state): State<AppState>,
    Query(q): Query<HabitQuery>,
) -> Result<Json<Vec<HabitDto>>, AppError> {
    let rows = state.store.list_habits(q.member_id).await?;
    Ok(Json(rows.into_iter().map(to_habit_dto).collect()))
}

pub(super) async fn api_get_habit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<HabitDto>, AppError> {
    Ok(Json(to_habit_dto(require_habit(&state, id).await?)))
}

pub(super) async fn api_create_habit(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<HabitReq>,
) -> Result<(StatusCode, Json<HabitDto>), AppError> {
    let fields = habit_fields(&state, body).await?;
    let habit = state.store.create_habit(fields).await?;
    info!(habit_id = habit.id, "habit created");
    Ok((StatusCode::CREATED, Json(to_habit_dto(habit))))
}

pub(super) async fn api_update_habit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<HabitReq>,
) -> Result<Json<HabitDto>, AppError> {
    let fields = habit_fields(&state, body).await?;
    let habit = state
        .store
        .update_habit(id, fields)
        .await?
        .ok_or_else(|| AppError::not_found(format!("habit not found: {id}")))?;
    Ok(Json(to_habit_dto(habit)))
}

pub(super) async fn api_delete_habit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_habit(id).await? {
        return Err(AppError::not_found(format!("habit not found: {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn api_log_habit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<MemberActionReq>,
) -> Result<(StatusCode, Json<HabitLogDto>), AppError> {
    let habit = require_habit(&state, id).await?;
    if !habit.active {
        return Err(AppError::bad_request("habit is not active"));
    }
    require_member(&state, body.member_id).await?;
    if habit.member_id.is_some_and(|owner| owner != body.member_id) {
        return Err(AppError::forbidden("habit belongs to another member"));
    }
    match state
        .store
        .log_habit(id, body.member_id, state.today())
        .await?
    {
        Once::Recorded(row) => {
            info!(habit_id = id, member_id = body.member_id, points = row.points_awarded, "habit logged");
            Ok((StatusCode::CREATED, Json(to_log_dto(row))))
        }
        Once::AlreadyDone => Err(AppError::conflict("habit already logged today")),
    }
}

pub(super) async fn api_undo_habit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<MemberActionReq>,
) -> Result<Json<UndoDto>, AppError> {
    require_habit(&state, id).await?;
    require_member(&state, body.member_id).await?;
    match state
        .store
        .undo_habit(id, body.member_id, state.today())
        .await?
    {
        UndoOutcome::Reverted { points, balance } => {
            info!(habit_id = id, member_id = body.member_id, points, "habit log undone");
            Ok(Json(UndoDto {
                points_reverted: points,
                balance,
            }))
        }
        UndoOutcome::NothingToUndo => Err(AppError::not_found("habit is not logged today")),
        UndoOutcome::Insufficient { balance, required } => {
            Err(AppError::InsufficientPoints { balance, required })
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LogQuery {
    member_id: Option<i32>,
    limit: Option<i64>,
}

pub(super) async fn api_habit_logs(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(q): Query<LogQuery>,
) -> Result<Json<Vec<HabitLogDto>>, AppError> {
    require_habit(&state, id).await?;
    let limit = q.limit.unwrap_or(30).clamp(1, 365);
    let rows = state.store.list_habit_logs(id, q.member_id, limit).await?;
    Ok(Json(rows.into_iter().map(to_log_dto).collect()))
}

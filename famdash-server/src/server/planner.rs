//! Weekly schedule and task list handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use famdash_shared::api::{
    ScheduleItemDto, ScheduleItemReq, TaskDto, TaskReq, TaskUpdateReq,
};
use serde::Deserialize;
use tracing::info;

use super::error::ApiJson;
use super::members::require_member;
use super::validate::{Validator, clean, parse_date, parse_hhmm};
use super::{AppError, AppState, rfc3339};
use crate::storage::models::{ScheduleItem, Task};
use crate::storage::{ScheduleFields, TaskUpdate};

fn to_schedule_dto(s: ScheduleItem) -> ScheduleItemDto {
    ScheduleItemDto {
        id: s.id,
        title: s.title,
        member_id: s.member_id,
        day_of_week: s.day_of_week,
        start_time: s.start_time,
        end_time: s.end_time,
    }
}

fn to_task_dto(t: Task) -> TaskDto {
    TaskDto {
        id: t.id,
        title: t.title,
        member_id: t.member_id,
        due_date: t.due_date.map(|d| d.to_string()),
        done: t.done,
        created_at: rfc3339(t.created_at),
    }
}

async fn schedule_fields(state: &AppState, body: ScheduleItemReq) -> Result<ScheduleFields, AppError> {
    let start = parse_hhmm(&body.start_time);
    let end_time = clean(body.end_time);
    let end = end_time.as_deref().map(parse_hhmm);

    let mut v = Validator::new();
    v.non_empty("title", &body.title);
    v.range("dayOfWeek", body.day_of_week, 0, 6);
    v.check(start.is_some(), "startTime", "must be HH:MM");
    match (start, end) {
        (_, Some(None)) => {
            v.check(false, "endTime", "must be HH:MM");
        }
        (Some(s), Some(Some(e))) => {
            v.check(e > s, "endTime", "must be after startTime");
        }
        _ => {}
    }
    v.finish()?;

    if let Some(m) = body.member_id {
        require_member(state, m).await?;
    }
    Ok(ScheduleFields {
        title: body.title.trim().to_string(),
        member_id: body.member_id,
        day_of_week: body.day_of_week,
        start_time: body.start_time,
        end_time,
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct ScheduleQuery {
    day: Option<i32>,
}

pub(super) async fn api_list_schedule(
    State(state): State<AppState>,
    Query(q): Query<ScheduleQuery>,
) -> Result<Json<Vec<ScheduleItemDto>>, AppError> {
    let rows = state.store.list_schedule(q.day).await?;
    Ok(Json(rows.into_iter().map(to_schedule_dto).collect()))
}

pub(super) async fn api_create_schedule_item(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ScheduleItemReq>,
) -> Result<(StatusCode, Json<ScheduleItemDto>), AppError> {
    let fields = schedule_fields(&state, body).await?;
    let item = state.store.create_schedule_item(fields).await?;
    info!(item_id = item.id, day = item.day_of_week, "schedule item created");
    Ok((StatusCode::CREATED, Json(to_schedule_dto(item))))
}

pub(super) async fn api_update_schedule_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<ScheduleItemReq>,
) -> Result<Json<ScheduleItemDto>, AppError> {
    let fields = schedule_fields(&state, body).await?;
    let item = state
        .store
        .update_schedule_item(id, fields)
        .await?
        .ok_or_else(|| AppError::not_found(format!("schedule item not found: {id}")))?;
    Ok(Json(to_schedule_dto(item)))
}

pub(super) async fn api_delete_schedule_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_schedule_item(id).await? {
        return Err(AppError::not_found(format!("schedule item not found: {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TaskQuery {
    #[serde(default)]
    include_done: bool,
}

pub(super) async fn api_list_tasks(
    State(state): State<AppState>,
    Query(q): Query<TaskQuery>,
) -> Result<Json<Vec<TaskDto>>, AppError> {
    let rows = state.store.list_tasks(q.include_done).await?;
    Ok(Json(rows.into_iter().map(to_task_dto).collect()))
}

pub(super) async fn api_create_task(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TaskReq>,
) -> Result<(StatusCode, Json<TaskDto>), AppError> {
    let due_raw = clean(body.due_date);
    let due_date = due_raw.as_deref().map(parse_date);
    let mut v = Validator::new();
    v.non_empty("title", &body.title);
    v.check(!matches!(due_date, Some(None)), "dueDate", "must be YYYY-MM-DD");
    v.finish()?;
    if let Some(m) = body.member_id {
        require_member(&state, m).await?;
    }
    let task = state
        .store
        .create_task(body.title.trim().to_string(), body.member_id, due_date.flatten())
        .await?;
    info!(task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(to_task_dto(task))))
}

/// Rename and/or toggle done.
pub(super) async fn api_update_task(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<TaskUpdateReq>,
) -> Result<Json<TaskDto>, AppError> {
    if let Some(title) = &body.title {
        Validator::new().non_empty("title", title).finish()?;
    }
    let update = TaskUpdate {
        title: body.title.map(|t| t.trim().to_string()),
        done: body.done,
    };
    let task = state
        .store
        .update_task(id, update)
        .await?
        .ok_or_else(|| AppError::not_found(format!("task not found: {id}")))?;
    Ok(Json(to_task_dto(task)))
}

pub(super) async fn api_delete_task(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_task(id).await? {
        return Err(AppError::not_found(format!("task not found: {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use famdash_shared::api::{RewardDto, RewardReq};
use serde::Deserialize;
use tracing::info;

use super::error::ApiJson;
use super::validate::{Validator, clean};
use super::{AppError, AppState};
use crate::storage::RewardFields;
use crate::storage::models::Reward;

pub(super) fn to_reward_dto(r: Reward) -> RewardDto {
    RewardDto {
        id: r.id,
        name: r.name,
        description: r.description,
        points_cost: r.points_cost,
        active: r.active,
        is_cash_reward: r.is_cash_reward,
        cash_value: r.cash_value,
    }
}

fn reward_fields(body: RewardReq) -> Result<RewardFields, AppError> {
    let mut v = Validator::new();
    v.non_empty("name", &body.name);
    v.check(body.points_cost > 0, "pointsCost", "must be positive");
    if body.is_cash_reward {
        v.check(
            body.cash_value.is_some_and(|c| c > 0),
            "cashValue",
            "cash rewards need a positive cash value",
        );
    }
    v.finish()?;
    Ok(RewardFields {
        name: body.name.trim().to_string(),
        description: clean(body.description),
        points_cost: body.points_cost,
        active: body.active.unwrap_or(true),
        is_cash_reward: body.is_cash_reward,
        cash_value: body.cash_value.filter(|_| body.is_cash_reward),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RewardQuery {
    #[serde(default)]
    include_inactive: bool,
}

pub(super) async fn api_list_rewards(
    State(state): State<AppState>,
    Query(q): Query<RewardQuery>,
) -> Result<Json<Vec<RewardDto>>, AppError> {
    let rows = state.store.list_rewards(q.include_inactive).await?;
    Ok(Json(rows.into_iter().map(to_reward_dto).collect()))
}

pub(super) async fn api_get_reward(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RewardDto>, AppError> {
    let reward = state
        .store
        .get_reward(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("reward not found: {id}")))?;
    Ok(Json(to_reward_dto(reward)))
}

pub(super) async fn api_create_reward(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RewardReq>,
) -> Result<(StatusCode, Json<RewardDto>), AppError> {
    let reward = state.store.create_reward(reward_fields(body)?).await?;
    info!(reward_id = reward.id, cost = reward.points_cost, "reward created");
    Ok((StatusCode::CREATED, Json(to_reward_dto(reward))))
}

pub(super) async fn api_update_reward(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<RewardReq>,
) -> Result<Json<RewardDto>, AppError> {
    let reward = state
        .store
        .update_reward(id, reward_fields(body)?)
        .await?
        .ok_or_else(|| AppError::not_found(format!("reward not found: {id}")))?;
    Ok(Json(to_reward_dto(reward)))
}

/// Archive; redemption history keeps pointing at the row.
pub(super) async fn api_delete_reward(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.store.archive_reward(id).await? {
        return Err(AppError::not_found(format!("reward not found: {id}")));
    }
    info!(reward_id = id, "reward archived");
    Ok(StatusCode::NO_CONTENT)
}

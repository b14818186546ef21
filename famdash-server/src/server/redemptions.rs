use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use famdash_shared::api::{RedemptionDecisionReq, RedemptionDto, RedemptionRequestReq};
use famdash_shared::domain::{MemberRole, RedemptionStatus};
use serde::Deserialize;
use tracing::info;

use super::error::ApiJson;
use super::members::{member_role, require_member};
use super::settings::HouseholdSettings;
use super::validate::clean;
use super::{AppError, AppState, rfc3339};
use crate::storage::models::Redemption;
use crate::storage::{Decision, RequestOutcome};

fn to_redemption_dto(r: Redemption) -> Result<RedemptionDto, AppError> {
    Ok(RedemptionDto {
        status: r.status.parse().map_err(AppError::internal)?,
        id: r.id,
        reward_id: r.reward_id,
        requester_id: r.requester_id,
        points_spent: r.points_spent,
        approver_id: r.approver_id,
        denial_reason: r.denial_reason,
        requested_at: rfc3339(r.requested_at),
        decided_at: r.decided_at.map(rfc3339),
    })
}

/// A child asks to spend points on a reward. Creates a PENDING request.
pub(super) async fn api_request_redemption(
    State(state): State<AppState>,
    settings: HouseholdSettings,
    ApiJson(body): ApiJson<RedemptionRequestReq>,
) -> Result<(StatusCode, Json<RedemptionDto>), AppError> {
    let reward = state
        .store
        .get_reward(body.reward_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("reward not found: {}", body.reward_id)))?;
    let requester = require_member(&state, body.requester_id).await?;
    if member_role(&requester)? != MemberRole::Child {
        return Err(AppError::forbidden("only children can request rewards"));
    }
    if !reward.active {
        return Err(AppError::bad_request("reward is not active"));
    }
    let cost = match body.custom_points_amount {
        None => reward.points_cost,
        Some(_) if !reward.is_cash_reward => {
            return Err(AppError::bad_request(
                "custom amounts are only allowed for cash rewards",
            ));
        }
        Some(amount) => {
            let minimum = settings.0.min_cash_redemption_points;
            if amount < minimum {
                return Err(AppError::bad_request(format!(
                    "custom amount must be at least {minimum} points"
                )));
            }
            amount
        }
    };

    match state
        .store
        .request_redemption(reward.id, requester.id, cost)
        .await?
    {
        RequestOutcome::Created(row) => {
            info!(
                redemption_id = row.id,
                member_id = requester.id,
                reward_id = reward.id,
                cost,
                "redemption requested"
            );
            Ok((StatusCode::CREATED, Json(to_redemption_dto(row)?)))
        }
        RequestOutcome::Insufficient {
            balance,
            available,
            required,
        } => Err(AppError::PointsHeld {
            balance,
            available,
            required,
        }),
    }
}

/// A parent approves or denies a PENDING request.
pub(super) async fn api_decide_redemption(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<RedemptionDecisionReq>,
) -> Result<Json<RedemptionDto>, AppError> {
    if !body.status.is_terminal() {
        return Err(AppError::bad_request("status must be APPROVED or DENIED"));
    }
    if state.store.get_redemption(id).await?.is_none() {
        return Err(AppError::not_found(format!("redemption not found: {id}")));
    }
    if let Some(approver) = body.approver_id {
        let member = require_member(&state, approver).await?;
        if member_role(&member)? != MemberRole::Parent {
            return Err(AppError::forbidden("only parents can decide redemptions"));
        }
    }

    let decision = state
        .store
        .decide_redemption(id, body.status, body.approver_id, clean(body.denial_reason))
        .await?;
    match decision {
        Decision::Decided(row) => {
            info!(redemption_id = id, status = %row.status, "redemption decided");
            Ok(Json(to_redemption_dto(row)?))
        }
        Decision::NotFound => Err(AppError::not_found(format!("redemption not found: {id}"))),
        Decision::AlreadyProcessed(status) => {
            info!(redemption_id = id, %status, "redemption already processed");
            Err(AppError::conflict("redemption already processed"))
        }
        Decision::Insufficient { balance, required } => {
            Err(AppError::InsufficientPoints { balance, required })
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RedemptionQuery {
    status: Option<RedemptionStatus>,
    member_id: Option<i32>,
}

pub(super) async fn api_list_redemptions(
    State(state): State<AppState>,
    Query(q): Query<RedemptionQuery>,
) -> Result<Json<Vec<RedemptionDto>>, AppError> {
    let rows = state.store.list_redemptions(q.status, q.member_id).await?;
    let items = rows
        .into_iter()
        .map(to_redemption_dto)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

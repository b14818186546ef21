use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use famdash_shared::api::{AdjustPointsReq, BalanceDto, TransactionDto};
use famdash_shared::domain::TransactionType;
use serde::Deserialize;
use tracing::info;

use super::error::ApiJson;
use super::members::require_member;
use super::validate::clean;
use super::{AppError, AppState, rfc3339};
use crate::storage::models::{Member, PointTransaction};
use crate::storage::{Debit, LedgerSummary};

pub(super) fn to_transaction_dto(t: PointTransaction) -> Result<TransactionDto, AppError> {
    Ok(TransactionDto {
        kind: t.kind.parse().map_err(AppError::internal)?,
        id: t.id,
        member_id: t.member_id,
        amount: t.amount,
        description: t.description,
        created_at: rfc3339(t.created_at),
    })
}

fn to_balance_dto(m: &Member, s: LedgerSummary) -> BalanceDto {
    BalanceDto {
        member_id: m.id,
        member_name: m.name.clone(),
        balance: s.balance,
        lifetime_earned: s.lifetime_earned,
        lifetime_spent: s.lifetime_spent,
    }
}

pub(super) async fn api_list_balances(
    State(state): State<AppState>,
) -> Result<Json<Vec<BalanceDto>>, AppError> {
    let members = state.store.list_members().await?;
    let summaries = state
        .store
        .ledger_summaries(members.iter().map(|m| m.id).collect())
        .await?;
    let items = members
        .iter()
        .zip(summaries)
        .map(|(m, (_, s))| to_balance_dto(m, s))
        .collect();
    Ok(Json(items))
}

pub(super) async fn api_member_points(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BalanceDto>, AppError> {
    let member = require_member(&state, id).await?;
    let summary = state.store.ledger_summary(id).await?;
    Ok(Json(to_balance_dto(&member, summary)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PageOpts {
    page: Option<usize>,
    per_page: Option<usize>,
}

pub(super) async fn api_member_transactions(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(opts): Query<PageOpts>,
) -> Result<Json<Vec<TransactionDto>>, AppError> {
    require_member(&state, id).await?;
    let page = opts.page.unwrap_or(1);
    let per_page = opts.per_page.unwrap_or(20);
    let rows = state.store.list_transactions(id, page, per_page).await?;
    let items = rows
        .into_iter()
        .map(to_transaction_dto)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

/// Manual BONUS or DEDUCTION by a parent.
pub(super) async fn api_adjust_points(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<AdjustPointsReq>,
) -> Result<(StatusCode, Json<TransactionDto>), AppError> {
    if body.amount <= 0 {
        return Err(AppError::bad_request("amount must be positive"));
    }
    require_member(&state, id).await?;
    let tx = match body.kind {
        TransactionType::Bonus => {
            let description = clean(body.description).unwrap_or_else(|| "Bonus".into());
            state
                .store
                .credit(id, body.amount, TransactionType::Bonus, &description)
                .await?
        }
        TransactionType::Deduction => {
            let description = clean(body.description).unwrap_or_else(|| "Deduction".into());
            match state
                .store
                .debit(id, body.amount, TransactionType::Deduction, &description)
                .await?
            {
                Debit::Applied(tx) => tx,
                Debit::Insufficient { balance, required } => {
                    return Err(AppError::InsufficientPoints { balance, required });
                }
            }
        }
        other => {
            return Err(AppError::bad_request(format!(
                "type must be BONUS or DEDUCTION, got {other}"
            )));
        }
    };
    info!(member_id = id, amount = tx.amount, kind = %tx.kind, "points adjusted");
    Ok((StatusCode::CREATED, Json(to_transaction_dto(tx)?)))
}

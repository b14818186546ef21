use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use famdash_shared::api::{
    GenerateShoppingReq, ShoppingItemDto, ShoppingItemReq, ShoppingItemUpdateReq,
};
use famdash_shared::shopping::{self, ShoppingLine};
use serde::Deserialize;
use tracing::info;

use super::error::ApiJson;
use super::validate::{Validator, clean};
use super::{AppError, AppState, rfc3339};
use crate::storage::models::ShoppingItem;
use crate::storage::{ShoppingFields, ShoppingUpdate};

fn to_item_dto(i: ShoppingItem) -> ShoppingItemDto {
    ShoppingItemDto {
        id: i.id,
        name: i.name,
        quantity: i.quantity,
        category: i.category,
        store: i.store,
        checked: i.checked,
        created_at: rfc3339(i.created_at),
    }
}

fn check_weeks(weeks: &[i32]) -> Result<(), AppError> {
    let mut v = Validator::new();
    v.check(!weeks.is_empty(), "weeks", "at least one week is required");
    v.check(
        weeks.iter().all(|w| (1..=53).contains(w)),
        "weeks",
        "weeks must be between 1 and 53",
    );
    v.finish()
}

async fn aggregate_weeks(state: &AppState, weeks: Vec<i32>) -> Result<Vec<ShoppingLine>, AppError> {
    let planned = state.store.planned_recipes(weeks).await?;
    Ok(shopping::aggregate(&planned))
}

pub(super) async fn api_list_shopping(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShoppingItemDto>>, AppError> {
    let rows = state.store.list_shopping().await?;
    Ok(Json(rows.into_iter().map(to_item_dto).collect()))
}

/// Category and store fall back to the keyword tables when not given.
pub(super) async fn api_add_shopping_item(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ShoppingItemReq>,
) -> Result<(StatusCode, Json<ShoppingItemDto>), AppError> {
    Validator::new().non_empty("name", &body.name).finish()?;
    let name = body.name.trim().to_string();
    let category = clean(body.category).unwrap_or_else(|| shopping::categorize(&name).into());
    let store = clean(body.store).unwrap_or_else(|| shopping::preferred_store(&name).into());
    let item = state
        .store
        .add_shopping_item(ShoppingFields {
            quantity: clean(body.quantity),
            name,
            category,
            store,
        })
        .await?;
    info!(item_id = item.id, category = %item.category, "shopping item added");
    Ok((StatusCode::CREATED, Json(to_item_dto(item))))
}

pub(super) async fn api_update_shopping_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<ShoppingItemUpdateReq>,
) -> Result<Json<ShoppingItemDto>, AppError> {
    if let Some(name) = &body.name {
        Validator::new().non_empty("name", name).finish()?;
    }
    let update = ShoppingUpdate {
        name: body.name.map(|n| n.trim().to_string()),
        quantity: body.quantity.map(|q| q.trim().to_string()),
        checked: body.checked,
    };
    let item = state
        .store
        .update_shopping_item(id, update)
        .await?
        .ok_or_else(|| AppError::not_found(format!("shopping item not found: {id}")))?;
    Ok(Json(to_item_dto(item)))
}

pub(super) async fn api_delete_shopping_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_shopping_item(id).await? {
        return Err(AppError::not_found(format!("shopping item not found: {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub(super) struct ClearQuery {
    #[serde(default)]
    checked: bool,
}

/// `DELETE /shopping?checked=true` clears ticked-off items.
pub(super) async fn api_clear_shopping(
    State(state): State<AppState>,
    Query(q): Query<ClearQuery>,
) -> Result<StatusCode, AppError> {
    if !q.checked {
        return Err(AppError::bad_request("only checked=true is supported"));
    }
    let removed = state.store.clear_checked_shopping().await?;
    info!(removed, "checked shopping items cleared");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub(super) struct PreviewQuery {
    weeks: String,
}

fn parse_weeks(raw: &str) -> Result<Vec<i32>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| AppError::bad_request(format!("invalid week number: {s}")))
        })
        .collect()
}

/// Aggregated ingredient lines for `?weeks=1,2` without touching the list.
pub(super) async fn api_preview_shopping(
    State(state): State<AppState>,
    Query(q): Query<PreviewQuery>,
) -> Result<Json<Vec<ShoppingLine>>, AppError> {
    let weeks = parse_weeks(&q.weeks)?;
    check_weeks(&weeks)?;
    Ok(Json(aggregate_weeks(&state, weeks).await?))
}

/// Append the aggregated lines to the list, skipping names already open.
pub(super) async fn api_generate_shopping(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GenerateShoppingReq>,
) -> Result<(StatusCode, Json<Vec<ShoppingItemDto>>), AppError> {
    check_weeks(&body.weeks)?;
    let lines = aggregate_weeks(&state, body.weeks).await?;
    let total = lines.len();
    let inserted = state.store.insert_shopping_lines(lines).await?;
    info!(aggregated = total, inserted = inserted.len(), "shopping list generated");
    Ok((
        StatusCode::CREATED,
        Json(inserted.into_iter().map(to_item_dto).collect()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_lists() {
        assert_eq!(parse_weeks("1, 2,,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_weeks("1,x").is_err());
        assert!(check_weeks(&[]).is_err());
        assert!(check_weeks(&[0]).is_err());
        assert!(check_weeks(&[53]).is_ok());
    }
}

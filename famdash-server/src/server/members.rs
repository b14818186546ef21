use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use famdash_shared::api::{MemberDto, MemberReq};
use famdash_shared::domain::MemberRole;
use tracing::info;

use super::error::ApiJson;
use super::validate::{Validator, clean, is_hex_color};
use super::{AppError, AppState};
use crate::storage::MemberFields;
use crate::storage::models::Member;

pub(super) fn member_role(m: &Member) -> Result<MemberRole, AppError> {
    m.role.parse().map_err(AppError::internal)
}

pub(super) fn to_member_dto(m: Member) -> Result<MemberDto, AppError> {
    Ok(MemberDto {
        role: member_role(&m)?,
        id: m.id,
        name: m.name,
        avatar: m.avatar,
        color: m.color,
        nfc_card_id: m.nfc_card_id,
    })
}

/// Load a member or answer 404.
pub(super) async fn require_member(state: &AppState, id: i32) -> Result<Member, AppError> {
    state
        .store
        .get_member(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("member not found: {id}")))
}

fn member_fields(body: MemberReq) -> Result<MemberFields, AppError> {
    let color = clean(body.color);
    let mut v = Validator::new();
    v.non_empty("name", &body.name);
    if let Some(c) = &color {
        v.check(is_hex_color(c), "color", "must be #rrggbb");
    }
    v.finish()?;
    Ok(MemberFields {
        name: body.name.trim().to_string(),
        role: body.role.as_str().to_string(),
        avatar: clean(body.avatar),
        color,
        nfc_card_id: clean(body.nfc_card_id),
    })
}

fn card_clash(e: crate::storage::StorageError) -> AppError {
    if e.is_unique_violation() {
        AppError::conflict("NFC card is already assigned to another member")
    } else {
        e.into()
    }
}

pub(super) async fn api_list_members(
    State(state): State<AppState>,
) -> Result<Json<Vec<MemberDto>>, AppError> {
    let rows = state.store.list_members().await?;
    let items = rows
        .into_iter()
        .map(to_member_dto)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

pub(super) async fn api_get_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MemberDto>, AppError> {
    Ok(Json(to_member_dto(require_member(&state, id).await?)?))
}

/// NFC tap lookup.
pub(super) async fn api_member_by_card(
    State(state): State<AppState>,
    Path(card): Path<String>,
) -> Result<Json<MemberDto>, AppError> {
    let member = state
        .store
        .get_member_by_card(card.trim())
        .await?
        .ok_or_else(|| AppError::not_found("no member for this card"))?;
    Ok(Json(to_member_dto(member)?))
}

pub(super) async fn api_create_member(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MemberReq>,
) -> Result<(StatusCode, Json<MemberDto>), AppError> {
    let fields = member_fields(body)?;
    let member = state.store.create_member(fields).await.map_err(card_clash)?;
    info!(member_id = member.id, role = %member.role, "member created");
    Ok((StatusCode::CREATED, Json(to_member_dto(member)?)))
}

pub(super) async fn api_update_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<MemberReq>,
) -> Result<Json<MemberDto>, AppError> {
    let fields = member_fields(body)?;
    let member = state
        .store
        .update_member(id, fields)
        .await
        .map_err(card_clash)?
        .ok_or_else(|| AppError::not_found(format!("member not found: {id}")))?;
    Ok(Json(to_member_dto(member)?))
}

pub(super) async fn api_delete_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_member(id).await? {
        return Err(AppError::not_found(format!("member not found: {id}")));
    }
    info!(member_id = id, "member deleted");
    Ok(StatusCode::NO_CONTENT)
}

//! Household PIN: setup, verification with lockout, change, disable, logout.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use famdash_shared::api::{
    AuditEntryDto, PinChangeReq, PinSessionDto, PinSetupReq, PinStatusDto, PinVerifyReq,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::error::ApiJson;
use super::session::{
    clear_cookie, has_valid_session, new_session_token, session_cookie, session_token,
};
use super::settings::HouseholdSettings;
use super::validate::is_valid_pin;
use super::{AppError, AppState, rfc3339};

async fn hash_pin(pin: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(pin, cost))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)
}

async fn pin_matches(pin: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(pin, &hash))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)
}

fn check_new_pin(new_pin: &str, confirm_pin: &str) -> Result<(), AppError> {
    if !is_valid_pin(new_pin) {
        return Err(AppError::bad_request("PIN must be 4 to 8 digits"));
    }
    if new_pin != confirm_pin {
        return Err(AppError::bad_request("PINs do not match"));
    }
    Ok(())
}

/// Check `pin` against the configured hash, honouring and updating the lockout.
///
/// The lock is checked before the comparison; a locked household never
/// reaches bcrypt. Checks run one at a time against freshly loaded settings,
/// so parallel guesses cannot outrun the failure counter.
async fn authenticate(state: &AppState, pin: &str, action: &'static str) -> Result<(), AppError> {
    let _gate = state.pin_gate.lock().await;
    let settings = state.store.load_settings().await?;
    let Some(hash) = settings.pin_hash.clone() else {
        return Err(AppError::bad_request("PIN is not configured"));
    };
    let now = Utc::now();
    let lockout = settings.lockout();
    if lockout.is_locked(now) {
        return Err(locked_out(state, action, lockout.remaining_secs(now)).await);
    }

    if pin_matches(pin.to_string(), hash).await? {
        if state.store.reset_pin_failures(now).await? {
            return Ok(());
        }
        let remaining_secs = state.store.load_settings().await?.lockout().remaining_secs(now);
        return Err(locked_out(state, action, remaining_secs).await);
    }

    let policy = state.config.pin.lockout_policy();
    let next = state.store.record_pin_failure(now, policy).await?;
    let remaining_attempts = next.remaining_attempts(now, &policy);
    let locked = next.is_locked(now);
    warn!(action, remaining_attempts, locked, "pin: incorrect PIN");
    state
        .audit("pin_failure", Some(format!("{action}; {remaining_attempts} attempts left")))
        .await;
    if locked {
        state
            .audit(
                "pin_lockout",
                Some(format!("locked for {}s", next.remaining_secs(now))),
            )
            .await;
    }
    Err(AppError::PinRejected {
        remaining_attempts,
        locked,
    })
}

async fn locked_out(state: &AppState, action: &'static str, remaining_secs: i64) -> AppError {
    warn!(action, remaining_secs, "pin: attempt while locked");
    state
        .audit("pin_locked_attempt", Some(format!("{action}; {remaining_secs}s remaining")))
        .await;
    AppError::LockedOut { remaining_secs }
}

fn with_session(
    status: StatusCode,
    token: &str,
    expires_at: DateTime<Utc>,
    secure: bool,
) -> Response {
    let body = Json(PinSessionDto {
        expires_at: expires_at.to_rfc3339(),
    });
    let mut resp = (status, body).into_response();
    resp.headers_mut()
        .insert(header::SET_COOKIE, session_cookie(token, expires_at, secure));
    resp
}

pub(super) async fn api_pin_status(
    State(state): State<AppState>,
    settings: HouseholdSettings,
    headers: HeaderMap,
) -> Result<Json<PinStatusDto>, AppError> {
    let now = Utc::now();
    let configured = settings.0.pin_configured();
    let lockout = settings.0.lockout();
    let authenticated = configured && has_valid_session(&state, &headers).await?;
    Ok(Json(PinStatusDto {
        configured,
        locked: lockout.is_locked(now),
        lockout_remaining: lockout.remaining_secs(now),
        authenticated,
    }))
}

pub(super) async fn api_pin_setup(
    State(state): State<AppState>,
    settings: HouseholdSettings,
    ApiJson(body): ApiJson<PinSetupReq>,
) -> Result<Response, AppError> {
    check_new_pin(&body.new_pin, &body.confirm_pin)?;
    if settings.0.pin_configured() {
        return Err(AppError::conflict("PIN is already configured"));
    }
    let hash = hash_pin(body.new_pin, state.config.pin.bcrypt_cost).await?;
    let token = new_session_token();
    let expires_at = Utc::now() + state.config.pin.session_ttl();
    if !state.store.setup_pin(hash, token.clone(), expires_at).await? {
        return Err(AppError::conflict("PIN is already configured"));
    }
    info!("pin: configured");
    state.audit("pin_setup", None).await;
    Ok(with_session(
        StatusCode::CREATED,
        &token,
        expires_at,
        state.config.pin.cookie_secure,
    ))
}

pub(super) async fn api_pin_verify(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PinVerifyReq>,
) -> Result<Response, AppError> {
    authenticate(&state, &body.pin, "verify").await?;
    let token = new_session_token();
    let expires_at = Utc::now() + state.config.pin.session_ttl();
    state.store.create_session(token.clone(), expires_at).await?;
    info!(expires_at = %expires_at, "pin: session opened");
    state.audit("pin_success", None).await;
    Ok(with_session(
        StatusCode::OK,
        &token,
        expires_at,
        state.config.pin.cookie_secure,
    ))
}

pub(super) async fn api_pin_change(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PinChangeReq>,
) -> Result<Response, AppError> {
    check_new_pin(&body.new_pin, &body.confirm_pin)?;
    authenticate(&state, &body.current_pin, "change").await?;
    let hash = hash_pin(body.new_pin, state.config.pin.bcrypt_cost).await?;
    let token = new_session_token();
    let expires_at = Utc::now() + state.config.pin.session_ttl();
    state
        .store
        .replace_pin(hash, token.clone(), expires_at)
        .await?;
    info!("pin: changed; other sessions revoked");
    state.audit("pin_change", None).await;
    Ok(with_session(
        StatusCode::OK,
        &token,
        expires_at,
        state.config.pin.cookie_secure,
    ))
}

pub(super) async fn api_pin_disable(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PinVerifyReq>,
) -> Result<Response, AppError> {
    authenticate(&state, &body.pin, "disable").await?;
    let revoked = state.store.disable_pin().await?;
    info!(revoked, "pin: disabled");
    state
        .audit("pin_disable", Some(format!("{revoked} sessions revoked")))
        .await;
    let body = Json(PinStatusDto {
        configured: false,
        locked: false,
        lockout_remaining: 0,
        authenticated: false,
    });
    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().insert(
        header::SET_COOKIE,
        clear_cookie(state.config.pin.cookie_secure),
    );
    Ok(resp)
}

pub(super) async fn api_pin_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = session_token(&headers) {
        state.store.delete_session(token).await?;
    }
    let mut resp = StatusCode::NO_CONTENT.into_response();
    resp.headers_mut().insert(
        header::SET_COOKIE,
        clear_cookie(state.config.pin.cookie_secure),
    );
    Ok(resp)
}

/// Audit entries for the PIN admin page.
pub(super) async fn api_list_audit(
    State(state): State<AppState>,
    Query(q): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntryDto>>, AppError> {
    let limit = q.limit.unwrap_or(100).clamp(1, 1000);
    let rows = state.store.list_audit(limit).await?;
    Ok(Json(
        rows.into_iter()
            .map(|r| AuditEntryDto {
                id: r.id,
                event: r.event,
                detail: r.detail,
                created_at: rfc3339(r.created_at),
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub(super) struct AuditQuery {
    limit: Option<i64>,
}

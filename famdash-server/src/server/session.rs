use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{DateTime, Utc};
use tracing::{Span, error, warn};
use uuid::Uuid;

use super::{AppError, AppState};

pub const SESSION_COOKIE: &str = "famdash_session";

/// 244 random bits, hex encoded.
pub fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// Session token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    bearer
        .or_else(|| cookie_value(headers, SESSION_COOKIE))
        .map(str::to_string)
}

pub fn session_cookie(token: &str, expires_at: DateTime<Utc>, secure: bool) -> HeaderValue {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    // Tokens are hex, so the value is always a valid header.
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| clear_cookie(secure))
}

pub fn clear_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static(
            "famdash_session=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0; Secure",
        )
    } else {
        HeaderValue::from_static("famdash_session=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
    }
}

/// True when the request carries a live PIN session.
pub async fn has_valid_session(state: &AppState, headers: &HeaderMap) -> Result<bool, AppError> {
    let Some(token) = session_token(headers) else {
        return Ok(false);
    };
    Ok(state.store.session_valid(token, Utc::now()).await?)
}

/// Guard for parent-only API routes. Open while no PIN is configured.
pub async fn require_pin_session(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let settings = state.store.load_settings().await.map_err(|e| {
        error!(error = %e, "pin guard: loading settings failed");
        AppError::from(e)
    })?;
    if !settings.pin_configured() {
        return Ok(next.run(req).await);
    }
    if !has_valid_session(&state, req.headers()).await? {
        warn!(path = %req.uri().path(), "pin guard: missing or expired session");
        return Err(AppError::Unauthorized);
    }
    Span::current().record("pin_session", true);
    Ok(next.run(req).await)
}

/// Redirect the admin pages to the PIN pad when a session is needed.
pub async fn admin_page_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if path != "/admin" && !path.starts_with("/admin/") && path != "/admin.html" {
        return next.run(req).await;
    }
    let allowed = match state.store.load_settings().await {
        Ok(s) if !s.pin_configured() => true,
        Ok(_) => has_valid_session(&state, req.headers()).await.unwrap_or(false),
        Err(e) => {
            error!(error = %e, "admin guard: loading settings failed");
            return AppError::from(e).into_response();
        }
    };
    if allowed {
        next.run(req).await
    } else {
        Redirect::to("/pin").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_from_cookie_or_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; famdash_session=abc123"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn empty_cookie_is_no_session() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("famdash_session="));
        assert!(session_token(&headers).is_none());
    }

    #[test]
    fn cookie_attributes() {
        let token = new_session_token();
        assert_eq!(token.len(), 64);
        let v = session_cookie(&token, Utc::now() + chrono::Duration::hours(1), true);
        let s = v.to_str().unwrap();
        assert!(s.starts_with(&format!("famdash_session={token};")));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("SameSite=Strict"));
        assert!(s.ends_with("; Secure"));
        assert!(clear_cookie(false).to_str().unwrap().contains("Max-Age=0"));
    }
}

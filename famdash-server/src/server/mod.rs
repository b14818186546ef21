mod chores;
mod config;
mod error;
mod habits;
mod meals;
mod members;
mod pin;
mod planner;
mod points;
mod redemptions;
mod rewards;
pub mod session;
mod settings;
mod shopping;
mod validate;

use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Json, Router,
    http::{Method, StatusCode, header},
    routing::{delete, get, post, put},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
pub use config::{
    AppConfig, ConfigError, PinPolicyConfig, SeedConfig, SeedMember, SeedReward,
};
pub use error::AppError;
use famdash_shared::api::VersionDto;
use mime_guess::from_path;
use rust_embed::RustEmbed;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info_span, warn};
use uuid::Uuid;

use crate::storage::Store;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    tz: Tz,
    shutdown: CancellationToken,
    /// Serializes PIN checks so the lock read, the bcrypt compare and the
    /// counter update act as one step.
    pin_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Result<Self, ConfigError> {
        let tz = config.tz()?;
        Ok(Self {
            config,
            store,
            tz,
            shutdown: CancellationToken::new(),
            pin_gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The household's calendar day, used for daily uniqueness.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// Append to the audit log. Failures are logged, never surfaced.
    pub async fn audit(&self, event: &str, detail: Option<String>) {
        if let Err(e) = self.store.record_audit(event, detail).await {
            warn!(error = %e, event, "audit: write failed");
        }
    }
}

/// Stored timestamps are naive UTC.
pub(crate) fn rfc3339(ts: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc).to_rfc3339()
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    // Kiosk surface: reads plus the actions a child performs at the screen.
    let public = Router::new()
        .route("/api/v1/version", get(api_version))
        .route("/api/v1/members", get(members::api_list_members))
        .route("/api/v1/members/{id}", get(members::api_get_member))
        .route(
            "/api/v1/members/by-card/{card}",
            get(members::api_member_by_card),
        )
        .route("/api/v1/points", get(points::api_list_balances))
        .route("/api/v1/members/{id}/points", get(points::api_member_points))
        .route(
            "/api/v1/members/{id}/points/transactions",
            get(points::api_member_transactions),
        )
        .route("/api/v1/rewards", get(rewards::api_list_rewards))
        .route("/api/v1/rewards/{id}", get(rewards::api_get_reward))
        .route(
            "/api/v1/redemption-request",
            post(redemptions::api_request_redemption),
        )
        .route("/api/v1/pin/status", get(pin::api_pin_status))
        .route("/api/v1/pin/setup", post(pin::api_pin_setup))
        .route("/api/v1/pin/verify", post(pin::api_pin_verify))
        .route(
            "/api/v1/pin/change",
            put(pin::api_pin_change).delete(pin::api_pin_disable),
        )
        .route("/api/v1/pin/logout", post(pin::api_pin_logout))
        .route("/api/v1/settings", get(settings::api_get_settings))
        .route("/api/v1/chores", get(chores::api_list_chores))
        .route("/api/v1/chores/today", get(chores::api_chores_today))
        .route("/api/v1/chores/{id}", get(chores::api_get_chore))
        .route(
            "/api/v1/chores/{id}/complete",
            post(chores::api_complete_chore),
        )
        .route("/api/v1/chores/{id}/undo", post(chores::api_undo_chore))
        .route("/api/v1/habits", get(habits::api_list_habits))
        .route("/api/v1/habits/{id}", get(habits::api_get_habit))
        .route("/api/v1/habits/{id}/log", post(habits::api_log_habit))
        .route("/api/v1/habits/{id}/undo", post(habits::api_undo_habit))
        .route("/api/v1/habits/{id}/logs", get(habits::api_habit_logs))
        .route("/api/v1/recipes", get(meals::api_list_recipes))
        .route("/api/v1/recipes/{id}", get(meals::api_get_recipe))
        .route("/api/v1/recipes/{id}/ratings", put(meals::api_rate_recipe))
        .route("/api/v1/meal-plan", get(meals::api_list_meal_plan))
        .route(
            "/api/v1/shopping",
            get(shopping::api_list_shopping).post(shopping::api_add_shopping_item),
        )
        .route(
            "/api/v1/shopping/preview",
            get(shopping::api_preview_shopping),
        )
        .route(
            "/api/v1/shopping/{id}",
            put(shopping::api_update_shopping_item),
        )
        .route("/api/v1/schedule", get(planner::api_list_schedule))
        .route("/api/v1/tasks", get(planner::api_list_tasks))
        .route("/api/v1/tasks/{id}", put(planner::api_update_task));

    // Parent surface: needs a PIN session once a PIN is configured.
    let protected = Router::new()
        .route("/api/v1/members", post(members::api_create_member))
        .route(
            "/api/v1/members/{id}",
            put(members::api_update_member).delete(members::api_delete_member),
        )
        .route("/api/v1/members/{id}/points", post(points::api_adjust_points))
        .route("/api/v1/rewards", post(rewards::api_create_reward))
        .route(
            "/api/v1/rewards/{id}",
            put(rewards::api_update_reward).delete(rewards::api_delete_reward),
        )
        .route(
            "/api/v1/redemption/{id}",
            put(redemptions::api_decide_redemption),
        )
        .route("/api/v1/redemptions", get(redemptions::api_list_redemptions))
        .route("/api/v1/settings", put(settings::api_update_settings))
        .route("/api/v1/audit", get(pin::api_list_audit))
        .route("/api/v1/chores", post(chores::api_create_chore))
        .route(
            "/api/v1/chores/{id}",
            put(chores::api_update_chore).delete(chores::api_delete_chore),
        )
        .route(
            "/api/v1/chores/{id}/assignments",
            put(chores::api_set_assignments),
        )
        .route("/api/v1/habits", post(habits::api_create_habit))
        .route(
            "/api/v1/habits/{id}",
            put(habits::api_update_habit).delete(habits::api_delete_habit),
        )
        .route("/api/v1/recipes", post(meals::api_create_recipe))
        .route(
            "/api/v1/recipes/{id}",
            put(meals::api_update_recipe).delete(meals::api_delete_recipe),
        )
        .route("/api/v1/meal-plan", post(meals::api_add_meal_plan_item))
        .route(
            "/api/v1/meal-plan/{id}",
            delete(meals::api_delete_meal_plan_item),
        )
        .route("/api/v1/shopping", delete(shopping::api_clear_shopping))
        .route(
            "/api/v1/shopping/{id}",
            delete(shopping::api_delete_shopping_item),
        )
        .route(
            "/api/v1/shopping/generate",
            post(shopping::api_generate_shopping),
        )
        .route("/api/v1/schedule", post(planner::api_create_schedule_item))
        .route(
            "/api/v1/schedule/{id}",
            put(planner::api_update_schedule_item).delete(planner::api_delete_schedule_item),
        )
        .route("/api/v1/tasks", post(planner::api_create_task))
        .route("/api/v1/tasks/{id}", delete(planner::api_delete_task))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_pin_session,
        ));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            pin_session = tracing::field::Empty
        )
    });

    let app = Router::new()
        .route("/healthz", get(health))
        .merge(public)
        .merge(protected)
        .fallback(get(serve_embedded))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::admin_page_guard,
        ))
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = header::HeaderValue::from_str(origin)
            .unwrap_or(header::HeaderValue::from_static("http://localhost:5173"));
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn api_version() -> Json<VersionDto> {
    Json(VersionDto {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // Balances and sessions must never come from a cache
    if path == "/healthz" || path.starts_with("/api/") {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    }

    Ok(resp)
}

#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Kiosk shell pages. `/admin` resolves to `admin.html`; unknown paths get
/// the dashboard.
async fn serve_embedded(
    uri: axum::http::Uri,
) -> Result<axum::response::Response, (StatusCode, String)> {
    let path = uri.path().trim_start_matches('/');
    if path.starts_with("api/") {
        return Err((StatusCode::NOT_FOUND, "no such endpoint".to_string()));
    }
    let page = format!("{}.html", path.trim_end_matches('/'));
    let (candidate, asset) = if path.is_empty() {
        ("index.html", WebAssets::get("index.html"))
    } else if let Some(a) = WebAssets::get(path) {
        (path, Some(a))
    } else if let Some(a) = WebAssets::get(&page) {
        (page.as_str(), Some(a))
    } else {
        ("index.html", WebAssets::get("index.html"))
    };
    let asset = asset.ok_or((StatusCode::NOT_FOUND, "asset not found".to_string()))?;

    let bytes = asset.data.into_owned();
    let mime = from_path(candidate).first_or_octet_stream();

    let mut resp = axum::response::Response::new(axum::body::Body::from(bytes));
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_str(mime.as_ref())
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );
    Ok(resp)
}

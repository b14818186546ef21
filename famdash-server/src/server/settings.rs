//! Household settings: loaded once per request, written back as a whole.

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::Json;
use famdash_shared::api::{SettingsDto, SettingsUpdateReq};

use super::error::ApiJson;
use super::validate::{Validator, clean};
use super::{AppError, AppState};
use crate::storage::models::Settings;

const THEMES: &[&str] = &["light", "dark", "auto"];
const WEATHER_UNITS: &[&str] = &["metric", "imperial"];

/// The settings row as a typed extractor.
#[derive(Debug, Clone)]
pub struct HouseholdSettings(pub Settings);

impl FromRequestParts<AppState> for HouseholdSettings {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        Ok(HouseholdSettings(state.store.load_settings().await?))
    }
}

impl HouseholdSettings {
    pub fn to_dto(&self) -> SettingsDto {
        let s = &self.0;
        SettingsDto {
            household_name: s.household_name.clone(),
            theme: s.theme.clone(),
            weather_latitude: s.weather_latitude,
            weather_longitude: s.weather_longitude,
            weather_units: s.weather_units.clone(),
            screensaver_enabled: s.screensaver_enabled,
            screensaver_idle_minutes: s.screensaver_idle_minutes,
            photo_interval_seconds: s.photo_interval_seconds,
            min_cash_redemption_points: s.min_cash_redemption_points,
            pin_configured: s.pin_configured(),
        }
    }

    /// Apply a partial update in memory after validating every supplied field.
    pub fn apply(&mut self, req: SettingsUpdateReq) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &req.household_name {
            v.non_empty("householdName", name);
        }
        if let Some(theme) = &req.theme {
            v.check(
                THEMES.contains(&theme.as_str()),
                "theme",
                format!("must be one of {}", THEMES.join(", ")),
            );
        }
        if let Some(units) = &req.weather_units {
            v.check(
                WEATHER_UNITS.contains(&units.as_str()),
                "weatherUnits",
                format!("must be one of {}", WEATHER_UNITS.join(", ")),
            );
        }
        if let Some(lat) = req.weather_latitude {
            v.check((-90.0..=90.0).contains(&lat), "weatherLatitude", "must be within -90..90");
        }
        if let Some(lon) = req.weather_longitude {
            v.check(
                (-180.0..=180.0).contains(&lon),
                "weatherLongitude",
                "must be within -180..180",
            );
        }
        if let Some(m) = req.screensaver_idle_minutes {
            v.range("screensaverIdleMinutes", m, 1, 240);
        }
        if let Some(s) = req.photo_interval_seconds {
            v.range("photoIntervalSeconds", s, 5, 3600);
        }
        if let Some(p) = req.min_cash_redemption_points {
            v.range("minCashRedemptionPoints", p, 1, 1_000_000);
        }
        v.finish()?;

        let s = &mut self.0;
        if let Some(name) = clean(req.household_name) {
            s.household_name = name;
        }
        if let Some(theme) = req.theme {
            s.theme = theme;
        }
        if let Some(lat) = req.weather_latitude {
            s.weather_latitude = Some(lat);
        }
        if let Some(lon) = req.weather_longitude {
            s.weather_longitude = Some(lon);
        }
        if let Some(units) = req.weather_units {
            s.weather_units = units;
        }
        if let Some(on) = req.screensaver_enabled {
            s.screensaver_enabled = on;
        }
        if let Some(m) = req.screensaver_idle_minutes {
            s.screensaver_idle_minutes = m;
        }
        if let Some(secs) = req.photo_interval_seconds {
            s.photo_interval_seconds = secs;
        }
        if let Some(p) = req.min_cash_redemption_points {
            s.min_cash_redemption_points = p;
        }
        Ok(())
    }
}

pub(super) async fn api_get_settings(settings: HouseholdSettings) -> Json<SettingsDto> {
    Json(settings.to_dto())
}

pub(super) async fn api_update_settings(
    State(state): State<AppState>,
    mut settings: HouseholdSettings,
    ApiJson(body): ApiJson<SettingsUpdateReq>,
) -> Result<Json<SettingsDto>, AppError> {
    settings.apply(body)?;
    let saved = state.store.save_settings(settings.0).await?;
    tracing::info!(household = %saved.household_name, "settings updated");
    Ok(Json(HouseholdSettings(saved).to_dto()))
}

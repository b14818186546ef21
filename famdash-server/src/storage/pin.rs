//! Household settings row, PIN credential and lockout columns, PIN sessions
//! and the audit log.

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use famdash_shared::lockout::{LockoutPolicy, LockoutState};

use super::models::{AuditEntry, NewAuditEntry, NewPinSession, Settings, SettingsChanges};
use super::schema::{audit_log, pin_sessions, settings};
use super::{StorageError, Store};

const SETTINGS_ID: i32 = 1;

fn settings_row(conn: &mut SqliteConnection) -> QueryResult<Settings> {
    settings::table
        .find(SETTINGS_ID)
        .select(Settings::as_select())
        .first(conn)
}

fn lockout_of(row: &Settings) -> LockoutState {
    LockoutState::from_columns(
        row.pin_failed_attempts,
        row.pin_locked_until.map(|t| t.and_utc()),
    )
}

fn write_lockout(conn: &mut SqliteConnection, state: LockoutState) -> QueryResult<usize> {
    let (failures, until) = state.to_columns();
    diesel::update(settings::table.find(SETTINGS_ID))
        .set((
            settings::pin_failed_attempts.eq(failures),
            settings::pin_locked_until.eq(until.map(|t| t.naive_utc())),
        ))
        .execute(conn)
}

fn insert_session(
    conn: &mut SqliteConnection,
    token: &str,
    expires_at: DateTime<Utc>,
) -> QueryResult<usize> {
    diesel::insert_into(pin_sessions::table)
        .values(&NewPinSession {
            token,
            created_at: Utc::now().naive_utc(),
            expires_at: expires_at.naive_utc(),
        })
        .execute(conn)
}

impl Settings {
    pub fn lockout(&self) -> LockoutState {
        lockout_of(self)
    }

    pub fn pin_configured(&self) -> bool {
        self.pin_hash.is_some()
    }
}

impl Store {
    pub async fn load_settings(&self) -> Result<Settings, StorageError> {
        self.run(|conn| Ok(settings_row(conn)?)).await
    }

    /// Write every display column of `next` in one UPDATE. PIN columns are left alone.
    pub async fn save_settings(&self, next: Settings) -> Result<Settings, StorageError> {
        self.run(move |conn| {
            let changes = SettingsChanges {
                household_name: &next.household_name,
                theme: &next.theme,
                weather_latitude: next.weather_latitude,
                weather_longitude: next.weather_longitude,
                weather_units: &next.weather_units,
                screensaver_enabled: next.screensaver_enabled,
                screensaver_idle_minutes: next.screensaver_idle_minutes,
                photo_interval_seconds: next.photo_interval_seconds,
                min_cash_redemption_points: next.min_cash_redemption_points,
                updated_at: Utc::now().naive_utc(),
            };
            Ok(diesel::update(settings::table.find(SETTINGS_ID))
                .set(&changes)
                .returning(Settings::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    /// Count one failed verification and return the resulting state.
    ///
    /// Read and write share a write-locked transaction so that parallel wrong
    /// guesses each consume an attempt.
    pub async fn record_pin_failure(
        &self,
        now: DateTime<Utc>,
        policy: LockoutPolicy,
    ) -> Result<LockoutState, StorageError> {
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                let row = settings_row(conn)?;
                let next = lockout_of(&row).record_failure(now, &policy);
                write_lockout(conn, next)?;
                Ok(next)
            })
        })
        .await
    }

    /// Clear the failure counter after a correct PIN.
    ///
    /// Returns `false` and leaves the row alone when a lock became active
    /// since the caller checked.
    pub async fn reset_pin_failures(&self, now: DateTime<Utc>) -> Result<bool, StorageError> {
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                let row = settings_row(conn)?;
                if lockout_of(&row).is_locked(now) {
                    return Ok(false);
                }
                write_lockout(conn, LockoutState::default())?;
                Ok(true)
            })
        })
        .await
    }

    /// Store the first PIN and open a session for the caller.
    /// Returns `false` when a PIN was already configured.
    pub async fn setup_pin(
        &self,
        hash: String,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                let updated = diesel::update(
                    settings::table
                        .filter(settings::id.eq(SETTINGS_ID))
                        .filter(settings::pin_hash.is_null()),
                )
                .set((
                    settings::pin_hash.eq(hash.as_str()),
                    settings::pin_failed_attempts.eq(0),
                    settings::pin_locked_until.eq(None::<NaiveDateTime>),
                ))
                .execute(conn)?;
                if updated == 0 {
                    return Ok(false);
                }
                insert_session(conn, &token, expires_at)?;
                Ok(true)
            })
        })
        .await
    }

    /// Replace the PIN, revoke every session and open a new one for the caller.
    pub async fn replace_pin(
        &self,
        hash: String,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                diesel::update(settings::table.find(SETTINGS_ID))
                    .set((
                        settings::pin_hash.eq(hash.as_str()),
                        settings::pin_failed_attempts.eq(0),
                        settings::pin_locked_until.eq(None::<NaiveDateTime>),
                    ))
                    .execute(conn)?;
                diesel::delete(pin_sessions::table).execute(conn)?;
                insert_session(conn, &token, expires_at)?;
                Ok(())
            })
        })
        .await
    }

    /// Back to UNCONFIGURED: clear hash, lockout state and all sessions.
    /// Returns the number of sessions revoked.
    pub async fn disable_pin(&self) -> Result<usize, StorageError> {
        self.run(|conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                diesel::update(settings::table.find(SETTINGS_ID))
                    .set((
                        settings::pin_hash.eq(None::<String>),
                        settings::pin_failed_attempts.eq(0),
                        settings::pin_locked_until.eq(None::<NaiveDateTime>),
                    ))
                    .execute(conn)?;
                Ok(diesel::delete(pin_sessions::table).execute(conn)?)
            })
        })
        .await
    }

    pub async fn create_session(
        &self,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.run(move |conn| {
            insert_session(conn, &token, expires_at)?;
            Ok(())
        })
        .await
    }

    /// True when `token` names a session that has not expired at `now`.
    pub async fn session_valid(
        &self,
        token: String,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        self.run(move |conn| {
            let found: Option<String> = pin_sessions::table
                .filter(pin_sessions::token.eq(&token))
                .filter(pin_sessions::expires_at.gt(now.naive_utc()))
                .select(pin_sessions::token)
                .first(conn)
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    pub async fn delete_session(&self, token: String) -> Result<usize, StorageError> {
        self.run(move |conn| {
            Ok(diesel::delete(pin_sessions::table.filter(pin_sessions::token.eq(&token)))
                .execute(conn)?)
        })
        .await
    }

    pub async fn prune_sessions(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        self.run(move |conn| {
            Ok(
                diesel::delete(pin_sessions::table.filter(pin_sessions::expires_at.le(now.naive_utc())))
                    .execute(conn)?,
            )
        })
        .await
    }

    pub async fn record_audit(
        &self,
        event: &str,
        detail: Option<String>,
    ) -> Result<(), StorageError> {
        let event = event.to_string();
        self.run(move |conn| {
            diesel::insert_into(audit_log::table)
                .values(&NewAuditEntry {
                    event: &event,
                    detail: detail.as_deref(),
                    created_at: Utc::now().naive_utc(),
                })
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn list_audit(&self, limit: i64) -> Result<Vec<AuditEntry>, StorageError> {
        self.run(move |conn| {
            Ok(audit_log::table
                .order(audit_log::id.desc())
                .limit(limit)
                .select(AuditEntry::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn prune_audit(&self, before: DateTime<Utc>) -> Result<usize, StorageError> {
        self.run(move |conn| {
            Ok(
                diesel::delete(audit_log::table.filter(audit_log::created_at.lt(before.naive_utc())))
                    .execute(conn)?,
            )
        })
        .await
    }
}

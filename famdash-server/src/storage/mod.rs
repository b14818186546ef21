pub mod models;
pub mod schema;

mod chores;
mod habits;
mod household;
mod ledger;
mod meals;
mod pin;
mod planner;
mod redemptions;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, trace};

use crate::server::SeedConfig;

pub use chores::{AssignedChore, ChoreFields};
pub use habits::HabitFields;
pub use household::{MemberFields, RewardFields};
pub use ledger::{Debit, LedgerSummary, UndoOutcome};
pub use meals::{RatedRecipe, RecipeFields};
pub use planner::{ScheduleFields, ShoppingFields, ShoppingUpdate, TaskUpdate};
pub use redemptions::{Decision, RequestOutcome};

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// The caller supplied invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StorageError {
    /// True when a UNIQUE constraint rejected the write.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                _
            ))
        )
    }
}

/// Outcome of a write that is refused when a per-day row already exists.
#[derive(Debug)]
pub enum Once<T> {
    Recorded(T),
    AlreadyDone,
}

#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder().max_size(8).build(manager)?;

        // Run pending Diesel migrations on startup (auto-init empty DBs)
        {
            let pool_clone = pool.clone();
            tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
                const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
                let mut conn = pool_clone.get()?;
                configure_sqlite_conn(&mut conn)?;
                let applied = conn
                    .run_pending_migrations(MIGRATIONS)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                if !applied.is_empty() {
                    info!(count = applied.len(), "applied database migrations");
                }
                Ok(())
            })
            .await??;
        }

        Ok(Store { pool })
    }

    /// Run `f` on a pooled connection off the async executor.
    async fn run<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            f(&mut conn)
        })
        .await?
    }

    /// Insert configured members and rewards into an empty household.
    pub async fn seed_from_config(&self, seed: &SeedConfig) -> Result<(), StorageError> {
        use models::{NewMember, NewReward};
        use schema::{members, rewards};

        let seed = seed.clone();
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<(), StorageError> {
                let existing: i64 = members::table.count().get_result(conn)?;
                if existing > 0 {
                    trace!(existing, "seed: household already populated; skipping");
                    return Ok(());
                }
                for m in &seed.members {
                    diesel::insert_into(members::table)
                        .values(&NewMember {
                            name: &m.name,
                            role: m.role.as_str(),
                            avatar: m.avatar.as_deref(),
                            color: m.color.as_deref(),
                            nfc_card_id: None,
                        })
                        .execute(conn)?;
                }
                for r in &seed.rewards {
                    diesel::insert_into(rewards::table)
                        .values(&NewReward {
                            name: &r.name,
                            description: r.description.as_deref(),
                            points_cost: r.points_cost,
                            active: true,
                            is_cash_reward: r.is_cash_reward,
                            cash_value: r.cash_value,
                        })
                        .execute(conn)?;
                }
                info!(
                    members = seed.members.len(),
                    rewards = seed.rewards.len(),
                    "seeded household from config"
                );
                Ok(())
            })
        })
        .await
    }
}

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // busy_timeout first so the WAL switch itself waits on a held lock
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA foreign_keys=ON;").execute(conn)?;
    Ok(())
}

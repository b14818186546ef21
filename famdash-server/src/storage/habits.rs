use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use famdash_shared::domain::TransactionType;

use super::ledger::{UndoOutcome, append, balance_of};
use super::models::{Habit, HabitLog, NewHabit, NewHabitLog};
use super::schema::{habit_logs, habits};
use super::{Once, StorageError, Store};

#[derive(Debug, Clone)]
pub struct HabitFields {
    pub name: String,
    pub points: i32,
    pub member_id: Option<i32>,
    pub active: bool,
}

impl HabitFields {
    fn as_new(&self) -> NewHabit<'_> {
        NewHabit {
            name: &self.name,
            points: self.points,
            member_id: self.member_id,
            active: self.active,
        }
    }
}

fn log_on(
    conn: &mut SqliteConnection,
    habit: i32,
    member: i32,
    day: NaiveDate,
) -> QueryResult<Option<HabitLog>> {
    habit_logs::table
        .filter(habit_logs::habit_id.eq(habit))
        .filter(habit_logs::member_id.eq(member))
        .filter(habit_logs::logged_on.eq(day))
        .select(HabitLog::as_select())
        .first(conn)
        .optional()
}

impl Store {
    pub async fn list_habits(&self, member: Option<i32>) -> Result<Vec<Habit>, StorageError> {
        self.run(move |conn| {
            let mut q = habits::table
                .filter(habits::active.eq(true))
                .order(habits::id.asc())
                .select(Habit::as_select())
                .into_boxed();
            if let Some(m) = member {
                // Unbound habits apply to everyone.
                q = q.filter(habits::member_id.eq(m).or(habits::member_id.is_null()));
            }
            Ok(q.load(conn)?)
        })
        .await
    }

    pub async fn get_habit(&self, id: i32) -> Result<Option<Habit>, StorageError> {
        self.run(move |conn| {
            Ok(habits::table
                .find(id)
                .select(Habit::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn create_habit(&self, fields: HabitFields) -> Result<Habit, StorageError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(habits::table)
                .values(&fields.as_new())
                .returning(Habit::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn update_habit(
        &self,
        id: i32,
        fields: HabitFields,
    ) -> Result<Option<Habit>, StorageError> {
        self.run(move |conn| {
            Ok(diesel::update(habits::table.find(id))
                .set(&fields.as_new())
                .returning(Habit::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    pub async fn delete_habit(&self, id: i32) -> Result<bool, StorageError> {
        self.run(move |conn| Ok(diesel::delete(habits::table.find(id)).execute(conn)? > 0))
            .await
    }

    /// Log `habit` for `member` on `day` and credit HABIT_COMPLETION points.
    pub async fn log_habit(
        &self,
        habit: i32,
        member: i32,
        day: NaiveDate,
    ) -> Result<Once<HabitLog>, StorageError> {
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                if log_on(conn, habit, member, day)?.is_some() {
                    return Ok(Once::AlreadyDone);
                }
                let (name, points): (String, i32) = habits::table
                    .find(habit)
                    .select((habits::name, habits::points))
                    .first(conn)?;
                let transaction_id = if points > 0 {
                    let tx = append(
                        conn,
                        member,
                        points,
                        TransactionType::HabitCompletion,
                        &format!("Habit: {name}"),
                    )?;
                    Some(tx.id)
                } else {
                    None
                };
                let row = diesel::insert_into(habit_logs::table)
                    .values(&NewHabitLog {
                        habit_id: habit,
                        member_id: member,
                        logged_on: day,
                        created_at: Utc::now().naive_utc(),
                        points_awarded: points,
                        transaction_id,
                    })
                    .returning(HabitLog::as_returning())
                    .get_result(conn)?;
                Ok(Once::Recorded(row))
            })
        })
        .await
    }

    /// Remove today's log and append a HABIT_UNDO entry for the points it earned.
    pub async fn undo_habit(
        &self,
        habit: i32,
        member: i32,
        day: NaiveDate,
    ) -> Result<UndoOutcome, StorageError> {
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                let Some(log) = log_on(conn, habit, member, day)? else {
                    return Ok(UndoOutcome::NothingToUndo);
                };
                let balance = balance_of(conn, member)?;
                let points = if log.transaction_id.is_some() {
                    log.points_awarded
                } else {
                    0
                };
                if points > 0 {
                    let required = i64::from(points);
                    if balance < required {
                        return Ok(UndoOutcome::Insufficient { balance, required });
                    }
                    let name: String = habits::table
                        .find(habit)
                        .select(habits::name)
                        .first(conn)?;
                    append(
                        conn,
                        member,
                        points,
                        TransactionType::HabitUndo,
                        &format!("Undo habit: {name}"),
                    )?;
                }
                diesel::delete(habit_logs::table.find(log.id)).execute(conn)?;
                Ok(UndoOutcome::Reverted {
                    points,
                    balance: balance - i64::from(points),
                })
            })
        })
        .await
    }

    pub async fn list_habit_logs(
        &self,
        habit: i32,
        member: Option<i32>,
        limit: i64,
    ) -> Result<Vec<HabitLog>, StorageError> {
        self.run(move |conn| {
            let mut q = habit_logs::table
                .filter(habit_logs::habit_id.eq(habit))
                .order((habit_logs::logged_on.desc(), habit_logs::id.desc()))
                .limit(limit)
                .select(HabitLog::as_select())
                .into_boxed();
            if let Some(m) = member {
                q = q.filter(habit_logs::member_id.eq(m));
            }
            Ok(q.load(conn)?)
        })
        .await
    }
}

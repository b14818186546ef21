use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use famdash_shared::domain::TransactionType;

use super::ledger::{UndoOutcome, append, balance_of};
use super::models::{Chore, ChoreAssignment, ChoreCompletion, NewChore, NewChoreCompletion};
use super::schema::{chore_assignments, chore_completions, chores};
use super::{Once, StorageError, Store};

#[derive(Debug, Clone)]
pub struct ChoreFields {
    pub name: String,
    pub description: Option<String>,
    pub points: i32,
    pub active: bool,
}

impl ChoreFields {
    fn as_new(&self) -> NewChore<'_> {
        NewChore {
            name: &self.name,
            description: self.description.as_deref(),
            points: self.points,
            active: self.active,
        }
    }
}

/// A chore with the ids of its assigned members.
#[derive(Debug, Clone)]
pub struct AssignedChore {
    pub chore: Chore,
    pub member_ids: Vec<i32>,
}

fn assignees(conn: &mut SqliteConnection, chore: i32) -> QueryResult<Vec<i32>> {
    chore_assignments::table
        .filter(chore_assignments::chore_id.eq(chore))
        .order(chore_assignments::member_id.asc())
        .select(chore_assignments::member_id)
        .load(conn)
}

fn with_assignments(
    conn: &mut SqliteConnection,
    list: Vec<Chore>,
) -> QueryResult<Vec<AssignedChore>> {
    let rows: Vec<ChoreAssignment> = chore_assignments::table
        .select(ChoreAssignment::as_select())
        .load(conn)?;
    let mut by_chore: HashMap<i32, Vec<i32>> = HashMap::new();
    for a in rows {
        by_chore.entry(a.chore_id).or_default().push(a.member_id);
    }
    Ok(list
        .into_iter()
        .map(|chore| {
            let mut member_ids = by_chore.remove(&chore.id).unwrap_or_default();
            member_ids.sort_unstable();
            AssignedChore { chore, member_ids }
        })
        .collect())
}

fn completion_on(
    conn: &mut SqliteConnection,
    chore: i32,
    day: NaiveDate,
) -> QueryResult<Option<ChoreCompletion>> {
    chore_completions::table
        .filter(chore_completions::chore_id.eq(chore))
        .filter(chore_completions::completed_on.eq(day))
        .select(ChoreCompletion::as_select())
        .first(conn)
        .optional()
}

impl Store {
    pub async fn list_chores(&self, include_inactive: bool) -> Result<Vec<AssignedChore>, StorageError> {
        self.run(move |conn| {
            let mut q = chores::table
                .order(chores::id.asc())
                .select(Chore::as_select())
                .into_boxed();
            if !include_inactive {
                q = q.filter(chores::active.eq(true));
            }
            let list = q.load(conn)?;
            Ok(with_assignments(conn, list)?)
        })
        .await
    }

    pub async fn get_chore(&self, id: i32) -> Result<Option<AssignedChore>, StorageError> {
        self.run(move |conn| {
            let Some(chore) = chores::table
                .find(id)
                .select(Chore::as_select())
                .first(conn)
                .optional()?
            else {
                return Ok(None);
            };
            let member_ids = assignees(conn, id)?;
            Ok(Some(AssignedChore { chore, member_ids }))
        })
        .await
    }

    pub async fn create_chore(&self, fields: ChoreFields) -> Result<AssignedChore, StorageError> {
        self.run(move |conn| {
            let chore = diesel::insert_into(chores::table)
                .values(&fields.as_new())
                .returning(Chore::as_returning())
                .get_result(conn)?;
            Ok(AssignedChore {
                chore,
                member_ids: Vec::new(),
            })
        })
        .await
    }

    pub async fn update_chore(
        &self,
        id: i32,
        fields: ChoreFields,
    ) -> Result<Option<AssignedChore>, StorageError> {
        self.run(move |conn| {
            let Some(chore) = diesel::update(chores::table.find(id))
                .set(&fields.as_new())
                .returning(Chore::as_returning())
                .get_result(conn)
                .optional()?
            else {
                return Ok(None);
            };
            let member_ids = assignees(conn, id)?;
            Ok(Some(AssignedChore { chore, member_ids }))
        })
        .await
    }

    /// Delete a chore with its assignments and completions. Ledger rows stay.
    pub async fn delete_chore(&self, id: i32) -> Result<bool, StorageError> {
        self.run(move |conn| Ok(diesel::delete(chores::table.find(id)).execute(conn)? > 0))
            .await
    }

    /// Replace the assignment set of a chore.
    pub async fn set_assignments(
        &self,
        chore: i32,
        mut member_ids: Vec<i32>,
    ) -> Result<Vec<i32>, StorageError> {
        member_ids.sort_unstable();
        member_ids.dedup();
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                diesel::delete(
                    chore_assignments::table.filter(chore_assignments::chore_id.eq(chore)),
                )
                .execute(conn)?;
                let rows: Vec<ChoreAssignment> = member_ids
                    .iter()
                    .map(|&member_id| ChoreAssignment {
                        chore_id: chore,
                        member_id,
                    })
                    .collect();
                if !rows.is_empty() {
                    diesel::insert_into(chore_assignments::table)
                        .values(&rows)
                        .execute(conn)?;
                }
                Ok(member_ids)
            })
        })
        .await
    }

    /// Active chores with their completion for `day`, if any.
    pub async fn chores_for_day(
        &self,
        day: NaiveDate,
    ) -> Result<Vec<(AssignedChore, Option<ChoreCompletion>)>, StorageError> {
        self.run(move |conn| {
            let list = chores::table
                .filter(chores::active.eq(true))
                .order(chores::id.asc())
                .select(Chore::as_select())
                .load(conn)?;
            let list = with_assignments(conn, list)?;
            let done: Vec<ChoreCompletion> = chore_completions::table
                .filter(chore_completions::completed_on.eq(day))
                .select(ChoreCompletion::as_select())
                .load(conn)?;
            let mut by_chore: HashMap<i32, ChoreCompletion> =
                done.into_iter().map(|c| (c.chore_id, c)).collect();
            Ok(list
                .into_iter()
                .map(|c| {
                    let completion = by_chore.remove(&c.chore.id);
                    (c, completion)
                })
                .collect())
        })
        .await
    }

    /// Record the completion of `chore` on `day` and credit its points.
    ///
    /// The existence check and both inserts share one `BEGIN IMMEDIATE`, so two
    /// kiosks tapping the same chore at once produce exactly one completion.
    pub async fn complete_chore(
        &self,
        chore: i32,
        member: i32,
        day: NaiveDate,
    ) -> Result<Once<ChoreCompletion>, StorageError> {
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                if completion_on(conn, chore, day)?.is_some() {
                    return Ok(Once::AlreadyDone);
                }
                let (name, points): (String, i32) = chores::table
                    .find(chore)
                    .select((chores::name, chores::points))
                    .first(conn)?;
                let transaction_id = if points > 0 {
                    let tx = append(
                        conn,
                        member,
                        points,
                        TransactionType::ChoreCompletion,
                        &format!("Chore: {name}"),
                    )?;
                    Some(tx.id)
                } else {
                    None
                };
                let row = diesel::insert_into(chore_completions::table)
                    .values(&NewChoreCompletion {
                        chore_id: chore,
                        member_id: member,
                        completed_on: day,
                        completed_at: Utc::now().naive_utc(),
                        points_awarded: points,
                        transaction_id,
                    })
                    .returning(ChoreCompletion::as_returning())
                    .get_result(conn)?;
                Ok(Once::Recorded(row))
            })
        })
        .await
    }

    /// Reverse `member`'s completion of `chore` on `day` with a CHORE_UNDO entry.
    pub async fn undo_chore(
        &self,
        chore: i32,
        member: i32,
        day: NaiveDate,
    ) -> Result<UndoOutcome, StorageError> {
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                let Some(done) = completion_on(conn, chore, day)? else {
                    return Ok(UndoOutcome::NothingToUndo);
                };
                if done.member_id != member {
                    return Ok(UndoOutcome::NothingToUndo);
                }
                let balance = balance_of(conn, member)?;
                let points = if done.transaction_id.is_some() {
                    done.points_awarded
                } else {
                    0
                };
                if points > 0 {
                    let required = i64::from(points);
                    if balance < required {
                        return Ok(UndoOutcome::Insufficient { balance, required });
                    }
                    let name: String = chores::table
                        .find(chore)
                        .select(chores::name)
                        .first(conn)?;
                    append(
                        conn,
                        member,
                        points,
                        TransactionType::ChoreUndo,
                        &format!("Undo chore: {name}"),
                    )?;
                }
                diesel::delete(chore_completions::table.find(done.id)).execute(conn)?;
                Ok(UndoOutcome::Reverted {
                    points,
                    balance: balance - i64::from(points),
                })
            })
        })
        .await
    }
}

//! Weekly schedule, task list and shopping list.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use famdash_shared::shopping::ShoppingLine;

use super::models::{
    NewScheduleItem, NewShoppingItem, NewTask, ScheduleItem, ShoppingItem, ShoppingItemChanges,
    Task, TaskChanges,
};
use super::schema::{schedule_items, shopping_items, tasks};
use super::{StorageError, Store};

#[derive(Debug, Clone)]
pub struct ScheduleFields {
    pub title: String,
    pub member_id: Option<i32>,
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: Option<String>,
}

impl ScheduleFields {
    fn as_new(&self) -> NewScheduleItem<'_> {
        NewScheduleItem {
            title: &self.title,
            member_id: self.member_id,
            day_of_week: self.day_of_week,
            start_time: &self.start_time,
            end_time: self.end_time.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShoppingFields {
    pub name: String,
    pub quantity: Option<String>,
    pub category: String,
    pub store: String,
}

#[derive(Debug, Clone, Default)]
pub struct ShoppingUpdate {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub done: Option<bool>,
}

impl Store {
    // Schedule

    pub async fn list_schedule(
        &self,
        day: Option<i32>,
    ) -> Result<Vec<ScheduleItem>, StorageError> {
        self.run(move |conn| {
            let mut q = schedule_items::table
                .order((
                    schedule_items::day_of_week.asc(),
                    schedule_items::start_time.asc(),
                    schedule_items::id.asc(),
                ))
                .select(ScheduleItem::as_select())
                .into_boxed();
            if let Some(d) = day {
                q = q.filter(schedule_items::day_of_week.eq(d));
            }
            Ok(q.load(conn)?)
        })
        .await
    }

    pub async fn create_schedule_item(
        &self,
        fields: ScheduleFields,
    ) -> Result<ScheduleItem, StorageError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(schedule_items::table)
                .values(&fields.as_new())
                .returning(ScheduleItem::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn update_schedule_item(
        &self,
        id: i32,
        fields: ScheduleFields,
    ) -> Result<Option<ScheduleItem>, StorageError> {
        self.run(move |conn| {
            Ok(diesel::update(schedule_items::table.find(id))
                .set(&fields.as_new())
                .returning(ScheduleItem::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    pub async fn delete_schedule_item(&self, id: i32) -> Result<bool, StorageError> {
        self.run(move |conn| {
            Ok(diesel::delete(schedule_items::table.find(id)).execute(conn)? > 0)
        })
        .await
    }

    // Tasks

    pub async fn list_tasks(&self, include_done: bool) -> Result<Vec<Task>, StorageError> {
        self.run(move |conn| {
            let mut q = tasks::table
                .order((tasks::done.asc(), tasks::due_date.asc(), tasks::id.asc()))
                .select(Task::as_select())
                .into_boxed();
            if !include_done {
                q = q.filter(tasks::done.eq(false));
            }
            Ok(q.load(conn)?)
        })
        .await
    }

    pub async fn create_task(
        &self,
        title: String,
        member_id: Option<i32>,
        due_date: Option<NaiveDate>,
    ) -> Result<Task, StorageError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(tasks::table)
                .values(&NewTask {
                    title: &title,
                    member_id,
                    due_date,
                    done: false,
                    created_at: Utc::now().naive_utc(),
                })
                .returning(Task::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn update_task(
        &self,
        id: i32,
        update: TaskUpdate,
    ) -> Result<Option<Task>, StorageError> {
        self.run(move |conn| {
            let changes = TaskChanges {
                title: update.title.as_deref(),
                done: update.done,
            };
            if changes.title.is_none() && changes.done.is_none() {
                return Ok(tasks::table
                    .find(id)
                    .select(Task::as_select())
                    .first(conn)
                    .optional()?);
            }
            Ok(diesel::update(tasks::table.find(id))
                .set(&changes)
                .returning(Task::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    pub async fn delete_task(&self, id: i32) -> Result<bool, StorageError> {
        self.run(move |conn| Ok(diesel::delete(tasks::table.find(id)).execute(conn)? > 0))
            .await
    }

    // Shopping list

    pub async fn list_shopping(&self) -> Result<Vec<ShoppingItem>, StorageError> {
        self.run(|conn| {
            Ok(shopping_items::table
                .order((
                    shopping_items::checked.asc(),
                    shopping_items::category.asc(),
                    shopping_items::name.asc(),
                ))
                .select(ShoppingItem::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn add_shopping_item(
        &self,
        fields: ShoppingFields,
    ) -> Result<ShoppingItem, StorageError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(shopping_items::table)
                .values(&NewShoppingItem {
                    name: &fields.name,
                    quantity: fields.quantity.as_deref(),
                    category: &fields.category,
                    store: &fields.store,
                    checked: false,
                    created_at: Utc::now().naive_utc(),
                })
                .returning(ShoppingItem::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn update_shopping_item(
        &self,
        id: i32,
        update: ShoppingUpdate,
    ) -> Result<Option<ShoppingItem>, StorageError> {
        self.run(move |conn| {
            let changes = ShoppingItemChanges {
                name: update.name.as_deref(),
                quantity: update.quantity.as_deref(),
                checked: update.checked,
            };
            if changes.name.is_none() && changes.quantity.is_none() && changes.checked.is_none() {
                return Ok(shopping_items::table
                    .find(id)
                    .select(ShoppingItem::as_select())
                    .first(conn)
                    .optional()?);
            }
            Ok(diesel::update(shopping_items::table.find(id))
                .set(&changes)
                .returning(ShoppingItem::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    pub async fn delete_shopping_item(&self, id: i32) -> Result<bool, StorageError> {
        self.run(move |conn| {
            Ok(diesel::delete(shopping_items::table.find(id)).execute(conn)? > 0)
        })
        .await
    }

    pub async fn clear_checked_shopping(&self) -> Result<usize, StorageError> {
        self.run(|conn| {
            Ok(
                diesel::delete(shopping_items::table.filter(shopping_items::checked.eq(true)))
                    .execute(conn)?,
            )
        })
        .await
    }

    /// Insert aggregated lines whose names are not already on the unchecked
    /// list (case-insensitive). Returns the inserted rows.
    pub async fn insert_shopping_lines(
        &self,
        lines: Vec<ShoppingLine>,
    ) -> Result<Vec<ShoppingItem>, StorageError> {
        self.run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<_, StorageError> {
                let open: Vec<String> = shopping_items::table
                    .filter(shopping_items::checked.eq(false))
                    .select(shopping_items::name)
                    .load(conn)?;
                let mut seen: HashSet<String> =
                    open.iter().map(|n| n.trim().to_lowercase()).collect();
                let now = Utc::now().naive_utc();
                let mut inserted = Vec::new();
                for line in &lines {
                    if !seen.insert(line.name.to_lowercase()) {
                        continue;
                    }
                    let note = line.quantity_note();
                    let row = diesel::insert_into(shopping_items::table)
                        .values(&NewShoppingItem {
                            name: &line.name,
                            quantity: (!note.is_empty()).then_some(note.as_str()),
                            category: &line.category,
                            store: &line.store,
                            checked: false,
                            created_at: now,
                        })
                        .returning(ShoppingItem::as_returning())
                        .get_result(conn)?;
                    inserted.push(row);
                }
                Ok(inserted)
            })
        })
        .await
    }
}

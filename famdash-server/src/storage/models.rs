use crate::storage::schema::{
    audit_log, chore_assignments, chore_completions, chores, habit_logs, habits,
    meal_plan_items, members, pin_sessions, point_transactions, recipe_ratings, recipes,
    reward_redemptions, rewards, schedule_items, settings, shopping_items, tasks,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = members)]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub role: String,
    pub avatar: Option<String>,
    pub color: Option<String>,
    pub nfc_card_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = members)]
#[diesel(treat_none_as_null = true)]
pub struct NewMember<'a> {
    pub name: &'a str,
    pub role: &'a str,
    pub avatar: Option<&'a str>,
    pub color: Option<&'a str>,
    pub nfc_card_id: Option<&'a str>,
}

/// Ledger row. Never updated once written.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = point_transactions)]
pub struct PointTransaction {
    pub id: i32,
    pub member_id: i32,
    pub amount: i32,
    pub kind: String,
    pub description: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = point_transactions)]
pub struct NewPointTransaction<'a> {
    pub member_id: i32,
    pub amount: i32,
    pub kind: &'a str,
    pub description: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = rewards)]
pub struct Reward {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i32,
    pub active: bool,
    pub is_cash_reward: bool,
    pub cash_value: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = rewards)]
#[diesel(treat_none_as_null = true)]
pub struct NewReward<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub points_cost: i32,
    pub active: bool,
    pub is_cash_reward: bool,
    pub cash_value: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = reward_redemptions)]
pub struct Redemption {
    pub id: i32,
    pub reward_id: i32,
    pub requester_id: i32,
    pub points_spent: i32,
    pub status: String,
    pub approver_id: Option<i32>,
    pub denial_reason: Option<String>,
    pub transaction_id: Option<i32>,
    pub requested_at: NaiveDateTime,
    pub decided_at: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = reward_redemptions)]
pub struct NewRedemption<'a> {
    pub reward_id: i32,
    pub requester_id: i32,
    pub points_spent: i32,
    pub status: &'a str,
    pub requested_at: NaiveDateTime,
}

/// The household settings row (single row, `id = 1`).
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = settings)]
pub struct Settings {
    pub id: i32,
    pub household_name: String,
    pub theme: String,
    pub weather_latitude: Option<f64>,
    pub weather_longitude: Option<f64>,
    pub weather_units: String,
    pub screensaver_enabled: bool,
    pub screensaver_idle_minutes: i32,
    pub photo_interval_seconds: i32,
    pub min_cash_redemption_points: i32,
    pub pin_hash: Option<String>,
    pub pin_failed_attempts: i32,
    pub pin_locked_until: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

/// Display settings written back as one unit. PIN columns are owned by the
/// PIN flows and are not part of this changeset.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = settings)]
#[diesel(treat_none_as_null = true)]
pub struct SettingsChanges<'a> {
    pub household_name: &'a str,
    pub theme: &'a str,
    pub weather_latitude: Option<f64>,
    pub weather_longitude: Option<f64>,
    pub weather_units: &'a str,
    pub screensaver_enabled: bool,
    pub screensaver_idle_minutes: i32,
    pub photo_interval_seconds: i32,
    pub min_cash_redemption_points: i32,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = pin_sessions)]
#[diesel(primary_key(token))]
pub struct PinSession {
    pub token: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = pin_sessions)]
pub struct NewPinSession<'a> {
    pub token: &'a str,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = audit_log)]
pub struct AuditEntry {
    pub id: i32,
    pub event: String,
    pub detail: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = audit_log)]
pub struct NewAuditEntry<'a> {
    pub event: &'a str,
    pub detail: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = chores)]
pub struct Chore {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub points: i32,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = chores)]
#[diesel(treat_none_as_null = true)]
pub struct NewChore<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub points: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = chore_assignments)]
pub struct ChoreAssignment {
    pub chore_id: i32,
    pub member_id: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = chore_completions)]
pub struct ChoreCompletion {
    pub id: i32,
    pub chore_id: i32,
    pub member_id: i32,
    pub completed_on: NaiveDate,
    pub completed_at: NaiveDateTime,
    pub points_awarded: i32,
    pub transaction_id: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = chore_completions)]
pub struct NewChoreCompletion {
    pub chore_id: i32,
    pub member_id: i32,
    pub completed_on: NaiveDate,
    pub completed_at: NaiveDateTime,
    pub points_awarded: i32,
    pub transaction_id: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = habits)]
pub struct Habit {
    pub id: i32,
    pub name: String,
    pub points: i32,
    pub member_id: Option<i32>,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = habits)]
#[diesel(treat_none_as_null = true)]
pub struct NewHabit<'a> {
    pub name: &'a str,
    pub points: i32,
    pub member_id: Option<i32>,
    pub active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = habit_logs)]
pub struct HabitLog {
    pub id: i32,
    pub habit_id: i32,
    pub member_id: i32,
    pub logged_on: NaiveDate,
    pub created_at: NaiveDateTime,
    pub points_awarded: i32,
    pub transaction_id: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = habit_logs)]
pub struct NewHabitLog {
    pub habit_id: i32,
    pub member_id: i32,
    pub logged_on: NaiveDate,
    pub created_at: NaiveDateTime,
    pub points_awarded: i32,
    pub transaction_id: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = recipes)]
pub struct Recipe {
    pub id: i32,
    pub name: String,
    pub ingredients: String, // JSON array of ingredients
    pub instructions: Option<String>,
    pub servings: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = recipes)]
#[diesel(treat_none_as_null = true)]
pub struct NewRecipe<'a> {
    pub name: &'a str,
    pub ingredients: &'a str,
    pub instructions: Option<&'a str>,
    pub servings: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = recipe_ratings)]
pub struct NewRecipeRating {
    pub recipe_id: i32,
    pub member_id: i32,
    pub rating: i32,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = meal_plan_items)]
pub struct MealPlanItem {
    pub id: i32,
    pub recipe_id: i32,
    pub week_number: i32,
    pub day_of_week: i32,
    pub meal_type: String,
}

#[derive(Insertable)]
#[diesel(table_name = meal_plan_items)]
pub struct NewMealPlanItem<'a> {
    pub recipe_id: i32,
    pub week_number: i32,
    pub day_of_week: i32,
    pub meal_type: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = schedule_items)]
pub struct ScheduleItem {
    pub id: i32,
    pub title: String,
    pub member_id: Option<i32>,
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: Option<String>,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = schedule_items)]
#[diesel(treat_none_as_null = true)]
pub struct NewScheduleItem<'a> {
    pub title: &'a str,
    pub member_id: Option<i32>,
    pub day_of_week: i32,
    pub start_time: &'a str,
    pub end_time: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = shopping_items)]
pub struct ShoppingItem {
    pub id: i32,
    pub name: String,
    pub quantity: Option<String>,
    pub category: String,
    pub store: String,
    pub checked: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = shopping_items)]
pub struct NewShoppingItem<'a> {
    pub name: &'a str,
    pub quantity: Option<&'a str>,
    pub category: &'a str,
    pub store: &'a str,
    pub checked: bool,
    pub created_at: NaiveDateTime,
}

/// Partial update; `None` leaves the column untouched.
#[derive(AsChangeset, Default)]
#[diesel(table_name = shopping_items)]
pub struct ShoppingItemChanges<'a> {
    pub name: Option<&'a str>,
    pub quantity: Option<&'a str>,
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = tasks)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub member_id: Option<i32>,
    pub due_date: Option<NaiveDate>,
    pub done: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTask<'a> {
    pub title: &'a str,
    pub member_id: Option<i32>,
    pub due_date: Option<NaiveDate>,
    pub done: bool,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = tasks)]
pub struct TaskChanges<'a> {
    pub title: Option<&'a str>,
    pub done: Option<bool>,
}

use serde::{Deserialize, Serialize};

use crate::domain::{Ingredient, MealType, MemberRole, RedemptionStatus, TransactionType};

pub mod endpoints;

pub const API_V1_PREFIX: &str = "/api/v1";

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionDto {
    pub version: String,
}

// Members
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: i32,
    pub name: String,
    pub role: MemberRole,
    pub avatar: Option<String>,
    pub color: Option<String>,
    pub nfc_card_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberReq {
    pub name: String,
    pub role: MemberRole,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub nfc_card_id: Option<String>,
}

// Points ledger
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDto {
    pub member_id: i32,
    pub member_name: String,
    pub balance: i64,
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: i32,
    pub member_id: i32,
    pub amount: i32,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    pub created_at: String, // RFC3339 UTC
}

/// Manual adjustment by a parent. `amount` is a positive magnitude.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustPointsReq {
    pub amount: i32,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub description: Option<String>,
}

// Rewards
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i32,
    pub active: bool,
    pub is_cash_reward: bool,
    pub cash_value: Option<i32>, // cents
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardReq {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub points_cost: i32,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub is_cash_reward: bool,
    #[serde(default)]
    pub cash_value: Option<i32>,
}

// Redemptions
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRequestReq {
    pub reward_id: i32,
    pub requester_id: i32,
    #[serde(default)]
    pub custom_points_amount: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionDecisionReq {
    pub status: RedemptionStatus,
    #[serde(default)]
    pub approver_id: Option<i32>,
    #[serde(default)]
    pub denial_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionDto {
    pub id: i32,
    pub reward_id: i32,
    pub requester_id: i32,
    pub points_spent: i32,
    pub status: RedemptionStatus,
    pub approver_id: Option<i32>,
    pub denial_reason: Option<String>,
    pub requested_at: String,
    pub decided_at: Option<String>,
}

// PIN
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinStatusDto {
    pub configured: bool,
    pub locked: bool,
    pub lockout_remaining: i64,
    pub authenticated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinSetupReq {
    pub new_pin: String,
    pub confirm_pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PinVerifyReq {
    pub pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinChangeReq {
    pub current_pin: String,
    pub new_pin: String,
    pub confirm_pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinSessionDto {
    pub expires_at: String,
}

// Settings
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDto {
    pub household_name: String,
    pub theme: String,
    pub weather_latitude: Option<f64>,
    pub weather_longitude: Option<f64>,
    pub weather_units: String,
    pub screensaver_enabled: bool,
    pub screensaver_idle_minutes: i32,
    pub photo_interval_seconds: i32,
    pub min_cash_redemption_points: i32,
    pub pin_configured: bool,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdateReq {
    pub household_name: Option<String>,
    pub theme: Option<String>,
    pub weather_latitude: Option<f64>,
    pub weather_longitude: Option<f64>,
    pub weather_units: Option<String>,
    pub screensaver_enabled: Option<bool>,
    pub screensaver_idle_minutes: Option<i32>,
    pub photo_interval_seconds: Option<i32>,
    pub min_cash_redemption_points: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryDto {
    pub id: i32,
    pub event: String,
    pub detail: Option<String>,
    pub created_at: String,
}

// Chores
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoreDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub points: i32,
    pub active: bool,
    pub assigned_member_ids: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoreReq {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub points: i32,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentsReq {
    pub member_ids: Vec<i32>,
}

/// Body of kiosk actions performed on behalf of a member (complete, undo, log).
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberActionReq {
    pub member_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoreCompletionDto {
    pub id: i32,
    pub chore_id: i32,
    pub member_id: i32,
    pub completed_on: String, // YYYY-MM-DD, household time zone
    pub completed_at: String,
    pub points_awarded: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoreTodayDto {
    #[serde(flatten)]
    pub chore: ChoreDto,
    pub completion: Option<ChoreCompletionDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoDto {
    pub points_reverted: i32,
    pub balance: i64,
}

// Habits
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitDto {
    pub id: i32,
    pub name: String,
    pub points: i32,
    pub member_id: Option<i32>,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitReq {
    pub name: String,
    pub points: i32,
    #[serde(default)]
    pub member_id: Option<i32>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitLogDto {
    pub id: i32,
    pub habit_id: i32,
    pub member_id: i32,
    pub logged_on: String,
    pub created_at: String,
}

// Meals
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDto {
    pub id: i32,
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Option<String>,
    pub servings: Option<i32>,
    pub average_rating: Option<f64>,
    pub rating_count: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeReq {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub servings: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingReq {
    pub member_id: i32,
    pub rating: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanItemDto {
    pub id: i32,
    pub recipe_id: i32,
    pub recipe_name: String,
    pub week_number: i32,
    pub day_of_week: i32,
    pub meal_type: MealType,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanItemReq {
    pub recipe_id: i32,
    pub week_number: i32,
    pub day_of_week: i32,
    pub meal_type: MealType,
}

// Shopping
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItemDto {
    pub id: i32,
    pub name: String,
    pub quantity: Option<String>,
    pub category: String,
    pub store: String,
    pub checked: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItemReq {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub store: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItemUpdateReq {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub checked: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateShoppingReq {
    pub weeks: Vec<i32>,
}

// Schedule
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItemDto {
    pub id: i32,
    pub title: String,
    pub member_id: Option<i32>,
    pub day_of_week: i32,
    pub start_time: String, // HH:MM
    pub end_time: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItemReq {
    pub title: String,
    #[serde(default)]
    pub member_id: Option<i32>,
    pub day_of_week: i32,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
}

// Tasks
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: i32,
    pub title: String,
    pub member_id: Option<i32>,
    pub due_date: Option<String>, // YYYY-MM-DD
    pub done: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReq {
    pub title: String,
    #[serde(default)]
    pub member_id: Option<i32>,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateReq {
    pub title: Option<String>,
    pub done: Option<bool>,
}

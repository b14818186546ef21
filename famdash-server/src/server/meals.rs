use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use famdash_shared::api::{MealPlanItemDto, MealPlanItemReq, RatingReq, RecipeDto, RecipeReq};
use serde::Deserialize;
use tracing::info;

use super::error::ApiJson;
use super::members::require_member;
use super::validate::{Validator, clean};
use super::{AppError, AppState};
use crate::storage::models::MealPlanItem;
use crate::storage::{RatedRecipe, RecipeFields};

fn to_recipe_dto(r: RatedRecipe) -> RecipeDto {
    RecipeDto {
        ingredients: r.recipe.ingredient_list(),
        id: r.recipe.id,
        name: r.recipe.name,
        instructions: r.recipe.instructions,
        servings: r.recipe.servings,
        average_rating: r.average_rating,
        rating_count: r.rating_count,
    }
}

fn to_plan_dto((item, recipe_name): (MealPlanItem, String)) -> Result<MealPlanItemDto, AppError> {
    Ok(MealPlanItemDto {
        meal_type: item.meal_type.parse().map_err(AppError::internal)?,
        id: item.id,
        recipe_id: item.recipe_id,
        recipe_name,
        week_number: item.week_number,
        day_of_week: item.day_of_week,
    })
}

fn recipe_fields(body: RecipeReq) -> Result<RecipeFields, AppError> {
    let mut v = Validator::new();
    v.non_empty("name", &body.name);
    v.check(
        body.ingredients.iter().all(|i| !i.name.trim().is_empty()),
        "ingredients",
        "every ingredient needs a name",
    );
    if let Some(s) = body.servings {
        v.range("servings", s, 1, 100);
    }
    v.finish()?;
    Ok(RecipeFields {
        name: body.name.trim().to_string(),
        ingredients: body.ingredients,
        instructions: clean(body.instructions),
        servings: body.servings,
    })
}

fn recipe_not_found(id: i32) -> AppError {
    AppError::not_found(format!("recipe not found: {id}"))
}

pub(super) async fn api_list_recipes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeDto>>, AppError> {
    let rows = state.store.list_recipes().await?;
    Ok(Json(rows.into_iter().map(to_recipe_dto).collect()))
}

pub(super) async fn api_get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeDto>, AppError> {
    let recipe = state
        .store
        .get_recipe(id)
        .await?
        .ok_or_else(|| recipe_not_found(id))?;
    Ok(Json(to_recipe_dto(recipe)))
}

pub(super) async fn api_create_recipe(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RecipeReq>,
) -> Result<(StatusCode, Json<RecipeDto>), AppError> {
    let recipe = state.store.create_recipe(recipe_fields(body)?).await?;
    info!(recipe_id = recipe.recipe.id, "recipe created");
    Ok((StatusCode::CREATED, Json(to_recipe_dto(recipe))))
}

pub(super) async fn api_update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<RecipeReq>,
) -> Result<Json<RecipeDto>, AppError> {
    let recipe = state
        .store
        .update_recipe(id, recipe_fields(body)?)
        .await?
        .ok_or_else(|| recipe_not_found(id))?;
    Ok(Json(to_recipe_dto(recipe)))
}

pub(super) async fn api_delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_recipe(id).await? {
        return Err(recipe_not_found(id));
    }
    info!(recipe_id = id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// One rating per member and recipe; a second rating replaces the first.
pub(super) async fn api_rate_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<RatingReq>,
) -> Result<Json<RecipeDto>, AppError> {
    Validator::new().range("rating", body.rating, 1, 5).finish()?;
    if state.store.get_recipe(id).await?.is_none() {
        return Err(recipe_not_found(id));
    }
    require_member(&state, body.member_id).await?;
    let recipe = state
        .store
        .rate_recipe(id, body.member_id, body.rating)
        .await?;
    info!(recipe_id = id, member_id = body.member_id, rating = body.rating, "recipe rated");
    Ok(Json(to_recipe_dto(recipe)))
}

#[derive(Debug, Deserialize)]
pub(super) struct PlanQuery {
    week: Option<i32>,
}

pub(super) async fn api_list_meal_plan(
    State(state): State<AppState>,
    Query(q): Query<PlanQuery>,
) -> Result<Json<Vec<MealPlanItemDto>>, AppError> {
    let rows = state.store.list_meal_plan(q.week).await?;
    let items = rows
        .into_iter()
        .map(to_plan_dto)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

pub(super) async fn api_add_meal_plan_item(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MealPlanItemReq>,
) -> Result<(StatusCode, Json<MealPlanItemDto>), AppError> {
    Validator::new()
        .range("weekNumber", body.week_number, 1, 53)
        .range("dayOfWeek", body.day_of_week, 0, 6)
        .finish()?;
    if state.store.get_recipe(body.recipe_id).await?.is_none() {
        return Err(recipe_not_found(body.recipe_id));
    }
    let row = state
        .store
        .add_meal_plan_item(
            body.recipe_id,
            body.week_number,
            body.day_of_week,
            body.meal_type.as_str(),
        )
        .await?;
    info!(
        recipe_id = body.recipe_id,
        week = body.week_number,
        day = body.day_of_week,
        "meal planned"
    );
    Ok((StatusCode::CREATED, Json(to_plan_dto(row)?)))
}

pub(super) async fn api_delete_meal_plan_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_meal_plan_item(id).await? {
        return Err(AppError::not_found(format!("meal plan item not found: {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use famdash_shared::domain::Ingredient;
use famdash_shared::shopping::PlannedRecipe;
use tracing::warn;

use super::models::{MealPlanItem, NewMealPlanItem, NewRecipe, NewRecipeRating, Recipe};
use super::schema::{meal_plan_items, recipe_ratings, recipes};
use super::{StorageError, Store};

#[derive(Debug, Clone)]
pub struct RecipeFields {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Option<String>,
    pub servings: Option<i32>,
}

/// A recipe with its rating aggregate.
#[derive(Debug, Clone)]
pub struct RatedRecipe {
    pub recipe: Recipe,
    pub average_rating: Option<f64>,
    pub rating_count: i32,
}

impl Recipe {
    /// Ingredients decoded from their JSON column. A corrupt column reads as empty.
    pub fn ingredient_list(&self) -> Vec<Ingredient> {
        match serde_json::from_str(&self.ingredients) {
            Ok(list) => list,
            Err(e) => {
                warn!(recipe_id = self.id, error = %e, "recipe ingredients are not valid JSON");
                Vec::new()
            }
        }
    }
}

fn encode_ingredients(list: &[Ingredient]) -> Result<String, StorageError> {
    serde_json::to_string(list).map_err(|e| StorageError::InvalidInput(e.to_string()))
}

fn rating_stats(
    conn: &mut SqliteConnection,
    only: Option<i32>,
) -> QueryResult<HashMap<i32, (i64, i32)>> {
    let mut q = recipe_ratings::table
        .select((recipe_ratings::recipe_id, recipe_ratings::rating))
        .into_boxed();
    if let Some(id) = only {
        q = q.filter(recipe_ratings::recipe_id.eq(id));
    }
    let rows: Vec<(i32, i32)> = q.load(conn)?;
    let mut stats: HashMap<i32, (i64, i32)> = HashMap::new();
    for (recipe, rating) in rows {
        let entry = stats.entry(recipe).or_default();
        entry.0 += i64::from(rating);
        entry.1 += 1;
    }
    Ok(stats)
}

fn rate(recipe: Recipe, stats: &HashMap<i32, (i64, i32)>) -> RatedRecipe {
    let (sum, count) = stats.get(&recipe.id).copied().unwrap_or((0, 0));
    let average_rating = (count > 0).then(|| {
        let avg = sum as f64 / f64::from(count);
        (avg * 10.0).round() / 10.0
    });
    RatedRecipe {
        recipe,
        average_rating,
        rating_count: count,
    }
}

impl Store {
    pub async fn list_recipes(&self) -> Result<Vec<RatedRecipe>, StorageError> {
        self.run(|conn| {
            let list = recipes::table
                .order(recipes::name.asc())
                .select(Recipe::as_select())
                .load(conn)?;
            let stats = rating_stats(conn, None)?;
            Ok(list.into_iter().map(|r| rate(r, &stats)).collect())
        })
        .await
    }

    pub async fn get_recipe(&self, id: i32) -> Result<Option<RatedRecipe>, StorageError> {
        self.run(move |conn| {
            let Some(recipe) = recipes::table
                .find(id)
                .select(Recipe::as_select())
                .first(conn)
                .optional()?
            else {
                return Ok(None);
            };
            let stats = rating_stats(conn, Some(id))?;
            Ok(Some(rate(recipe, &stats)))
        })
        .await
    }

    pub async fn create_recipe(&self, fields: RecipeFields) -> Result<RatedRecipe, StorageError> {
        let ingredients = encode_ingredients(&fields.ingredients)?;
        self.run(move |conn| {
            let recipe = diesel::insert_into(recipes::table)
                .values(&NewRecipe {
                    name: &fields.name,
                    ingredients: &ingredients,
                    instructions: fields.instructions.as_deref(),
                    servings: fields.servings,
                })
                .returning(Recipe::as_returning())
                .get_result(conn)?;
            Ok(rate(recipe, &HashMap::new()))
        })
        .await
    }

    pub async fn update_recipe(
        &self,
        id: i32,
        fields: RecipeFields,
    ) -> Result<Option<RatedRecipe>, StorageError> {
        let ingredients = encode_ingredients(&fields.ingredients)?;
        self.run(move |conn| {
            let Some(recipe) = diesel::update(recipes::table.find(id))
                .set(&NewRecipe {
                    name: &fields.name,
                    ingredients: &ingredients,
                    instructions: fields.instructions.as_deref(),
                    servings: fields.servings,
                })
                .returning(Recipe::as_returning())
                .get_result(conn)
                .optional()?
            else {
                return Ok(None);
            };
            let stats = rating_stats(conn, Some(id))?;
            Ok(Some(rate(recipe, &stats)))
        })
        .await
    }

    /// Delete a recipe with its ratings and meal plan slots.
    pub async fn delete_recipe(&self, id: i32) -> Result<bool, StorageError> {
        self.run(move |conn| Ok(diesel::delete(recipes::table.find(id)).execute(conn)? > 0))
            .await
    }

    /// Insert or replace `member`'s rating of `recipe`.
    pub async fn rate_recipe(
        &self,
        recipe: i32,
        member: i32,
        rating: i32,
    ) -> Result<RatedRecipe, StorageError> {
        self.run(move |conn| {
            let now = Utc::now().naive_utc();
            diesel::insert_into(recipe_ratings::table)
                .values(&NewRecipeRating {
                    recipe_id: recipe,
                    member_id: member,
                    rating,
                    updated_at: now,
                })
                .on_conflict((recipe_ratings::recipe_id, recipe_ratings::member_id))
                .do_update()
                .set((
                    recipe_ratings::rating.eq(rating),
                    recipe_ratings::updated_at.eq(now),
                ))
                .execute(conn)?;
            let row = recipes::table
                .find(recipe)
                .select(Recipe::as_select())
                .first(conn)?;
            let stats = rating_stats(conn, Some(recipe))?;
            Ok(rate(row, &stats))
        })
        .await
    }

    /// Meal plan slots with their recipe names, optionally for one week.
    pub async fn list_meal_plan(
        &self,
        week: Option<i32>,
    ) -> Result<Vec<(MealPlanItem, String)>, StorageError> {
        self.run(move |conn| {
            let mut q = meal_plan_items::table
                .inner_join(recipes::table)
                .order((
                    meal_plan_items::week_number.asc(),
                    meal_plan_items::day_of_week.asc(),
                    meal_plan_items::id.asc(),
                ))
                .select((MealPlanItem::as_select(), recipes::name))
                .into_boxed();
            if let Some(w) = week {
                q = q.filter(meal_plan_items::week_number.eq(w));
            }
            Ok(q.load(conn)?)
        })
        .await
    }

    pub async fn add_meal_plan_item(
        &self,
        recipe: i32,
        week_number: i32,
        day_of_week: i32,
        meal_type: &'static str,
    ) -> Result<(MealPlanItem, String), StorageError> {
        self.run(move |conn| {
            let name: String = recipes::table
                .find(recipe)
                .select(recipes::name)
                .first(conn)?;
            let item = diesel::insert_into(meal_plan_items::table)
                .values(&NewMealPlanItem {
                    recipe_id: recipe,
                    week_number,
                    day_of_week,
                    meal_type,
                })
                .returning(MealPlanItem::as_returning())
                .get_result(conn)?;
            Ok((item, name))
        })
        .await
    }

    pub async fn delete_meal_plan_item(&self, id: i32) -> Result<bool, StorageError> {
        self.run(move |conn| {
            Ok(diesel::delete(meal_plan_items::table.find(id)).execute(conn)? > 0)
        })
        .await
    }

    /// Recipes planned in `weeks`, in plan order, ready for shopping aggregation.
    /// A recipe planned twice appears twice.
    pub async fn planned_recipes(&self, weeks: Vec<i32>) -> Result<Vec<PlannedRecipe>, StorageError> {
        self.run(move |conn| {
            let rows: Vec<Recipe> = meal_plan_items::table
                .inner_join(recipes::table)
                .filter(meal_plan_items::week_number.eq_any(weeks))
                .order((
                    meal_plan_items::week_number.asc(),
                    meal_plan_items::day_of_week.asc(),
                    meal_plan_items::id.asc(),
                ))
                .select(Recipe::as_select())
                .load(conn)?;
            Ok(rows
                .into_iter()
                .map(|r| PlannedRecipe {
                    ingredients: r.ingredient_list(),
                    name: r.name,
                })
                .collect())
        })
        .await
    }
}

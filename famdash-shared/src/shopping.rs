//! Shopping list aggregation over planned recipes.
//!
//! Ingredient names are merged case-insensitively and their quantities are
//! kept as per-recipe annotations; nothing is unit-converted. Category and
//! store routing are plain keyword tables evaluated in order.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::Ingredient;

pub const DEFAULT_CATEGORY: &str = "Other";
pub const DEFAULT_STORE: &str = "Grocery";

/// Evaluated top to bottom, first match wins. More specific aisles come first
/// so "ice cream" lands in Frozen and "chicken stock" in Pantry.
const CATEGORY_RULES: &[(&str, &str)] = &[
    ("Frozen", r"\b(frozen|ice cream|ice cubes)\b"),
    (
        "Pantry",
        r"\b(flour|sugar|salt|rice|pasta|spaghetti|noodles|oil|vinegar|beans|lentils|stock|broth|sauce|ketchup|mustard|mayonnaise|spices?|cumin|paprika|cinnamon|oats|honey|cereal|peanut butter|baking (soda|powder)|yeast|chocolate chips)\b",
    ),
    ("Beverages", r"\b(juice|coffee|tea|soda|sparkling water)\b"),
    ("Bakery", r"\b(bread|buns?|rolls?|tortillas?|bagels?|pita|baguette|croissants?)\b"),
    (
        "Dairy & Eggs",
        r"\b(milk|cheese|butter|yogh?urt|cream|eggs?|parmesan|mozzarella|cheddar|feta)\b",
    ),
    (
        "Meat & Seafood",
        r"\b(chicken|beef|pork|lamb|turkey|bacon|sausages?|ham|fish|salmon|tuna|cod|shrimp|prawns?|mince)\b",
    ),
    (
        "Produce",
        r"\b(apples?|bananas?|lettuce|spinach|kale|tomato(es)?|onions?|garlic|potato(es)?|carrots?|peppers?|cucumbers?|lemons?|limes?|cilantro|parsley|basil|broccoli|celery|mushrooms?|avocados?|berries|strawberr(y|ies)|zucchini|ginger)\b",
    ),
];

/// `(pattern, store, priority)`. Lowest priority number wins; ties keep table order.
const STORE_RULES: &[(&str, &str, u8)] = &[
    (
        r"\b(organic|tofu|tempeh|quinoa|kombucha|gluten[- ]free)\b",
        "Health Food Store",
        1,
    ),
    (r"\b(salmon|tuna|cod|shrimp|prawns?|fish)\b", "Fish Market", 1),
    (r"\b(beef|pork|lamb|sausages?|bacon|mince)\b", "Butcher", 2),
    (r"\b(bread|baguette|bagels?|croissants?)\b", "Bakery", 2),
    (
        r"\b(rice|flour|sugar|oats|paper towels|toilet paper)\b",
        "Warehouse Club",
        3,
    ),
];

static CATEGORIES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    CATEGORY_RULES
        .iter()
        .map(|(name, pat)| {
            let re = Regex::new(&format!("(?i){pat}")).expect("valid category pattern");
            (*name, re)
        })
        .collect()
});

static STORES: Lazy<Vec<(Regex, &'static str, u8)>> = Lazy::new(|| {
    STORE_RULES
        .iter()
        .map(|(pat, store, prio)| {
            let re = Regex::new(&format!("(?i){pat}")).expect("valid store pattern");
            (re, *store, *prio)
        })
        .collect()
});

pub fn categorize(name: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(_, re)| re.is_match(name))
        .map(|(cat, _)| *cat)
        .unwrap_or(DEFAULT_CATEGORY)
}

pub fn preferred_store(name: &str) -> &'static str {
    let mut best: Option<(&'static str, u8)> = None;
    for (re, store, prio) in STORES.iter() {
        if !re.is_match(name) {
            continue;
        }
        match best {
            Some((_, p)) if p <= *prio => {}
            _ => best = Some((store, *prio)),
        }
    }
    best.map(|(s, _)| s).unwrap_or(DEFAULT_STORE)
}

fn category_rank(category: &str) -> usize {
    CATEGORY_RULES
        .iter()
        .position(|(name, _)| *name == category)
        .unwrap_or(CATEGORY_RULES.len())
}

/// A recipe occurrence in the meal plan. A recipe planned twice appears twice.
#[derive(Debug, Clone)]
pub struct PlannedRecipe {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitySource {
    pub recipe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingLine {
    pub name: String,
    pub category: String,
    pub store: String,
    pub sources: Vec<QuantitySource>,
}

impl ShoppingLine {
    /// Human readable quantity, e.g. `2 cups (Pancakes), 1 cup (Cookies)`.
    pub fn quantity_note(&self) -> String {
        self.sources
            .iter()
            .map(|s| match &s.quantity {
                Some(q) => format!("{q} ({})", s.recipe),
                None => s.recipe.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn aggregate(recipes: &[PlannedRecipe]) -> Vec<ShoppingLine> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut lines: Vec<ShoppingLine> = Vec::new();

    for recipe in recipes {
        for ing in &recipe.ingredients {
            let name = ing.name.trim();
            if name.is_empty() {
                continue;
            }
            let quantity = ing
                .quantity
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string);
            let source = QuantitySource {
                recipe: recipe.name.clone(),
                quantity,
            };
            let key = name.to_lowercase();
            match index.get(&key) {
                Some(&i) => lines[i].sources.push(source),
                None => {
                    index.insert(key, lines.len());
                    lines.push(ShoppingLine {
                        name: name.to_string(),
                        category: categorize(name).to_string(),
                        store: preferred_store(name).to_string(),
                        sources: vec![source],
                    });
                }
            }
        }
    }

    lines.sort_by(|a, b| {
        category_rank(&a.category)
            .cmp(&category_rank(&b.category))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ing(name: &str, qty: Option<&str>) -> Ingredient {
        Ingredient {
            name: name.into(),
            quantity: qty.map(Into::into),
        }
    }

    #[test]
    fn categories_follow_table_order() {
        assert_eq!(categorize("Vanilla Ice Cream"), "Frozen");
        assert_eq!(categorize("chicken stock"), "Pantry");
        assert_eq!(categorize("Chicken breast"), "Meat & Seafood");
        assert_eq!(categorize("cheddar"), "Dairy & Eggs");
        assert_eq!(categorize("Tomatoes"), "Produce");
        assert_eq!(categorize("saffron"), DEFAULT_CATEGORY);
    }

    #[test]
    fn lowest_priority_store_wins() {
        assert_eq!(preferred_store("ground beef"), "Butcher");
        // priority 1 beats the butcher's 2
        assert_eq!(preferred_store("organic beef"), "Health Food Store");
        // both priority 1, table order decides
        assert_eq!(preferred_store("organic salmon"), "Health Food Store");
        assert_eq!(preferred_store("brown rice"), "Warehouse Club");
        assert_eq!(preferred_store("apples"), DEFAULT_STORE);
    }

    #[test]
    fn merges_names_case_insensitively() {
        let recipes = vec![
            PlannedRecipe {
                name: "Pancakes".into(),
                ingredients: vec![ing("Flour", Some("2 cups")), ing("Eggs", Some("2"))],
            },
            PlannedRecipe {
                name: "Cookies".into(),
                ingredients: vec![ing(" flour ", Some("1 cup")), ing("butter", None)],
            },
        ];
        let lines = aggregate(&recipes);
        assert_eq!(lines.len(), 3);
        let flour = lines.iter().find(|l| l.name == "Flour").unwrap();
        assert_eq!(flour.sources.len(), 2);
        assert_eq!(flour.quantity_note(), "2 cups (Pancakes), 1 cup (Cookies)");
        assert_eq!(flour.category, "Pantry");
        assert_eq!(flour.store, "Warehouse Club");
        let butter = lines.iter().find(|l| l.name == "butter").unwrap();
        assert_eq!(butter.quantity_note(), "Cookies");
    }

    #[test]
    fn output_is_grouped_by_category() {
        let recipes = vec![PlannedRecipe {
            name: "Salad".into(),
            ingredients: vec![
                ing("tomatoes", None),
                ing("feta", None),
                ing("olive oil", None),
                ing("za'atar", None),
                ing("bread", None),
            ],
        }];
        let names: Vec<_> = aggregate(&recipes).into_iter().map(|l| l.name).collect();
        assert_eq!(names, ["olive oil", "bread", "feta", "tomatoes", "za'atar"]);
    }

    #[test]
    fn repeated_recipe_accumulates() {
        let r = PlannedRecipe {
            name: "Tacos".into(),
            ingredients: vec![ing("tortillas", Some("8"))],
        };
        let lines = aggregate(&[r.clone(), r]);
        assert_eq!(lines[0].quantity_note(), "8 (Tacos), 8 (Tacos)");
    }

    #[test]
    fn skips_blank_names() {
        let r = PlannedRecipe {
            name: "Odd".into(),
            ingredients: vec![ing("  ", Some("1"))],
        };
        assert!(aggregate(&[r]).is_empty());
    }
}

//! Path builders for the JSON API, relative to the server root.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::API_V1_PREFIX;

fn v1(path: &str) -> String {
    format!("{}/{}", API_V1_PREFIX, path.trim_start_matches('/'))
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

pub fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub fn version() -> String {
    v1("version")
}

pub fn members() -> String {
    v1("members")
}
pub fn member(id: i32) -> String {
    v1(&format!("members/{id}"))
}
pub fn member_by_card(card: &str) -> String {
    v1(&format!("members/by-card/{}", enc(card)))
}

pub fn balances() -> String {
    v1("points")
}
pub fn member_points(id: i32) -> String {
    v1(&format!("members/{id}/points"))
}
pub fn member_transactions(id: i32) -> String {
    v1(&format!("members/{id}/points/transactions"))
}

pub fn rewards() -> String {
    v1("rewards")
}
pub fn reward(id: i32) -> String {
    v1(&format!("rewards/{id}"))
}

pub fn redemption_request() -> String {
    v1("redemption-request")
}
pub fn redemption(id: i32) -> String {
    v1(&format!("redemption/{id}"))
}
pub fn redemptions() -> String {
    v1("redemptions")
}

pub fn pin_status() -> String {
    v1("pin/status")
}
pub fn pin_setup() -> String {
    v1("pin/setup")
}
pub fn pin_verify() -> String {
    v1("pin/verify")
}
pub fn pin_change() -> String {
    v1("pin/change")
}
pub fn pin_logout() -> String {
    v1("pin/logout")
}

pub fn settings() -> String {
    v1("settings")
}
pub fn audit() -> String {
    v1("audit")
}

pub fn chores() -> String {
    v1("chores")
}
pub fn chores_today() -> String {
    v1("chores/today")
}
pub fn chore(id: i32) -> String {
    v1(&format!("chores/{id}"))
}
pub fn chore_assignments(id: i32) -> String {
    v1(&format!("chores/{id}/assignments"))
}
pub fn chore_complete(id: i32) -> String {
    v1(&format!("chores/{id}/complete"))
}
pub fn chore_undo(id: i32) -> String {
    v1(&format!("chores/{id}/undo"))
}

pub fn habits() -> String {
    v1("habits")
}
pub fn habit(id: i32) -> String {
    v1(&format!("habits/{id}"))
}
pub fn habit_log(id: i32) -> String {
    v1(&format!("habits/{id}/log"))
}
pub fn habit_undo(id: i32) -> String {
    v1(&format!("habits/{id}/undo"))
}
pub fn habit_logs(id: i32) -> String {
    v1(&format!("habits/{id}/logs"))
}

pub fn recipes() -> String {
    v1("recipes")
}
pub fn recipe(id: i32) -> String {
    v1(&format!("recipes/{id}"))
}
pub fn recipe_ratings(id: i32) -> String {
    v1(&format!("recipes/{id}/ratings"))
}
pub fn meal_plan() -> String {
    v1("meal-plan")
}
pub fn meal_plan_item(id: i32) -> String {
    v1(&format!("meal-plan/{id}"))
}

pub fn shopping() -> String {
    v1("shopping")
}
pub fn shopping_item(id: i32) -> String {
    v1(&format!("shopping/{id}"))
}
pub fn shopping_preview(weeks: &[i32]) -> String {
    let list = weeks
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(",");
    v1(&format!("shopping/preview?weeks={list}"))
}
pub fn shopping_generate() -> String {
    v1("shopping/generate")
}

pub fn schedule() -> String {
    v1("schedule")
}
pub fn schedule_item(id: i32) -> String {
    v1(&format!("schedule/{id}"))
}

pub fn tasks() -> String {
    v1("tasks")
}
pub fn task(id: i32) -> String {
    v1(&format!("tasks/{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_prefixed_paths() {
        assert_eq!(member_points(3), "/api/v1/members/3/points");
        assert_eq!(shopping_preview(&[1, 2]), "/api/v1/shopping/preview?weeks=1,2");
        assert_eq!(
            join("http://127.0.0.1:5252/", &redemption(7)),
            "http://127.0.0.1:5252/api/v1/redemption/7"
        );
    }

    #[test]
    fn card_ids_are_escaped() {
        assert_eq!(member_by_card("04A1B2"), "/api/v1/members/by-card/04A1B2");
        assert_eq!(
            member_by_card("04:a1/b2 ?%"),
            "/api/v1/members/by-card/04%3Aa1%2Fb2%20%3F%25"
        );
    }
}

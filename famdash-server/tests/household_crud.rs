mod common;

use axum::http::{StatusCode, header};
use common::TestServer;
use famdash_shared::api::endpoints as ep;
use serde_json::{Value, json};

fn names(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health_version_and_headers() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let (code, headers, _) = server.send("GET", "/healthz", None, None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(headers.contains_key("x-request-id"));

    let (code, headers, body) = server.send("GET", "/api/v1/version", None, None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
    let cache = headers.get(header::CACHE_CONTROL).unwrap().to_str().unwrap();
    assert!(cache.contains("no-store"));

    let (code, _, _) = server.send("GET", "/api/v1/nope", None, None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    let (code, headers, _) = server.send("GET", "/", None, None).await;
    assert_eq!(code, StatusCode::OK);
    let ctype = headers.get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(ctype.starts_with("text/html"));
}

#[tokio::test]
async fn members_crud_and_card_lookup() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let (code, body) = server
        .request(
            "POST",
            "/api/v1/members",
            None,
            Some(json!({"name": "", "role": "CHILD", "color": "red"})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"].as_array().unwrap().len(), 2);
    let (code, _) = server
        .request(
            "POST",
            "/api/v1/members",
            None,
            Some(json!({"name": "Zed", "role": "GRANDPARENT"})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let ann = server
        .request_expect(
            "POST",
            "/api/v1/members",
            None,
            Some(json!({"name": " Ann ", "role": "CHILD", "color": "#ff8800", "nfcCardId": "04A1B2"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(ann["name"], json!("Ann"));
    let (code, body) = server
        .request(
            "POST",
            "/api/v1/members",
            None,
            Some(json!({"name": "Ben", "role": "CHILD", "nfcCardId": "04A1B2"})),
        )
        .await;
    assert_eq!(code, StatusCode::CONFLICT, "{body:?}");

    let found = server
        .request_expect(
            "GET",
            "/api/v1/members/by-card/04A1B2",
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(found["id"], ann["id"]);
    let (code, _) = server
        .request("GET", "/api/v1/members/by-card/FFFF", None, None)
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);

    // Card ids with reserved characters survive the path
    let tagged = server
        .request_expect(
            "POST",
            &ep::members(),
            None,
            Some(json!({"name": "Cleo", "role": "CHILD", "nfcCardId": "tag/7 #a?"})),
            StatusCode::CREATED,
        )
        .await;
    let found = server
        .request_expect("GET", &ep::member_by_card("tag/7 #a?"), None, None, StatusCode::OK)
        .await;
    assert_eq!(found["id"], tagged["id"]);

    let id = ann["id"].as_i64().unwrap();
    let updated = server
        .request_expect(
            "PUT",
            &format!("/api/v1/members/{id}"),
            None,
            Some(json!({"name": "Annie", "role": "CHILD", "avatar": "🦊"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["name"], json!("Annie"));
    assert_eq!(updated["nfcCardId"], json!(null));

    server
        .request_expect(
            "DELETE",
            &format!("/api/v1/members/{id}"),
            None,
            None,
            StatusCode::NO_CONTENT,
        )
        .await;
    let (code, _) = server
        .request("GET", &format!("/api/v1/members/{id}"), None, None)
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    let (code, _) = server
        .request("DELETE", &format!("/api/v1/members/{id}"), None, None)
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rewards_archive_instead_of_vanishing() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let (code, _) = server
        .request(
            "POST",
            "/api/v1/rewards",
            None,
            Some(json!({"name": "Ice cream", "pointsCost": 0})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let treat = server
        .request_expect(
            "POST",
            "/api/v1/rewards",
            None,
            Some(json!({"name": "Ice cream", "pointsCost": 25, "description": "One scoop"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(treat["active"], json!(true));
    assert_eq!(treat["isCashReward"], json!(false));
    let id = treat["id"].as_i64().unwrap();

    server
        .request_expect(
            "DELETE",
            &format!("/api/v1/rewards/{id}"),
            None,
            None,
            StatusCode::NO_CONTENT,
        )
        .await;
    let listed = server
        .request_expect("GET", "/api/v1/rewards", None, None, StatusCode::OK)
        .await;
    assert!(listed.as_array().unwrap().is_empty());
    let listed = server
        .request_expect(
            "GET",
            "/api/v1/rewards?includeInactive=true",
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(names(&listed), ["Ice cream"]);
    assert_eq!(listed[0]["active"], json!(false));

    let archived = server
        .request_expect(
            "GET",
            &format!("/api/v1/rewards/{id}"),
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(archived["active"], json!(false));
}

#[tokio::test]
async fn settings_validate_every_field() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let before = server
        .request_expect("GET", "/api/v1/settings", None, None, StatusCode::OK)
        .await;
    assert_eq!(before["pinConfigured"], json!(false));

    let (code, body) = server
        .request(
            "PUT",
            "/api/v1/settings",
            None,
            Some(json!({"theme": "neon", "weatherLatitude": 95.0, "householdName": "Renamed"})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"].as_array().unwrap().len(), 2);
    let unchanged = server
        .request_expect("GET", "/api/v1/settings", None, None, StatusCode::OK)
        .await;
    assert_eq!(unchanged["householdName"], before["householdName"]);

    let saved = server
        .request_expect(
            "PUT",
            "/api/v1/settings",
            None,
            Some(json!({"theme": "dark", "householdName": "The Smiths", "weatherUnits": "imperial"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(saved["theme"], json!("dark"));
    assert_eq!(saved["householdName"], json!("The Smiths"));
    assert_eq!(saved["weatherUnits"], json!("imperial"));
    assert_eq!(saved["screensaverIdleMinutes"], before["screensaverIdleMinutes"]);
}

#[tokio::test]
async fn recipes_ratings_and_meal_plan() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let ann = server.member("Ann", "CHILD", None).await;
    let dad = server.member("Dad", "PARENT", None).await;

    let (code, _) = server
        .request(
            "POST",
            "/api/v1/recipes",
            None,
            Some(json!({"name": "Soup", "ingredients": [{"name": " "}]})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let pancakes = server
        .request_expect(
            "POST",
            "/api/v1/recipes",
            None,
            Some(json!({
                "name": "Pancakes",
                "servings": 4,
                "ingredients": [
                    {"name": "Flour", "quantity": "2 cups"},
                    {"name": "Milk", "quantity": "1 cup"},
                    {"name": "Eggs", "quantity": "2"}
                ]
            })),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(pancakes["ingredients"].as_array().unwrap().len(), 3);
    assert_eq!(pancakes["averageRating"], json!(null));
    assert_eq!(pancakes["ratingCount"], json!(0));
    let id = pancakes["id"].as_i64().unwrap();
    let ratings = format!("/api/v1/recipes/{id}/ratings");

    for (member, rating) in [(ann, 3), (dad, 5), (ann, 4)] {
        server
            .request_expect(
                "PUT",
                &ratings,
                None,
                Some(json!({"memberId": member, "rating": rating})),
                StatusCode::OK,
            )
            .await;
    }
    let rated = server
        .request_expect("GET", &format!("/api/v1/recipes/{id}"), None, None, StatusCode::OK)
        .await;
    assert_eq!(rated["ratingCount"], json!(2));
    assert_eq!(rated["averageRating"], json!(4.5));

    let (code, _) = server
        .request("PUT", &ratings, None, Some(json!({"memberId": ann, "rating": 6})))
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    let (code, _) = server
        .request(
            "PUT",
            "/api/v1/recipes/999/ratings",
            None,
            Some(json!({"memberId": ann, "rating": 3})),
        )
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);

    let (code, body) = server
        .request(
            "POST",
            "/api/v1/meal-plan",
            None,
            Some(json!({"recipeId": id, "weekNumber": 54, "dayOfWeek": 7, "mealType": "BREAKFAST"})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"].as_array().unwrap().len(), 2);
    let (code, _) = server
        .request(
            "POST",
            "/api/v1/meal-plan",
            None,
            Some(json!({"recipeId": 999, "weekNumber": 1, "dayOfWeek": 0, "mealType": "DINNER"})),
        )
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);

    let planned = server
        .request_expect(
            "POST",
            "/api/v1/meal-plan",
            None,
            Some(json!({"recipeId": id, "weekNumber": 1, "dayOfWeek": 6, "mealType": "BREAKFAST"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(planned["recipeName"], json!("Pancakes"));
    assert_eq!(planned["mealType"], json!("BREAKFAST"));

    let week1 = server
        .request_expect("GET", "/api/v1/meal-plan?week=1", None, None, StatusCode::OK)
        .await;
    assert_eq!(week1.as_array().unwrap().len(), 1);
    let week2 = server
        .request_expect("GET", "/api/v1/meal-plan?week=2", None, None, StatusCode::OK)
        .await;
    assert!(week2.as_array().unwrap().is_empty());

    server
        .request_expect(
            "DELETE",
            &format!("/api/v1/meal-plan/{}", planned["id"]),
            None,
            None,
            StatusCode::NO_CONTENT,
        )
        .await;
}

async fn recipe(server: &TestServer, name: &str, ingredients: Value) -> i64 {
    let body = server
        .request_expect(
            "POST",
            "/api/v1/recipes",
            None,
            Some(json!({"name": name, "ingredients": ingredients})),
            StatusCode::CREATED,
        )
        .await;
    body["id"].as_i64().unwrap()
}

async fn plan(server: &TestServer, recipe: i64, week: i64, day: i64) {
    server
        .request_expect(
            "POST",
            "/api/v1/meal-plan",
            None,
            Some(json!({"recipeId": recipe, "weekNumber": week, "dayOfWeek": day, "mealType": "DINNER"})),
            StatusCode::CREATED,
        )
        .await;
}

#[tokio::test]
async fn shopping_list_from_the_meal_plan() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let pancakes = recipe(
        &server,
        "Pancakes",
        json!([{"name": "Flour", "quantity": "2 cups"}, {"name": "Milk", "quantity": "1 cup"}]),
    )
    .await;
    let cookies = recipe(
        &server,
        "Cookies",
        json!([{"name": "flour", "quantity": "1 cup"}, {"name": "Chocolate chips"}]),
    )
    .await;
    plan(&server, pancakes, 1, 0).await;
    plan(&server, cookies, 2, 3).await;

    let preview = server
        .request_expect(
            "GET",
            &ep::shopping_preview(&[1, 2]),
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(names(&preview), ["Chocolate chips", "Flour", "Milk"]);
    let flour = &preview[1];
    assert_eq!(flour["category"], json!("Pantry"));
    assert_eq!(flour["store"], json!("Warehouse Club"));
    assert_eq!(flour["sources"].as_array().unwrap().len(), 2);

    let only_week1 = server
        .request_expect(
            "GET",
            &ep::shopping_preview(&[1]),
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(names(&only_week1), ["Flour", "Milk"]);
    let (code, _) = server
        .request("GET", "/api/v1/shopping/preview?weeks=1,x", None, None)
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    // Previewing leaves the list alone
    let list = server
        .request_expect("GET", &ep::shopping(), None, None, StatusCode::OK)
        .await;
    assert!(list.as_array().unwrap().is_empty());

    let generated = server
        .request_expect(
            "POST",
            &ep::shopping_generate(),
            None,
            Some(json!({"weeks": [1, 2]})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(generated.as_array().unwrap().len(), 3);
    let flour_row = generated
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["name"] == json!("Flour"))
        .unwrap();
    assert_eq!(flour_row["quantity"], json!("2 cups (Pancakes), 1 cup (Cookies)"));

    let again = server
        .request_expect(
            "POST",
            &ep::shopping_generate(),
            None,
            Some(json!({"weeks": [1, 2]})),
            StatusCode::CREATED,
        )
        .await;
    assert!(again.as_array().unwrap().is_empty());
    let (code, _) = server
        .request("POST", &ep::shopping_generate(), None, Some(json!({"weeks": []})))
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn shopping_items_by_hand() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let salmon = server
        .request_expect(
            "POST",
            &ep::shopping(),
            None,
            Some(json!({"name": "Salmon fillets", "quantity": "2"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(salmon["category"], json!("Meat & Seafood"));
    assert_eq!(salmon["store"], json!("Fish Market"));
    assert_eq!(salmon["checked"], json!(false));

    let other = server
        .request_expect(
            "POST",
            &ep::shopping(),
            None,
            Some(json!({"name": "Birthday candles", "category": "Party", "store": "Corner shop"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(other["category"], json!("Party"));
    assert_eq!(other["store"], json!("Corner shop"));

    let (code, _) = server
        .request("POST", &ep::shopping(), None, Some(json!({"name": "  "})))
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let ticked = server
        .request_expect(
            "PUT",
            &format!("/api/v1/shopping/{}", salmon["id"]),
            None,
            Some(json!({"checked": true})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(ticked["checked"], json!(true));
    assert_eq!(ticked["quantity"], json!("2"));

    let (code, _) = server.request("DELETE", &ep::shopping(), None, None).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    server
        .request_expect(
            "DELETE",
            "/api/v1/shopping?checked=true",
            None,
            None,
            StatusCode::NO_CONTENT,
        )
        .await;
    let list = server
        .request_expect("GET", &ep::shopping(), None, None, StatusCode::OK)
        .await;
    assert_eq!(names(&list), ["Birthday candles"]);

    server
        .request_expect(
            "DELETE",
            &format!("/api/v1/shopping/{}", other["id"]),
            None,
            None,
            StatusCode::NO_CONTENT,
        )
        .await;
    let (code, _) = server
        .request(
            "PUT",
            &format!("/api/v1/shopping/{}", other["id"]),
            None,
            Some(json!({"checked": true})),
        )
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedule_and_tasks() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let ann = server.member("Ann", "CHILD", None).await;

    let (code, body) = server
        .request(
            "POST",
            "/api/v1/schedule",
            None,
            Some(json!({"title": "Swim", "dayOfWeek": 2, "startTime": "17:00", "endTime": "16:30"})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], json!("endTime"));
    let (code, _) = server
        .request(
            "POST",
            "/api/v1/schedule",
            None,
            Some(json!({"title": "Swim", "dayOfWeek": 2, "startTime": "25:00"})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    let (code, _) = server
        .request(
            "POST",
            "/api/v1/schedule",
            None,
            Some(json!({"title": "Swim", "dayOfWeek": 2, "startTime": "17:00", "memberId": 999})),
        )
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);

    let swim = server
        .request_expect(
            "POST",
            "/api/v1/schedule",
            None,
            Some(json!({
                "title": "Swim",
                "dayOfWeek": 2,
                "startTime": "17:00",
                "endTime": "18:00",
                "memberId": ann
            })),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(swim["startTime"], json!("17:00"));
    let tuesday = server
        .request_expect("GET", "/api/v1/schedule?day=2", None, None, StatusCode::OK)
        .await;
    assert_eq!(tuesday.as_array().unwrap().len(), 1);
    let monday = server
        .request_expect("GET", "/api/v1/schedule?day=1", None, None, StatusCode::OK)
        .await;
    assert!(monday.as_array().unwrap().is_empty());

    let moved = server
        .request_expect(
            "PUT",
            &format!("/api/v1/schedule/{}", swim["id"]),
            None,
            Some(json!({"title": "Swim", "dayOfWeek": 3, "startTime": "16:00"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(moved["dayOfWeek"], json!(3));
    assert_eq!(moved["endTime"], json!(null));
    server
        .request_expect(
            "DELETE",
            &format!("/api/v1/schedule/{}", swim["id"]),
            None,
            None,
            StatusCode::NO_CONTENT,
        )
        .await;

    let (code, _) = server
        .request(
            "POST",
            "/api/v1/tasks",
            None,
            Some(json!({"title": "Library books", "dueDate": "2026-13-01"})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    let task = server
        .request_expect(
            "POST",
            "/api/v1/tasks",
            None,
            Some(json!({"title": "Library books", "dueDate": "2026-11-02", "memberId": ann})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(task["done"], json!(false));
    assert_eq!(task["dueDate"], json!("2026-11-02"));

    let done = server
        .request_expect(
            "PUT",
            &format!("/api/v1/tasks/{}", task["id"]),
            None,
            Some(json!({"done": true})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(done["done"], json!(true));
    assert_eq!(done["title"], json!("Library books"));

    let open = server
        .request_expect("GET", "/api/v1/tasks", None, None, StatusCode::OK)
        .await;
    assert!(open.as_array().unwrap().is_empty());
    let all = server
        .request_expect("GET", "/api/v1/tasks?includeDone=true", None, None, StatusCode::OK)
        .await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    server
        .request_expect(
            "DELETE",
            &format!("/api/v1/tasks/{}", task["id"]),
            None,
            None,
            StatusCode::NO_CONTENT,
        )
        .await;
    let (code, _) = server
        .request("DELETE", &format!("/api/v1/tasks/{}", task["id"]), None, None)
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

mod common;

use axum::http::{StatusCode, header};
use common::{TestServer, session_from, test_config};
use famdash_shared::api::endpoints as ep;
use serde_json::{Value, json};
use std::time::Duration;

async fn setup(server: &TestServer, pin: &str) -> String {
    let (status, headers, body) = server
        .send(
            "POST",
            &ep::pin_setup(),
            None,
            Some(json!({"newPin": pin, "confirmPin": pin})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body:?}");
    assert!(body["expiresAt"].is_string());
    session_from(&headers).expect("session cookie")
}

async fn verify(server: &TestServer, pin: &str) -> (StatusCode, Option<String>, Value) {
    let (status, headers, body) = server
        .send("POST", &ep::pin_verify(), None, Some(json!({"pin": pin})))
        .await;
    (status, session_from(&headers), body)
}

async fn status(server: &TestServer, token: Option<&str>) -> Value {
    server
        .request_expect("GET", &ep::pin_status(), token, None, StatusCode::OK)
        .await
}

fn new_member() -> Option<Value> {
    Some(json!({"name": "Grandma", "role": "PARENT"}))
}

#[tokio::test]
async fn protected_routes_follow_pin_configuration() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let st = status(&server, None).await;
    assert_eq!(st["configured"], json!(false));
    // Nothing to verify against yet
    server
        .request_expect("POST", &ep::members(), None, new_member(), StatusCode::CREATED)
        .await;

    let token = setup(&server, "2468").await;
    let st = status(&server, Some(&token)).await;
    assert_eq!(st["configured"], json!(true));
    assert_eq!(st["authenticated"], json!(true));
    assert_eq!(status(&server, None).await["authenticated"], json!(false));

    let (code, _) = server
        .request("POST", &ep::members(), None, new_member())
        .await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    let (code, _) = server
        .request("POST", &ep::members(), Some("not-a-session"), new_member())
        .await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    server
        .request_expect(
            "POST",
            &ep::members(),
            Some(&token),
            new_member(),
            StatusCode::CREATED,
        )
        .await;

    // Kiosk reads and actions stay open
    server
        .request_expect("GET", &ep::members(), None, None, StatusCode::OK)
        .await;
    server
        .request_expect("GET", &ep::settings(), None, None, StatusCode::OK)
        .await;
    let settings = server
        .request_expect("GET", &ep::settings(), None, None, StatusCode::OK)
        .await;
    assert_eq!(settings["pinConfigured"], json!(true));
    assert!(settings.get("pinHash").is_none());

    let (code, _) = server
        .request("PUT", &ep::settings(), None, Some(json!({"theme": "dark"})))
        .await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    let (code, _) = server.request("GET", &ep::redemptions(), None, None).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);

    let (code, _) = server
        .request(
            "POST",
            &ep::pin_setup(),
            None,
            Some(json!({"newPin": "1357", "confirmPin": "1357"})),
        )
        .await;
    assert_eq!(code, StatusCode::CONFLICT);
}

#[tokio::test]
async fn setup_rejects_bad_input_without_state_change() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let (code, body) = server
        .request(
            "POST",
            &ep::pin_setup(),
            None,
            Some(json!({"newPin": "1234", "confirmPin": "1243"})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("PINs do not match"));

    for pin in ["123", "123456789", "12a4"] {
        let (code, _) = server
            .request(
                "POST",
                &ep::pin_setup(),
                None,
                Some(json!({"newPin": pin, "confirmPin": pin})),
            )
            .await;
        assert_eq!(code, StatusCode::BAD_REQUEST, "pin {pin}");
    }
    assert_eq!(status(&server, None).await["configured"], json!(false));

    let (code, _, _) = verify(&server, "1234").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lockout_after_repeated_failures() {
    let mut config = test_config();
    config.pin.lockout_secs = 2;
    let Some(server) = TestServer::spawn_with(config).await else {
        return;
    };
    setup(&server, "9876").await;

    for attempt in 1..=5u32 {
        let (code, _, body) = verify(&server, "0000").await;
        assert_eq!(code, StatusCode::UNAUTHORIZED);
        assert_eq!(body["remainingAttempts"], json!(5 - attempt));
        assert_eq!(body["locked"], json!(attempt == 5));
    }

    // The lock is checked before the PIN, so even the right one is refused.
    let (code, token, body) = verify(&server, "9876").await;
    assert_eq!(code, StatusCode::FORBIDDEN);
    assert!(token.is_none());
    assert_eq!(body["locked"], json!(true));
    assert!(body["lockoutRemaining"].as_i64().unwrap() >= 1);
    assert_eq!(status(&server, None).await["locked"], json!(true));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let (code, token, _) = verify(&server, "9876").await;
    assert_eq!(code, StatusCode::OK);
    assert!(token.is_some());

    // Success reset the counter
    let (_, _, body) = verify(&server, "1111").await;
    assert_eq!(body["remainingAttempts"], json!(4));

    let audit = server
        .request_expect(
            "GET",
            &format!("{}?limit=50", ep::audit()),
            token.as_deref(),
            None,
            StatusCode::OK,
        )
        .await;
    let events: Vec<&str> = audit
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    for expected in ["pin_setup", "pin_failure", "pin_lockout", "pin_locked_attempt", "pin_success"] {
        assert!(events.contains(&expected), "missing {expected} in {events:?}");
    }
}

#[tokio::test]
async fn parallel_wrong_guesses_cannot_exceed_attempt_limit() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    setup(&server, "2580").await;

    let url = ep::join(&server.base, &ep::pin_verify());
    let client = reqwest::Client::new();
    let mut guesses = tokio::task::JoinSet::new();
    for n in 0..20 {
        let client = client.clone();
        let url = url.clone();
        guesses.spawn(async move {
            client
                .post(&url)
                .json(&json!({"pin": format!("{:04}", 1000 + n)}))
                .send()
                .await
                .unwrap()
                .status()
        });
    }
    let mut rejected = 0;
    let mut locked = 0;
    while let Some(code) = guesses.join_next().await {
        match code.unwrap() {
            StatusCode::UNAUTHORIZED => rejected += 1,
            StatusCode::FORBIDDEN => locked += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(rejected, 5);
    assert_eq!(locked, 15);

    let (code, token, body) = verify(&server, "2580").await;
    assert_eq!(code, StatusCode::FORBIDDEN);
    assert!(token.is_none());
    assert_eq!(body["locked"], json!(true));
}

#[tokio::test]
async fn change_disable_and_logout() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let first = setup(&server, "1234").await;
    let (_, second, _) = verify(&server, "1234").await;
    let second = second.unwrap();

    let (code, _) = server
        .request(
            "PUT",
            &ep::pin_change(),
            None,
            Some(json!({"currentPin": "9999", "newPin": "5678", "confirmPin": "5678"})),
        )
        .await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    let (code, _) = server
        .request(
            "PUT",
            &ep::pin_change(),
            None,
            Some(json!({"currentPin": "1234", "newPin": "5678", "confirmPin": "8765"})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (code, headers, _) = server
        .send(
            "PUT",
            &ep::pin_change(),
            Some(&first),
            Some(json!({"currentPin": "1234", "newPin": "5678", "confirmPin": "5678"})),
        )
        .await;
    assert_eq!(code, StatusCode::OK);
    let fresh = session_from(&headers).unwrap();

    // Older sessions are revoked
    for old in [&first, &second] {
        let (code, _) = server
            .request("GET", &ep::redemptions(), Some(old), None)
            .await;
        assert_eq!(code, StatusCode::UNAUTHORIZED);
    }
    server
        .request_expect("GET", &ep::redemptions(), Some(&fresh), None, StatusCode::OK)
        .await;
    assert_eq!(verify(&server, "1234").await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(verify(&server, "5678").await.0, StatusCode::OK);

    let (code, headers, _) = server
        .send("POST", &ep::pin_logout(), Some(&fresh), None)
        .await;
    assert_eq!(code, StatusCode::NO_CONTENT);
    let cleared = headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));
    let (code, _) = server
        .request("GET", &ep::redemptions(), Some(&fresh), None)
        .await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);

    let (code, _) = server
        .request("DELETE", &ep::pin_change(), None, Some(json!({"pin": "0000"})))
        .await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    let body = server
        .request_expect(
            "DELETE",
            &ep::pin_change(),
            None,
            Some(json!({"pin": "5678"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["configured"], json!(false));
    assert_eq!(status(&server, None).await["configured"], json!(false));
    server
        .request_expect("GET", &ep::redemptions(), None, None, StatusCode::OK)
        .await;
}

#[tokio::test]
async fn admin_page_redirects_without_session() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let admin = format!("{}/admin", server.base);

    // Open while no PIN exists
    let resp = client.get(&admin).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let token = setup(&server, "4321").await;
    let resp = client.get(&admin).send().await.unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
        "/pin"
    );

    let resp = client
        .get(&admin)
        .header(header::COOKIE, format!("famdash_session={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Pending rewards"));

    // Cookie auth works for the API too
    let resp = client
        .get(ep::join(&server.base, &ep::redemptions()))
        .header(header::COOKIE, format!("famdash_session={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/pin", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn correct_pin_does_not_clear_an_active_lock() {
    use chrono::{Duration as Span, Utc};
    use famdash_server::storage::Store;
    use famdash_shared::lockout::LockoutPolicy;

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("lock.db");
    let store = Store::connect_sqlite(db.to_str().unwrap()).await.unwrap();
    let now = Utc::now();
    assert!(
        store
            .setup_pin("hash".into(), "token".into(), now + Span::hours(1))
            .await
            .unwrap()
    );

    assert!(store.reset_pin_failures(now).await.unwrap());
    let policy = LockoutPolicy {
        max_attempts: 2,
        lockout: Span::minutes(15),
    };
    store.record_pin_failure(now, policy).await.unwrap();
    let state = store.record_pin_failure(now, policy).await.unwrap();
    assert!(state.is_locked(now));

    // A compare that finished after the lock landed must not undo it.
    assert!(!store.reset_pin_failures(now).await.unwrap());
    assert!(store.load_settings().await.unwrap().lockout().is_locked(now));
}

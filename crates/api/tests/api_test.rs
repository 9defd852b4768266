//! End-to-end tests of the HTTP API over the in-memory store.

#![allow(clippy::too_many_lines)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use timebill_api::{AppState, create_router};
use timebill_core::auth::{NewUser, Role, UserDirectory};
use timebill_db::{CollectionStore, InMemorySessionStore, Repositories, bootstrap};
use timebill_shared::FixedClock;
use timebill_shared::config::BootstrapConfig;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "admin-password";

struct TestApp {
    router: Router,
    repos: Repositories,
    clock: Arc<FixedClock>,
}

impl TestApp {
    async fn new() -> Self {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap(),
        ));
        let store = CollectionStore::memory().unwrap();
        let repos = Repositories::new(store, clock.clone());
        bootstrap(
            &repos,
            &BootstrapConfig {
                admin_username: "admin".to_string(),
                admin_email: "admin@timebill.local".to_string(),
                admin_password: Some(ADMIN_PASSWORD.to_string()),
            },
        )
        .await
        .unwrap();

        let state = AppState {
            repos: repos.clone(),
            sessions: Arc::new(InMemorySessionStore::new(clock.clone())),
            clock: clock.clone(),
            session_ttl: Duration::hours(8),
        };
        Self {
            router: create_router(state),
            repos,
            clock,
        }
    }

    async fn add_user(&self, username: &str, role: Role) {
        let input = NewUser {
            username: username.to_string(),
            email: format!("{username}@timebill.local"),
            password: "member-password".to_string(),
            full_name: None,
            role: Some(role),
        };
        self.repos
            .users
            .mutate(|users, now| UserDirectory::create(users, input, now))
            .await
            .unwrap();
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, login: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": login, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn admin(&self) -> String {
        self.login("admin", ADMIN_PASSWORD).await
    }
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

async fn seed_contract(app: &TestApp, token: &str, hours: &str, rate: &str) -> (i64, i64) {
    let (status, client) = app
        .request(
            "POST",
            "/api/clients",
            Some(token),
            Some(json!({"name": "Acme", "email": "ops@acme.io"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{client}");
    let client_id = client["data"]["id"].as_i64().unwrap();

    let (status, contract) = app
        .request(
            "POST",
            "/api/contracts",
            Some(token),
            Some(json!({
                "client_id": client_id,
                "contract_number": "A-100",
                "total_hours": hours,
                "hourly_rate": rate,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{contract}");
    (client_id, contract["data"]["id"].as_i64().unwrap())
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.request("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_protected_route_requires_session() {
    let app = TestApp::new().await;
    let (status, body) = app.request("GET", "/api/clients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .request("GET", "/api/clients", Some("made-up-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "admin", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_session_cookie_and_logout() {
    let app = TestApp::new().await;
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"email": "admin@timebill.local", "password": ADMIN_PASSWORD})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session_token="));

    let me = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);

    let token = cookie.trim_start_matches("session_token=").to_string();
    let (status, _) = app.request("POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_expires_with_clock() {
    let app = TestApp::new().await;
    let token = app.admin().await;
    app.clock.advance(Duration::hours(8));
    let (status, _) = app.request("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_contract_hours_are_enforced() {
    let app = TestApp::new().await;
    let token = app.admin().await;
    let (_, contract_id) = seed_contract(&app, &token, "10", "50").await;

    let (status, entry) = app
        .request(
            "POST",
            "/api/time-entries",
            Some(&token),
            Some(json!({
                "contract_id": contract_id,
                "description": "Discovery",
                "hours_used": "6",
                "entry_date": "2026-03-10",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{entry}");
    assert_eq!(decimal(&entry["data"]["amount"]), dec!(300));
    assert_eq!(entry["data"]["month_year"], "2026-03");
    assert_eq!(entry["data"]["category_name"], "General");

    let (status, body) = app
        .request(
            "POST",
            "/api/time-entries",
            Some(&token),
            Some(json!({
                "contract_id": contract_id,
                "description": "Build",
                "hours_used": "5",
                "entry_date": "2026-03-11",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_HOURS");
    assert!(body["message"].as_str().unwrap().contains("only 4 hours remaining"));

    let (_, contract) = app
        .request("GET", &format!("/api/contracts/{contract_id}"), Some(&token), None)
        .await;
    assert_eq!(decimal(&contract["data"]["used_hours"]), dec!(6));
    assert_eq!(decimal(&contract["data"]["remaining_hours"]), dec!(4));
    assert_eq!(decimal(&contract["data"]["total_value"]), dec!(500));
}

#[tokio::test]
async fn test_oversized_quantities_are_rejected() {
    let app = TestApp::new().await;
    let token = app.admin().await;
    let (client_id, contract_id) = seed_contract(&app, &token, "10", "50").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/contracts",
            Some(&token),
            Some(json!({
                "client_id": client_id,
                "contract_number": "HUGE-1",
                "total_hours": "100000000000000000000",
                "hourly_rate": "10000000000",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .request(
            "POST",
            "/api/time-entries",
            Some(&token),
            Some(json!({
                "contract_id": contract_id,
                "description": "Runaway",
                "hours_used": "100000000000000000000",
                "entry_date": "2026-03-10",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.request("GET", "/api/contracts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_an_envelope() {
    let app = TestApp::new().await;
    let (status, body) = app.request("GET", "/api/invoices", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_contract_delete_requires_confirmation() {
    let app = TestApp::new().await;
    let token = app.admin().await;
    let (_, contract_id) = seed_contract(&app, &token, "20", "40").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/time-entries",
            Some(&token),
            Some(json!({
                "contract_id": contract_id,
                "description": "Kickoff",
                "hours_used": "2",
                "entry_date": "2026-03-02",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, project) = app
        .request(
            "POST",
            "/api/projects",
            Some(&token),
            Some(json!({"name": "Portal", "contract_id": contract_id, "estimated_hours": "10"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{project}");
    let project_id = project["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/contracts/{contract_id}");
    let (status, body) = app.request("DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["requiresConfirmation"], true);
    assert_eq!(body["dependents"]["time_entries"], 1);
    assert_eq!(body["dependents"]["projects"], 1);

    let (status, body) = app
        .request("DELETE", &format!("{uri}?force=true"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["removed_time_entries"], 1);

    let (status, _) = app.request("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, project) = app
        .request("GET", &format!("/api/projects/{project_id}"), Some(&token), None)
        .await;
    assert_eq!(project["data"]["is_independent"], true);
    assert_eq!(project["data"]["status"], "cancelled");
    assert!(project["data"]["contract_id"].is_null());
}

#[tokio::test]
async fn test_payment_routes_move_billed_amount() {
    let app = TestApp::new().await;
    let token = app.admin().await;
    let (_, contract_id) = seed_contract(&app, &token, "10", "100").await;

    let (status, payment) = app
        .request(
            "POST",
            &format!("/api/contracts/{contract_id}/payment"),
            Some(&token),
            Some(json!({"amount": "500"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{payment}");
    assert_eq!(payment["data"]["payment_type"], "partial");
    assert_eq!(payment["data"]["payment_date"], "2026-03-16");
    let payment_id = payment["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/payments/{payment_id}"),
            Some(&token),
            Some(json!({"amount": "300"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            "POST",
            "/api/payments",
            Some(&token),
            Some(json!({"contract_id": contract_id, "percentage": "10"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, contract) = app
        .request("GET", &format!("/api/contracts/{contract_id}"), Some(&token), None)
        .await;
    assert_eq!(decimal(&contract["data"]["billed_amount"]), dec!(400));
    assert_eq!(decimal(&contract["data"]["remaining_amount"]), dec!(600));

    let (status, body) = app
        .request(
            "POST",
            "/api/payments",
            Some(&token),
            Some(json!({"amount": "10"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_roles_are_enforced() {
    let app = TestApp::new().await;
    app.add_user("colin", Role::Collaborator).await;
    app.add_user("viewer", Role::Client).await;
    let admin = app.admin().await;
    let (client_id, _) = seed_contract(&app, &admin, "10", "50").await;

    let collaborator = app.login("colin", "member-password").await;
    let (status, _) = app
        .request(
            "POST",
            "/api/clients",
            Some(&collaborator),
            Some(json!({"name": "Globex", "email": "hi@globex.io"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app
        .request("DELETE", &format!("/api/clients/{client_id}"), Some(&collaborator), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    let (status, _) = app.request("GET", "/api/users", Some(&collaborator), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let viewer = app.login("viewer", "member-password").await;
    let (status, _) = app.request("GET", "/api/contracts", Some(&viewer), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .request(
            "POST",
            "/api/clients",
            Some(&viewer),
            Some(json!({"name": "Initech", "email": "hi@initech.io"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deactivated_user_loses_session() {
    let app = TestApp::new().await;
    app.add_user("colin", Role::Collaborator).await;
    let admin = app.admin().await;
    let colin = app.login("colin", "member-password").await;

    let (_, users) = app.request("GET", "/api/users", Some(&admin), None).await;
    let colin_id = users["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "colin")
        .and_then(|u| u["id"].as_i64())
        .unwrap();
    assert!(users["data"][0].get("password_hash").is_none());

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/users/{colin_id}"),
            Some(&admin),
            Some(json!({"is_active": false})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request("GET", "/api/auth/me", Some(&colin), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "colin", "password": "member-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn test_general_category_is_protected() {
    let app = TestApp::new().await;
    let token = app.admin().await;
    let (status, body) = app.request("DELETE", "/api/categories/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PROTECTED");
}

#[tokio::test]
async fn test_malformed_body_is_an_envelope() {
    let app = TestApp::new().await;
    let token = app.admin().await;
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/clients")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .request(
            "POST",
            "/api/clients",
            Some(&token),
            Some(json!({"name": "Acme", "email": "not-an-email"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reports_dispatch_on_action() {
    let app = TestApp::new().await;
    let token = app.admin().await;
    let (_, contract_id) = seed_contract(&app, &token, "10", "50").await;
    let (status, _) = app
        .request(
            "POST",
            "/api/time-entries",
            Some(&token),
            Some(json!({
                "contract_id": contract_id,
                "description": "Support",
                "hours_used": "3",
                "entry_date": "2026-03-05",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, overview) = app.request("GET", "/api/reports", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["data"]["total_contracts"], 1);
    assert_eq!(decimal(&overview["data"]["month_hours"]), dec!(3));

    let (status, monthly) = app
        .request("GET", "/api/reports?action=monthly", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(monthly["data"]["month"], "2026-03");
    assert_eq!(decimal(&monthly["data"]["total_amount"]), dec!(150));

    let (status, active) = app
        .request("GET", "/api/reports?action=active_contracts", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&active["data"][0]["progress_percentage"]), dec!(30));

    let (status, entries) = app
        .request(
            "GET",
            "/api/reports?action=time-entries&month=2026-03",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&entries["data"]["total_hours"]), dec!(3));

    let (status, _) = app
        .request("GET", "/api/reports?action=forecast", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resync_is_admin_only() {
    let app = TestApp::new().await;
    app.add_user("colin", Role::Collaborator).await;
    let admin = app.admin().await;
    let colin = app.login("colin", "member-password").await;

    let (status, _) = app
        .request("POST", "/api/maintenance/resync", Some(&colin), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request("POST", "/api/maintenance/resync", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

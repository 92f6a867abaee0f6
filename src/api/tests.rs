use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use super::{AppState, router};
use crate::auth::{Claims, TokenIdentity};
use crate::config::Config;
use crate::db::Store;
use crate::models::UserRole;

const TEST_SECRET: &str = "integration-test-secret";

async fn test_state() -> Arc<AppState> {
    let mut config = Config::default();
    config.security.jwt_secret = TEST_SECRET.to_string();
    // Cheap hash params keep the suite fast.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    // A single connection so the in-memory database is shared.
    let store = Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("in-memory store");

    AppState::new(store, config).expect("app state")
}

async fn test_app() -> (Router, Arc<AppState>) {
    let state = test_state().await;
    (router(state.clone()), state)
}

fn token_for(state: &AppState, id: i32, role: UserRole, facility_id: Option<i32>) -> String {
    state
        .tokens()
        .issue(&TokenIdentity::new(id, role, facility_id))
        .expect("token")
}

async fn admin_token(state: &AppState) -> String {
    let admin = state
        .store()
        .get_user_by_email("admin@example.com")
        .await
        .expect("query admin")
        .expect("seeded admin");

    token_for(state, admin.id, admin.role, admin.facility_id)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

async fn create_facility(app: &Router, admin_token: &str, name: &str) -> i32 {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/admin/facilities",
            Some(admin_token),
            Some(json!({"name": name, "country": "USA", "city": "Springfield"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "facility create: {body}");
    i32::try_from(body["facility"]["id"].as_i64().expect("facility id")).expect("i32 id")
}

fn report_payload(facility_id: i32, icu: i32, ventilators: i32, staff: i32) -> Value {
    json!({
        "facility_id": facility_id,
        "icu_beds_available": icu,
        "ventilators_available": ventilators,
        "staff_on_duty": staff
    })
}

// ============================================================================
// System
// ============================================================================

#[tokio::test]
async fn health_reports_database_connectivity() {
    let (app, _state) = test_app().await;

    let (status, body) = send(&app, json_request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn index_exposes_service_metadata() {
    let (app, _state) = test_app().await;

    let (status, body) = send(&app, json_request("GET", "/", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "HFRAT API");
    assert_eq!(body["endpoints"]["monitor"], "/api/monitor");
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_reporter_returns_token_with_embedded_identity() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "City General Hospital").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "a@b.com",
                "password": "longenough1",
                "role": "reporter",
                "facility_id": facility_id
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["role"], "reporter");
    assert_eq!(body["facility_id"], facility_id);
    assert_eq!(body["user"]["email"], "a@b.com");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["access_token"].as_str().expect("token");
    let claims = state.tokens().decode(token).expect("decode");
    let identity = claims.identity();
    assert_eq!(identity.role, Some(UserRole::Reporter));
    assert_eq!(identity.facility_id, Some(facility_id));
    assert_eq!(identity.id.map(i64::from), body["user"]["id"].as_i64());
}

#[tokio::test]
async fn register_requires_facility_for_reporter() {
    let (app, _state) = test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"email": "r@b.com", "password": "longenough1", "role": "reporter"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn register_rejects_facility_for_non_reporter() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "Linked Facility").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "m@b.com",
                "password": "longenough1",
                "role": "admin",
                "facility_id": facility_id
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "facility_id allowed only for reporter role.");
}

#[tokio::test]
async fn register_rejects_unknown_role_and_missing_facility() {
    let (app, _state) = test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"email": "x@b.com", "password": "longenough1", "role": "superuser"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid role.");

    // Reporter pointing at a facility that does not exist.
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "x@b.com",
                "password": "longenough1",
                "role": "reporter",
                "facility_id": 999
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Facility not found.");
}

#[tokio::test]
async fn register_conflicts_on_duplicate_email() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "Dup Facility").await;

    let payload = json!({
        "email": "dup@b.com",
        "password": "longenough1",
        "role": "reporter",
        "facility_id": facility_id
    });

    let (status, _) = send(
        &app,
        json_request("POST", "/api/auth/register", None, Some(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/auth/register", None, Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered.");
}

#[tokio::test]
async fn register_collects_validation_errors() {
    let (app, _state) = test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"email": "not-an-email", "password": "short"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().expect("errors list");
    assert_eq!(errors.len(), 2);
}

// ============================================================================
// Login / logout
// ============================================================================

#[tokio::test]
async fn login_returns_token_for_valid_credentials() {
    let (app, _state) = test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "admin@example.com", "password": "change-me"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "admin");
    assert_eq!(body["facility_id"], Value::Null);
    assert!(body["access_token"].as_str().is_some());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (app, _state) = test_app().await;

    let (wrong_pw_status, wrong_pw_body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "admin@example.com", "password": "not-the-password"})),
        ),
    )
    .await;

    let (unknown_status, unknown_body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": "whatever1"})),
        ),
    )
    .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, unknown_body);
}

#[tokio::test]
async fn logout_revokes_the_presented_token() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;

    let (status, _) = send(
        &app,
        json_request("GET", "/api/admin/users", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/auth/logout", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out");

    // The revoked token now reads as unauthenticated everywhere.
    let (status, _) = send(
        &app,
        json_request("GET", "/api/admin/users", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Guards
// ============================================================================

#[tokio::test]
async fn guards_reject_missing_and_garbage_tokens() {
    let (app, _state) = test_app().await;

    let (status, _) = send(&app, json_request("GET", "/api/admin/users", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request("GET", "/api/admin/users", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn guards_hide_allowed_roles_from_foreign_callers() {
    let (app, state) = test_app().await;
    let monitor = token_for(&state, 50, UserRole::Monitor, None);

    let (status, body) = send(
        &app,
        json_request("GET", "/api/admin/users", Some(&monitor), None),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    // Reporters cannot reach monitor endpoints either.
    let reporter = token_for(&state, 51, UserRole::Reporter, Some(1));
    let (status, _) = send(
        &app,
        json_request("GET", "/api/monitor/dashboard", Some(&reporter), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn legacy_scalar_subject_is_rejected_with_forbidden() {
    let (app, _state) = test_app().await;

    // A valid signature over a legacy subject that carries only a user id.
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: json!("42"),
        jti: "legacy-jti".to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(1)).timestamp(),
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("legacy token");

    let (status, body) = send(
        &app,
        json_request("GET", "/api/monitor/dashboard", Some(&token), None),
    )
    .await;

    // Verified but role-less: forbidden, not a crash or a default role.
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn submit_report_upserts_a_single_snapshot() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "Snapshot Hospital").await;
    let reporter = token_for(&state, 10, UserRole::Reporter, Some(facility_id));

    let (status, first) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&reporter),
            Some(report_payload(facility_id, 5, 2, 30)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");

    let (status, second) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&reporter),
            Some(report_payload(facility_id, 1, 4, 25)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // In-place overwrite: same row, new values.
    assert_eq!(first["report"]["id"], second["report"]["id"]);
    assert_eq!(second["report"]["icu_beds_available"], 1);
    assert_eq!(second["report"]["ventilators_available"], 4);
    assert_eq!(second["report"]["staff_on_duty"], 25);

    let retained = state
        .store()
        .reports_since(facility_id, "1970-01-01T00:00:00.000000Z")
        .await
        .expect("history");
    assert_eq!(retained.len(), 1);
    assert_eq!(retained[0].icu_beds_available, 1);
}

#[tokio::test]
async fn reporter_cannot_submit_for_another_facility() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let own = create_facility(&app, &admin, "Own Facility").await;
    let other = create_facility(&app, &admin, "Other Facility").await;
    let reporter = token_for(&state, 11, UserRole::Reporter, Some(own));

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&reporter),
            Some(report_payload(other, 3, 3, 3)),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Reporter can only submit for their facility.");
}

#[tokio::test]
async fn unlinked_reporter_cannot_submit() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "Unlinked Target").await;
    let reporter = token_for(&state, 12, UserRole::Reporter, None);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&reporter),
            Some(report_payload(facility_id, 3, 3, 3)),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Reporter is not linked to a facility.");
}

#[tokio::test]
async fn admin_submits_for_any_facility_but_not_unknown_ones() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "Admin Writable").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&admin),
            Some(report_payload(facility_id, 2, 2, 2)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&admin),
            Some(report_payload(9999, 2, 2, 2)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Facility not found.");
}

#[tokio::test]
async fn report_validation_collects_distinct_messages() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&admin),
            Some(json!({"facility_id": 1, "icu_beds_available": 10_001, "staff_on_duty": 5})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors: Vec<&str> = body["errors"]
        .as_array()
        .expect("errors")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(errors.contains(&"icu_beds_available must be a non-negative integer (max 10000)."));
    assert!(errors.contains(&"ventilators_available is required."));
}

#[tokio::test]
async fn latest_report_lookup_covers_reporter_and_admin_paths() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "Lookup Hospital").await;
    let reporter = token_for(&state, 13, UserRole::Reporter, Some(facility_id));

    // Nothing submitted yet.
    let (status, body) = send(
        &app,
        json_request("GET", "/api/reporter/reports/me", Some(&reporter), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No report found.");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&reporter),
            Some(report_payload(facility_id, 7, 1, 12)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        json_request("GET", "/api/reporter/reports/me", Some(&reporter), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["icu_beds_available"], 7);

    // Admins must name the facility explicitly.
    let (status, body) = send(
        &app,
        json_request("GET", "/api/reporter/reports/me", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "facility_id is required for this request.");

    let uri = format!("/api/reporter/reports/me?facility_id={facility_id}");
    let (status, body) = send(&app, json_request("GET", &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["staff_on_duty"], 12);
}

// ============================================================================
// Dashboard
// ============================================================================

#[tokio::test]
async fn dashboard_marks_critical_and_unreported_facilities() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let critical_id = create_facility(&app, &admin, "Critical Hospital").await;
    let silent_id = create_facility(&app, &admin, "Silent Hospital").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&admin),
            Some(report_payload(critical_id, 0, 2, 10)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let monitor = token_for(&state, 20, UserRole::Monitor, None);
    let (status, body) = send(
        &app,
        json_request("GET", "/api/monitor/dashboard", Some(&monitor), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let facilities = body["facilities"].as_array().expect("facilities");
    let entry = |id: i32| {
        facilities
            .iter()
            .find(|f| f["facility_id"] == id)
            .expect("entry")
    };

    let critical = entry(critical_id);
    assert_eq!(critical["critical"], true);
    assert_eq!(critical["icu_beds_available"], 0);
    assert_eq!(critical["location"], "Springfield, USA");

    let silent = entry(silent_id);
    assert_eq!(silent["critical"], false);
    assert_eq!(silent["icu_beds_available"], Value::Null);
    assert_eq!(silent["last_update"], Value::Null);
}

#[tokio::test]
async fn dashboard_history_validates_its_window() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "History Hospital").await;
    let monitor = token_for(&state, 21, UserRole::Monitor, None);

    let (status, body) = send(
        &app,
        json_request("GET", "/api/monitor/dashboard/history", Some(&monitor), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "facility_id is required.");

    let uri = format!("/api/monitor/dashboard/history?facility_id={facility_id}&days=0");
    let (status, body) = send(&app, json_request("GET", &uri, Some(&monitor), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "days must be a positive integer.");

    let (status, _) = send(
        &app,
        json_request(
            "GET",
            "/api/monitor/dashboard/history?facility_id=9999",
            Some(&monitor),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&admin),
            Some(report_payload(facility_id, 4, 4, 4)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/monitor/dashboard/history?facility_id={facility_id}");
    let (status, body) = send(&app, json_request("GET", &uri, Some(&monitor), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"], 7);
    assert_eq!(body["facility"]["id"], facility_id);
    assert_eq!(body["reports"].as_array().expect("reports").len(), 1);

    // An unparseable window falls back to the default.
    let uri = format!("/api/monitor/dashboard/history?facility_id={facility_id}&days=abc");
    let (status, body) = send(&app, json_request("GET", &uri, Some(&monitor), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"], 7);
}

// ============================================================================
// Admin management
// ============================================================================

#[tokio::test]
async fn admin_lists_users_and_facilities() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    create_facility(&app, &admin, "Beta House").await;
    create_facility(&app, &admin, "Alpha House").await;

    let (status, body) = send(
        &app,
        json_request("GET", "/api/admin/facilities", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["facilities"]
        .as_array()
        .expect("facilities")
        .iter()
        .filter_map(|f| f["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Alpha House", "Beta House"]);

    let (status, body) = send(
        &app,
        json_request("GET", "/api/admin/users", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["users"]
            .as_array()
            .expect("users")
            .iter()
            .any(|u| u["email"] == "admin@example.com")
    );
}

#[tokio::test]
async fn duplicate_facility_names_conflict() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    create_facility(&app, &admin, "Unique Hospital").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/facilities",
            Some(&admin),
            Some(json!({"name": "Unique Hospital"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Facility already exists.");
}

#[tokio::test]
async fn admin_creates_users_with_temporary_passwords() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "Staffed Hospital").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/users",
            Some(&admin),
            Some(json!({
                "email": "new-reporter@example.com",
                "temporary_password": "temp-pass-1",
                "role": "reporter",
                "facility_id": facility_id
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["role"], "reporter");
    assert_eq!(body["user"]["facility_id"], facility_id);

    // The temporary password works for login.
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "new-reporter@example.com", "password": "temp-pass-1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A monitor's facility link is dropped rather than stored.
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/users",
            Some(&admin),
            Some(json!({
                "email": "new-monitor@example.com",
                "password": "temp-pass-2",
                "role": "monitor",
                "facility_id": facility_id
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["facility_id"], Value::Null);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/users",
            Some(&admin),
            Some(json!({"email": "x@example.com", "password": "temp-pass-3", "role": "chief"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid role.");
}

#[tokio::test]
async fn facility_deletion_cascades_reports() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "Doomed Hospital").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/reporter/reports",
            Some(&admin),
            Some(report_payload(facility_id, 1, 1, 1)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/admin/facilities/{facility_id}");
    let (status, body) = send(&app, json_request("DELETE", &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Facility deleted.");

    // The report went with it and the dashboard no longer lists the facility.
    let orphan = state
        .store()
        .latest_report(facility_id)
        .await
        .expect("query");
    assert!(orphan.is_none());

    let monitor = token_for(&state, 22, UserRole::Monitor, None);
    let (status, body) = send(
        &app,
        json_request("GET", "/api/monitor/dashboard", Some(&monitor), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        !body["facilities"]
            .as_array()
            .expect("facilities")
            .iter()
            .any(|f| f["facility_id"] == facility_id)
    );

    let (status, _) = send(&app, json_request("DELETE", &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn facility_deletion_is_blocked_while_users_reference_it() {
    let (app, state) = test_app().await;
    let admin = admin_token(&state).await;
    let facility_id = create_facility(&app, &admin, "Occupied Hospital").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "linked@example.com",
                "password": "longenough1",
                "role": "reporter",
                "facility_id": facility_id
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/admin/facilities/{facility_id}");
    let (status, body) = send(&app, json_request("DELETE", &uri, Some(&admin), None)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Facility has linked users and cannot be deleted.");
}

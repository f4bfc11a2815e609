// Router-level tests against the in-memory application

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use meetup_control_plane::auth::{AuthConfig, AuthState};
use meetup_control_plane::build_app;
use meetup_control_plane::config::{SeedAccount, SeedAccountsConfig, ServerConfig};
use meetup_control_plane::storage::StorageBackend;
use serde_json::{json, Value};
use tower::ServiceExt;

const BASE_URL: &str = "http://meetup.test";
const CLIENT_BASIC: &str = "Basic bXlBcHA6cGFzcw=="; // myApp:pass
const MANAGER: (&str, &str) = ("keesun@email.com", "keesun");
const OTHER: (&str, &str) = ("other@email.com", "other");

async fn test_app() -> Router {
    let mut config = AuthConfig::default();
    config.jwt.secret = "integration-test-secret".to_string();
    let auth_state = AuthState::new(config, StorageBackend::in_memory());

    auth_state
        .accounts
        .seed_accounts(&SeedAccountsConfig {
            admin: Some(SeedAccount {
                username: MANAGER.0.to_string(),
                password: MANAGER.1.to_string(),
            }),
            user: Some(SeedAccount {
                username: OTHER.0.to_string(),
                password: OTHER.1.to_string(),
            }),
        })
        .await
        .unwrap();

    let server = ServerConfig {
        base_url: BASE_URL.to_string(),
        ..ServerConfig::default()
    };
    build_app(&server, auth_state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn token_request(form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header(header::AUTHORIZATION, CLIENT_BASIC)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn token_for(app: &Router, (username, password): (&str, &str)) -> Value {
    let (status, body) = send(
        app,
        token_request(&format!(
            "grant_type=password&username={username}&password={password}"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "token request failed: {body}");
    body
}

async fn access_token(app: &Router, credentials: (&str, &str)) -> String {
    token_for(app, credentials).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn event_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": "REST API Development with Spring",
        "beginEnrollmentDateTime": "2026-11-23T14:21:00",
        "closeEnrollmentDateTime": "2026-11-24T14:21:00",
        "beginEventDateTime": "2026-11-25T14:21:00",
        "endEventDateTime": "2026-11-26T14:21:00",
        "basePrice": 100,
        "maxPrice": 200,
        "limitOfEnrollment": 100,
        "location": "Gangnam D2 Startup Factory"
    })
}

async fn create_event(app: &Router, token: &str, body: &Value) -> Value {
    let (status, created) = send(app, json_request("POST", "/api/events", Some(token), body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {created}");
    created
}

// ============================================
// Token endpoint
// ============================================

#[tokio::test]
async fn test_password_grant_issues_tokens() {
    let app = test_app().await;
    let body = token_for(&app, MANAGER).await;

    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert!(!body["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 600);
    assert_eq!(body["scope"], "read write");
}

#[tokio::test]
async fn test_password_grant_rejects_wrong_password() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        token_request("grant_type=password&username=keesun@email.com&password=wrong"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_token_endpoint_requires_client_credentials() {
    let app = test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header(header::AUTHORIZATION, "Basic bXlBcHA6d3Jvbmc=") // myApp:wrong
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "grant_type=password&username=keesun@email.com&password=keesun",
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn test_unsupported_grant_and_missing_parameters() {
    let app = test_app().await;

    let (status, body) = send(&app, token_request("grant_type=client_credentials")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_grant_type");

    let (status, body) = send(&app, token_request("grant_type=password&username=x@y.com")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = send(
        &app,
        token_request("grant_type=password&username=keesun@email.com&password=keesun&scope=admin"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_scope");
}

#[tokio::test]
async fn test_refresh_token_is_rotated_and_single_use() {
    let app = test_app().await;
    let first = token_for(&app, MANAGER).await;
    let refresh = first["refresh_token"].as_str().unwrap();

    let form = format!("grant_type=refresh_token&refresh_token={refresh}");
    let (status, second) = send(&app, token_request(&form)).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(second["refresh_token"], first["refresh_token"]);

    // The new access token works
    let token = second["access_token"].as_str().unwrap();
    let (status, me) = send(&app, get("/api/accounts/me", Some(token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], MANAGER.0);

    // The redeemed refresh token does not
    let (status, body) = send(&app, token_request(&form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_grant");
}

// ============================================
// Events
// ============================================

#[tokio::test]
async fn test_create_event() {
    let app = test_app().await;
    let token = access_token(&app, MANAGER).await;

    let request = json_request("POST", "/api/events", Some(&token), &event_body("Spring"));
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let event: Value = serde_json::from_slice(&body).unwrap();
    let id = event["id"].as_str().unwrap();

    assert_eq!(location, format!("{BASE_URL}/api/events/{id}"));
    assert_eq!(event["eventStatus"], "DRAFT");
    assert_eq!(event["free"], false);
    assert_eq!(event["offline"], true);
    assert_eq!(event["_links"]["self"]["href"], location);
    assert_eq!(event["_links"]["update-event"]["href"], location);
    assert_eq!(event["_links"]["query-events"]["href"], format!("{BASE_URL}/api/events"));
    assert!(event["_links"]["profile"]["href"].is_string());
}

#[tokio::test]
async fn test_create_event_ignores_client_derived_fields() {
    let app = test_app().await;
    let token = access_token(&app, MANAGER).await;

    let mut body = event_body("Free online");
    body["basePrice"] = json!(0);
    body["maxPrice"] = json!(0);
    body["location"] = json!("");
    body["free"] = json!(false);
    body["offline"] = json!(true);
    body["eventStatus"] = json!("PUBLISHED");
    body["id"] = json!(100);

    let event = create_event(&app, &token, &body).await;
    assert_eq!(event["free"], true);
    assert_eq!(event["offline"], false);
    assert_eq!(event["eventStatus"], "DRAFT");
    assert_ne!(event["id"], 100);
}

#[tokio::test]
async fn test_create_event_requires_authentication() {
    let app = test_app().await;
    let (status, _) = send(&app, json_request("POST", "/api/events", None, &event_body("x"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/events", Some("garbage"), &event_body("x")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_event_validation_errors() {
    let app = test_app().await;
    let token = access_token(&app, MANAGER).await;

    let mut body = event_body("Bad schedule");
    body["closeEnrollmentDateTime"] = json!("2026-11-22T14:21:00");
    body["basePrice"] = json!(10000);

    let (status, errors) = send(&app, json_request("POST", "/api/events", Some(&token), &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let fields: Vec<&str> = errors["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"closeEnrollmentDateTime"));
    assert!(fields.contains(&"basePrice"));
    assert!(fields.contains(&"maxPrice"));
    assert_eq!(errors["errors"][0]["objectName"], "eventDto");
    assert_eq!(errors["_links"]["index"]["href"], format!("{BASE_URL}/api"));
}

#[tokio::test]
async fn test_create_event_empty_input() {
    let app = test_app().await;
    let token = access_token(&app, MANAGER).await;

    let (status, errors) =
        send(&app, json_request("POST", "/api/events", Some(&token), &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // everything but location is required
    assert_eq!(errors["errors"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_create_event_type_mismatch_is_400() {
    let app = test_app().await;
    let token = access_token(&app, MANAGER).await;

    let mut body = event_body("Mistyped");
    body["basePrice"] = json!("abc");

    let (status, errors) = send(&app, json_request("POST", "/api/events", Some(&token), &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["errors"][0]["field"], "basePrice");
    assert_eq!(errors["errors"][0]["code"], "typeMismatch");
    assert_eq!(errors["errors"][0]["rejectedValue"], "abc");
    assert_eq!(errors["_links"]["index"]["href"], format!("{BASE_URL}/api"));
}

#[tokio::test]
async fn test_create_event_malformed_json_is_400() {
    let app = test_app().await;
    let token = access_token(&app, MANAGER).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/events")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(r#"{"name": "Spring","#))
        .unwrap();
    let (status, errors) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["errors"][0]["code"], "unreadable");
    assert!(errors["_links"]["index"].is_object());
}

#[tokio::test]
async fn test_create_event_accepts_timestamps_without_seconds() {
    let app = test_app().await;
    let token = access_token(&app, MANAGER).await;

    let mut body = event_body("Minutes");
    body["beginEnrollmentDateTime"] = json!("2026-11-23T14:21");
    body["endEventDateTime"] = json!("2026-11-26T14:21");

    let event = create_event(&app, &token, &body).await;
    assert_eq!(event["beginEnrollmentDateTime"], "2026-11-23T14:21:00");
    assert_eq!(event["endEventDateTime"], "2026-11-26T14:21:00");
}

#[tokio::test]
async fn test_get_event_links_depend_on_caller() {
    let app = test_app().await;
    let manager = access_token(&app, MANAGER).await;
    let other = access_token(&app, OTHER).await;
    let created = create_event(&app, &manager, &event_body("Spring")).await;
    let uri = format!("/api/events/{}", created["id"].as_str().unwrap());

    let (status, anonymous) = send(&app, get(&uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(anonymous["name"], "Spring");
    assert!(anonymous["_links"]["self"].is_object());
    assert!(anonymous["_links"]["profile"].is_object());
    assert!(anonymous["_links"]["update-event"].is_null());

    let (_, as_other) = send(&app, get(&uri, Some(&other))).await;
    assert!(as_other["_links"]["update-event"].is_null());

    let (_, as_manager) = send(&app, get(&uri, Some(&manager))).await;
    assert!(as_manager["_links"]["update-event"].is_object());
}

#[tokio::test]
async fn test_get_unknown_event_is_404() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        get("/api/events/0192f0c8-0000-7000-8000-000000000000", None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_list_events_paging() {
    let app = test_app().await;
    let token = access_token(&app, MANAGER).await;
    for i in 0..30 {
        create_event(&app, &token, &event_body(&format!("event {i:02}"))).await;
    }

    let (status, page) = send(&app, get("/api/events?page=1&size=10&sort=name,desc", None)).await;
    assert_eq!(status, StatusCode::OK);

    let list = page["_embedded"]["eventList"].as_array().unwrap();
    assert_eq!(list.len(), 10);
    assert_eq!(list[0]["name"], "event 19");
    assert!(list[0]["_links"]["self"].is_object());

    assert_eq!(page["page"]["size"], 10);
    assert_eq!(page["page"]["totalElements"], 30);
    assert_eq!(page["page"]["totalPages"], 3);
    assert_eq!(page["page"]["number"], 1);

    for rel in ["self", "first", "prev", "next", "last", "profile"] {
        assert!(page["_links"][rel].is_object(), "missing {rel} link");
    }
    assert_eq!(
        page["_links"]["next"]["href"],
        format!("{BASE_URL}/api/events?page=2&size=10&sort=name,desc")
    );
    assert!(page["_links"]["create-event"].is_null());

    let (_, authed) = send(&app, get("/api/events", Some(&token))).await;
    assert!(authed["_links"]["create-event"].is_object());
    assert!(authed["_links"]["prev"].is_null());
}

#[tokio::test]
async fn test_list_events_empty() {
    let app = test_app().await;
    let (status, page) = send(&app, get("/api/events", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["_embedded"].is_null());
    assert_eq!(page["page"]["totalElements"], 0);
    assert_eq!(page["page"]["totalPages"], 0);
}

#[tokio::test]
async fn test_list_events_huge_page_number() {
    let app = test_app().await;
    let token = access_token(&app, MANAGER).await;
    create_event(&app, &token, &event_body("Spring")).await;

    let (status, page) = send(&app, get("/api/events?page=9223372036854775807", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["_embedded"].is_null());
    assert_eq!(page["page"]["totalElements"], 1);
    assert!(page["_links"]["prev"].is_object());
    assert!(page["_links"]["next"].is_null());
}

#[tokio::test]
async fn test_update_event_by_manager() {
    let app = test_app().await;
    let token = access_token(&app, MANAGER).await;
    let created = create_event(&app, &token, &event_body("Spring")).await;
    let uri = format!("/api/events/{}", created["id"].as_str().unwrap());

    let mut body = event_body("Updated");
    body["basePrice"] = json!(0);
    body["maxPrice"] = json!(0);
    body.as_object_mut().unwrap().remove("location");

    let (status, updated) = send(&app, json_request("PUT", &uri, Some(&token), &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Updated");
    assert_eq!(updated["free"], true);
    assert_eq!(updated["offline"], false);
    assert!(updated["_links"]["self"].is_object());
    assert!(updated["_links"]["profile"].is_object());
}

#[tokio::test]
async fn test_update_event_by_non_manager_is_401() {
    let app = test_app().await;
    let manager = access_token(&app, MANAGER).await;
    let other = access_token(&app, OTHER).await;
    let created = create_event(&app, &manager, &event_body("Spring")).await;
    let uri = format!("/api/events/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        json_request("PUT", &uri, Some(&other), &event_body("Hijacked")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_null());

    let (_, stored) = send(&app, get(&uri, None)).await;
    assert_eq!(stored["name"], "Spring");
}

#[tokio::test]
async fn test_update_event_error_order() {
    let app = test_app().await;
    let manager = access_token(&app, MANAGER).await;
    let other = access_token(&app, OTHER).await;
    let created = create_event(&app, &manager, &event_body("Spring")).await;
    let uri = format!("/api/events/{}", created["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/events/0192f0c8-0000-7000-8000-000000000000",
            Some(&manager),
            &event_body("Missing"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // invalid input is reported before ownership is checked
    let (status, errors) = send(&app, json_request("PUT", &uri, Some(&other), &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["errors"].is_array());
}

#[tokio::test]
async fn test_read_scope_cannot_write_events() {
    let app = test_app().await;
    let full = access_token(&app, MANAGER).await;
    let created = create_event(&app, &full, &event_body("Spring")).await;
    let uri = format!("/api/events/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        token_request(&format!(
            "grant_type=password&username={}&password={}&scope=read",
            MANAGER.0, MANAGER.1
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scope"], "read");
    let read_only = body["access_token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        json_request("POST", "/api/events", Some(&read_only), &event_body("Nope")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        json_request("PUT", &uri, Some(&read_only), &event_body("Renamed")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // reads still work
    let (status, event) = send(&app, get(&uri, Some(&read_only))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["name"], "Spring");
}

// ============================================
// Accounts and index
// ============================================

#[tokio::test]
async fn test_register_account_then_login() {
    let app = test_app().await;
    let body = json!({ "email": "new@email.com", "password": "secret" });

    let (status, account) = send(&app, json_request("POST", "/api/accounts", None, &body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(account["email"], "new@email.com");
    assert_eq!(account["roles"], json!(["USER"]));
    assert!(account.get("passwordHash").is_none());
    assert!(account["_links"]["self"].is_object());

    let token = access_token(&app, ("new@email.com", "secret")).await;
    let (status, me) = send(&app, get("/api/accounts/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], account["id"]);

    let (status, _) = send(&app, json_request("POST", "/api/accounts", None, &body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_account_validation() {
    let app = test_app().await;
    let body = json!({ "email": "not-an-email", "password": "abc" });

    let (status, errors) = send(&app, json_request("POST", "/api/accounts", None, &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_account_visibility() {
    let app = test_app().await;
    let admin = access_token(&app, MANAGER).await;
    let user = access_token(&app, OTHER).await;

    let (_, admin_me) = send(&app, get("/api/accounts/me", Some(&admin))).await;
    let admin_uri = format!("/api/accounts/{}", admin_me["id"].as_str().unwrap());
    let (_, user_me) = send(&app, get("/api/accounts/me", Some(&user))).await;
    let user_uri = format!("/api/accounts/{}", user_me["id"].as_str().unwrap());

    let (status, _) = send(&app, get(&admin_uri, Some(&user))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get(&user_uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get(&user_uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_index_links_to_events() {
    let app = test_app().await;
    let (status, index) = send(&app, get("/api", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(index["_links"]["events"]["href"], format!("{BASE_URL}/api/events"));
}

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chartarr::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

const BOUNDARY: &str = "chartarr-test-boundary";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.storage.uploads_path = std::env::temp_dir()
        .join(format!("chartarr-test-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .to_string();
    config.ai.enabled = false;
    config.observability.metrics_enabled = false;

    let state = chartarr::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    chartarr::api::router(state).await
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(
    app: &Router,
    username: &str,
    email: &str,
    password: &str,
    role: Option<&str>,
) -> axum::response::Response {
    let mut payload = serde_json::json!({
        "username": username,
        "email": email,
        "password": password,
    });
    if let Some(role) = role {
        payload["role"] = serde_json::json!(role);
    }

    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn login(app: &Router, identity: &str, password: &str) -> axum::response::Response {
    let payload = serde_json::json!({ "username": identity, "password": password });

    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn login_token(app: &Router, identity: &str, password: &str) -> String {
    let response = login(app, identity, password).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Register an account and return its bearer token.
async fn register_and_login(app: &Router, username: &str, email: &str, role: Option<&str>) -> String {
    let response = register(app, username, email, "password123", role).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    login_token(app, email, "password123").await
}

fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload_file(
    app: &Router,
    token: &str,
    filename: &str,
    bytes: &[u8],
) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/excel")
                .header("Authorization", format!("Bearer {token}"))
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body("file", filename, bytes)))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get_with_token(app: &Router, uri: &str, token: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

fn sales_workbook() -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Product").unwrap();
    sheet.write_string(0, 1, "Region").unwrap();
    sheet.write_string(0, 2, "Sales").unwrap();
    sheet.write_string(1, 0, "Widget").unwrap();
    sheet.write_string(1, 1, "North").unwrap();
    sheet.write_number(1, 2, 120.0).unwrap();
    sheet.write_string(2, 0, "Gadget").unwrap();
    sheet.write_string(2, 1, "South").unwrap();
    sheet.write_number(2, 2, 80.0).unwrap();
    workbook.save_to_buffer().unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "OK");
    assert!(body["data"]["time"].is_string());
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = spawn_app().await;

    let response = register(&app, "alice", "alice@example.com", "password123", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["role"], "user");

    // Same email again fails, even with a different username.
    let response = register(&app, "alice2", "alice@example.com", "other-pass", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A different email succeeds independently.
    let response = register(&app, "alice", "alice2@example.com", "password123", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_validates_fields() {
    let app = spawn_app().await;

    let response = register(&app, "bob", "", "password123", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = register(&app, "bob", "not-an-email", "password123", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_and_token_gate() {
    let app = spawn_app().await;

    let response = register(&app, "bob", "bob@example.com", "password123", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Wrong password: 401, whether or not the identity exists.
    let response = login(&app, "bob@example.com", "wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = login(&app, "nobody@example.com", "wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Login works by username as well as by email.
    let token = login_token(&app, "bob", "password123").await;
    let _ = login_token(&app, "bob@example.com", "password123").await;

    // The token is accepted by the gate.
    let response = get_with_token(&app, "/api/history", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Missing header is a 403, a bad token a 401.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_with_token(&app, "/api/history", "garbage-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_dedupe_per_account() {
    let app = spawn_app().await;
    let token_a = register_and_login(&app, "alice", "alice@example.com", None).await;
    let token_b = register_and_login(&app, "bob", "bob@example.com", None).await;

    let workbook = sales_workbook();

    let response = upload_file(&app, &token_a, "sales.xlsx", &workbook).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Same filename again for the same account: rejected.
    let response = upload_file(&app, &token_a, "sales.xlsx", &workbook).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The same filename from a different account succeeds.
    let response = upload_file(&app, &token_b, "sales.xlsx", &workbook).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_rejects_bad_extension() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "alice@example.com", None).await;

    let response = upload_file(&app, &token, "notes.txt", b"hello").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chart_history_upsert() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "alice@example.com", None).await;

    let update = |chart_type: &str| {
        serde_json::json!({
            "fileName": "report.xlsx",
            "xAxis": "Region",
            "yAxis": "Sales",
            "chartType": chart_type,
            "chartDownloadUrl": "",
        })
    };

    // No prior upload: the upsert creates the record.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/updateChartHistory")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(update("bar").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["chartType"], "bar");

    // A second call replaces the selection instead of duplicating.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/updateChartHistory")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(update("line").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_with_token(&app, "/api/history", &token).await;
    let body = body_json(response).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["chartType"], "line");
    assert_eq!(records[0]["selectedAxes"]["x"], "Region");
}

#[tokio::test]
async fn test_chart_history_validates_fields() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "alice@example.com", None).await;

    let payload = serde_json::json!({ "fileName": "report.xlsx", "xAxis": "Region" });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/updateChartHistory")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_gate() {
    let app = spawn_app().await;
    let user_token = register_and_login(&app, "alice", "alice@example.com", None).await;
    let admin_token = register_and_login(&app, "root", "root@example.com", Some("admin")).await;

    let response = get_with_token(&app, "/api/admin/stats", &user_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_with_token(&app, "/api/admin/stats", &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_with_token(&app, "/api/history/all", &user_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_with_token(&app, "/api/history/all", &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_stats_counts() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "alice@example.com", None).await;
    let admin_token = register_and_login(&app, "root", "root@example.com", Some("admin")).await;

    let workbook = sales_workbook();
    assert_eq!(
        upload_file(&app, &token, "a.xlsx", &workbook).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        upload_file(&app, &token, "b.xlsx", &workbook).await.status(),
        StatusCode::OK
    );

    // Pick a chart for one of the uploads.
    let payload = serde_json::json!({
        "fileName": "a.xlsx",
        "xAxis": "Region",
        "yAxis": "Sales",
        "chartType": "pie",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/updateChartHistory")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_with_token(&app, "/api/admin/stats", &admin_token).await;
    let body = body_json(response).await;

    assert_eq!(body["data"]["totalUsers"], 2);
    assert_eq!(body["data"]["activeUsers"], 2);
    assert_eq!(body["data"]["blockedUsers"], 0);
    assert_eq!(body["data"]["totalUploads"], 2);
    assert_eq!(body["data"]["chartTypes"]["pie"], 1);
    assert_eq!(body["data"]["chartTypes"]["-"], 1);
}

#[tokio::test]
async fn test_block_and_role_management() {
    let app = spawn_app().await;
    let admin_token = register_and_login(&app, "root", "root@example.com", Some("admin")).await;

    let response = register(&app, "alice", "alice@example.com", "password123", None).await;
    let body = body_json(response).await;
    let user_id = body["data"]["id"].as_i64().unwrap();

    // Invalid status value is rejected.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/admin/users/{user_id}/block"))
                .header("Authorization", format!("Bearer {admin_token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(r#"{"status":"suspended"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/admin/users/{user_id}/block"))
                .header("Authorization", format!("Bearer {admin_token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(r#"{"status":"blocked"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["user"]["status"], "blocked");

    // Role switch on a missing user is a 404.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/admin/role/9999")
                .header("Authorization", format!("Bearer {admin_token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(r#"{"role":"admin"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/admin/role/{user_id}"))
                .header("Authorization", format!("Bearer {admin_token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(r#"{"role":"admin"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_user_does_not_cascade_uploads() {
    let app = spawn_app().await;
    let admin_token = register_and_login(&app, "root", "root@example.com", Some("admin")).await;

    let response = register(&app, "alice", "alice@example.com", "password123", None).await;
    let body = body_json(response).await;
    let user_id = body["data"]["id"].as_i64().unwrap();
    let token = login_token(&app, "alice@example.com", "password123").await;

    let workbook = sales_workbook();
    assert_eq!(
        upload_file(&app, &token, "sales.xlsx", &workbook).await.status(),
        StatusCode::OK
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/admin/users/{user_id}"))
                .header("Authorization", format!("Bearer {admin_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No referential action is defined: the ledger entry survives its owner.
    let response = get_with_token(&app, "/api/history/all", &admin_token).await;
    let body = body_json(response).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["fileName"], "sales.xlsx");
    assert!(records[0]["user"].is_null());
}

#[tokio::test]
async fn test_history_ownership_checks() {
    let app = spawn_app().await;
    let token_a = register_and_login(&app, "alice", "alice@example.com", None).await;
    let token_b = register_and_login(&app, "bob", "bob@example.com", None).await;

    let workbook = sales_workbook();
    let response = upload_file(&app, &token_a, "sales.xlsx", &workbook).await;
    let body = body_json(response).await;
    let history_id = body["data"]["historyId"].as_i64().unwrap();

    // Another user's record is off limits.
    let response =
        get_with_token(&app, &format!("/api/history/details/{history_id}"), &token_b).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/history/{history_id}"))
                .header("Authorization", format!("Bearer {token_b}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner sees it and can delete it.
    let response =
        get_with_token(&app, &format!("/api/history/details/{history_id}"), &token_a).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/history/{history_id}"))
                .header("Authorization", format!("Bearer {token_a}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response =
        get_with_token(&app, &format!("/api/history/details/{history_id}"), &token_a).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_excel_upload_parse_chart_flow() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "alice@example.com", None).await;

    let response = upload_file(&app, &token, "sales.xlsx", &sales_workbook()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["filename"].as_str().unwrap().ends_with("-sales.xlsx"));

    // Parse by the original filename: resolved through the ledger.
    let response = get_with_token(&app, "/api/data/parse/sales.xlsx", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["data"]["headers"],
        serde_json::json!(["Product", "Region", "Sales"])
    );
    assert_eq!(body["data"]["rows"][0][0], "Widget");
    assert_eq!(body["data"]["rows"][0][2], 120.0);

    let payload = serde_json::json!({
        "fileName": "sales.xlsx",
        "xAxis": "Region",
        "yAxis": "Sales",
        "chartType": "bar",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/updateChartHistory")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Exactly one record with the chosen chart type.
    let response = get_with_token(&app, "/api/history", &token).await;
    let body = body_json(response).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["chartType"], "bar");
    assert_eq!(records[0]["fileName"], "sales.xlsx");

    // The stored bytes round-trip through the download endpoint.
    let response = get_with_token(&app, "/api/history/download/sales.xlsx", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get("Content-Disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("attachment")
    );
}

#[tokio::test]
async fn test_profile_self_service() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "alice@example.com", None).await;
    let _ = register_and_login(&app, "bob", "bob@example.com", None).await;

    let response = get_with_token(&app, "/api/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "alice@example.com");

    // Claiming another account's email fails.
    let payload = serde_json::json!({ "username": "alice", "email": "bob@example.com" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/me")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Changing the password requires the current one.
    let payload = serde_json::json!({ "currentPassword": "wrong", "newPassword": "newpass456" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/change-password")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let payload =
        serde_json::json!({ "currentPassword": "password123", "newPassword": "newpass456" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/change-password")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works, the new one does.
    let response = login(&app, "alice@example.com", "password123").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let _ = login_token(&app, "alice@example.com", "newpass456").await;
}

#[tokio::test]
async fn test_history_user_route_authorization() {
    let app = spawn_app().await;
    let admin_token = register_and_login(&app, "root", "root@example.com", Some("admin")).await;

    let response = register(&app, "alice", "alice@example.com", "password123", None).await;
    let body = body_json(response).await;
    let user_id = body["data"]["id"].as_i64().unwrap();
    let token = login_token(&app, "alice@example.com", "password123").await;

    // Self-access and admin access are allowed; anyone else gets 403.
    let response = get_with_token(&app, &format!("/api/history/user/{user_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response =
        get_with_token(&app, &format!("/api/history/user/{user_id}"), &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let other_token = register_and_login(&app, "bob", "bob@example.com", None).await;
    let response =
        get_with_token(&app, &format!("/api/history/user/{user_id}"), &other_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_insights_requires_headers_and_rows() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "alice@example.com", None).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/ai/insights")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(r#"{"headers":["A"]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

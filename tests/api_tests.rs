use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use dokarr::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Admin account seeded by migration (must match m20240101_create_users.rs)
const ADMIN_EMAIL: &str = "admin@dokarr.local";
const ADMIN_PASSWORD: &str = "admin123";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.storage.upload_path = std::env::temp_dir()
        .join(format!("dokarr-test-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .to_string();
    config.server.secure_cookies = false;

    let state = dokarr::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    dokarr::api::router(state).await
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Expected a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = if let Some(body) = body {
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let response = request_json(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");
    session_cookie(&response)
}

async fn register(app: &Router, name: &str, email: &str) -> (i32, String) {
    let response = request_json(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": "secret99" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response);
    let body = body_json(response).await;
    let id = i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap();
    (id, cookie)
}

/// Creates an account with an explicit role through the admin surface and
/// logs it in. Returns (id, session cookie).
async fn create_and_login(
    app: &Router,
    admin_cookie: &str,
    name: &str,
    email: &str,
    role: &str,
) -> (i32, String) {
    let response = request_json(
        app,
        "POST",
        "/api/users",
        Some(admin_cookie),
        Some(json!({
            "name": name,
            "email": email,
            "password": "secret99",
            "role": role,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let id = i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap();
    let cookie = login(app, email, "secret99").await;
    (id, cookie)
}

fn multipart_request(
    uri: &str,
    cookie: &str,
    field: &str,
    files: &[(&str, &str, &[u8])],
    description: Option<&str>,
) -> Request<Body> {
    let boundary = "X-DOKARR-TEST-BOUNDARY";
    let mut body = Vec::new();
    for (filename, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(description) = description {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n{description}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn upload_text_file(app: &Router, cookie: &str, name: &str) -> i32 {
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/files/upload",
            cookie,
            "file",
            &[(name, mime::TEXT_PLAIN.essence_str(), b"hello")],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap()
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;

    let response = request_json(&app, "GET", "/api/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_session() {
    let app = spawn_app().await;

    let response = request_json(&app, "GET", "/api/files/mine", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = request_json(&app, "GET", "/api/users", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = spawn_app().await;

    let response = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": ADMIN_EMAIL, "password": "wrong" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "whatever" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn seeded_admin_can_login_and_fetch_self() {
    let app = spawn_app().await;

    let cookie = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = request_json(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
    assert_eq!(body["data"]["role"], "admin");
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = spawn_app().await;

    register(&app, "First", "dup@example.com").await;

    let response = request_json(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Second", "email": "DUP@example.com", "password": "secret99" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn logout_invalidates_session() {
    let app = spawn_app().await;

    let cookie = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = request_json(&app, "POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = request_json(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_flow() {
    let app = spawn_app().await;

    let (_, _) = register(&app, "Reset Me", "reset@example.com").await;

    let response = request_json(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "reset@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["data"]["reset_token"].as_str().unwrap().to_string();

    // Unknown addresses get the same answer without a token.
    let response = request_json(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "ghost@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["reset_token"].is_null());

    let response = request_json(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({ "token": token, "new_password": "brandnew1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    login(&app, "reset@example.com", "brandnew1").await;

    // Tokens are single use.
    let response = request_json(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({ "token": token, "new_password": "another99" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// User directory
// ============================================================================

#[tokio::test]
async fn registration_auto_assigns_least_loaded_manager() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    // The seeded admin is the only eligible candidate at first.
    let response = request_json(&app, "GET", "/api/auth/me", Some(&admin), None).await;
    let admin_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = request_json(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "First", "email": "first@example.com", "password": "secret99" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["manager_id"], json!(admin_id));
    assert_eq!(body["data"]["role"], "client");
    assert_eq!(body["data"]["credits"], 10);

    // A fresh manager with zero clients now beats the admin carrying one.
    let (manager_id, _) =
        create_and_login(&app, &admin, "Manager", "mgr@example.com", "manager").await;

    let response = request_json(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Client", "email": "client@example.com", "password": "secret99" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["manager_id"], json!(manager_id));
}

#[tokio::test]
async fn clients_cannot_list_users() {
    let app = spawn_app().await;

    let (_, client_cookie) = register(&app, "Client", "c1@example.com").await;

    let response = request_json(&app, "GET", "/api/users", Some(&client_cookie), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn manager_cannot_create_privileged_accounts() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (_, manager_cookie) =
        create_and_login(&app, &admin, "Manager", "mgr2@example.com", "manager").await;

    for role in ["admin", "manager"] {
        let response = request_json(
            &app,
            "POST",
            "/api/users",
            Some(&manager_cookie),
            Some(json!({
                "name": "Sneaky",
                "email": format!("sneaky-{role}@example.com"),
                "password": "secret99",
                "role": role,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn admin_cannot_change_own_role_or_status() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = request_json(&app, "GET", "/api/auth/me", Some(&admin), None).await;
    let admin_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{admin_id}/role"),
        Some(&admin),
        Some(json!({ "role": "client" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{admin_id}/status"),
        Some(&admin),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn role_change_validates_role_and_target() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (client_id, _) = register(&app, "Client", "rolechange@example.com").await;

    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{client_id}/role"),
        Some(&admin),
        Some(json!({ "role": "superuser" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = request_json(
        &app,
        "PUT",
        "/api/users/999999/role",
        Some(&admin),
        Some(json!({ "role": "editor" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{client_id}/role"),
        Some(&admin),
        Some(json!({ "role": "editor" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["role"], "editor");
}

#[tokio::test]
async fn deactivated_account_is_locked_out() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (client_id, client_cookie) = register(&app, "Client", "locked@example.com").await;

    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{client_id}/status"),
        Some(&admin),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Existing session is refused on the next request.
    let response = request_json(&app, "GET", "/api/files/mine", Some(&client_cookie), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // And a fresh login is refused too.
    let response = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "locked@example.com", "password": "secret99" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn credits_are_replaced_not_added() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (client_id, _) = register(&app, "Client", "credits@example.com").await;

    let uri = format!("/api/users/{client_id}/credits");

    let response = request_json(&app, "PUT", &uri, Some(&admin), Some(json!({ "credits": 42 })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["credits"], 42);

    let response = request_json(&app, "PUT", &uri, Some(&admin), Some(json!({ "credits": 7 })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["credits"], 7);

    let response =
        request_json(&app, "PUT", &uri, Some(&admin), Some(json!({ "credits": -1 }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response =
        request_json(&app, "PUT", &uri, Some(&admin), Some(json!({ "credits": 1.5 }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn manager_reassignment_is_validated() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (manager_id, _) =
        create_and_login(&app, &admin, "Manager", "mgr3@example.com", "manager").await;
    let (editor_id, _) =
        create_and_login(&app, &admin, "Editor", "editor3@example.com", "editor").await;
    let (client_id, _) = register(&app, "Client", "reassign@example.com").await;

    // Unknown client.
    let response = request_json(
        &app,
        "PUT",
        "/api/users/999999/manager",
        Some(&admin),
        Some(json!({ "manager_id": manager_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Target must be a client.
    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{editor_id}/manager"),
        Some(&admin),
        Some(json!({ "manager_id": manager_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // New manager must hold the manager role.
    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{client_id}/manager"),
        Some(&admin),
        Some(json!({ "manager_id": editor_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{client_id}/manager"),
        Some(&admin),
        Some(json!({ "manager_id": manager_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"]["manager_id"],
        json!(manager_id)
    );

    // A deactivated account cannot take on clients.
    let (retired_id, _) =
        create_and_login(&app, &admin, "Retired", "retired@example.com", "manager").await;
    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{retired_id}/status"),
        Some(&admin),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{client_id}/manager"),
        Some(&admin),
        Some(json!({ "manager_id": retired_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The rejected update left the assignment untouched.
    let response = request_json(&app, "GET", "/api/users?role=client", Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let client = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "reassign@example.com")
        .unwrap()
        .clone();
    assert_eq!(client["manager_id"], json!(manager_id));

    // Null clears the assignment.
    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{client_id}/manager"),
        Some(&admin),
        Some(json!({ "manager_id": null })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["manager_id"].is_null());
}

// ============================================================================
// Files
// ============================================================================

#[tokio::test]
async fn upload_and_lifecycle() {
    let app = spawn_app().await;
    let (_, cookie) = register(&app, "Uploader", "upload@example.com").await;

    let file_id = upload_text_file(&app, &cookie, "notes.txt").await;

    let response = request_json(&app, "GET", "/api/files/mine", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["original_name"], "notes.txt");

    // Description edit.
    let response = request_json(
        &app,
        "PUT",
        &format!("/api/files/{file_id}"),
        Some(&cookie),
        Some(json!({ "description": "quarterly notes" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"]["description"],
        "quarterly notes"
    );

    // Download round trip.
    let response = request_json(
        &app,
        "GET",
        &format!("/api/files/{file_id}/download"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("notes.txt"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"hello");

    // Soft delete, then the record is gone from every read.
    let response = request_json(
        &app,
        "DELETE",
        &format!("/api/files/{file_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = request_json(
        &app,
        "GET",
        &format!("/api/files/{file_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Deleting again is not a silent success.
    let response = request_json(
        &app,
        "DELETE",
        &format!("/api/files/{file_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_rejects_disallowed_mime_type() {
    let app = spawn_app().await;
    let (_, cookie) = register(&app, "Uploader", "mime@example.com").await;

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/files/upload",
            &cookie,
            "file",
            &[("malware.exe", "application/x-msdownload", b"MZ")],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_binds_to_the_named_file_field() {
    let app = spawn_app().await;
    let (_, cookie) = register(&app, "Uploader", "fieldname@example.com").await;

    // A file part under an unexpected name is not picked up.
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/files/upload",
            &cookie,
            "attachment",
            &[("stray.txt", "text/plain", b"hello")],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The batch route binds to "files", not "file".
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/files/upload-multiple",
            &cookie,
            "file",
            &[("stray.txt", "text/plain", b"hello")],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = request_json(&app, "GET", "/api/files/mine", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn multi_upload_reports_per_file_failures() {
    let app = spawn_app().await;
    let (_, cookie) = register(&app, "Uploader", "multi@example.com").await;

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/files/upload-multiple",
            &cookie,
            "files",
            &[
                ("a.txt", "text/plain", b"aaa"),
                ("b.exe", "application/x-msdownload", b"MZ"),
                ("c.pdf", mime::APPLICATION_PDF.essence_str(), b"%PDF"),
            ],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["uploaded"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["failed"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["failed"][0]["name"], "b.exe");
}

#[tokio::test]
async fn client_cannot_read_other_clients_files() {
    let app = spawn_app().await;
    let (owner_id, owner_cookie) = register(&app, "Owner", "owner@example.com").await;
    let (_, other_cookie) = register(&app, "Other", "other@example.com").await;

    let file_id = upload_text_file(&app, &owner_cookie, "private.txt").await;

    let response = request_json(
        &app,
        "GET",
        &format!("/api/files/{file_id}"),
        Some(&other_cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = request_json(
        &app,
        "GET",
        &format!("/api/files/user/{owner_id}"),
        Some(&other_cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn editor_reads_everything_but_cannot_delete_or_edit() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (_, editor_cookie) =
        create_and_login(&app, &admin, "Editor", "editor@example.com", "editor").await;
    let (_, owner_cookie) = register(&app, "Owner", "owner2@example.com").await;

    let file_id = upload_text_file(&app, &owner_cookie, "shared.txt").await;

    let response = request_json(
        &app,
        "GET",
        &format!("/api/files/{file_id}"),
        Some(&editor_cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = request_json(
        &app,
        "DELETE",
        &format!("/api/files/{file_id}"),
        Some(&editor_cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = request_json(
        &app,
        "PUT",
        &format!("/api/files/{file_id}"),
        Some(&editor_cookie),
        Some(json!({ "description": "defaced" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn manager_access_is_limited_to_assigned_clients() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (manager_id, manager_cookie) =
        create_and_login(&app, &admin, "Manager A", "mgra@example.com", "manager").await;
    let (_, stranger_cookie) =
        create_and_login(&app, &admin, "Manager B", "mgrb@example.com", "manager").await;

    let (client_id, client_cookie) = register(&app, "Client", "managed@example.com").await;
    let response = request_json(
        &app,
        "PUT",
        &format!("/api/users/{client_id}/manager"),
        Some(&admin),
        Some(json!({ "manager_id": manager_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let file_id = upload_text_file(&app, &client_cookie, "report.pdf").await;

    let response = request_json(
        &app,
        "GET",
        &format!("/api/files/user/{client_id}"),
        Some(&manager_cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["user"]["manager_id"], json!(manager_id));
    assert_eq!(body["data"]["files"].as_array().unwrap().len(), 1);

    // A manager the client is not assigned to is refused.
    let response = request_json(
        &app,
        "GET",
        &format!("/api/files/{file_id}"),
        Some(&stranger_cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The assigned manager can read but not delete or edit.
    let response = request_json(
        &app,
        "DELETE",
        &format!("/api/files/{file_id}"),
        Some(&manager_cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_can_delete_but_not_edit_description() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (_, owner_cookie) = register(&app, "Owner", "owner3@example.com").await;

    let file_id = upload_text_file(&app, &owner_cookie, "doc.txt").await;

    // Description edits stay owner-only even for admins.
    let response = request_json(
        &app,
        "PUT",
        &format!("/api/files/{file_id}"),
        Some(&admin),
        Some(json!({ "description": "admin note" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = request_json(
        &app,
        "DELETE",
        &format!("/api/files/{file_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn clients_overview_scopes_managers_to_their_clients() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (manager_id, manager_cookie) =
        create_and_login(&app, &admin, "Manager", "overview@example.com", "manager").await;

    let (c1_id, c1) = register(&app, "Client One", "ov1@example.com").await;
    upload_text_file(&app, &c1, "one.txt").await;
    let (c2_id, _) = register(&app, "Client Two", "ov2@example.com").await;

    // Pin both clients to the manager so the scoping below is deterministic.
    for id in [c1_id, c2_id] {
        let response = request_json(
            &app,
            "PUT",
            &format!("/api/users/{id}/manager"),
            Some(&admin),
            Some(json!({ "manager_id": manager_id })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Admin sees every client.
    let response = request_json(&app, "GET", "/api/files/clients", Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // The manager sees only assigned clients (both registered after it).
    let response = request_json(
        &app,
        "GET",
        "/api/files/clients",
        Some(&manager_cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let one = entries
        .iter()
        .find(|e| e["email"] == "ov1@example.com")
        .unwrap();
    assert_eq!(one["file_count"], 1);

    // Clients get no overview at all.
    let response = request_json(&app, "GET", "/api/files/clients", Some(&c1), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

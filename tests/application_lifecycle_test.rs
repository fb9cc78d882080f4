use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tokio_test::assert_ok;
use tower::ServiceExt;
use uuid::Uuid;

use jobtracker_backend::{database::pool, routes, AppState};

/// Returns `None` when no database is configured, so the suite can run on
/// machines without Postgres.
async fn setup_app() -> Option<(Router, PgPool)> {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping database scenario");
        return None;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "lifecycle_test_secret");
    env::set_var(
        "UPLOADS_DIR",
        env::temp_dir().join("jobtracker-test-uploads"),
    );
    let _ = jobtracker_backend::config::init_config();

    let pool = pool::create_pool().await.expect("pool");
    assert_ok!(pool::run_migrations(&pool).await);

    let app = routes::router(AppState::new(pool.clone()));
    Some((app, pool))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registers a fresh account and returns its bearer header and auth body.
async fn register(app: &Router) -> (String, JsonValue) {
    let email = format!("user-{}@example.com", Uuid::new_v4());
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": "correct horse", "fullName": "Test User" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let auth = format!("Bearer {}", body["accessToken"].as_str().unwrap());
    (auth, body)
}

async fn create_company(app: &Router, auth: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/companies",
        Some(auth),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

async fn create_application(app: &Router, auth: &str, company_id: &str) -> JsonValue {
    let (status, body) = send(
        app,
        "POST",
        "/api/applications",
        Some(auth),
        Some(json!({
            "companyId": company_id,
            "positionTitle": "Backend Engineer",
            "workType": "on-site",
            "employmentType": "full-time",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[tokio::test]
async fn status_history_follows_transitions() {
    let Some((app, _pool)) = setup_app().await else {
        return;
    };
    let (auth, _) = register(&app).await;
    let company_id = create_company(&app, &auth, "Acme").await;

    let created = create_application(&app, &auth, &company_id).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "applied");
    assert_eq!(created["workType"], "on_site");
    assert_eq!(created["employmentType"], "full_time");
    assert_eq!(created["history"].as_array().unwrap().len(), 1);
    assert!(created["history"][0]["previousStatus"].is_null());
    assert_eq!(created["history"][0]["newStatus"], "applied");

    let uri = format!("/api/applications/{}", id);
    let (status, updated) = send(
        &app,
        "PUT",
        &uri,
        Some(&auth),
        Some(json!({ "status": "interviewed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history = updated["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["previousStatus"], "applied");
    assert_eq!(history[1]["newStatus"], "interviewed");

    let (_, repeated) = send(
        &app,
        "PUT",
        &uri,
        Some(&auth),
        Some(json!({ "status": "interviewed" })),
    )
    .await;
    assert_eq!(repeated["history"].as_array().unwrap().len(), 2);

    let (_, notes_only) = send(
        &app,
        "PUT",
        &uri,
        Some(&auth),
        Some(json!({ "notes": "Great call with the team" })),
    )
    .await;
    assert_eq!(notes_only["history"].as_array().unwrap().len(), 2);
    assert_eq!(notes_only["notes"], "Great call with the team");

    let (_, hyphenated) = send(
        &app,
        "PUT",
        &uri,
        Some(&auth),
        Some(json!({ "status": "interview-scheduled", "workType": "hybrid" })),
    )
    .await;
    assert_eq!(hyphenated["status"], "interview_scheduled");
    assert_eq!(hyphenated["workType"], "hybrid");

    let (status, history) = send(&app, "GET", &format!("{}/history", uri), Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2]["previousStatus"], "interviewed");
    assert_eq!(history[2]["note"], "Status updated to interview_scheduled");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_keep_an_unbroken_history_chain() {
    let Some((app, _pool)) = setup_app().await else {
        return;
    };
    let (auth, _) = register(&app).await;
    let company_id = create_company(&app, &auth, "Racing Co").await;
    let created = create_application(&app, &auth, &company_id).await;
    let uri = format!("/api/applications/{}", created["id"].as_str().unwrap());

    let statuses = ["reviewing", "interviewed", "offer", "rejected"];
    let mut updates = tokio::task::JoinSet::new();
    for i in 0..32 {
        let app = app.clone();
        let auth = auth.clone();
        let uri = uri.clone();
        let status = statuses[i % statuses.len()];
        updates.spawn(async move {
            send(&app, "PUT", &uri, Some(&auth), Some(json!({ "status": status }))).await
        });
    }
    while let Some(joined) = updates.join_next().await {
        let (status, body) = joined.unwrap();
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    let (status, history) = send(&app, "GET", &format!("{}/history", uri), Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert!(history.len() > 1);
    assert!(history[0]["previousStatus"].is_null());
    for pair in history.windows(2) {
        assert_eq!(pair[1]["previousStatus"], pair[0]["newStatus"], "{:?}", history);
        assert_ne!(pair[1]["previousStatus"], pair[1]["newStatus"]);
    }

    let (_, current) = send(&app, "GET", &uri, Some(&auth), None).await;
    assert_eq!(current["status"], history[history.len() - 1]["newStatus"]);
}

#[tokio::test]
async fn other_users_rows_are_not_found() {
    let Some((app, _pool)) = setup_app().await else {
        return;
    };
    let (owner, _) = register(&app).await;
    let (intruder, _) = register(&app).await;
    let company_id = create_company(&app, &owner, "Globex").await;
    let created = create_application(&app, &owner, &company_id).await;
    let uri = format!("/api/applications/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, "GET", &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&intruder),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        "/api/applications",
        Some(&intruder),
        Some(json!({ "companyId": company_id, "positionTitle": "Spy" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].get("company_id").is_some());

    let (status, still_there) = send(&app, "GET", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(still_there["status"], "applied");
}

#[tokio::test]
async fn deleting_an_application_removes_dependents() {
    let Some((app, pool)) = setup_app().await else {
        return;
    };
    let (auth, _) = register(&app).await;
    let company_id = create_company(&app, &auth, "Initech").await;
    let created = create_application(&app, &auth, &company_id).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/applications/{}/interviews", id),
        Some(&auth),
        Some(json!({ "interviewType": "phone-screen", "scheduledAt": "2030-01-15T10:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/applications/{}/tasks", id),
        Some(&auth),
        Some(json!({ "title": "Send thank-you note" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let boundary = "jobtrackerboundary";
    let multipart = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"applicationId\"\r\n\r\n{id}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"documentType\"\r\n\r\nresume\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cv.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nplain text resume\r\n--{b}--\r\n",
        b = boundary,
        id = id
    );
    let req = Request::builder()
        .method("POST")
        .uri("/api/documents")
        .header("authorization", &auth)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/applications/{}", id),
        Some(&auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let application_id = Uuid::parse_str(&id).unwrap();
    for table in ["status_history", "interviews", "tasks", "documents"] {
        let remaining: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE application_id = $1",
            table
        ))
        .bind(application_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(remaining, 0, "orphans left in {}", table);
    }
}

#[tokio::test]
async fn company_names_are_unique_per_user() {
    let Some((app, _pool)) = setup_app().await else {
        return;
    };
    let (auth, _) = register(&app).await;
    let (other, _) = register(&app).await;
    create_company(&app, &auth, "Umbrella").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/companies",
        Some(&auth),
        Some(json!({ "name": "umbrella" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    create_company(&app, &other, "Umbrella").await;
}

#[tokio::test]
async fn refresh_tokens_rotate_and_logout_is_idempotent() {
    let Some((app, _pool)) = setup_app().await else {
        return;
    };
    let (_, registered) = register(&app).await;
    let first = registered["refreshToken"].as_str().unwrap().to_string();

    let (status, rotated) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": first })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = rotated["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": first })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/logout",
            None,
            Some(json!({ "refreshToken": second })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": registered["user"]["email"], "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dashboard_counts_every_status() {
    let Some((app, _pool)) = setup_app().await else {
        return;
    };
    let (auth, _) = register(&app).await;
    let company_id = create_company(&app, &auth, "Hooli").await;
    create_application(&app, &auth, &company_id).await;
    let second = create_application(&app, &auth, &company_id).await;
    send(
        &app,
        "PUT",
        &format!("/api/applications/{}", second["id"].as_str().unwrap()),
        Some(&auth),
        Some(json!({ "status": "rejected" })),
    )
    .await;

    let (status, stats) = send(&app, "GET", "/api/dashboard/stats", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalApplications"], 2);
    assert_eq!(stats["activeApplications"], 1);
    assert_eq!(stats["responseRate"], 0.5);
    assert_eq!(stats["byStatus"].as_object().unwrap().len(), 7);
    assert_eq!(stats["byStatus"]["rejected"], 1);
    assert_eq!(stats["recentApplications"].as_array().unwrap().len(), 2);
}

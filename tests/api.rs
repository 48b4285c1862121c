mod common;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use votegate::app::{router, AppState};
use votegate::jwt::JwtConfig;

use common::{fixture, Fixture, MAX_UPLOAD_BYTES, PASSWORD};

fn app(fx: &Fixture) -> Result<Router> {
    let jwt = JwtConfig::new("test-secret", 1)?;
    Ok(router(AppState::new(fx.pool.clone(), jwt, MAX_UPLOAD_BYTES)))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

async fn login(app: &Router, fx: &Fixture) -> Result<String> {
    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "org_code": "lic0001", "email": "admin@lic0001.example", "password": PASSWORD })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    assert_eq!(body["user"]["org_id"], json!(fx.org_id));
    Ok(body["token"].as_str().context("missing token")?.to_string())
}

#[tokio::test]
async fn health_endpoint_reports_db_ok() -> Result<()> {
    let fx = fixture().await?;
    let app = app(&fx)?;

    let (status, body) = send(&app, "GET", "/api/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["db_ok"], json!(true), "{}", body);
    assert_eq!(body["permissions"], json!(38));
    Ok(())
}

#[tokio::test]
async fn login_rejects_wrong_credentials() -> Result<()> {
    let fx = fixture().await?;
    let app = app(&fx)?;

    for (org_code, password) in [("LIC0001", "wrong-password"), ("LIC9999", PASSWORD)] {
        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "org_code": org_code, "email": "admin@lic0001.example", "password": password })),
        )
        .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

#[tokio::test]
async fn guarded_routes_need_a_bearer_token() -> Result<()> {
    let fx = fixture().await?;
    let app = app(&fx)?;

    for uri in ["/auth/me", "/roles", "/users", "/lists", "/campaigns"] {
        let (status, _) = send(&app, "GET", uri, None, None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
    let (status, _) = send(&app, "GET", "/auth/me", Some("not-a-token"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The organization lookup backs the login screen.
    let (status, body) = send(&app, "GET", "/organizations/code/lic0001", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], json!("LIC0001"));
    Ok(())
}

#[tokio::test]
async fn admin_flow_over_http() -> Result<()> {
    let fx = fixture().await?;
    let app = app(&fx)?;
    let token = login(&app, &fx).await?;

    let (status, me) = send(&app, "GET", "/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], json!(fx.admin_id));
    assert_eq!(me["role_ids"].as_array().map(Vec::len), Some(1));

    let (status, role) = send(
        &app,
        "POST",
        "/roles",
        Some(&token),
        Some(json!({ "name": "coordinator", "level": 10, "list_id": fx.list_x })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", role);
    let role_id = role["id"].as_str().context("missing role id")?.to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/roles",
        Some(&token),
        Some(json!({ "name": "too_high", "level": 100 })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, user) = send(
        &app,
        "POST",
        "/users",
        Some(&token),
        Some(json!({
            "name": "Carla",
            "surname": "Rossi",
            "email": "carla@example.com",
            "password": PASSWORD,
            "role_ids": [role_id],
            "list_ids": [fx.list_x]
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", user);
    assert_eq!(user["must_change_password"], json!(true));
    let user_id = user["id"].as_str().context("missing user id")?.to_string();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/users/{}/roles/{}", user_id, role_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/roles/{}", uuid::Uuid::new_v4()), Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, campaign) = send(
        &app,
        "POST",
        "/campaigns",
        Some(&token),
        Some(json!({
            "name": "Spring",
            "list_id": fx.list_x,
            "start_date": "2026-03-15",
            "end_date": "2026-03-01"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", campaign);

    let (status, position) = send(
        &app,
        "POST",
        "/positions",
        Some(&token),
        Some(json!({ "name": "President" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", position);
    let (status, listed) = send(
        &app,
        "GET",
        &format!("/positions?list_id={}", fx.list_x),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["name"], json!("President"));
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let fx = fixture().await?;
    let app = app(&fx)?;

    let (status, doc) = send(&app, "GET", "/api-docs/openapi.json", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/auth/login"]["post"].is_object());
    assert!(doc["paths"]["/campaigns/{id}/candidates"]["get"].is_object());
    assert!(doc["paths"]["/positions/{id}"]["delete"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearerAuth"].is_object());
    Ok(())
}

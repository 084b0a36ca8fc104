mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use form_token_service::TenantSettings;
use serde_json::json;
use support::{issue, post_empty, post_json, TestApp, NOW};

#[tokio::test]
async fn issue_returns_token_and_expiry() {
    let app = TestApp::new();
    let (status, _, body) = app
        .send(post_json(
            "/public-form-tokens",
            Some("acme"),
            json!({"form": "enrollment", "ttl": 15}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["form"], "enrollment");
    assert_eq!(body["tenant_id"], "acme");
    assert_eq!(body["expires_in"], 900);
    assert!(body["expires_at"].as_str().expect("rfc3339").starts_with("2024-05-29T"));
    let token = body["token"].as_str().expect("token");
    assert_eq!(token.matches('.').count(), 1);
}

#[tokio::test]
async fn issued_token_verifies_for_same_tenant() {
    let app = TestApp::new();
    let token = issue(&app, Some("contact"), Some(5), Some("acme")).await;

    let (status, _, body) = app
        .send(post_json(
            "/public-form-tokens/verify",
            Some("acme"),
            json!({"token": token, "form": "contact"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["claims"]["form"], "contact");
    assert_eq!(body["claims"]["tenant_id"], "acme");
    assert_eq!(body["claims"]["iat"], NOW);
    assert_eq!(body["claims"]["exp"], NOW + 300);
}

#[tokio::test]
async fn path_form_takes_precedence() {
    let app = TestApp::new();
    let (status, _, body) = app
        .send(post_json(
            "/public-form-tokens/intake?form=from-query",
            None,
            json!({"form": "from-body"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["form"], "intake");

    let (status, _, body) = app
        .send(post_json(
            "/public-form-tokens?form=from-query",
            None,
            json!({"form": "from-body"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["form"], "from-query");
}

#[tokio::test]
async fn empty_request_uses_defaults() {
    let app = TestApp::new();
    let (status, _, body) = app.send(post_empty("/public-form-tokens", None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["form"], "generic");
    assert!(body["tenant_id"].is_null());
    assert_eq!(body["expires_in"], 1800);

    let token = body["token"].as_str().expect("token").to_string();
    let (status, _, body) = app
        .send(post_json(
            "/public-form-tokens/verify",
            None,
            json!({"token": token, "form": "generic"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claims"]["form"], "generic");
}

#[tokio::test]
async fn query_ttl_string_is_accepted() {
    let app = TestApp::new();
    let (status, _, body) = app
        .send(post_empty("/public-form-tokens?ttl=45", None))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["expires_in"], 45 * 60);
}

#[tokio::test]
async fn token_expires_after_ttl() {
    let app = TestApp::new();
    let token = issue(&app, None, Some(1), None).await;

    app.clock.advance(59);
    let (status, _, _) = app
        .send(post_json("/public-form-tokens/verify", None, json!({"token": token})))
        .await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(2);
    let (status, code, body) = app
        .send(post_json("/public-form-tokens/verify", None, json!({"token": token})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code.as_deref(), Some("invalid_token"));
    assert_eq!(body["message"], "Invalid token: token has expired");
}

#[tokio::test]
async fn token_from_other_tenant_is_rejected() {
    let app = TestApp::new();
    let token = issue(&app, Some("contact"), None, Some("A")).await;
    let (status, code, body) = app
        .send(post_json(
            "/public-form-tokens/verify",
            Some("B"),
            json!({"token": token}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code.as_deref(), Some("invalid_token"));
    assert_eq!(
        body["message"],
        "Invalid token: token does not belong to the current tenant"
    );
}

#[tokio::test]
async fn fallback_tenant_applies_without_header() {
    let app = TestApp::with_tenancy(TenantSettings {
        fallback_tenant: Some("main".into()),
    });
    let (status, _, body) = app.send(post_empty("/public-form-tokens", None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tenant_id"], "main");

    let token = body["token"].as_str().expect("token").to_string();
    let (status, _, _) = app
        .send(post_json(
            "/public-form-tokens/verify",
            Some("main"),
            json!({"token": token}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn verify_accepts_token_in_query() {
    let app = TestApp::new();
    let token = issue(&app, Some("contact"), None, None).await;
    let uri = format!("/public-form-tokens/verify?token={token}&form=contact");
    let (status, _, body) = app.send(post_empty(&uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claims"]["form"], "contact");
}

#[tokio::test]
async fn form_session_checks_path_form() {
    let app = TestApp::new();
    let token = issue(&app, Some("enrollment"), None, Some("acme")).await;

    let request = Request::builder()
        .method("GET")
        .uri("/public-forms/enrollment/session")
        .header("X-Tenant-ID", "acme")
        .header("X-Form-Token", token.as_str())
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claims"]["form"], "enrollment");

    let request = Request::builder()
        .method("GET")
        .uri("/public-forms/contact/session")
        .header("X-Tenant-ID", "acme")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, code, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code.as_deref(), Some("invalid_token"));
    assert_eq!(
        body["message"],
        "Invalid token: token was issued for a different form"
    );
}

#[tokio::test]
async fn metrics_reflect_activity() {
    let app = TestApp::new();
    let token = issue(&app, None, None, None).await;
    let _ = app
        .send(post_json("/public-form-tokens/verify", None, json!({"token": token})))
        .await;
    let _ = app
        .send(post_json(
            "/public-form-tokens/verify",
            None,
            json!({"token": "bogus.token"}),
        ))
        .await;

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().expect("text exposition");
    assert!(text.contains("form_tokens_issued_total{form_default=\"true\"} 1"));
    assert!(text.contains("form_token_verifications_total{outcome=\"valid\"} 1"));
    assert!(text.contains("form_token_verifications_total{outcome=\"bad_signature\"} 1"));
}

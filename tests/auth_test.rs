// ============================================================================
// Authentication Tests
// ============================================================================
//
// - Basic-Auth token on every request, matched or not
// - x-api-key on the header-keyed namespace only
// - 401 responses carry the WWW-Authenticate hint
//
// ============================================================================

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use bot_web_api::error::AUTH_HINT;

mod common;
use common::*;

fn request(uri: &str, authorization: Option<&str>, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    if let Some(value) = api_key {
        builder = builder.header("x-api-key", value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_missing_authorization_header() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StubBackend::new();

    let response = send(
        app(backend.clone(), dir.path()),
        request(&format!("{}/Statistics", V2), None, Some(API_KEY)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        AUTH_HINT
    );
    assert_eq!(
        body_text(response).await,
        "Access denied: invalid Authorization Header format. Correct format: \"Authorization: Basic base64_auth_token\""
    );
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_scheme_is_malformed() {
    let dir = tempfile::tempdir().unwrap();

    let response = send(
        app(StubBackend::new(), dir.path()),
        request(&format!("{}/Statistics", V2), Some("Bearer abc"), Some(API_KEY)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("invalid Authorization Header format"));
}

#[tokio::test]
async fn test_wrong_token() {
    let dir = tempfile::tempdir().unwrap();

    let response = send(
        app(StubBackend::new(), dir.path()),
        request(
            &format!("{}/Statistics", V2),
            Some(&basic_auth("not-the-token")),
            Some(API_KEY),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_text(response).await,
        "Access denied: invalid basic-auth token."
    );
}

#[tokio::test]
async fn test_v2_requires_api_key_header() {
    let dir = tempfile::tempdir().unwrap();
    let auth = basic_auth(AUTH_TOKEN);

    for api_key in [None, Some("wrong-key")] {
        let response = send(
            app(StubBackend::new(), dir.path()),
            request(&format!("{}/Statistics", V2), Some(&auth), api_key),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, "Access denied: invalid api-key.");
    }
}

#[tokio::test]
async fn test_v1_needs_no_api_key_header() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StubBackend::new();

    let response = send(
        app(backend.clone(), dir.path()),
        request(
            &format!("{}/Statistics", V1),
            Some(&basic_auth(AUTH_TOKEN)),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.calls_to("get_statistics").len(), 1);
}

#[tokio::test]
async fn test_bare_token_is_accepted() {
    use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

    let dir = tempfile::tempdir().unwrap();
    let bare = BASE64.encode(AUTH_TOKEN);

    let response = send(
        app(StubBackend::new(), dir.path()),
        request(&format!("{}/Statistics", V2), Some(&bare), Some(API_KEY)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_v1_key_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StubBackend::new();

    let response = send(
        app(backend.clone(), dir.path()),
        request(
            "/WickrIO/V1/Apps/other-key/Statistics",
            Some(&basic_auth(AUTH_TOKEN)),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_text(response).await,
        "Endpoint /WickrIO/V1/Apps/other-key/Statistics not found"
    );
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_unmatched_path_still_requires_auth() {
    let dir = tempfile::tempdir().unwrap();

    let response = send(
        app(StubBackend::new(), dir.path()),
        request("/nowhere", None, None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

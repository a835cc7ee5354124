//! HTTP client and resource client behavior against a live fake backend.

mod common;

use axum::http::Method;
use serde_json::json;

use common::{student_session, FakeBackend, Reply};
use job_board::api::ApplicationStatus;
use job_board::http::ApiError;

#[tokio::test]
async fn delete_with_no_content_resolves_without_value() {
    let backend = FakeBackend::start().await;
    backend.reply(Method::DELETE, "/offers/42", Reply::Empty(204));

    let client = backend.client();
    client.offers().remove(42).await.expect("204 is success");

    assert_eq!(backend.calls_to(Method::DELETE, "/offers/42").len(), 1);
}

#[tokio::test]
async fn error_body_text_becomes_the_message() {
    let backend = FakeBackend::start().await;
    backend.reply(
        Method::GET,
        "/students/1032",
        Reply::Text(403, "Forbidden resource".to_string()),
    );

    let err = backend
        .client()
        .students()
        .get("1032")
        .await
        .expect_err("403 fails");

    assert_eq!(err.status(), Some(403));
    assert_eq!(err.to_string(), "Forbidden resource");
}

#[tokio::test]
async fn empty_error_body_reports_status() {
    let backend = FakeBackend::start().await;
    backend.reply(Method::GET, "/universities", Reply::Empty(500));

    let err = backend
        .client()
        .universities()
        .list()
        .await
        .expect_err("500 fails");

    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert_eq!(err.to_string(), "HTTP 500");
}

#[tokio::test]
async fn bearer_token_comes_from_the_session() {
    let backend = FakeBackend::start().await;
    backend.reply(Method::GET, "/applications/student/1032", Reply::Json(200, json!([])));

    let client = backend.client_with(student_session("1032"));
    client
        .applications()
        .list_by_student("1032")
        .await
        .expect("lists");

    let calls = backend.calls_to(Method::GET, "/applications/student/1032");
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer student-token"));
}

#[tokio::test]
async fn signed_out_requests_carry_no_token() {
    let backend = FakeBackend::start().await;
    backend.reply(Method::GET, "/offers", Reply::Json(200, json!([])));

    backend.client().offers().list().await.expect("lists");

    assert_eq!(backend.calls()[0].authorization, None);
}

#[tokio::test]
async fn list_endpoints_accept_wrapped_and_bare_shapes() {
    let backend = FakeBackend::start().await;
    backend
        .reply(
            Method::GET,
            "/offers",
            Reply::Json(
                200,
                json!({"data": [{"id_oferta": 1, "titulo": "A", "id_organizacion": "org-1"}]}),
            ),
        )
        .reply(
            Method::GET,
            "/universities",
            Reply::Json(200, json!({"universities": [{"id_universidad": 3, "nombre": "UNAL"}]})),
        )
        .reply(
            Method::GET,
            "/universities/3/careers",
            Reply::Json(200, json!([{"id_carrera": 12, "nombre": "Sistemas", "nivel": "UNDERGRADUATE", "id_universidad": 3}])),
        )
        .reply(
            Method::GET,
            "/organizations/featured",
            Reply::Json(200, json!({"total": 0})),
        );

    let client = backend.client();
    assert_eq!(client.offers().list().await.expect("offers").len(), 1);
    assert_eq!(client.universities().list().await.expect("universities")[0].name, "UNAL");
    assert_eq!(client.universities().careers(3).await.expect("careers")[0].id, 12);
    assert!(client
        .organizations()
        .featured()
        .await
        .expect("featured")
        .is_empty());
}

#[tokio::test]
async fn status_update_sends_canonical_code() {
    let backend = FakeBackend::start().await;
    backend.reply(Method::PATCH, "/applications/9", Reply::Json(200, json!({"ok": true})));

    backend
        .client()
        .applications()
        .update_status(9, ApplicationStatus::Accepted)
        .await
        .expect("updates");

    let calls = backend.calls_to(Method::PATCH, "/applications/9");
    assert_eq!(calls[0].body, Some(json!({"estado": "ACCEPTED"})));
}

//! Sign-in, registration and logout with a file-backed session.

mod common;

use std::sync::Arc;

use axum::http::Method;
use serde_json::json;

use common::{FakeBackend, Reply};
use job_board::api::{AuthError, StudentRegistration};
use job_board::session::AccountKind;
use job_board::SessionContext;

fn login_reply() -> Reply {
    Reply::Json(
        200,
        json!({
            "access_token": "jwt-abc",
            "user": {"id": "1032", "email": "laura@uni.edu.co", "nombre": "LAURA GOMEZ", "type": "student"}
        }),
    )
}

#[tokio::test]
async fn login_persists_the_session_and_logout_removes_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    let backend = FakeBackend::start().await;
    backend
        .reply(Method::POST, "/auth/login", login_reply())
        .reply(Method::GET, "/applications/student/1032", Reply::Json(200, json!([])));

    let client = backend.client_with(Arc::new(SessionContext::load(&path).expect("no file yet")));
    let user = client
        .auth()
        .login("laura@uni.edu.co", "secret")
        .await
        .expect("signs in");

    assert_eq!(user.kind, AccountKind::Student);
    assert!(path.exists());
    let login = backend.calls_to(Method::POST, "/auth/login");
    assert_eq!(
        login[0].body,
        Some(json!({"email": "laura@uni.edu.co", "password": "secret"}))
    );

    let restored = SessionContext::load(&path).expect("reads persisted session");
    assert_eq!(restored.token().as_deref(), Some("jwt-abc"));
    assert_eq!(restored.user().map(|user| user.id), Some("1032".to_string()));

    client
        .applications()
        .list_by_student("1032")
        .await
        .expect("lists");
    let calls = backend.calls_to(Method::GET, "/applications/student/1032");
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer jwt-abc"));

    client.auth().logout().expect("logs out");
    assert!(!path.exists());
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn invalid_registration_is_rejected_without_a_request() {
    let backend = FakeBackend::start().await;
    let registration = StudentRegistration {
        id_number: "12".to_string(),
        id_type: "CC".to_string(),
        first_names: "laura".to_string(),
        last_names: "gomez".to_string(),
        email: "laura@uni.edu.co".to_string(),
        password: "secret".to_string(),
    };

    let err = backend
        .client()
        .auth()
        .register_student(registration)
        .await
        .expect_err("short identification");

    assert!(matches!(err, AuthError::Invalid(_)));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn registration_sends_uppercased_names_and_signs_in() {
    let backend = FakeBackend::start().await;
    backend.reply(Method::POST, "/auth/register/student", login_reply());
    let client = backend.client();

    client
        .auth()
        .register_student(StudentRegistration {
            id_number: "1032".to_string(),
            id_type: "CC".to_string(),
            first_names: "laura".to_string(),
            last_names: "gomez".to_string(),
            email: "laura@uni.edu.co".to_string(),
            password: "secret".to_string(),
        })
        .await
        .expect("registers");

    let calls = backend.calls_to(Method::POST, "/auth/register/student");
    let body = calls[0].body.clone().expect("json body");
    assert_eq!(body["nombres"], "LAURA");
    assert_eq!(body["apellidos"], "GOMEZ");
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn rejected_login_surfaces_the_server_message() {
    let backend = FakeBackend::start().await;
    backend.reply(
        Method::POST,
        "/auth/login",
        Reply::Json(401, json!({"statusCode": 401, "message": "Credenciales invalidas"})),
    );
    let client = backend.client();

    let err = client
        .auth()
        .login("laura@uni.edu.co", "wrong")
        .await
        .expect_err("rejected");

    assert_eq!(err.to_string(), "Credenciales invalidas");
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn profile_without_token_fails_locally() {
    let backend = FakeBackend::start().await;

    let err = backend.client().auth().profile().await.expect_err("signed out");

    assert!(matches!(err, AuthError::Rejected { .. }));
    assert!(backend.calls().is_empty());
}

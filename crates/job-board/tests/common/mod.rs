//! In-process fake of the job board REST backend.
//!
//! Tests register canned replies per method and path, drive the real client against the
//! ephemeral listener, and then assert on the recorded calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use job_board::config::ApiConfig;
use job_board::session::{AccountKind, SessionUser};
use job_board::{JobBoardClient, SessionContext};

#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Text(u16, String),
    Empty(u16),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct BackendState {
    replies: Mutex<HashMap<(Method, String), Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend");
        });
        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn reply(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.state
            .replies
            .lock()
            .expect("replies poisoned")
            .insert((method, path.to_string()), reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().expect("calls poisoned").clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method && call.path == path)
            .collect()
    }

    pub fn client(&self) -> JobBoardClient {
        self.client_with(Arc::new(SessionContext::in_memory()))
    }

    pub fn client_with(&self, session: Arc<SessionContext>) -> JobBoardClient {
        let config = ApiConfig::new(self.base_url()).expect("valid fake backend url");
        JobBoardClient::new(&config, session)
    }
}

pub fn student_session(id: &str) -> Arc<SessionContext> {
    let session = SessionContext::in_memory();
    session
        .establish(
            "student-token".to_string(),
            SessionUser {
                id: id.to_string(),
                email: "laura@uni.edu.co".to_string(),
                name: "LAURA GOMEZ".to_string(),
                kind: AccountKind::Student,
            },
        )
        .expect("in-memory session");
    Arc::new(session)
}

pub fn organization_session(id: &str) -> Arc<SessionContext> {
    let session = SessionContext::in_memory();
    session
        .establish(
            "organization-token".to_string(),
            SessionUser {
                id: id.to_string(),
                email: "talento@acme.co".to_string(),
                name: "ACME SAS".to_string(),
                kind: AccountKind::Organization,
            },
        )
        .expect("in-memory session");
    Arc::new(session)
}

async fn handle(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.calls.lock().expect("calls poisoned").push(RecordedCall {
        method: method.clone(),
        path: path.clone(),
        body: serde_json::from_slice(&body).ok(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    });

    let reply = state
        .replies
        .lock()
        .expect("replies poisoned")
        .get(&(method, path))
        .cloned()
        .unwrap_or(Reply::Empty(404));

    match reply {
        Reply::Json(status, value) => (
            status_code(status),
            [(header::CONTENT_TYPE, "application/json")],
            value.to_string(),
        )
            .into_response(),
        Reply::Text(status, text) => (status_code(status), text).into_response(),
        Reply::Empty(status) => status_code(status).into_response(),
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).expect("valid status code")
}

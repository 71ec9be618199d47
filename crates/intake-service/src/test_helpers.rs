use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use intake_core::submission::SUBMIT_PATH;
use tokio::net::TcpListener;

/// What the stub endpoint answers with.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubResponse {
    pub fn ok() -> Self {
        Self::status(200, r#"{"message":"Information received"}"#)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// One multipart request as the stub received it.
#[derive(Debug, Clone, Default)]
pub struct RecordedSubmission {
    pub fields: BTreeMap<String, String>,
    pub files: BTreeMap<String, RecordedFile>,
}

struct StubState {
    response: StubResponse,
    received: Mutex<Vec<RecordedSubmission>>,
}

/// A running stub endpoint with its base_url and background task handle.
pub struct StubServer {
    pub base_url: String,
    state: Arc<StubState>,
    _handle: tokio::task::JoinHandle<()>,
}

impl StubServer {
    pub fn received(&self) -> Vec<RecordedSubmission> {
        self.state.received.lock().unwrap().clone()
    }
}

/// Stub router: one multipart POST route at the submit path.
fn stub_router(state: Arc<StubState>) -> Router {
    Router::new()
        .route(SUBMIT_PATH, post(receive))
        .layer(DefaultBodyLimit::max(12 * 1024 * 1024))
        .with_state(state)
}

/// Spawn the stub endpoint on a random port.
pub async fn spawn_stub_server(response: StubResponse) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let state = Arc::new(StubState {
        response,
        received: Mutex::new(Vec::new()),
    });
    let app = stub_router(state.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    StubServer {
        base_url,
        state,
        _handle: handle,
    }
}

async fn receive(State(state): State<Arc<StubState>>, mut multipart: Multipart) -> Response {
    let mut recorded = RecordedSubmission::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(String::from) {
            Some(file_name) => {
                let content_type = field.content_type().map(String::from);
                let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
                recorded.files.insert(
                    name,
                    RecordedFile {
                        file_name,
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let text = field.text().await.unwrap_or_default();
                recorded.fields.insert(name, text);
            }
        }
    }
    state.received.lock().unwrap().push(recorded);

    let response = state.response.clone();
    tokio::time::sleep(response.delay).await;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, response.body).into_response()
}

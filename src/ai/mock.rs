//! In-process chat-completions endpoint for tests

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: HeaderMap,
    pub body: Value,
}

struct Inner {
    requests: Mutex<Vec<RecordedRequest>>,
    response: Mutex<(StatusCode, Value)>,
}

/// Records every request and answers with the configured response.
#[derive(Clone)]
pub struct MockUpstream {
    inner: Arc<Inner>,
    base_url: String,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let inner = Arc::new(Inner {
            requests: Mutex::new(Vec::new()),
            response: Mutex::new((StatusCode::OK, completion("ok"))),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(inner.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            inner,
            base_url: format!("http://{}/v1", addr),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Answer with a successful completion carrying `content`.
    pub fn reply_with(&self, content: &str) {
        self.respond(StatusCode::OK, completion(content));
    }

    pub fn respond(&self, status: StatusCode, body: Value) {
        *self.inner.response.lock().unwrap() = (status, body);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.requests.lock().unwrap().len()
    }
}

fn completion(content: &str) -> Value {
    json!({
        "id": "gen-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

async fn chat_completions(
    State(inner): State<Arc<Inner>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    inner
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { headers, body });
    let (status, body) = inner.response.lock().unwrap().clone();
    (status, Json(body))
}

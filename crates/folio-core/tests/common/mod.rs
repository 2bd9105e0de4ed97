//! In-process chat backend for HTTP tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures_util::stream;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Clone)]
struct Script {
    status: StatusCode,
    chunks: Vec<&'static [u8]>,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// Serves `POST /api/chat/stream`, replying with scripted body chunks
pub struct ChatServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl ChatServer {
    /// Stream `chunks` back as the reply body
    pub async fn streaming(chunks: &[&'static [u8]]) -> Self {
        Self::start(StatusCode::OK, chunks.to_vec()).await
    }

    /// Answer every request with `status` and no body
    pub async fn failing(status: StatusCode) -> Self {
        Self::start(status, Vec::new()).await
    }

    async fn start(status: StatusCode, chunks: Vec<&'static [u8]>) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/api/chat/stream", post(chat_stream))
            .with_state(Script {
                status,
                chunks,
                requests: requests.clone(),
            });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: format!("http://{}/api/chat/stream", addr),
            requests,
        }
    }

    /// JSON bodies received so far
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }
}

async fn chat_stream(State(script): State<Script>, Json(body): Json<Value>) -> Response {
    script.requests.lock().push(body);
    if !script.status.is_success() {
        return script.status.into_response();
    }
    let chunks = script.chunks.into_iter().map(Ok::<_, std::io::Error>);
    Body::from_stream(stream::iter(chunks)).into_response()
}

//! Scripted analysis server on a loopback port
//!
//! Replies to each request with the next scripted (status, body) pair and
//! records what the client actually sent.

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::post;
use axum::Router;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// One request as received by the stub
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub request_id: Option<String>,
    pub fields: HashMap<String, String>,
    pub file_field: Option<String>,
    pub file_len: Option<usize>,
}

#[derive(Default)]
struct StubState {
    script: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubServer {
    /// Start serving; once the script runs out every request gets 500
    pub async fn start(script: Vec<(u16, &str)>) -> Self {
        let state = Arc::new(StubState {
            script: Mutex::new(script.into_iter().map(|(s, b)| (s, b.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/analyze", post(record_and_reply))
            .route("/analyze/label", post(record_and_reply))
            .route("/analyze/smart", post(record_and_reply))
            .route("/lookup/barcode", post(record_and_reply))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }
}

async fn record_and_reply(
    State(state): State<Arc<StubState>>,
    uri: Uri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let mut recorded = RecordedRequest {
        path: uri.path().to_string(),
        request_id: headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        fields: HashMap::new(),
        file_field: None,
        file_len: None,
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            let bytes = field.bytes().await.unwrap_or_default();
            recorded.file_field = Some(name);
            recorded.file_len = Some(bytes.len());
        } else {
            let text = field.text().await.unwrap_or_default();
            recorded.fields.insert(name, text);
        }
    }

    state.requests.lock().unwrap().push(recorded);

    let (status, body) = state
        .script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((500, "script exhausted".to_string()));

    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body,
    )
}

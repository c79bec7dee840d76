#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use cliente_lookup::ClientOptions;
use serde_json::{json, Value as JsonValue};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Clone)]
pub struct MockResponse {
    status: StatusCode,
    body: JsonValue,
    delay: Duration,
}

impl MockResponse {
    pub fn json(status: StatusCode, body: JsonValue) -> Self {
        Self {
            status,
            body,
            delay: Duration::from_millis(0),
        }
    }

    pub fn ok(body: JsonValue) -> Self {
        Self::json(StatusCode::OK, body)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    hits: Arc<Mutex<Vec<Instant>>>,
    ids: Arc<Mutex<Vec<String>>>,
}

async fn app_search_handler(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state
        .hits
        .lock()
        .expect("hits mutex must not be poisoned")
        .push(Instant::now());
    state
        .ids
        .lock()
        .expect("ids mutex must not be poisoned")
        .push(query.get("id").cloned().unwrap_or_default());

    let response = {
        let mut queue = state
            .responses
            .lock()
            .expect("response queue mutex must not be poisoned");
        queue.pop_front().unwrap_or_else(|| {
            MockResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "no mock response available"}),
            )
        })
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    (response.status, Json(response.body))
}

pub struct TestServer {
    pub base_url: String,
    hits: Arc<Mutex<Vec<Instant>>>,
    ids: Arc<Mutex<Vec<String>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    pub fn hits(&self) -> usize {
        self.hits.lock().expect("hits mutex must not be poisoned").len()
    }

    /// Time elapsed between consecutive hits.
    pub fn gaps(&self) -> Vec<Duration> {
        let hits = self.hits.lock().expect("hits mutex must not be poisoned");
        hits.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }

    pub fn requested_ids(&self) -> Vec<String> {
        self.ids.lock().expect("ids mutex must not be poisoned").clone()
    }
}

/// Serves `/clientes/app-search`, answering with `responses` in order and a
/// 500 once they run out.
pub async fn spawn_server(responses: Vec<MockResponse>) -> TestServer {
    let state = MockState {
        responses: Arc::new(Mutex::new(responses.into())),
        hits: Arc::new(Mutex::new(Vec::new())),
        ids: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/clientes/app-search", get(app_search_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer {
        base_url: format!("http://{address}"),
        hits: state.hits,
        ids: state.ids,
        task,
    }
}

pub struct FlakyServer {
    pub base_url: String,
    pub connections: Arc<AtomicUsize>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for FlakyServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Reads until the end of the request head; `false` if the peer went away.
async fn read_request_head(socket: &mut tokio::net::TcpStream) -> bool {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return false,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    true
}

/// Raw TCP server that closes the first `drops` connections without
/// answering, then replies `200` with `body` to every request.
pub async fn spawn_flaky_server(drops: usize, body: JsonValue) -> FlakyServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);
    let payload = body.to_string();

    let task = tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let seen = counter.fetch_add(1, Ordering::SeqCst);
            if seen < drops {
                drop(socket);
                continue;
            }

            let payload = payload.clone();
            tokio::spawn(async move {
                if !read_request_head(&mut socket).await {
                    return;
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    payload.len(),
                    payload
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    FlakyServer {
        base_url: format!("http://{address}"),
        connections,
        task,
    }
}

/// Raw TCP server that answers every request with a `503` whose body ends
/// before its declared `content-length`.
pub async fn spawn_truncated_error_server() -> FlakyServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    let task = tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);

            tokio::spawn(async move {
                if !read_request_head(&mut socket).await {
                    return;
                }
                let response =
                    "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\nconnection: close\r\n\r\nshort";
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    FlakyServer {
        base_url: format!("http://{address}"),
        connections,
        task,
    }
}

/// Base URL of a local port nothing listens on.
pub async fn refused_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    drop(listener);
    format!("http://{address}")
}

/// Short timings so retry tests finish quickly.
pub fn fast_options(max_retries: usize) -> ClientOptions {
    ClientOptions {
        timeout_ms: 1_000,
        max_retries,
        retry_backoff_ms: 20,
    }
}

pub fn sucursal(id: &str, latitud: Option<f64>, longitud: Option<f64>) -> JsonValue {
    json!({
        "id": id,
        "nombre": "Abarrotes La Esperanza",
        "latitud": latitud,
        "longitud": longitud,
        "vendedorNombre": "Ana Ruiz",
        "vendedorTelefono": "555-0101",
        "direccion": "Av. Juárez 120"
    })
}

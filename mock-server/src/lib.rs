//! Programmable stand-in for the loans API, used by the client's
//! integration tests.
//!
//! # Design
//! Every request lands in one fallback handler. It records the request, then
//! answers with the response registered for `(method, path?query)`, falling
//! back to `(method, path)`. Unmatched requests get a 404 JSON error body so
//! a missing stub shows up as a rejected call rather than a hang.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// A request as the stub server saw it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    /// JSON body; non-JSON bodies are kept as a string, empty ones as `None`.
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A canned answer.
#[derive(Clone, Debug, PartialEq)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
}

impl StubResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self::body(status, "application/json", body.to_string())
    }

    pub fn body(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: Some(content_type.to_string()),
            body: body.into(),
            delay: None,
        }
    }

    /// No body and no `Content-Type`.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
            delay: None,
        }
    }

    /// Hold the answer back for `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl IntoResponse for StubResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if let Some(value) = self.content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        response
    }
}

#[derive(Default)]
struct StubState {
    routes: HashMap<(String, String), StubResponse>,
    requests: Vec<RecordedRequest>,
}

/// Shared stub registry. Clones share routes and the request log.
#[derive(Clone, Default)]
pub struct Stubs {
    state: Arc<Mutex<StubState>>,
}

impl Stubs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method target` with `response`. `target` is a path, optionally
    /// with a query string that must then match exactly. Registering the same
    /// route again replaces the previous answer.
    pub fn on(&self, method: &str, target: &str, response: StubResponse) -> &Self {
        self.lock()
            .routes
            .insert((method.to_ascii_uppercase(), target.to_string()), response);
        self
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Requests received for `method path` (query ignored).
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|request| request.method.eq_ignore_ascii_case(method) && request.path == path)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(&self, request: RecordedRequest) -> StubResponse {
        let mut state = self.lock();
        let target = match &request.query {
            Some(query) => format!("{}?{query}", request.path),
            None => request.path.clone(),
        };
        let response = state
            .routes
            .get(&(request.method.clone(), target))
            .or_else(|| state.routes.get(&(request.method.clone(), request.path.clone())))
            .cloned()
            .unwrap_or_else(|| {
                StubResponse::json(
                    404,
                    &json!({ "errors": { "base": [format!("no stub for {} {}", request.method, request.path)] } }),
                )
            });
        state.requests.push(request);
        response
    }
}

pub fn app(stubs: Stubs) -> Router {
    Router::new().fallback(handle).with_state(stubs)
}

pub async fn run(listener: TcpListener, stubs: Stubs) -> Result<(), std::io::Error> {
    axum::serve(listener, app(stubs)).await
}

/// Serve `stubs` on a random local port from a background thread and return
/// the bound address.
pub fn spawn(stubs: Stubs) -> Result<SocketAddr, std::io::Error> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = std_listener.local_addr()?;
    std_listener.set_nonblocking(true)?;

    // Startup errors are reported to the caller.
    let (ready_tx, ready_rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let started = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .and_then(|rt| {
                let listener = {
                    let _guard = rt.enter();
                    TcpListener::from_std(std_listener)?
                };
                Ok((rt, listener))
            });
        match started {
            Ok((rt, listener)) => {
                ready_tx.send(Ok(())).ok();
                if let Err(e) = rt.block_on(run(listener, stubs)) {
                    eprintln!("stub server stopped: {e}");
                }
            }
            Err(e) => {
                ready_tx.send(Err(e)).ok();
            }
        }
    });

    ready_rx
        .recv()
        .map_err(|_| std::io::Error::other("stub server thread exited during startup"))??;
    Ok(addr)
}

async fn handle(
    State(stubs): State<Stubs>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RecordedRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect(),
        body: parse_body(&body),
    };

    let response = stubs.respond(request);
    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }
    response.into_response()
}

fn parse_body(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    Some(
        serde_json::from_slice(body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded(method: &str, path: &str, query: Option<&str>) -> RecordedRequest {
        RecordedRequest {
            method: method.to_string(),
            path: path.to_string(),
            query: query.map(str::to_string),
            headers: Vec::new(),
            body: None,
        }
    }

    #[test]
    fn exact_query_match_wins() {
        let stubs = Stubs::new();
        stubs
            .on("get", "/loan_requests/t", StubResponse::empty(200))
            .on("GET", "/loan_requests/t?amount=5", StubResponse::empty(204));

        let response = stubs.respond(recorded("GET", "/loan_requests/t", Some("amount=5")));
        assert_eq!(response.status, 204);
    }

    #[test]
    fn falls_back_to_path_without_query() {
        let stubs = Stubs::new();
        stubs.on("GET", "/loan_requests/t", StubResponse::empty(200));

        let response = stubs.respond(recorded("GET", "/loan_requests/t", Some("amount=9")));
        assert_eq!(response.status, 200);
    }

    #[test]
    fn unmatched_request_is_json_404() {
        let response = Stubs::new().respond(recorded("POST", "/nowhere", None));
        assert_eq!(response.status, 404);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn requests_are_logged_in_order() {
        let stubs = Stubs::new();
        stubs.respond(recorded("POST", "/sessions", None));
        stubs.respond(recorded("GET", "/orders", None));

        let methods: Vec<_> = stubs.requests().into_iter().map(|r| r.method).collect();
        assert_eq!(methods, vec!["POST", "GET"]);
        assert_eq!(stubs.requests_to("get", "/orders").len(), 1);
    }

    #[test]
    fn spawned_server_accepts_connections_on_return() {
        let addr = spawn(Stubs::new()).unwrap();
        assert!(std::net::TcpStream::connect(addr).is_ok());
    }

    #[test]
    fn non_json_body_is_kept_as_text() {
        assert_eq!(parse_body(b"plain"), Some(Value::String("plain".to_string())));
        assert_eq!(parse_body(b""), None);
        assert_eq!(parse_body(br#"{"a":1}"#), Some(json!({ "a": 1 })));
    }
}

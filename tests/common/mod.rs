// Shared test harness: an in-process stub standing in for the auth and
// contacts services. Every call is recorded so tests can assert not
// just on outcomes but on which fetches a given operation issued.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::Filter;

/// One observed request, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: &'static str,
    pub method: &'static str,
    pub action: String,
    pub token: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct StubState {
    pub calls: Vec<RecordedCall>,
    auth_response: Option<(u16, Value)>,
    get_responses: HashMap<String, (u16, Value)>,
    post_responses: HashMap<String, (u16, Value)>,
}

pub struct StubService {
    state: Arc<Mutex<StubState>>,
    addr: SocketAddr,
}

fn reply_with(status: u16, value: &Value) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(value),
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    )
}

impl StubService {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(StubState::default()));

        let with_state = {
            let state = state.clone();
            warp::any().map(move || state.clone())
        };

        let auth = warp::path("auth")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_state.clone())
            .map(|body: Value, state: Arc<Mutex<StubState>>| {
                let mut guard = state.lock().unwrap();
                let action = body
                    .get("action")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                guard.calls.push(RecordedCall {
                    endpoint: "auth",
                    method: "POST",
                    action,
                    token: None,
                    body: Some(body),
                });
                let (status, value) = guard
                    .auth_response
                    .clone()
                    .unwrap_or((500, json!({"error": "auth response not configured"})));
                reply_with(status, &value)
            });

        let contacts_get = warp::path("contacts")
            .and(warp::get())
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::header::optional::<String>("x-user-token"))
            .and(with_state.clone())
            .map(
                |query: HashMap<String, String>,
                 token: Option<String>,
                 state: Arc<Mutex<StubState>>| {
                    let action = query.get("action").cloned().unwrap_or_default();
                    let mut guard = state.lock().unwrap();
                    guard.calls.push(RecordedCall {
                        endpoint: "contacts",
                        method: "GET",
                        action: action.clone(),
                        token,
                        body: None,
                    });
                    let (status, value) = guard
                        .get_responses
                        .get(&action)
                        .cloned()
                        .unwrap_or((404, json!({"error": "unknown action"})));
                    reply_with(status, &value)
                },
            );

        let contacts_post = warp::path("contacts")
            .and(warp::post())
            .and(warp::body::json())
            .and(warp::header::optional::<String>("x-user-token"))
            .and(with_state)
            .map(
                |body: Value, token: Option<String>, state: Arc<Mutex<StubState>>| {
                    let action = body
                        .get("action")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let mut guard = state.lock().unwrap();
                    guard.calls.push(RecordedCall {
                        endpoint: "contacts",
                        method: "POST",
                        action: action.clone(),
                        token,
                        body: Some(body),
                    });
                    let (status, value) = guard
                        .post_responses
                        .get(&action)
                        .cloned()
                        .unwrap_or((404, json!({"error": "unknown action"})));
                    reply_with(status, &value)
                },
            );

        let routes = auth.or(contacts_get).or(contacts_post);
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        StubService { state, addr }
    }

    pub fn auth_url(&self) -> String {
        format!("http://{}/auth", self.addr)
    }

    pub fn contacts_url(&self) -> String {
        format!("http://{}/contacts", self.addr)
    }

    pub fn set_auth_response(&self, status: u16, body: Value) {
        self.state.lock().unwrap().auth_response = Some((status, body));
    }

    pub fn set_get_response(&self, action: &str, status: u16, body: Value) {
        self.state
            .lock()
            .unwrap()
            .get_responses
            .insert(action.to_string(), (status, body));
    }

    pub fn set_post_response(&self, action: &str, status: u16, body: Value) {
        self.state
            .lock()
            .unwrap()
            .post_responses
            .insert(action.to_string(), (status, body));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Compact trace like `["auth:POST:login", "contacts:GET:list"]`.
    pub fn action_log(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| format!("{}:{}:{}", c.endpoint, c.method, c.action))
            .collect()
    }
}

/// Service-shaped user object for seeding responses.
pub fn user_json(id: i64, email: &str, name: &str) -> Value {
    json!({"id": id, "email": email, "name": name, "avatar_url": null})
}

/// Service-shaped contact object (a user plus `added_at`).
pub fn contact_json(id: i64, email: &str, name: &str) -> Value {
    json!({
        "id": id, "email": email, "name": name,
        "avatar_url": null, "added_at": "2024-05-01T10:00:00"
    })
}

/// Service-shaped pending incoming request.
pub fn request_json(request_id: i64, user_id: i64, email: &str, name: &str) -> Value {
    json!({
        "request_id": request_id, "user_id": user_id,
        "email": email, "name": name,
        "avatar_url": null, "created_at": "2024-05-02T08:30:00"
    })
}

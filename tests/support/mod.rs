#![allow(dead_code)]

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;

pub const USERNAME: &str = "ada";
pub const PASSWORD: &str = "lovelace";
pub const TOKEN: &str = "tok-1";
pub const REFRESHED_TOKEN: &str = "tok-2";

#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Deserialize)]
struct Draft {
    title: String,
    body: String,
}

#[derive(Deserialize)]
struct Creds {
    username: String,
    password: String,
}

#[derive(Default)]
struct Store {
    notes: BTreeMap<u64, Note>,
    next_id: u64,
    hits: Vec<String>,
}

#[derive(Clone, Default)]
struct Backend {
    store: Arc<Mutex<Store>>,
}

/// In-memory stand-in for the note backend, served on its own runtime thread.
pub struct FakeBackend {
    pub url: String,
    store: Arc<Mutex<Store>>,
}

impl FakeBackend {
    fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind backend");
        listener.set_nonblocking(true).expect("nonblocking backend");
        let url = format!("http://{}", listener.local_addr().unwrap());
        let backend = Backend::default();
        let store = Arc::clone(&backend.store);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("backend runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, backend_router(backend)).await.unwrap();
            });
        });

        Self { url, store }
    }

    pub fn add_note(&self, title: &str, body: &str) -> u64 {
        let mut store = self.store.lock().unwrap();
        store.next_id += 1;
        let id = store.next_id;
        store.notes.insert(
            id,
            Note {
                id,
                title: title.to_string(),
                body: body.to_string(),
            },
        );
        id
    }

    pub fn note(&self, id: u64) -> Option<Note> {
        self.store.lock().unwrap().notes.get(&id).cloned()
    }

    /// Requests seen so far whose target contains `needle`.
    pub fn hits(&self, needle: &str) -> usize {
        self.store
            .lock()
            .unwrap()
            .hits
            .iter()
            .filter(|hit| hit.contains(needle))
            .count()
    }
}

pub static BACKEND: Lazy<FakeBackend> = Lazy::new(FakeBackend::start);

fn backend_router(backend: Backend) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/verify", get(verify))
        .route("/api/auth/logout", get(logout))
        .route("/api/note/new", post(new_note))
        .route("/api/note/search", get(search))
        .route("/api/note/:id", get(get_note).delete(delete_note))
        .route("/api/note/:id/update", post(update_note))
        .route("/api/note/:id/similar", get(similar))
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .with_state(backend)
}

async fn record(State(backend): State<Backend>, request: Request, next: Next) -> Response {
    let hit = format!("{} {}", request.method(), request.uri());
    backend.store.lock().unwrap().hits.push(hit);
    next.run(request).await
}

fn session(headers: &HeaderMap) -> Option<&'static str> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| match pair.trim() {
        "session-token=tok-1" => Some(TOKEN),
        "session-token=tok-2" => Some(REFRESHED_TOKEN),
        _ => None,
    })
}

async fn login(Form(creds): Form<Creds>) -> Response {
    if creds.username == USERNAME && creds.password == PASSWORD {
        (
            AppendHeaders([(header::SET_COOKIE, format!("session-token={TOKEN}; Path=/"))]),
            StatusCode::OK,
        )
            .into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn register(Form(creds): Form<Creds>) -> StatusCode {
    if creds.username == USERNAME {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    }
}

/// Sessions on the first token are rotated, as the real backend does halfway through expiry.
async fn verify(headers: HeaderMap) -> Response {
    match session(&headers) {
        Some(TOKEN) => (
            AppendHeaders([(
                header::SET_COOKIE,
                format!("session-token={REFRESHED_TOKEN}; Path=/"),
            )]),
            StatusCode::OK,
        )
            .into_response(),
        Some(_) => StatusCode::OK.into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn logout(headers: HeaderMap) -> Response {
    if session(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    (
        AppendHeaders([(header::SET_COOKIE, "session-token=; Path=/; Max-Age=0")]),
        StatusCode::OK,
    )
        .into_response()
}

async fn new_note(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(draft): Json<Draft>,
) -> Response {
    if session(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut store = backend.store.lock().unwrap();
    store.next_id += 1;
    let id = store.next_id;
    store.notes.insert(
        id,
        Note {
            id,
            title: draft.title,
            body: draft.body,
        },
    );
    (StatusCode::ACCEPTED, id.to_string()).into_response()
}

async fn get_note(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    let token = match session(&headers) {
        Some(token) => token,
        None => return StatusCode::UNAUTHORIZED.into_response(),
    };
    let response = match backend.store.lock().unwrap().notes.get(&id) {
        Some(note) => Json(note.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    };
    if token != TOKEN {
        return response;
    }
    (
        AppendHeaders([(
            header::SET_COOKIE,
            format!("session-token={REFRESHED_TOKEN}; Path=/"),
        )]),
        response,
    )
        .into_response()
}

async fn delete_note(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> StatusCode {
    if session(&headers).is_none() {
        return StatusCode::UNAUTHORIZED;
    }
    match backend.store.lock().unwrap().notes.remove(&id) {
        Some(_) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    }
}

async fn update_note(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(draft): Json<Draft>,
) -> Response {
    if session(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut store = backend.store.lock().unwrap();
    match store.notes.get_mut(&id) {
        Some(note) => {
            note.title = draft.title;
            note.body = draft.body;
            (StatusCode::ACCEPTED, id.to_string()).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "Could not update note").into_response(),
    }
}

async fn search(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if session(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let query = params.get("query").cloned().unwrap_or_default();
    let count: usize = params
        .get("count")
        .and_then(|count| count.parse().ok())
        .unwrap_or(10);
    let store = backend.store.lock().unwrap();
    let found: Vec<Note> = store
        .notes
        .values()
        .filter(|note| note.title.contains(&query) || note.body.contains(&query))
        .take(count)
        .cloned()
        .collect();
    Json(found).into_response()
}

async fn similar(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if session(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let store = backend.store.lock().unwrap();
    let Some(note) = store.notes.get(&id) else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let prefix: String = note.title.chars().take(4).collect();
    let found: Vec<Note> = store
        .notes
        .values()
        .filter(|other| other.title.starts_with(&prefix))
        .cloned()
        .collect();
    Json(found).into_response()
}

pub struct TestShell {
    pub base_url: String,
    child: Child,
}

impl Drop for TestShell {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(unix)]
mod cleanup {
    use std::sync::{Mutex, Once};

    static REGISTER: Once = Once::new();
    static PIDS: Mutex<Vec<u32>> = Mutex::new(Vec::new());

    pub fn register(pid: u32) {
        if let Ok(mut pids) = PIDS.lock() {
            pids.push(pid);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = PIDS.lock() {
            for pid in pids.iter() {
                unsafe {
                    libc::kill(*pid as i32, libc::SIGTERM);
                }
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/login")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("shell did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

static SHELLS: Lazy<tokio::sync::Mutex<HashMap<&'static str, Arc<TestShell>>>> =
    Lazy::new(|| tokio::sync::Mutex::new(HashMap::new()));

async fn spawn_shell(flavor: &str) -> TestShell {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_notable_shell"))
        .env("PORT", port.to_string())
        .env("NOTABLE_API_URL", &BACKEND.url)
        .env("NOTABLE_FLAVOR", flavor)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn shell");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestShell { base_url, child }
}

/// One shell process per flavor, shared by every test in the binary.
pub async fn shared_shell(flavor: &'static str) -> Arc<TestShell> {
    let mut guard = SHELLS.lock().await;
    if let Some(shell) = guard.get(flavor) {
        return Arc::clone(shell);
    }
    let shell = Arc::new(spawn_shell(flavor).await);
    guard.insert(flavor, Arc::clone(&shell));
    shell
}

/// Browser-like client: keeps no cookie store and never follows redirects.
pub fn browser() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn session_cookie(token: &str) -> String {
    format!("session-token={token}")
}

pub fn location(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::LOCATION)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

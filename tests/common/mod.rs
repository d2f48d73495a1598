//! Mock targets for integration tests.
//!
//! Each mock reproduces the wire behavior of one real challenge service
//! closely enough for the adapters to run their full protocol against it:
//! the note-storage app (cookie-session forms), the loyalty-points store
//! (register/login/transfer/buy with its exact marker strings) and the
//! line-oriented mailbox (220 banner, LOGIN/SEND/READ).

#![allow(dead_code)] // not every test file uses every mock

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex;

use axum::extract::{Form, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

fn session_user(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|cookie| {
        let (name, value) = cookie.trim().split_once('=')?;
        (name == "session").then(|| value.to_string())
    })
}

fn session_cookie(user: &str) -> [(header::HeaderName, String); 1] {
    [(header::SET_COOKIE, format!("session={user}; Path=/"))]
}

// ---------------------------------------------------------------------------
// Notes target
// ---------------------------------------------------------------------------

/// Tunable failure modes of the mock notes target.
#[derive(Clone, Default)]
pub struct NotesBehavior {
    /// Answer HTTP 500 on signup.
    pub fail_signup: bool,
    /// Accept notes but silently discard them.
    pub drop_notes: bool,
}

#[derive(Clone)]
struct NotesState {
    behavior: NotesBehavior,
    notes: Arc<Mutex<HashMap<String, String>>>,
}

#[derive(Deserialize)]
struct Credentials {
    user: String,
    #[allow(unused)]
    passwd: String,
}

#[derive(Deserialize)]
struct NoteForm {
    note: String,
}

async fn notes_signup(
    State(state): State<NotesState>,
    Form(creds): Form<Credentials>,
) -> Response {
    if state.behavior.fail_signup {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database is down").into_response();
    }
    state
        .notes
        .lock()
        .unwrap()
        .insert(creds.user.clone(), String::new());
    (session_cookie(&creds.user), "account created").into_response()
}

async fn notes_note(
    State(state): State<NotesState>,
    headers: HeaderMap,
    Form(form): Form<NoteForm>,
) -> Response {
    let Some(user) = session_user(&headers) else {
        return (StatusCode::UNAUTHORIZED, "login first").into_response();
    };
    if !state.behavior.drop_notes {
        state.notes.lock().unwrap().insert(user, form.note);
    }
    "note saved".into_response()
}

async fn notes_home(State(state): State<NotesState>, headers: HeaderMap) -> Response {
    let Some(user) = session_user(&headers) else {
        return (StatusCode::UNAUTHORIZED, "login first").into_response();
    };
    let note = state
        .notes
        .lock()
        .unwrap()
        .get(&user)
        .cloned()
        .unwrap_or_default();
    format!("<h2>Welcome {user}</h2><p>{note}</p>").into_response()
}

/// Spawn a mock note-storage target; returns its bound address.
pub async fn spawn_notes_target(behavior: NotesBehavior) -> SocketAddr {
    let state = NotesState {
        behavior,
        notes: Arc::new(Mutex::new(HashMap::new())),
    };
    let app = Router::new()
        .route("/signup", post(notes_signup))
        .route("/note", post(notes_note))
        .route("/home", get(notes_home))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// ---------------------------------------------------------------------------
// Points target
// ---------------------------------------------------------------------------

/// Tunable behavior of the mock loyalty-points target.
#[derive(Clone)]
pub struct PointsBehavior {
    /// Whether the negative-transfer exploit still works (unpatched target).
    pub accept_exploit: bool,
    /// Serve an incoherent purchase page with neither flag nor marker.
    pub broken_buy: bool,
    /// Always answer the purchase with the insufficient-points page, the way
    /// a defended store refuses to hand out the flag twice.
    pub always_insufficient: bool,
    /// Flag the store reveals on a successful purchase.
    pub flag: String,
}

const STARTING_POINTS: i64 = 10_000;
const FLAG_PRICE: i64 = 1_000_000;

#[derive(Clone)]
struct PointsState {
    behavior: PointsBehavior,
    balances: Arc<Mutex<HashMap<String, i64>>>,
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    #[allow(unused)]
    password: String,
    action: String,
}

#[derive(Deserialize)]
struct TransferForm {
    recipient: String,
    amount: String,
}

async fn points_login(State(state): State<PointsState>, Form(form): Form<LoginForm>) -> Response {
    let mut balances = state.balances.lock().unwrap();
    match form.action.as_str() {
        "register" => {
            balances.entry(form.username.clone()).or_insert(STARTING_POINTS);
            "Account created! Please login.".into_response()
        }
        "login" => {
            if balances.contains_key(&form.username) {
                (session_cookie(&form.username), "Welcome back").into_response()
            } else {
                "Invalid credentials.".into_response()
            }
        }
        _ => (StatusCode::BAD_REQUEST, "unknown action").into_response(),
    }
}

async fn points_transfer(
    State(state): State<PointsState>,
    headers: HeaderMap,
    Form(form): Form<TransferForm>,
) -> Response {
    let Some(sender) = session_user(&headers) else {
        return (StatusCode::UNAUTHORIZED, "login first").into_response();
    };
    let Ok(amount) = form.amount.parse::<i64>() else {
        return "Invalid amount.".into_response();
    };
    // A patched target validates the sign; the vulnerable one does not.
    if !state.behavior.accept_exploit && amount <= 0 {
        return "Invalid amount.".into_response();
    }
    let mut balances = state.balances.lock().unwrap();
    if !balances.contains_key(&form.recipient) {
        return "Recipient not found.".into_response();
    }
    let sender_balance = balances.get(&sender).copied().unwrap_or(0);
    if sender_balance < amount {
        return "Insufficient points.".into_response();
    }
    *balances.get_mut(&sender).unwrap() -= amount;
    *balances.get_mut(&form.recipient).unwrap() += amount;
    format!(
        "Successfully transferred {amount} points to {}.",
        form.recipient
    )
    .into_response()
}

async fn points_buy(
    State(state): State<PointsState>,
    Path(product_id): Path<u32>,
    headers: HeaderMap,
) -> Response {
    let Some(user) = session_user(&headers) else {
        return (StatusCode::UNAUTHORIZED, "login first").into_response();
    };
    if state.behavior.broken_buy {
        return "Out of stock".into_response();
    }
    if state.behavior.always_insufficient {
        return "Insufficient Points! You need more loyalty points.".into_response();
    }
    if product_id != 4 {
        return (StatusCode::NOT_FOUND, "Product not found").into_response();
    }
    let mut balances = state.balances.lock().unwrap();
    let balance = balances.get(&user).copied().unwrap_or(0);
    if balance >= FLAG_PRICE {
        *balances.get_mut(&user).unwrap() = 0;
        format!("ACCESS GRANTED. SECRET CODE: {}", state.behavior.flag).into_response()
    } else {
        "Insufficient Points! You need more loyalty points.".into_response()
    }
}

/// Spawn a mock loyalty-points target; returns its bound address.
pub async fn spawn_points_target(behavior: PointsBehavior) -> SocketAddr {
    let mut balances = HashMap::new();
    // The exploit recipient exists on every instance.
    balances.insert("root".to_string(), 1);
    let state = PointsState {
        behavior,
        balances: Arc::new(Mutex::new(balances)),
    };
    let app = Router::new()
        .route("/login", post(points_login))
        .route("/transfer", post(points_transfer))
        .route("/buy/{product_id}", post(points_buy))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// ---------------------------------------------------------------------------
// Mailbox target
// ---------------------------------------------------------------------------

/// Tunable behavior of the mock mailbox target.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MailboxBehavior {
    /// Speak the protocol correctly.
    Normal,
    /// Greet with a non-220 banner.
    BadBanner,
    /// Reject every LOGIN.
    RejectLogin,
}

/// Observable state of a running mock mailbox.
pub struct MailboxHandle {
    /// Bound address.
    pub addr: SocketAddr,
    /// Accept timestamps, one per connection, in order.
    pub connections: Arc<Mutex<Vec<Instant>>>,
}

async fn serve_mailbox_conn(
    stream: TcpStream,
    password: String,
    behavior: MailboxBehavior,
    store: Arc<Mutex<HashMap<u64, String>>>,
    counter: Arc<AtomicU64>,
) {
    let mut reader = BufReader::new(stream);
    let banner = match behavior {
        MailboxBehavior::BadBanner => "999 UNDER MAINTENANCE\n",
        _ => "220 Welcome to VulnMail 1.0\n",
    };
    if reader.get_mut().write_all(banner.as_bytes()).await.is_err() {
        return;
    }

    let mut logged_in = false;
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let line = line.trim_end();
        let mut parts = line.splitn(3, ' ');
        let reply = match (parts.next(), parts.next(), parts.next()) {
            (Some("LOGIN"), Some("admin"), Some(pass)) => {
                if behavior != MailboxBehavior::RejectLogin && pass == password {
                    logged_in = true;
                    "200 Admin login successful\n".to_string()
                } else {
                    "535 Authentication failed\n".to_string()
                }
            }
            (Some("SEND"), Some(_user), Some(body)) if logged_in => {
                let id = counter.fetch_add(1, Ordering::SeqCst);
                store.lock().unwrap().insert(id, body.to_string());
                format!("200 Sent (ID: {id})\n")
            }
            (Some("READ"), Some(id), None) if logged_in => {
                match id.parse::<u64>().ok().and_then(|id| store.lock().unwrap().get(&id).cloned()) {
                    Some(body) => format!("200 CONTENT:\n{body}\n.\n"),
                    None => "500 No such message\n".to_string(),
                }
            }
            _ => "500 Unknown Command\n".to_string(),
        };
        if reader.get_mut().write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Spawn a mock line-protocol mailbox target.
pub async fn spawn_mailbox_target(password: &str, behavior: MailboxBehavior) -> MailboxHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::new(Mutex::new(HashMap::new()));
    let counter = Arc::new(AtomicU64::new(1));
    let password = password.to_string();

    let conn_log = connections.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            conn_log.lock().unwrap().push(Instant::now());
            tokio::spawn(serve_mailbox_conn(
                stream,
                password.clone(),
                behavior,
                store.clone(),
                counter.clone(),
            ));
        }
    });

    MailboxHandle { addr, connections }
}

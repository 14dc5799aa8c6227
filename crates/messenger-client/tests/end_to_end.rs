use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde_json::json;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;

use messenger_api::sms::{BoxFuture, SmsError, SmsGateway};
use messenger_api::state::AppStateInner;
use messenger_client::auth::{self, LoginForm, SignupForm};
use messenger_client::compose::{self, MessageDraft};
use messenger_client::history;
use messenger_client::{
    ApiClient, AuthError, ClientError, MemoryStorage, ReloadNotifier, ResponseCache, SessionStore,
};
use messenger_db::Database;

#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<(String, String)>>,
}

impl SmsGateway for RecordingGateway {
    fn send_sms<'a>(&'a self, to: &'a str, body: &'a str) -> BoxFuture<'a, Result<String, SmsError>> {
        Box::pin(async move {
            let mut sent = self.sent.lock().unwrap();
            sent.push((to.to_string(), body.to_string()));
            Ok(format!("SM{}", sent.len()))
        })
    }
}

struct Harness {
    api: ApiClient,
    sessions: SessionStore,
    notifier: ReloadNotifier,
    gateway: Arc<RecordingGateway>,
}

async fn start() -> Harness {
    let gateway = Arc::new(RecordingGateway::default());
    let db = Database::open_in_memory().unwrap();
    let app = messenger_api::router(AppStateInner::new(db, gateway.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let storage = Arc::new(MemoryStorage::new());
    let cache = Arc::new(ResponseCache::new(storage.clone()));
    let notifier = ReloadNotifier::new();
    Harness {
        api: ApiClient::new(&format!("http://{}", addr), cache, notifier.clone()),
        sessions: SessionStore::new(storage),
        notifier,
        gateway,
    }
}

fn signup_form(username: &str, password: &str) -> SignupForm {
    SignupForm {
        username: username.into(),
        password: password.into(),
        confirm_password: password.into(),
    }
}

async fn expect_reload(rx: &mut broadcast::Receiver<()>) {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no reload within 5s")
        .unwrap();
}

#[tokio::test]
async fn signup_then_login() {
    let h = start().await;

    let session = auth::signup(&h.api, &h.sessions, &signup_form("Alice", "hunter22"))
        .await
        .unwrap();
    assert_eq!(session.username_hash, auth::hash_credentials("alice", "hunter22"));
    assert!(h.sessions.has());

    let again = auth::signup(&h.api, &h.sessions, &signup_form("alice", "hunter22")).await;
    assert!(matches!(again, Err(AuthError::AlreadyRegistered)));

    auth::logout(&h.sessions, h.api.cache()).unwrap();
    assert!(!h.sessions.has());

    let wrong = LoginForm {
        username: "alice".into(),
        password: "hunter23".into(),
    };
    let err = auth::login(&h.api, &h.sessions, &wrong).await.unwrap_err();
    assert!(matches!(err, AuthError::IncorrectCredentials));
    assert_eq!(err.to_string(), "Username or password is incorrect.");
    assert!(!h.sessions.has());

    let right = LoginForm {
        username: "ALICE".into(),
        password: "hunter22".into(),
    };
    let session = auth::login(&h.api, &h.sessions, &right).await.unwrap();
    assert_eq!(h.sessions.get(), Some(session));
}

#[tokio::test]
async fn compose_requires_a_session_and_valid_input() {
    let h = start().await;
    let draft = MessageDraft::new("5551234567", "hello");

    let err = compose::send_message(&h.api, &h.sessions, &h.notifier, &draft)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NoSession));

    auth::signup(&h.api, &h.sessions, &signup_form("bob", "secret1"))
        .await
        .unwrap();
    let bad = MessageDraft::new("12345", "hello");
    let err = compose::send_message(&h.api, &h.sessions, &h.notifier, &bad)
        .await
        .unwrap_err();
    match err {
        ClientError::Validation(errors) => assert!(errors.contains("phoneNumber")),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(h.gateway.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn history_refreshes_in_the_background() {
    let h = start().await;
    let session = auth::signup(&h.api, &h.sessions, &signup_form("bob", "secret1"))
        .await
        .unwrap();
    let mut rx = h.notifier.subscribe();

    let first = MessageDraft::new("5551234567", "first");
    compose::send_message(&h.api, &h.sessions, &h.notifier, &first)
        .await
        .unwrap();
    expect_reload(&mut rx).await;
    assert_eq!(
        h.gateway.sent.lock().unwrap().as_slice(),
        [("5551234567".to_string(), "first".to_string())]
    );

    let messages = history::load_history(&h.api, &h.sessions).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].username_hash, session.username_hash);

    let second = MessageDraft::new("5551234567", "second");
    compose::send_message(&h.api, &h.sessions, &h.notifier, &second)
        .await
        .unwrap();
    expect_reload(&mut rx).await;

    // Cached answer first, then the refetch notices the new message.
    let stale = history::load_history(&h.api, &h.sessions).await.unwrap();
    assert_eq!(stale.len(), 1);
    expect_reload(&mut rx).await;

    let fresh = history::load_history(&h.api, &h.sessions).await.unwrap();
    let mut contents: Vec<_> = fresh.iter().map(|m| m.content.as_str()).collect();
    contents.sort();
    assert_eq!(contents, ["first", "second"]);

    // Nothing changed since, so this refetch stays quiet.
    assert!(timeout(Duration::from_millis(300), rx.recv()).await.is_err());
}

#[tokio::test]
async fn delete_account_removes_user_and_messages() {
    let h = start().await;
    let bob = auth::signup(&h.api, &h.sessions, &signup_form("bob", "secret1"))
        .await
        .unwrap();
    compose::send_message(
        &h.api,
        &h.sessions,
        &h.notifier,
        &MessageDraft::new("5551234567", "bye"),
    )
    .await
    .unwrap();
    history::load_history(&h.api, &h.sessions).await.unwrap();
    assert!(!h.api.cache().is_empty());

    auth::delete_account(&h.api, &h.sessions).await.unwrap();
    assert!(!h.sessions.has());
    assert!(h.api.cache().is_empty());

    assert!(h.api.read_users().await.unwrap().is_empty());
    assert!(h.api.read_messages().await.unwrap().is_empty());
    assert!(h.api.read_user(&bob.username_hash).await.unwrap_err().is_not_found());
}

#[derive(Default)]
struct Hits {
    flaky: AtomicUsize,
    down: AtomicUsize,
    missing: AtomicUsize,
}

/// A server whose `/readMessages` fails twice before answering, whose
/// `/readUsers` always fails and whose `/readUser/{hash}` is always 404.
async fn unreliable_server() -> (String, Arc<Hits>) {
    async fn flaky(State(hits): State<Arc<Hits>>) -> (StatusCode, Json<serde_json::Value>) {
        if hits.flaky.fetch_add(1, Ordering::SeqCst) < 2 {
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "busy" })))
        } else {
            (StatusCode::OK, Json(json!([])))
        }
    }

    async fn down(State(hits): State<Arc<Hits>>) -> (StatusCode, Json<serde_json::Value>) {
        hits.down.fetch_add(1, Ordering::SeqCst);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Internal server error" })))
    }

    async fn missing(State(hits): State<Arc<Hits>>) -> (StatusCode, Json<serde_json::Value>) {
        hits.missing.fetch_add(1, Ordering::SeqCst);
        (StatusCode::NOT_FOUND, Json(json!({ "error": "User not found" })))
    }

    let hits = Arc::new(Hits::default());
    let app = Router::new()
        .route("/readMessages", get(flaky))
        .route("/readUsers", get(down))
        .route("/readUser/{username_hash}", get(missing))
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), hits)
}

fn client_for(base_url: &str) -> ApiClient {
    let storage = Arc::new(MemoryStorage::new());
    ApiClient::new(base_url, Arc::new(ResponseCache::new(storage)), ReloadNotifier::new())
}

#[tokio::test]
async fn server_errors_are_retried_twice() {
    let (base, hits) = unreliable_server().await;
    let api = client_for(&base);

    let messages = api.read_messages().await.unwrap();
    assert!(messages.is_empty());
    assert_eq!(hits.flaky.load(Ordering::SeqCst), 3);

    let err = api.read_users().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(hits.down.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let (base, hits) = unreliable_server().await;
    let api = client_for(&base);

    let err = api.read_user("nobody").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(hits.missing.load(Ordering::SeqCst), 1);
}

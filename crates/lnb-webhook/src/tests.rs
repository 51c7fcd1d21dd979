use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;

use lnb_core::{
    domain::{ChatId, Subscription, UserId},
    messaging::port::MessagingPort,
    store::SubscriptionStore,
    Error, Result,
};

use super::*;

const KEY: &str = "test-key";

struct FakeStore {
    chats: Vec<i64>,
    fail_list: bool,
    list_calls: AtomicUsize,
}

impl FakeStore {
    fn with_chats(chats: &[i64]) -> Self {
        Self {
            chats: chats.to_vec(),
            fail_list: false,
            list_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SubscriptionStore for FakeStore {
    async fn add_or_replace(&self, _: ChatId, _: &str, _: UserId) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, _: ChatId) -> Result<()> {
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Subscription>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(Error::Store(sqlx::Error::PoolClosed));
        }
        Ok(self
            .chats
            .iter()
            .enumerate()
            .map(|(i, chat_id)| Subscription {
                id: i as i64 + 1,
                chat_id: *chat_id,
                title: format!("group {i}"),
                added_by: 1,
                created_at: Utc::now(),
            })
            .collect())
    }

    async fn is_subscribed(&self, chat_id: ChatId) -> Result<bool> {
        Ok(self.chats.contains(&chat_id.0))
    }
}

#[derive(Default)]
struct FakeMessenger {
    failing: Vec<i64>,
    delay: Duration,
    sends: Mutex<Vec<(i64, String)>>,
}

impl FakeMessenger {
    fn delivered(&self) -> Vec<i64> {
        self.sends.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.sends
            .lock()
            .unwrap()
            .push((chat_id.0, html.to_string()));
        if self.failing.contains(&chat_id.0) {
            return Err(Error::Transport("Forbidden: bot was kicked".into()));
        }
        Ok(())
    }

    async fn chat_administrators(&self, _: ChatId) -> Result<Vec<UserId>> {
        Ok(vec![])
    }
}

fn app(store: Arc<FakeStore>, messenger: Arc<FakeMessenger>) -> Router {
    app_with_timeout(store, messenger, Duration::from_secs(5))
}

fn app_with_timeout(
    store: Arc<FakeStore>,
    messenger: Arc<FakeMessenger>,
    request_timeout: Duration,
) -> Router {
    let broadcaster = Arc::new(Broadcaster::new(store, messenger));
    router(AppState::new(KEY, broadcaster), request_timeout)
}

fn post_json(uri: &str, key: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = key {
        req = req.header("X-API-Key", key);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_needs_no_key() {
    let app = app(
        Arc::new(FakeStore::with_chats(&[])),
        Arc::new(FakeMessenger::default()),
    );

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "OK");
}

#[tokio::test]
async fn rejects_missing_or_wrong_key_without_touching_store() {
    let store = Arc::new(FakeStore::with_chats(&[-1]));
    let messenger = Arc::new(FakeMessenger::default());
    let body = serde_json::json!({"service": "api", "error": "boom", "createdAt": "2024-01-02T03:04:05Z"});

    for key in [None, Some("nope"), Some("")] {
        let resp = app(store.clone(), messenger.clone())
            .oneshot(post_json("/webhook/server-error", key, body.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(store.list_calls.load(Ordering::SeqCst), 0);
    assert!(messenger.sends.lock().unwrap().is_empty());
}

#[tokio::test]
async fn user_registered_reaches_every_group() {
    let store = Arc::new(FakeStore::with_chats(&[-100, -200]));
    let messenger = Arc::new(FakeMessenger::default());

    let resp = app(store, messenger.clone())
        .oneshot(post_json(
            "/webhook/user-registered",
            Some(KEY),
            serde_json::json!({
                "email": "a@b.com",
                "createdAt": "2024-01-02T03:04:05Z",
                "metadata": {"country": "RU"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "OK");

    let sends = messenger.sends.lock().unwrap();
    assert_eq!(sends.len(), 2);
    let chats: Vec<i64> = sends.iter().map(|(c, _)| *c).collect();
    assert_eq!(chats, vec![-100, -200]);
    for (_, text) in sends.iter() {
        assert!(text.contains("a@b.com"));
        assert!(text.contains("02.01.2024 03:04:05"));
        assert!(text.lines().any(|l| l.contains("RU")));
    }
}

#[tokio::test]
async fn malformed_body_is_400_and_not_broadcast() {
    let store = Arc::new(FakeStore::with_chats(&[-1]));
    let messenger = Arc::new(FakeMessenger::default());

    let bad_bodies = [
        serde_json::json!({"userEmail": "u@x.io"}),
        serde_json::json!({"userEmail": "u@x.io", "message": "hi", "createdAt": "yesterday"}),
        serde_json::json!(["not", "an", "object"]),
    ];
    for body in bad_bodies {
        let resp = app(store.clone(), messenger.clone())
            .oneshot(post_json("/webhook/support-message", Some(KEY), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let resp = app(store.clone(), messenger.clone())
        .oneshot(
            Request::post("/webhook/support-message")
                .header("X-API-Key", KEY)
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(store.list_calls.load(Ordering::SeqCst), 0);
    assert!(messenger.sends.lock().unwrap().is_empty());
}

#[tokio::test]
async fn list_failure_is_500() {
    let store = Arc::new(FakeStore {
        fail_list: true,
        ..FakeStore::with_chats(&[-1])
    });
    let messenger = Arc::new(FakeMessenger::default());

    let resp = app(store, messenger.clone())
        .oneshot(post_json(
            "/webhook/support-message",
            Some(KEY),
            serde_json::json!({"userEmail": "u@x.io", "message": "hi", "createdAt": "2024-01-02T03:04:05Z"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(messenger.sends.lock().unwrap().is_empty());
}

#[tokio::test]
async fn partial_delivery_is_still_ok() {
    let store = Arc::new(FakeStore::with_chats(&[-1, -2, -3]));
    let messenger = Arc::new(FakeMessenger {
        failing: vec![-2],
        ..Default::default()
    });

    let resp = app(store, messenger.clone())
        .oneshot(post_json(
            "/webhook/server-error",
            Some(KEY),
            serde_json::json!({
                "service": "billing",
                "error": "x".repeat(600),
                "stack": "at main()",
                "createdAt": "2024-01-02T03:04:05Z"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let sends = messenger.sends.lock().unwrap();
    assert_eq!(sends.len(), 3);
    let text = &sends[0].1;
    assert!(text.contains(&format!("<pre>{}...</pre>", "x".repeat(500))));
    assert!(!text.contains(&"x".repeat(501)));
    assert!(text.contains("at main()"));
}

#[tokio::test]
async fn null_metadata_is_accepted() {
    let store = Arc::new(FakeStore::with_chats(&[-1]));
    let messenger = Arc::new(FakeMessenger::default());

    let resp = app(store, messenger.clone())
        .oneshot(post_json(
            "/webhook/user-registered",
            Some(KEY),
            serde_json::json!({
                "email": "a@b.com",
                "createdAt": "2024-01-02T03:04:05Z",
                "metadata": null
            }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let sends = messenger.sends.lock().unwrap();
    assert_eq!(sends.len(), 1);
    assert!(sends[0].1.contains("a@b.com"));
}

#[tokio::test]
async fn request_timeout_does_not_cut_broadcast_short() {
    let store = Arc::new(FakeStore::with_chats(&[-1, -2, -3, -4, -5]));
    let messenger = Arc::new(FakeMessenger {
        delay: Duration::from_millis(200),
        ..Default::default()
    });

    let resp = app_with_timeout(store, messenger.clone(), Duration::from_millis(500))
        .oneshot(post_json(
            "/webhook/server-error",
            Some(KEY),
            serde_json::json!({"service": "api", "error": "boom", "createdAt": "2024-01-02T03:04:05Z"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
    assert!(messenger.delivered().len() < 5);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while messenger.delivered().len() < 5 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(messenger.delivered(), vec![-1, -2, -3, -4, -5]);
}

#[tokio::test]
async fn exited_reports_server_failure() {
    let (shutdown_tx, _shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(async { Err(std::io::Error::other("listener lost")) });
    let mut server = WebhookServer { shutdown_tx, task };

    let err = tokio::time::timeout(Duration::from_secs(1), server.exited())
        .await
        .unwrap();
    assert!(format!("{err:#}").contains("listener lost"));
}

#[tokio::test]
async fn running_server_stays_up_until_stopped() {
    let app = app(
        Arc::new(FakeStore::with_chats(&[])),
        Arc::new(FakeMessenger::default()),
    );
    let mut server = start_server("127.0.0.1:0", app).await.unwrap();

    let still_running = tokio::time::timeout(Duration::from_millis(100), server.exited()).await;
    assert!(still_running.is_err());

    tokio::time::timeout(Duration::from_secs(2), server.stop())
        .await
        .unwrap();
}

//! End-to-end flows against an in-process backend: optimistic likes,
//! rollback, feed pagination, and 401 teardown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use chatter_api::client::ApiConfig;
use chatter_sync::key::post_keys;
use chatter_sync::{Chatter, PendingFlag};
use chatter_types::models::Post;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn spawn_backend(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Both base URLs point at the same mock; the tests here only exercise
/// one service at a time.
fn chatter_for(addr: SocketAddr, name: &str) -> Chatter {
    let base = format!("http://{}", addr);
    let config = ApiConfig {
        auth_base_url: base.clone(),
        social_base_url: base,
        session_path: std::env::temp_dir().join("chatter_sync_test").join(name),
    };
    let chatter = Chatter::new(config).unwrap();
    chatter.session().set_auth("valid-token".into(), None, None);
    chatter
}

fn envelope(data: serde_json::Value) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": data }))
}

fn post_json(id: Uuid, like_count: u64, is_liked: bool) -> serde_json::Value {
    let now = Utc::now().to_rfc3339();
    json!({
        "id": id,
        "userId": Uuid::new_v4(),
        "content": "hello world",
        "createdAt": now,
        "updatedAt": now,
        "likeCount": like_count,
        "commentCount": 0,
        "isLiked": is_liked,
    })
}

/// Mock post store: one post whose like state lives in atomics so the
/// handlers can mutate it.
#[derive(Clone)]
struct LikeBackend {
    post_id: Uuid,
    likes: Arc<AtomicUsize>,
    liked: Arc<AtomicUsize>,
    like_calls: Arc<AtomicUsize>,
    fail_likes: bool,
    like_delay: Duration,
}

impl LikeBackend {
    fn new(likes: usize, liked: bool) -> Self {
        Self {
            post_id: Uuid::new_v4(),
            likes: Arc::new(AtomicUsize::new(likes)),
            liked: Arc::new(AtomicUsize::new(liked as usize)),
            like_calls: Arc::new(AtomicUsize::new(0)),
            fail_likes: false,
            like_delay: Duration::ZERO,
        }
    }

    fn failing(mut self) -> Self {
        self.fail_likes = true;
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.like_delay = delay;
        self
    }

    fn router(&self) -> Router {
        async fn get_post(State(b): State<LikeBackend>) -> Json<serde_json::Value> {
            envelope(post_json(
                b.post_id,
                b.likes.load(Ordering::SeqCst) as u64,
                b.liked.load(Ordering::SeqCst) != 0,
            ))
        }

        async fn like(State(b): State<LikeBackend>) -> Result<Json<serde_json::Value>, StatusCode> {
            b.like_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(b.like_delay).await;
            if b.fail_likes {
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
            b.likes.fetch_add(1, Ordering::SeqCst);
            b.liked.store(1, Ordering::SeqCst);
            Ok(envelope(json!({
                "id": Uuid::new_v4(),
                "postId": b.post_id,
                "userId": Uuid::new_v4(),
                "createdAt": Utc::now().to_rfc3339(),
            })))
        }

        async fn unlike(State(b): State<LikeBackend>) -> Result<StatusCode, StatusCode> {
            b.like_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(b.like_delay).await;
            if b.fail_likes {
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
            if b.liked.swap(0, Ordering::SeqCst) != 0 {
                b.likes.fetch_sub(1, Ordering::SeqCst);
            }
            Ok(StatusCode::NO_CONTENT)
        }

        Router::new()
            .route("/posts/{id}", get(get_post))
            .route("/likes", post(like))
            .route("/posts/{id}/likes", delete(unlike))
            .with_state(self.clone())
    }
}

#[tokio::test]
async fn optimistic_like_patches_cache_then_settles_on_server_truth() {
    init_logging();
    let backend = LikeBackend::new(5, false);
    let post_id = backend.post_id;
    let addr = spawn_backend(backend.router()).await;
    let chatter = chatter_for(addr, "optimistic.json");

    let before = chatter.post(post_id).await.unwrap();
    assert_eq!(before.like_count, 5);
    assert!(!before.is_liked);

    chatter.like_post(post_id).await.unwrap();

    // Cached copy was patched in place.
    let cached: Post = chatter.cache().get(&post_keys::detail(post_id)).unwrap();
    assert_eq!(cached.like_count, 6);
    assert!(cached.is_liked);

    // The entry was invalidated, so the next read refetches and agrees
    // with the server.
    let after = chatter.post(post_id).await.unwrap();
    assert_eq!(after.like_count, 6);
    assert!(after.is_liked);
}

#[tokio::test]
async fn failed_like_rolls_the_cache_back() {
    init_logging();
    let backend = LikeBackend::new(5, false).failing();
    let post_id = backend.post_id;
    let addr = spawn_backend(backend.router()).await;
    let chatter = chatter_for(addr, "rollback.json");

    chatter.post(post_id).await.unwrap();
    chatter.like_post(post_id).await.unwrap_err();

    let cached: Post = chatter.cache().get(&post_keys::detail(post_id)).unwrap();
    assert_eq!(cached.like_count, 5);
    assert!(!cached.is_liked);
}

#[tokio::test]
async fn unlike_never_drives_the_count_negative() {
    init_logging();
    let backend = LikeBackend::new(0, true).failing();
    let post_id = backend.post_id;
    let addr = spawn_backend(backend.router()).await;
    let chatter = chatter_for(addr, "floor.json");

    chatter.post(post_id).await.unwrap();
    // Count is already zero; the optimistic decrement must saturate.
    chatter.unlike_post(post_id).await.unwrap_err();

    let cached: Post = chatter.cache().get(&post_keys::detail(post_id)).unwrap();
    assert_eq!(cached.like_count, 0);
}

#[tokio::test]
async fn pending_flag_drops_the_second_press() {
    init_logging();
    let backend = LikeBackend::new(5, false).slow(Duration::from_millis(100));
    let post_id = backend.post_id;
    let like_calls = backend.like_calls.clone();
    let addr = spawn_backend(backend.router()).await;
    let chatter = chatter_for(addr, "pending.json");

    chatter.post(post_id).await.unwrap();

    let pending = PendingFlag::new();
    let first = {
        let chatter = chatter.clone();
        let pending = pending.clone();
        tokio::spawn(async move { chatter.toggle_like(post_id, false, &pending).await })
    };
    // Give the first press time to claim the gate.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(pending.is_pending());

    chatter.toggle_like(post_id, false, &pending).await.unwrap();
    first.await.unwrap().unwrap();

    assert!(!pending.is_pending());
    assert_eq!(like_calls.load(Ordering::SeqCst), 1);

    let after = chatter.post(post_id).await.unwrap();
    assert_eq!(after.like_count, 6);
}

#[tokio::test]
async fn feed_paginates_and_stops_at_the_last_page() {
    init_logging();

    async fn feed_route(Query(q): Query<std::collections::HashMap<String, String>>) -> Json<serde_json::Value> {
        let page: u32 = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let items: Vec<serde_json::Value> =
            (0..2).map(|_| post_json(Uuid::new_v4(), 0, false)).collect();
        envelope(json!({
            "items": items,
            "total": 6,
            "page": page,
            "size": 2,
            "totalPages": 3,
        }))
    }

    let addr = spawn_backend(Router::new().route("/feed", get(feed_route))).await;
    let chatter = chatter_for(addr, "feed.json");

    let pages = chatter.feed().await.unwrap();
    assert_eq!(pages.len(), 1);
    assert!(chatter.feed_has_next());

    let pages = chatter.feed_next_page().await.unwrap();
    assert_eq!(pages.len(), 2);
    let pages = chatter.feed_next_page().await.unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages.last().unwrap().page, 3);
    assert!(!chatter.feed_has_next());

    // Requesting past the end keeps the loaded pages unchanged.
    let pages = chatter.feed_next_page().await.unwrap();
    assert_eq!(pages.len(), 3);
}

#[tokio::test]
async fn unauthorized_tears_down_the_session() {
    init_logging();
    let addr = spawn_backend(Router::new().route(
        "/posts/{id}",
        get(|Path(_): Path<Uuid>| async { StatusCode::UNAUTHORIZED }),
    ))
    .await;
    let chatter = chatter_for(addr, "teardown.json");
    assert!(chatter.session().is_authenticated());

    let err = chatter.post(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!chatter.session().is_authenticated());

    // No token means no further requests; the failure is local now.
    let err = chatter.current_user().await.unwrap_err();
    assert!(err.is_unauthorized());
}

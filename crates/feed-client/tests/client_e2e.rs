use feed_client::{ClientError, FeedClient, FeedSession, SessionStore};
use feed_server::core::{router, AppState, ServerConfig};
use tempfile::{tempdir, TempDir};

/// Start a server on an ephemeral port and return its base URL
async fn spawn_server() -> (TempDir, String) {
    let dir = tempdir().unwrap();
    let mut config = ServerConfig::with_base_dir(dir.path().join("server"), "e2e-secret");
    config.bcrypt_cost = 4;
    let state = AppState::init(config).await.unwrap();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (dir, format!("http://{}", addr))
}

#[tokio::test]
async fn test_session_register_post_like_comment_logout() {
    let (dir, base_url) = spawn_server().await;
    let store = SessionStore::new(dir.path().join("client").join("user.json"));

    let mut session = FeedSession::load(FeedClient::new(&base_url), store.clone()).await;
    assert!(session.user().is_none());

    assert!(session.register("alice", "alice@example.com", "pw123").await);
    let user = session.user().cloned().unwrap();
    assert_eq!(store.load().await, Some(user.clone()));

    let client = session.client().clone();
    let post = client
        .create_post(session.user(), Some("hello"), None)
        .await
        .unwrap();
    assert_eq!(post.username, "alice");

    let likes = client.toggle_like(session.user(), &post.id).await.unwrap();
    assert_eq!(likes.len(), 1);

    let comments = client
        .add_comment(session.user(), &post.id, "first!")
        .await
        .unwrap();
    assert_eq!(comments[0].text, "first!");

    let feed = client.list_posts().await.unwrap();
    assert_eq!(feed.len(), 1);
    assert!(feed[0].is_liked_by(&user.id));

    // A fresh session picks the identity back up from disk
    let restored = FeedSession::load(FeedClient::new(&base_url), store.clone()).await;
    assert_eq!(restored.user(), Some(&user));

    session.logout().await.unwrap();
    assert!(session.user().is_none());
    assert!(store.load().await.is_none());
}

#[tokio::test]
async fn test_failed_login_surfaces_server_message() {
    let (dir, base_url) = spawn_server().await;
    let store = SessionStore::new(dir.path().join("user.json"));
    let mut session = FeedSession::load(FeedClient::new(&base_url), store.clone()).await;

    assert!(!session.login("ghost@example.com", "nope").await);
    assert_eq!(session.state().error.as_deref(), Some("Invalid credentials"));
    assert!(!session.state().loading);
    assert!(store.load().await.is_none());
}

#[tokio::test]
async fn test_api_error_carries_status_and_message() {
    let (_dir, base_url) = spawn_server().await;
    let client = FeedClient::new(&base_url);
    let user = client
        .register("bob", "bob@example.com", "pw123")
        .await
        .unwrap();

    let err = client
        .create_post(Some(&user), Some(""), Some(""))
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "Please add text or an image");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

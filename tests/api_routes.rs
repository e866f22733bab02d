//! End-to-end HTTP tests: a real server on an ephemeral port, driven by a
//! plain HTTP client the way a browser client would be.

mod common;

use axum::Router;
use chatx::identity::Identity;
use chatx::routes::create_router;
use chatx::server::AppState;
use chatx::upload::ImageUploader;
use common::test_pool;
use pretty_assertions::assert_eq;
use tokio::sync::oneshot;

async fn start_server() -> (String, oneshot::Sender<()>) {
    let pool = test_pool().await;
    let state = AppState {
        store: chatx::store::DocumentStore::new(pool.clone()),
        identity: Identity::new(pool),
        uploader: ImageUploader::new("http://127.0.0.1:1/upload", ""),
        public_origin: "http://chatx.test".to_string(),
    };
    let app: Router = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("server addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });
    tokio::spawn(async move {
        let _ = server.await;
    });

    (format!("http://{}", addr), shutdown_tx)
}

async fn signup(client: &reqwest::Client, base: &str, username: &str) -> (String, String) {
    let response = client
        .post(format!("{base}/api/auth/signup"))
        .json(&serde_json::json!({
            "name": username,
            "email": format!("{username}@example.com"),
            "password": "hunter22",
            "username": username,
        }))
        .send()
        .await
        .expect("signup request");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("signup body");
    (
        body["token"].as_str().expect("token").to_string(),
        body["user"]["uid"].as_str().expect("uid").to_string(),
    )
}

#[tokio::test]
async fn test_signup_login_me_round_trip() {
    let (base, _shutdown) = start_server().await;
    let client = reqwest::Client::new();

    let (token, uid) = signup(&client, &base, "alice").await;

    let me: serde_json::Value = client
        .get(format!("{base}/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["uid"].as_str(), Some(uid.as_str()));
    assert_eq!(me["username"].as_str(), Some("alice"));

    let login = client
        .post(format!("{base}/api/auth/login"))
        .json(&serde_json::json!({
            "email": "alice@example.com",
            "password": "hunter22",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), 200);
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let (base, _shutdown) = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/api/chats"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .get(format!("{base}/api/chats"))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Health and availability stay public.
    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let response = client
        .get(format!("{base}/api/users/alice/available"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_direct_chat_over_http() {
    let (base, _shutdown) = start_server().await;
    let client = reqwest::Client::new();
    let (alice_token, _) = signup(&client, &base, "alice").await;
    let (bob_token, _) = signup(&client, &base, "bob").await;

    let chat: serde_json::Value = client
        .post(format!("{base}/api/chats"))
        .bearer_auth(&alice_token)
        .json(&serde_json::json!({ "username": "bob" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let chat_id = chat["id"].as_str().expect("chat id").to_string();

    let sent = client
        .post(format!("{base}/api/chats/{chat_id}/messages"))
        .bearer_auth(&alice_token)
        .json(&serde_json::json!({ "text": "hey bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(sent.status(), 200);

    let messages: serde_json::Value = client
        .get(format!("{base}/api/chats/{chat_id}/messages"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let messages = messages.as_array().expect("message list");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"].as_str(), Some("hey bob"));
    assert_eq!(messages[0]["senderUsername"].as_str(), Some("alice"));

    // A third account gets a 403 for someone else's conversation.
    let (carol_token, _) = signup(&client, &base, "carol").await;
    let response = client
        .get(format!("{base}/api/chats/{chat_id}/messages"))
        .bearer_auth(&carol_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_group_and_invite_over_http() {
    let (base, _shutdown) = start_server().await;
    let client = reqwest::Client::new();
    let (alice_token, _) = signup(&client, &base, "alice").await;
    let (bob_token, bob_uid) = signup(&client, &base, "bob").await;

    let group: serde_json::Value = client
        .post(format!("{base}/api/groups"))
        .bearer_auth(&alice_token)
        .json(&serde_json::json!({ "name": "Team", "description": "the team" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let group_id = group["id"].as_str().expect("group id").to_string();

    let invite: serde_json::Value = client
        .post(format!("{base}/api/groups/{group_id}/invite"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = invite["code"].as_str().expect("invite code").to_string();
    assert_eq!(
        invite["url"].as_str(),
        Some(format!("http://chatx.test/invite/{code}").as_str())
    );

    // The preview is public; joining needs a session.
    let preview: serde_json::Value = client
        .get(format!("{base}/api/invite/{code}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(preview["name"].as_str(), Some("Team"));
    assert_eq!(preview["memberCount"].as_i64(), Some(1));

    let response = client
        .post(format!("{base}/api/invite/{code}/join"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let joined: serde_json::Value = client
        .post(format!("{base}/api/invite/{code}/join"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(joined["groupId"].as_str(), Some(group_id.as_str()));

    let group: serde_json::Value = client
        .get(format!("{base}/api/groups/{group_id}"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let members = group["members"].as_array().expect("members");
    assert!(members.iter().any(|m| m.as_str() == Some(bob_uid.as_str())));
}

#[tokio::test]
async fn test_error_bodies_carry_status_and_message() {
    let (base, _shutdown) = start_server().await;
    let client = reqwest::Client::new();
    let (token, _) = signup(&client, &base, "alice").await;

    let response = client
        .post(format!("{base}/api/chats"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "username": "nobody" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"].as_i64(), Some(404));
    assert!(body["error"].as_str().is_some());
}

use second_brain::{AppConfig, AppState, InMemoryRepository, RepositoryState, create_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    async fn signup(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/signup"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("req fail")
    }

    async fn signin(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/signin"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("req fail")
    }

    /// Signs up and in, returning the token.
    async fn login(&self, username: &str) -> String {
        self.signup(username, "secret1").await;
        let body: Value = self.signin(username, "secret1").await.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }
}

async fn spawn_app_with(config: AppConfig) -> TestApp {
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let router = create_router(AppState::new(repo, config));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(AppConfig {
        bcrypt_cost: 4,
        ..AppConfig::default()
    })
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_account_and_content_lifecycle() {
    let app = spawn_app().await;

    // 1. Signup
    let response = app.signup("alice123", "secret1").await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User created successfully");

    // 2. Wrong password
    let response = app.signin("alice123", "wrong").await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Invalid username or password" }));

    // 3. Signin
    let response = app.signin("alice123", "secret1").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    // 4. Add content with the raw token in `authorization`
    let response = app
        .client
        .post(app.url("/content"))
        .header("authorization", &token)
        .json(&json!({ "link": "http://x", "type": "article" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Content added");

    // 5. List
    let response = app
        .client
        .get(app.url("/content"))
        .header("authorization", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let items = body["content"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["link"], "http://x");
    assert_eq!(items[0]["type"], "article");
    assert_eq!(items[0]["userId"]["username"], "alice123");
    assert_eq!(items[0]["tags"], json!([]));

    // 6. Delete
    let content_id = items[0]["id"].as_str().unwrap().to_string();
    let response = app
        .client
        .delete(app.url("/content"))
        .header("authorization", &token)
        .json(&json!({ "contentId": content_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Deleted content");

    let body: Value = app
        .client
        .get(app.url("/content"))
        .header("authorization", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["content"], json!([]));
}

#[tokio::test]
async fn test_bearer_prefix_is_accepted() {
    let app = spawn_app().await;
    let token = app.login("bob_456").await;

    let response = app
        .client
        .get(app.url("/content"))
        .header("authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_share_flow() {
    let app = spawn_app().await;
    let token = app.login("alice123").await;

    app.client
        .post(app.url("/content"))
        .header("authorization", &token)
        .json(&json!({ "title": "Talk", "link": "http://video", "type": "video" }))
        .send()
        .await
        .unwrap();

    // Enable sharing twice: same hash both times.
    let share = |enabled: bool| {
        app.client
            .post(app.url("/brain/share"))
            .header("authorization", &token)
            .json(&json!({ "share": enabled }))
            .send()
    };
    let first: Value = share(true).await.unwrap().json().await.unwrap();
    let second: Value = share(true).await.unwrap().json().await.unwrap();
    let hash = first["hash"].as_str().unwrap().to_string();
    assert_eq!(first, second);
    assert_eq!(hash.len(), 10);

    // Anyone can read the shared collection.
    let response = app
        .client
        .get(app.url(&format!("/brain/{hash}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice123");
    assert_eq!(body["content"][0]["title"], "Talk");

    // Revoke, then the hash no longer resolves.
    let revoked: Value = share(false).await.unwrap().json().await.unwrap();
    assert_eq!(revoked, json!({ "message": "Removed link" }));

    let response = app
        .client
        .get(app.url(&format!("/brain/{hash}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Share link not found" }));
}

#[tokio::test]
async fn test_legacy_status_for_unknown_share() {
    let app = spawn_app_with(AppConfig {
        bcrypt_cost: 4,
        legacy_status_codes: true,
        ..AppConfig::default()
    })
    .await;

    let response = app
        .client
        .get(app.url("/brain/doesnotexist"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 411);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Sorry incorrect input" }));
}

#[tokio::test]
async fn test_content_routes_require_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/content"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .client
        .post(app.url("/brain/share"))
        .header("authorization", "not-a-token")
        .json(&json!({ "share": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

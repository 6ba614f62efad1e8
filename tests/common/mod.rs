// tests/common/mod.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use mastery::{
    config::{Config, S3Config},
    media::MediaStore,
    models::user::NewUser,
    routes,
    state::AppState,
    store::{MemoryStore, RecordStore},
    utils::hash::hash_password,
};

/// Signs by prefixing a fake host so tests can assert on resolved URLs.
pub struct FakeMedia;

#[async_trait]
impl MediaStore for FakeMedia {
    async fn create_signed_url(&self, bucket: &str, path: &str, _ttl: Duration) -> Option<String> {
        Some(format!("https://media.test/{}/{}?sig=1", bucket, path))
    }
}

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        s3: S3Config::default(),
        media_bucket: "media".to_string(),
        signed_url_ttl: Duration::from_secs(60),
        seed_instructor_username: None,
        seed_instructor_password: None,
    }
}

/// Spawns the app on a random port backed by an in-memory store.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        media: Arc::new(FakeMedia),
        config: test_config(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let resp: serde_json::Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");
        resp["token"].as_str().expect("Token not found").to_string()
    }

    /// Instructors are provisioned directly in the store, as the seed does at boot.
    pub async fn instructor_token(&self) -> String {
        let username = unique_name("ins");
        self.store
            .insert_user(NewUser {
                username: username.clone(),
                password_hash: hash_password("password123").unwrap(),
                role: "instructor".to_string(),
            })
            .await
            .unwrap();
        self.login(&username, "password123").await
    }

    pub async fn student_token(&self) -> String {
        let username = unique_name("stu");
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({ "username": username, "password": "password123" }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(resp.status().as_u16(), 201);
        self.login(&username, "password123").await
    }
}

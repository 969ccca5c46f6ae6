#![allow(dead_code)]

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use blu_api::auth::{generate_jwt, Claims, Role};
use blu_api::config::AppConfig;
use blu_api::database::{schema::ensure_schema, DatabaseManager};
use blu_api::state::AppState;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub config: Arc<AppConfig>,
}

impl TestServer {
    /// Runs the app on its own thread and runtime so every test (each with its
    /// own tokio runtime) can share one server.
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::from_env();
        config.server.port = port;
        config.server.uploads_dir = std::env::temp_dir()
            .join(format!("blu-api-test-uploads-{}", port))
            .to_string_lossy()
            .into_owned();
        config.api.enable_request_logging = false;
        let config = Arc::new(config);

        let server_config = config.clone();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("test runtime");
            runtime.block_on(async move {
                let db = DatabaseManager::connect_lazy(&server_config).expect("lazy pool");
                if has_database() {
                    ensure_schema(&db).await.expect("schema");
                }
                let state = AppState::new(db, server_config.clone()).expect("app state");
                let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
                    .await
                    .expect("bind test port");
                axum::serve(listener, blu_api::app(state)).await.expect("server");
            });
        });

        Ok(Self { port, base_url, config })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A token signed with the server's secret for a principal that need not exist.
    pub fn token_for(&self, role: Role) -> Result<String> {
        let claims = Claims::new("test-user", "test@blu.app", role, "test-org", 1);
        Ok(generate_jwt(&claims, &self.config.security)?)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to start test server"));
    server.wait_ready(Duration::from_secs(30)).await?;
    Ok(server)
}

/// Tests that need PostgreSQL return early when this is false.
pub fn has_database() -> bool {
    std::env::var("DATABASE_URL").map(|v| !v.trim().is_empty()).unwrap_or(false)
}

pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Registers a fresh organization and returns its bearer token and user.
pub async fn register(server: &TestServer, client: &reqwest::Client) -> Result<(String, Value)> {
    let email = format!("{}@blu.test", unique("owner"));
    let res = client
        .post(server.url("/api/auth/register"))
        .json(&json!({
            "email": email,
            "password": "secret123",
            "name": "Test Owner",
            "organizationName": unique("org"),
        }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

    let body: Value = res.json().await?;
    let token = body["data"]["token"].as_str().context("token missing")?.to_string();
    Ok((token, body["data"]["user"].clone()))
}

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const ADMIN_USERNAME: &str = "admin-tests";
pub const ADMIN_PASSWORD: &str = "admin-tests-password";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/monster-catalog-api");
        cmd.env("CATALOG_API_PORT", port.to_string())
            .env("JWT_SECRET", "integration-test-secret-long-enough-for-hmac")
            .env("CATALOG_ADMIN_USERNAME", ADMIN_USERNAME)
            .env("CATALOG_ADMIN_PASSWORD", ADMIN_PASSWORD)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL from .env
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
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
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Per-run unique suffix so reruns never trip the duplicate checks
pub fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

/// Log in as the bootstrapped admin and return its access token
pub async fn admin_access_token(base_url: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/login", base_url))
        .json(&serde_json::json!({
            "username": ADMIN_USERNAME,
            "email": format!("{}@localhost.local", ADMIN_USERNAME),
            "password": ADMIN_PASSWORD,
        }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "admin login failed: {}", res.status());
    let body = res.json::<serde_json::Value>().await?;
    let token = body["access"].as_str().context("missing access token")?.to_string();
    Ok(token)
}

/// Register a throwaway non-staff user and return its access token
pub async fn member_access_token(base_url: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let username = unique("member");
    let res = client
        .post(format!("{}/register", base_url))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "member-password-123",
        }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
    let body = res.json::<serde_json::Value>().await?;
    let token = body["access"].as_str().context("missing access token")?.to_string();
    Ok(token)
}

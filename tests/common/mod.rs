#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tempfile::TempDir;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "test-password";
pub const UPLOAD_MAX_BYTES: usize = 4096;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub data_dir: TempDir,
    pub upload_dir: TempDir,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let data_dir = tempfile::tempdir().context("failed to create data dir")?;
        let upload_dir = tempfile::tempdir().context("failed to create upload dir")?;

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_clubsite-api"));
        cmd.env("CLUBSITE_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("CLUBSITE_DATA_DIR", data_dir.path())
            .env("CLUBSITE_UPLOAD_DIR", upload_dir.path())
            .env("UPLOAD_MAX_BYTES", UPLOAD_MAX_BYTES.to_string())
            .env("LOCAL_ADMIN_TOKEN", ADMIN_TOKEN)
            .env("ADMIN_USERNAME", ADMIN_USERNAME)
            .env("ADMIN_PASSWORD", ADMIN_PASSWORD)
            .env("SESSION_SECRET", "test-session-secret")
            .env("RUST_LOG", "clubsite_api=warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            data_dir,
            upload_dir,
            child,
        })
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

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Client that keeps the session cookie between requests
pub fn session_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().cookie_store(true).build()?)
}

/// Session client already logged in as the configured admin
pub async fn admin_client(server: &TestServer) -> Result<reqwest::Client> {
    let client = session_client()?;
    let res = client
        .post(server.url("/api/login"))
        .json(&serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "admin login failed: {}", res.status());
    Ok(client)
}

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use configs::{AppConfig, LoadPolicy};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

struct TestServer {
    base_url: String,
    stop: oneshot::Sender<()>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    /// Trigger graceful shutdown and wait for the final flush.
    async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.stop.send(());
        self.task.await??;
        Ok(())
    }
}

fn config_for(root: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.storage.users_file = root.join("data").join("users.json");
    cfg.storage.load_policy = LoadPolicy::FailClosed;
    cfg.frontend.dir = root.join("frontend");
    cfg
}

async fn start_server(cfg: AppConfig) -> anyhow::Result<TestServer> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        server::startup::serve(listener, &cfg, async move {
            let _ = stopped.await;
        })
        .await
    });

    Ok(TestServer { base_url, stop, task })
}

/// Poll health until the spawned server accepts connections.
async fn wait_ready(c: &reqwest::Client, base_url: &str) -> anyhow::Result<()> {
    for _ in 0..50 {
        if let Ok(res) = c.get(format!("{base_url}/api/health")).send().await {
            if res.status() == HttpStatusCode::OK {
                return Ok(());
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    Err(anyhow::anyhow!("server at {base_url} never became ready"))
}

fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!("e2e_{}", Uuid::new_v4()))
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let root = temp_root();
    let app = start_server(config_for(&root)).await?;
    let c = reqwest::Client::new();
    wait_ready(&c, &app.base_url).await?;

    let res = c.get(format!("{}/api/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");

    app.shutdown().await?;
    let _ = tokio::fs::remove_dir_all(&root).await;
    Ok(())
}

#[tokio::test]
async fn e2e_registration_survives_restart() -> anyhow::Result<()> {
    let root = temp_root();
    let c = reqwest::Client::new();

    let app = start_server(config_for(&root)).await?;
    wait_ready(&c, &app.base_url).await?;
    let res = c
        .post(format!("{}/api/register", app.base_url))
        .json(&json!({"name": "Eve", "email": "Eve@Example.com", "password": "pw-eve"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    app.shutdown().await?;

    // Fresh process state: the store is rebuilt from the backing file.
    let app = start_server(config_for(&root)).await?;
    wait_ready(&c, &app.base_url).await?;

    let res = c
        .post(format!("{}/api/login", app.base_url))
        .json(&json!({"email": "eve@example.com", "password": "pw-eve"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["user"], json!({"name": "Eve", "email": "eve@example.com"}));

    let res = c
        .post(format!("{}/api/register", app.base_url))
        .json(&json!({"name": "Eve2", "email": "EVE@example.com", "password": "x"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CONFLICT);

    app.shutdown().await?;
    let _ = tokio::fs::remove_dir_all(&root).await;
    Ok(())
}

#[tokio::test]
async fn e2e_corrupt_store_fails_closed_startup() -> anyhow::Result<()> {
    let root = temp_root();
    let cfg = config_for(&root);
    tokio::fs::create_dir_all(root.join("data")).await?;
    tokio::fs::write(&cfg.storage.users_file, b"garbage").await?;

    let app = start_server(cfg).await?;
    let res = app.task.await?;
    assert!(res.is_err(), "startup must fail on an unreadable users file");

    let _ = tokio::fs::remove_dir_all(&root).await;
    Ok(())
}

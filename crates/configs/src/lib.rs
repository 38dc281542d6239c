use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Mount `GET /api/_debug/users`. Lists every account without auth.
    #[serde(default = "default_true")]
    pub expose_debug_routes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            worker_threads: Some(4),
            expose_debug_routes: true,
        }
    }
}

/// What to do when the backing file exists but cannot be read or parsed.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Log the failure and start with an empty store.
    #[default]
    FailOpen,
    /// Abort startup.
    FailClosed,
}

impl LoadPolicy {
    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_open" => Ok(LoadPolicy::FailOpen),
            "fail_closed" => Ok(LoadPolicy::FailClosed),
            other => Err(anyhow!("unknown storage.load_policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,
    #[serde(default)]
    pub load_policy: LoadPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { users_file: default_users_file(), load_policy: LoadPolicy::default() }
    }
}

impl StorageConfig {
    /// Directory holding the backing file (empty when the file is relative with no parent).
    pub fn data_dir(&self) -> &Path {
        self.users_file.parent().unwrap_or_else(|| Path::new(""))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    #[serde(default = "default_frontend_dir")]
    pub dir: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self { dir: default_frontend_dir() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 4000 }
fn default_true() -> bool { true }
fn default_users_file() -> PathBuf { PathBuf::from("data/users.json") }
fn default_frontend_dir() -> PathBuf { PathBuf::from("frontend") }
fn default_log_format() -> String { "compact".into() }

/// Load `CONFIG_PATH` (default `config.toml`); a missing file yields defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// File, then process environment, then normalization.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        let vars: HashMap<String, String> = std::env::vars().collect();
        cfg.apply_env(|k| vars.get(k).cloned())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Apply environment overrides through a lookup function.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        // PORT takes precedence over SERVER_PORT.
        if let Some(port) = lookup("PORT").or_else(|| lookup("SERVER_PORT")) {
            self.server.port = port
                .trim()
                .parse::<u16>()
                .map_err(|e| anyhow!("invalid port {port:?}: {e}"))?;
        }
        if let Some(threads) = lookup("TOKIO_WORKER_THREADS") {
            self.server.worker_threads = Some(
                threads
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| anyhow!("invalid TOKIO_WORKER_THREADS {threads:?}: {e}"))?,
            );
        }
        if let Some(file) = lookup("USERS_FILE") {
            self.storage.users_file = PathBuf::from(file);
        }
        if let Some(policy) = lookup("USERS_LOAD_POLICY") {
            self.storage.load_policy = LoadPolicy::parse(&policy)?;
        }
        if let Some(dir) = lookup("FRONTEND_DIR") {
            self.frontend.dir = PathBuf::from(dir);
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        if self.storage.users_file.as_os_str().is_empty() {
            return Err(anyhow!("storage.users_file must not be empty"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

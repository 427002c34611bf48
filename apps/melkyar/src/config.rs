//! Configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/melkyar/melkyar.toml`
//! - Windows: `%APPDATA%/melkyar/melkyar.toml`
//!
//! `--config <PATH>` points at a different file. A missing file is
//! created with defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use melkyar_media_server::ServerConfig;
use melkyar_protocol::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES};

/// Environment variable that supplies the upload token.
pub const TOKEN_ENV: &str = "MELKYAR_TOKEN";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub uploader: UploaderSection,
}

/// `[server]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    /// Accepted upload tokens. Empty = generate one at startup.
    #[serde(default)]
    pub api_tokens: Vec<String>,

    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    #[serde(default = "default_staging_ttl_secs")]
    pub staging_ttl_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// `[uploader]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderSection {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Upload token; `MELKYAR_TOKEN` takes precedence when set.
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-chunk request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retry chunks the server rejected with a 4xx (other than 408/429).
    /// Set to `false` to fail fast on bad tokens or malformed chunks.
    #[serde(default = "default_retry_rejections")]
    pub retry_rejections: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0:4000".into()
}

fn default_media_root() -> PathBuf {
    PathBuf::from("./media")
}

fn default_max_chunk_size() -> usize {
    10 * 1024 * 1024
}

fn default_staging_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    10 * 60
}

fn default_server_url() -> String {
    "http://localhost:4000".into()
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retry_rejections() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            media_root: default_media_root(),
            api_tokens: Vec::new(),
            max_chunk_size: default_max_chunk_size(),
            staging_ttl_secs: default_staging_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for UploaderSection {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            token: String::new(),
            chunk_size: default_chunk_size(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
            retry_rejections: default_retry_rejections(),
        }
    }
}

impl ServerSection {
    /// Converts the table into the server's runtime configuration.
    pub fn to_server_config(&self) -> anyhow::Result<ServerConfig> {
        let bind_addr: SocketAddr = self
            .bind_addr
            .parse()
            .with_context(|| format!("invalid bind_addr: {}", self.bind_addr))?;
        Ok(ServerConfig {
            bind_addr,
            media_root: self.media_root.clone(),
            api_tokens: self.api_tokens.clone(),
            max_chunk_size: self.max_chunk_size,
            staging_ttl: Duration::from_secs(self.staging_ttl_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
        })
    }
}

impl Config {
    /// Loads configuration from `path` (or the default location), creating
    /// a default file if none exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Tokens live in this file.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("melkyar")
            .join("melkyar.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("melkyar").join("melkyar.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/melkyar/melkyar.toml"))
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Subdirectory of the media root holding finalized videos.
const VIDEOS_DIR: &str = "videos";
/// Subdirectory of the media root holding images.
const IMAGES_DIR: &str = "images";
/// Hidden subdirectory of the media root where chunks are staged.
const STAGING_DIR: &str = ".staging";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (port 0 = OS-assigned).
    pub bind_addr: SocketAddr,
    /// Root of the media tree.
    pub media_root: PathBuf,
    /// Accepted upload credentials. When empty, one is generated at startup.
    pub api_tokens: Vec<String>,
    /// Largest accepted chunk payload in bytes.
    pub max_chunk_size: usize,
    /// Staged uploads idle longer than this are removed.
    pub staging_ttl: Duration,
    /// How often the staging sweeper runs.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 4000)),
            media_root: PathBuf::from("media"),
            api_tokens: Vec::new(),
            max_chunk_size: 10 * 1024 * 1024,
            staging_ttl: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
        }
    }
}

impl ServerConfig {
    pub fn videos_dir(&self) -> PathBuf {
        self.media_root.join(VIDEOS_DIR)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.media_root.join(IMAGES_DIR)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.media_root.join(STAGING_DIR)
    }
}

//! Melkyar media service and upload client entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Chunked media uploads and range-request media serving.
#[derive(Debug, Parser)]
#[command(name = "melkyar", version, about)]
struct Cli {
    /// Configuration file (defaults to the per-user config location).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the media server until Ctrl-C.
    Serve,

    /// Upload one video file and print its stored filename.
    Upload {
        /// File to upload.
        file: PathBuf,

        /// Server base URL, overriding the configured one.
        #[arg(long, value_name = "URL")]
        server: Option<String>,

        /// Chunk size in bytes, overriding the configured one.
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = config::Config::load(cli.config.as_deref())?;
    tracing::debug!(media_root = %config.server.media_root.display(), "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    match cli.command {
        Command::Serve => {
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting Melkyar media server");
            rt.block_on(app::serve(config))?;
            tracing::info!("media server shut down cleanly");
        }
        Command::Upload {
            file,
            server,
            chunk_size,
        } => {
            let mut uploader = config.uploader;
            if let Some(url) = server {
                uploader.server_url = url;
            }
            if let Some(size) = chunk_size {
                uploader.chunk_size = size;
            }
            let filename = rt.block_on(app::upload(&uploader, &file))?;
            println!("{filename}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload_with_overrides() {
        let cli = Cli::try_parse_from([
            "melkyar",
            "upload",
            "tour.mp4",
            "--server",
            "http://media.local:4000",
            "--chunk-size",
            "65536",
        ])
        .unwrap();

        match cli.command {
            Command::Upload {
                file,
                server,
                chunk_size,
            } => {
                assert_eq!(file, PathBuf::from("tour.mp4"));
                assert_eq!(server.as_deref(), Some("http://media.local:4000"));
                assert_eq!(chunk_size, Some(65536));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["melkyar", "serve", "--config", "/etc/melkyar.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/melkyar.toml")));
    }

    #[test]
    fn upload_requires_file() {
        assert!(Cli::try_parse_from(["melkyar", "upload"]).is_err());
    }
}

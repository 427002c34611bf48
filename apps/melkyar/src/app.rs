//! Command implementations: wires configuration into the server and the uploader.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use melkyar_media_server::MediaServer;
use melkyar_uploader::{
    CredentialProvider, EnvToken, HttpTransport, RetryPolicy, StaticToken, UploadOptions,
    UploadOrchestrator,
};

use crate::config::{Config, TOKEN_ENV, UploaderSection};

/// Runs the media server until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let server_config = config.server.to_server_config()?;
    let server = MediaServer::new(server_config);

    let server_run = Arc::clone(&server);
    let mut handle = tokio::spawn(async move { server_run.run().await });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("listening for Ctrl-C")?;
            tracing::info!("shutdown requested");
            server.shutdown();
        }
        // The server stopped on its own, e.g. the address was taken.
        result = &mut handle => {
            result.context("server task panicked")??;
            return Ok(());
        }
    }

    handle.await.context("server task panicked")??;
    Ok(())
}

/// Credential lookup order: `MELKYAR_TOKEN`, then the configured token.
fn credentials(section: &UploaderSection) -> impl CredentialProvider + use<> {
    let env = EnvToken::new(TOKEN_ENV);
    let configured = StaticToken::new(section.token.clone());
    move || env.token().or_else(|| configured.token())
}

fn upload_options(section: &UploaderSection) -> UploadOptions {
    UploadOptions {
        chunk_size: section.chunk_size,
        retry: RetryPolicy {
            max_retries: section.max_retries,
            retry_rejections: section.retry_rejections,
            ..RetryPolicy::default()
        },
    }
}

/// Uploads `file` and returns the server-assigned filename.
pub async fn upload(section: &UploaderSection, file: &Path) -> anyhow::Result<String> {
    let transport = HttpTransport::new(&section.server_url)?
        .with_chunk_timeout(Duration::from_secs(section.request_timeout_secs));
    let creds = credentials(section);

    let name = file.display().to_string();
    let mut orchestrator = UploadOrchestrator::new(&transport, &creds)
        .with_options(upload_options(section))
        .on_progress(Box::new(move |pct| {
            tracing::info!(file = %name, progress = pct, "upload progress");
        }));

    let filename = orchestrator
        .upload(file)
        .await
        .with_context(|| format!("uploading {}", file.display()))?;
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_token_is_used_without_env() {
        let section = UploaderSection {
            token: "from-config".into(),
            ..Default::default()
        };
        let creds = credentials(&section);
        if std::env::var(TOKEN_ENV).is_err() {
            assert_eq!(creds.token().as_deref(), Some("from-config"));
        }
    }

    #[test]
    fn options_follow_config() {
        let section = UploaderSection {
            chunk_size: 4096,
            max_retries: 5,
            ..Default::default()
        };
        let options = upload_options(&section);
        assert_eq!(options.chunk_size, 4096);
        assert_eq!(options.retry.max_retries, 5);
        assert_eq!(options.retry.base_delay, Duration::from_secs(1));
        assert!(options.retry.retry_rejections);

        let strict = UploaderSection {
            retry_rejections: false,
            ..Default::default()
        };
        assert!(!upload_options(&strict).retry.retry_rejections);
    }

    #[tokio::test]
    async fn upload_of_missing_file_fails() {
        let section = UploaderSection {
            token: "t".into(),
            server_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        let result = upload(&section, Path::new("/nonexistent/melkyar/clip.mp4")).await;
        assert!(result.is_err());
    }
}

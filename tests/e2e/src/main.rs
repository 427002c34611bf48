fn main() {
    println!("Run `cargo test -p melkyar-e2e` to execute the end-to-end and wire format tests.");
}

#[cfg(test)]
mod wire {
    use std::fs;
    use std::path::PathBuf;

    use melkyar_protocol::messages::{
        ChunkUploadResponse, ErrorBody, FinalizeRequest, FinalizeResponse,
    };

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Parses a fixture into `T`, re-serializes it and compares the JSON.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed).unwrap();
        assert_eq!(fixture, reserialized, "wire mismatch for {name}");
    }

    #[test]
    fn chunk_upload_response() {
        roundtrip_test::<ChunkUploadResponse>("chunk_upload_response.json");
        roundtrip_test::<ChunkUploadResponse>("chunk_upload_failure.json");
    }

    #[test]
    fn finalize_messages() {
        roundtrip_test::<FinalizeRequest>("finalize_request.json");
        roundtrip_test::<FinalizeResponse>("finalize_response.json");
    }

    #[test]
    fn media_error() {
        roundtrip_test::<ErrorBody>("media_error.json");
    }

    #[test]
    fn acknowledgment_matches_fixture() {
        let fixture = load_fixture("chunk_upload_response.json");
        let ack = ChunkUploadResponse::ack("1718000000000-k3v9q2m7x", 4);
        assert_eq!(serde_json::to_value(ack).unwrap(), fixture);
    }
}

#[cfg(test)]
mod e2e {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use melkyar_media_server::{MediaServer, ServerConfig};
    use melkyar_protocol::text;
    use melkyar_transfer::{ChunkPlan, ChunkReader, UploadSession};
    use melkyar_uploader::{
        ChunkTransport, HttpTransport, RetryPolicy, StaticToken, UploadError, UploadOptions,
        UploadOrchestrator, UploadState,
    };
    use reqwest::StatusCode;
    use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE};

    const TOKEN: &str = "e2e-token";
    const CHUNK: u64 = 16 * 1024;

    struct TestServer {
        server: Arc<MediaServer>,
        base_url: String,
        root: PathBuf,
        _dir: tempfile::TempDir,
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            self.server.shutdown();
        }
    }

    async fn start_server() -> TestServer {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            media_root: dir.path().to_path_buf(),
            api_tokens: vec![TOKEN.to_string()],
            max_chunk_size: 64 * 1024,
            ..Default::default()
        };
        let server = MediaServer::new(config);
        let s = Arc::clone(&server);
        tokio::spawn(async move { s.run().await });

        // Wait for the server to bind.
        let mut addr = None;
        for _ in 0..200 {
            addr = server.local_addr().await;
            if addr.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let addr = addr.expect("server did not bind");

        TestServer {
            server,
            base_url: format!("http://{addr}"),
            root: dir.path().to_path_buf(),
            _dir: dir,
        }
    }

    fn write_source(dir: &Path, name: &str, len: usize) -> (PathBuf, Vec<u8>) {
        let data: Vec<u8> = (0..len).map(|i| (i * 31 % 256) as u8).collect();
        let path = dir.join(name);
        std::fs::write(&path, &data).unwrap();
        (path, data)
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(10),
            ..RetryPolicy::default()
        }
    }

    #[tokio::test]
    async fn upload_then_stream_ranges() {
        let srv = start_server().await;
        let src = tempfile::tempdir().unwrap();
        let (path, data) = write_source(src.path(), "walkthrough.mp4", (CHUNK * 5 / 2) as usize);

        let transport = HttpTransport::new(&srv.base_url).unwrap();
        let creds = StaticToken::new(TOKEN);
        let progress = Arc::new(Mutex::new(Vec::new()));
        let p = Arc::clone(&progress);

        let mut orchestrator = UploadOrchestrator::new(&transport, &creds)
            .with_options(UploadOptions {
                chunk_size: CHUNK,
                retry: fast_retry(),
            })
            .on_progress(Box::new(move |pct| p.lock().unwrap().push(pct)));
        let filename = orchestrator.upload(&path).await.unwrap();

        assert_eq!(orchestrator.state(), UploadState::Done);
        assert!(filename.ends_with(".mp4"), "{filename}");
        assert_eq!(*progress.lock().unwrap(), vec![33, 67, 100]);

        let stored = std::fs::read(srv.root.join("videos").join(&filename)).unwrap();
        assert_eq!(stored, data);

        let http = reqwest::Client::new();
        let url = format!("{}/api/media/videos/{filename}", srv.base_url);

        let resp = http.get(&url).header(RANGE, "bytes=100-199").send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[CONTENT_RANGE], format!("bytes 100-199/{}", data.len()).as_str());
        assert_eq!(resp.headers()[CONTENT_LENGTH], "100");
        assert_eq!(resp.headers()[ACCEPT_RANGES], "bytes");
        assert_eq!(resp.headers()[CONTENT_TYPE], "video/mp4");
        assert_eq!(resp.bytes().await.unwrap().as_ref(), &data[100..200]);

        let resp = http.get(&url).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], data.len().to_string().as_str());
        assert_eq!(resp.bytes().await.unwrap().as_ref(), data.as_slice());
    }

    #[tokio::test]
    async fn concurrent_ranges_on_one_file() {
        let srv = start_server().await;
        let videos = srv.root.join("videos");
        let (_, data) = write_source(&videos, "plan.webm", 1000);
        let url = format!("{}/api/media/videos/plan.webm", srv.base_url);
        let http = reqwest::Client::new();

        let requests = (0..10u64).map(|i| {
            let http = http.clone();
            let url = url.clone();
            async move {
                let start = i * 100;
                let resp = http
                    .get(&url)
                    .header(RANGE, format!("bytes={start}-{}", start + 99))
                    .send()
                    .await
                    .unwrap();
                (start as usize, resp.bytes().await.unwrap())
            }
        });
        let handles: Vec<_> = requests.map(tokio::spawn).collect();
        for handle in handles {
            let (start, body) = handle.await.unwrap();
            assert_eq!(body.as_ref(), &data[start..start + 100]);
        }
    }

    #[tokio::test]
    async fn missing_media_is_404_with_error_body() {
        let srv = start_server().await;
        let resp = reqwest::get(format!("{}/api/media/images/none.jpg", srv.base_url))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], text::FILE_NOT_FOUND);
    }

    #[tokio::test]
    async fn rejected_token_fails_without_finalize() {
        let srv = start_server().await;
        let src = tempfile::tempdir().unwrap();
        let (path, _) = write_source(src.path(), "clip.mp4", 1000);

        let transport = HttpTransport::new(&srv.base_url).unwrap();
        let creds = StaticToken::new("not-the-token");
        let errors = Arc::new(Mutex::new(0));
        let e = Arc::clone(&errors);

        let mut orchestrator = UploadOrchestrator::new(&transport, &creds)
            .with_options(UploadOptions {
                chunk_size: CHUNK,
                retry: RetryPolicy {
                    retry_rejections: false,
                    ..fast_retry()
                },
            })
            .on_error(Box::new(move |_| *e.lock().unwrap() += 1));
        let err = orchestrator.upload(&path).await.unwrap_err();

        match &err {
            UploadError::ChunkRejected { status, message } => {
                assert_eq!(*status, 401);
                assert_eq!(message, text::UNAUTHORIZED);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(orchestrator.state(), UploadState::Failed);
        assert_eq!(*errors.lock().unwrap(), 1);

        let finalized = std::fs::read_dir(srv.root.join("videos")).unwrap().count();
        assert_eq!(finalized, 0);
    }

    #[tokio::test]
    async fn repeated_finalize_returns_same_filename() {
        let srv = start_server().await;
        let src = tempfile::tempdir().unwrap();
        let (path, data) = write_source(src.path(), "Garden.WEBM", 3000);

        let transport = HttpTransport::new(&srv.base_url).unwrap();
        let mut reader = ChunkReader::open(&path, 1024).await.unwrap();
        let session = UploadSession::new(
            "1718000000000-e2erepeat".to_string(),
            &ChunkPlan::new(data.len() as u64, 1024),
            "Garden.WEBM".to_string(),
        );

        for index in 0..session.total_chunks {
            let chunk = reader.read_chunk(index).await.unwrap();
            let ack = transport.send_chunk(&session, &chunk, TOKEN).await.unwrap();
            assert_eq!(ack.chunk_id, format!("{}-{index}", session.upload_id));
        }

        let first = transport.finalize(&session, TOKEN).await.unwrap();
        let second = transport.finalize(&session, TOKEN).await.unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with(".webm"));

        let stored = std::fs::read(srv.root.join("videos").join(&first)).unwrap();
        assert_eq!(stored, data);
    }

    #[tokio::test]
    async fn finalize_before_all_chunks_reports_server_message() {
        let srv = start_server().await;
        let transport = HttpTransport::new(&srv.base_url).unwrap();
        let session = UploadSession::new(
            "1718000000000-e2epartial".to_string(),
            &ChunkPlan::new(2048, 1024),
            "clip.mp4".to_string(),
        );

        let src = tempfile::tempdir().unwrap();
        let (path, _) = write_source(src.path(), "clip.mp4", 2048);
        let mut reader = ChunkReader::open(&path, 1024).await.unwrap();
        let chunk = reader.read_chunk(0).await.unwrap();
        transport.send_chunk(&session, &chunk, TOKEN).await.unwrap();

        let err = transport.finalize(&session, TOKEN).await.unwrap_err();
        match err {
            UploadError::Finalize { status, message } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, text::MISSING_CHUNKS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

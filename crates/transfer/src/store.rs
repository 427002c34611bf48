use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::TransferError;
use crate::validation::validate_upload_id;

const PART_SUFFIX: &str = ".part";
/// Per-upload file recording the chunk count fixed by the first chunk.
const MANIFEST_NAME: &str = "total";

/// Staged state of one upload on the server.
#[derive(Debug)]
struct StagedUpload {
    total_chunks: u64,
    received: BTreeSet<u64>,
    last_activity: Instant,
}

impl StagedUpload {
    fn new(total_chunks: u64, received: BTreeSet<u64>) -> Self {
        Self {
            total_chunks,
            received,
            last_activity: Instant::now(),
        }
    }

    fn missing(&self) -> usize {
        self.total_chunks as usize - self.received.len()
    }
}

/// Stages received chunks on disk, keyed by upload id and chunk index.
///
/// Layout: `<root>/<upload_id>/<index>.part` plus a `total` manifest.
/// Resending an index overwrites the previous part. The root is
/// normally a hidden directory inside the media root.
///
/// Sessions are cached in memory and rebuilt from the manifest and the
/// staged parts when the store is recreated, so a restart between the
/// last chunk and finalize loses nothing.
pub struct ChunkStore {
    root: PathBuf,
    sessions: Mutex<HashMap<String, StagedUpload>>,
    /// Serializes assembly so concurrent finalize calls for one upload
    /// cannot race on its parts.
    assembly: Mutex<()>,
    temp_seq: AtomicU64,
}

impl ChunkStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            sessions: Mutex::new(HashMap::new()),
            assembly: Mutex::new(()),
            temp_seq: AtomicU64::new(0),
        }
    }

    /// Returns the staging root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_dir(&self, upload_id: &str) -> PathBuf {
        self.root.join(upload_id)
    }

    /// Unique temp name so overlapping writes never share a file.
    fn temp_path(&self, target: &Path) -> PathBuf {
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{seq}.tmp"));
        target.with_file_name(name)
    }

    /// Rebuilds an upload left on disk by an earlier run.
    ///
    /// Returns `None` when no manifest exists.
    async fn restore(&self, upload_id: &str) -> Result<Option<StagedUpload>, TransferError> {
        let dir = self.session_dir(upload_id);
        let raw = match tokio::fs::read_to_string(dir.join(MANIFEST_NAME)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let Ok(total) = raw.trim().parse::<u64>() else {
            warn!(upload_id, manifest = %raw.trim(), "ignoring unreadable upload manifest");
            return Ok(None);
        };
        let received = scan_parts(&dir, total).await?;
        debug!(
            upload_id,
            total_chunks = total,
            received = received.len(),
            "restored staged upload"
        );
        Ok(Some(StagedUpload::new(total, received)))
    }

    /// Writes chunk `index` of `upload_id`.
    ///
    /// The first chunk seen for an upload fixes its `total`; later chunks
    /// must agree. Parts left on disk by an earlier server run are picked
    /// up when the session is first seen again.
    pub async fn write_chunk(
        &self,
        upload_id: &str,
        index: u64,
        total: u64,
        data: &[u8],
    ) -> Result<(), TransferError> {
        validate_upload_id(upload_id)?;
        if index >= total {
            return Err(TransferError::ChunkOutOfRange { index, total });
        }

        let dir = self.session_dir(upload_id);
        let known = self.sessions.lock().await.contains_key(upload_id);
        let restored = if known {
            None
        } else {
            self.restore(upload_id).await?
        };
        let fresh = !known && restored.is_none();

        {
            let mut sessions = self.sessions.lock().await;
            let staged = sessions.entry(upload_id.to_string()).or_insert_with(|| {
                restored.unwrap_or_else(|| StagedUpload::new(total, BTreeSet::new()))
            });
            if staged.total_chunks != total {
                return Err(TransferError::TotalMismatch {
                    expected: staged.total_chunks,
                    actual: total,
                });
            }
            staged.last_activity = Instant::now();
        }

        tokio::fs::create_dir_all(&dir).await?;
        if fresh {
            let manifest = dir.join(MANIFEST_NAME);
            let tmp = self.temp_path(&manifest);
            tokio::fs::write(&tmp, total.to_string()).await?;
            tokio::fs::rename(&tmp, &manifest).await?;
        }

        // Write to a temp name, then rename: a resent index replaces the
        // old part atomically.
        let part = dir.join(part_name(index));
        let tmp = self.temp_path(&part);
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &part).await?;

        let mut sessions = self.sessions.lock().await;
        if let Some(staged) = sessions.get_mut(upload_id) {
            staged.received.insert(index);
            staged.last_activity = Instant::now();
            debug!(
                upload_id,
                chunk_index = index,
                total_chunks = total,
                received = staged.received.len(),
                "chunk staged"
            );
        }
        Ok(())
    }

    /// Returns `true` if the store is tracking `upload_id`.
    pub async fn contains(&self, upload_id: &str) -> bool {
        self.sessions.lock().await.contains_key(upload_id)
    }

    /// Returns the received chunk indices of `upload_id`, in order.
    pub async fn received(&self, upload_id: &str) -> Option<Vec<u64>> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(upload_id)
            .map(|s| s.received.iter().copied().collect())
    }

    /// Returns `true` once every chunk of `upload_id` has been staged.
    pub async fn is_complete(&self, upload_id: &str) -> bool {
        let sessions = self.sessions.lock().await;
        sessions.get(upload_id).is_some_and(|s| s.missing() == 0)
    }

    /// Concatenates all parts of `upload_id` into `dest`.
    ///
    /// The output is written next to `dest` under a temporary name and
    /// renamed into place, so readers never see a partial file. On
    /// success the staging directory is removed and the session is
    /// forgotten. An upload not in memory is restored from disk first.
    /// Returns the number of bytes written.
    pub async fn assemble(&self, upload_id: &str, dest: &Path) -> Result<u64, TransferError> {
        validate_upload_id(upload_id)?;
        let _assembling = self.assembly.lock().await;

        let restored = if self.contains(upload_id).await {
            None
        } else {
            self.restore(upload_id).await?
        };
        if let Some(staged) = restored {
            self.sessions
                .lock()
                .await
                .entry(upload_id.to_string())
                .or_insert(staged);
        }

        let total = {
            let sessions = self.sessions.lock().await;
            let staged = sessions
                .get(upload_id)
                .ok_or_else(|| TransferError::SessionNotFound(upload_id.to_string()))?;
            let missing = staged.missing();
            if missing > 0 {
                return Err(TransferError::Incomplete {
                    upload_id: upload_id.to_string(),
                    missing,
                });
            }
            staged.total_chunks
        };

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let dir = self.session_dir(upload_id);
        let tmp = self.temp_path(dest);
        let written = match concat_parts(&dir, total, &tmp).await {
            Ok(n) => n,
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(e);
            }
        };
        tokio::fs::rename(&tmp, dest).await?;

        self.sessions.lock().await.remove(upload_id);
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            warn!(upload_id, error = %e, "failed to remove staging directory");
        }

        info!(
            upload_id,
            chunks = total,
            bytes = written,
            dest = %dest.display(),
            "upload assembled"
        );
        Ok(written)
    }

    /// Drops an upload and its staged parts.
    pub async fn discard(&self, upload_id: &str) -> Result<(), TransferError> {
        validate_upload_id(upload_id)?;
        self.sessions.lock().await.remove(upload_id);
        match tokio::fs::remove_dir_all(self.session_dir(upload_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes uploads idle for longer than `ttl`.
    ///
    /// Tracked sessions are judged by their last chunk; directories the
    /// store does not know (left by an earlier run) by their mtime.
    /// Returns the number of uploads removed.
    pub async fn sweep_stale(&self, ttl: Duration) -> Result<usize, TransferError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(upload_id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            let stale = {
                let sessions = self.sessions.lock().await;
                match sessions.get(&upload_id) {
                    Some(staged) => staged.last_activity.elapsed() > ttl,
                    None => dir_idle_for(&entry.path()).await.is_some_and(|idle| idle > ttl),
                }
            };
            if !stale {
                continue;
            }

            self.sessions.lock().await.remove(&upload_id);
            match tokio::fs::remove_dir_all(entry.path()).await {
                Ok(()) => {
                    info!(upload_id = %upload_id, "removed stale upload");
                    removed += 1;
                }
                Err(e) => warn!(upload_id = %upload_id, error = %e, "failed to remove stale upload"),
            }
        }
        Ok(removed)
    }
}

fn part_name(index: u64) -> String {
    format!("{index}{PART_SUFFIX}")
}

/// Collects indices `< total` of parts already present in `dir`.
async fn scan_parts(dir: &Path, total: u64) -> Result<BTreeSet<u64>, TransferError> {
    let mut found = BTreeSet::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(found),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(index) = name
            .to_str()
            .and_then(|n| n.strip_suffix(PART_SUFFIX))
            .and_then(|n| n.parse::<u64>().ok())
        else {
            continue;
        };
        if index < total {
            found.insert(index);
        }
    }
    Ok(found)
}

async fn concat_parts(dir: &Path, total: u64, out_path: &Path) -> Result<u64, TransferError> {
    let mut out = tokio::fs::File::create(out_path).await?;
    let mut written = 0;
    for index in 0..total {
        let mut part = tokio::fs::File::open(dir.join(part_name(index))).await?;
        written += tokio::io::copy(&mut part, &mut out).await?;
    }
    out.flush().await?;
    out.sync_all().await?;
    Ok(written)
}

async fn dir_idle_for(path: &Path) -> Option<Duration> {
    let modified = tokio::fs::metadata(path).await.ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}

use std::io::SeekFrom;
use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::TransferError;
use crate::plan::ChunkPlan;
use crate::types::Chunk;

/// Reads a source file chunk by chunk according to a [`ChunkPlan`].
pub struct ChunkReader {
    file: tokio::fs::File,
    plan: ChunkPlan,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`](crate::DEFAULT_CHUNK_SIZE) is used.
    pub async fn open(path: &Path, chunk_size: u64) -> Result<Self, TransferError> {
        let file = tokio::fs::File::open(path).await?;
        let file_size = file.metadata().await?.len();
        Ok(Self {
            file,
            plan: ChunkPlan::new(file_size, chunk_size),
        })
    }

    /// Reads chunk `index`.
    pub async fn read_chunk(&mut self, index: u64) -> Result<Chunk, TransferError> {
        let total = self.plan.total_chunks();
        if index >= total {
            return Err(TransferError::ChunkOutOfRange { index, total });
        }

        let range = self.plan.range(index);
        let mut buf = vec![0u8; (range.end - range.start) as usize];
        self.file.seek(SeekFrom::Start(range.start)).await?;
        self.file.read_exact(&mut buf).await?;

        Ok(Chunk {
            index,
            offset: range.start,
            data: buf,
        })
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.plan.file_size()
    }
}

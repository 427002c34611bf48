use crate::plan::ChunkPlan;

/// A contiguous byte range of the source file, ready to transmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based sequence number within the upload.
    pub index: u64,
    /// Byte offset within the source file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Identity of one in-progress file transfer.
///
/// Lives only for the duration of one upload call; nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub upload_id: String,
    pub total_chunks: u64,
    pub original_filename: String,
}

impl UploadSession {
    /// Creates a session for a source file split by `plan`.
    pub fn new(upload_id: String, plan: &ChunkPlan, original_filename: String) -> Self {
        Self {
            upload_id,
            total_chunks: plan.total_chunks(),
            original_filename,
        }
    }
}

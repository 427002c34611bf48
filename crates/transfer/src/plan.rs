use std::ops::Range;

use crate::DEFAULT_CHUNK_SIZE;

/// Fixed-size split of a file into contiguous byte ranges.
///
/// Chunk `i` covers `[i * chunk_size, min((i + 1) * chunk_size, file_size))`.
/// Every chunk is exactly `chunk_size` bytes except possibly the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    file_size: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    /// Plans `file_size` bytes in chunks of `chunk_size`.
    ///
    /// A `chunk_size` of 0 is replaced with [`DEFAULT_CHUNK_SIZE`].
    pub fn new(file_size: u64, chunk_size: u64) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            file_size,
            chunk_size,
        }
    }

    /// `ceil(file_size / chunk_size)`.
    pub fn total_chunks(&self) -> u64 {
        self.file_size.div_ceil(self.chunk_size)
    }

    /// Byte range `[start, end)` of chunk `index`.
    ///
    /// Indices past the end yield an empty range at `file_size`.
    pub fn range(&self, index: u64) -> Range<u64> {
        let start = index
            .saturating_mul(self.chunk_size)
            .min(self.file_size);
        let end = start.saturating_add(self.chunk_size).min(self.file_size);
        start..end
    }

    /// Iterates `(index, range)` for every chunk in order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, Range<u64>)> + '_ {
        (0..self.total_chunks()).map(|i| (i, self.range(i)))
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }
}

//! Data types for the upload flow.

use rand::Rng;

use melkyar_protocol::constants::DEFAULT_CHUNK_SIZE;

use crate::retry::RetryPolicy;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Lifecycle of one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Init,
    Sending,
    Finalizing,
    Done,
    Failed,
}

/// Tunables for one upload.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub chunk_size: u64,
    pub retry: RetryPolicy,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

/// Generates a client-side upload id: `<unix-millis>-<9 base36 chars>`.
pub fn generate_upload_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}-{suffix}", chrono::Utc::now().timestamp_millis())
}

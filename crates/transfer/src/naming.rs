use std::path::Path;

use sha2::{Digest, Sha256};

/// Hex characters of the upload-id digest kept in the stored filename.
const NAME_DIGEST_LEN: usize = 24;

/// Lowercased extension of the client's original filename, without the dot.
pub fn original_extension(original_filename: &str) -> Option<String> {
    Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// Storage name of a finalized upload.
///
/// Derived only from the upload id and extension, so finalizing the
/// same upload twice always yields the same name.
pub fn finalized_filename(upload_id: &str, extension: &str) -> String {
    let digest = hex::encode(Sha256::digest(upload_id.as_bytes()));
    format!("{}.{extension}", &digest[..NAME_DIGEST_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(original_extension("Tour.MP4").as_deref(), Some("mp4"));
        assert_eq!(original_extension("a.b.webm").as_deref(), Some("webm"));
    }

    #[test]
    fn missing_extension() {
        assert!(original_extension("video").is_none());
        assert!(original_extension("").is_none());
    }

    #[test]
    fn filename_is_deterministic() {
        let a = finalized_filename("1718029384123-k3j9x0a1b", "mp4");
        let b = finalized_filename("1718029384123-k3j9x0a1b", "mp4");
        assert_eq!(a, b);
        assert_eq!(a.len(), NAME_DIGEST_LEN + 4);
        assert!(a.ends_with(".mp4"));
    }

    #[test]
    fn distinct_uploads_get_distinct_names() {
        let a = finalized_filename("upload-a", "mp4");
        let b = finalized_filename("upload-b", "mp4");
        assert_ne!(a, b);
    }
}

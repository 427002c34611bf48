use std::path::{Component, Path};

use crate::TransferError;

/// Longest accepted upload id.
const MAX_UPLOAD_ID_LEN: usize = 128;

/// Validates a client-supplied upload id before it is used as a directory name.
///
/// Accepts 1–128 characters from `[A-Za-z0-9_-]`.
pub fn validate_upload_id(upload_id: &str) -> Result<(), TransferError> {
    if upload_id.is_empty() {
        return Err(TransferError::InvalidUploadId("empty upload id".into()));
    }
    if upload_id.len() > MAX_UPLOAD_ID_LEN {
        return Err(TransferError::InvalidUploadId(format!(
            "upload id longer than {MAX_UPLOAD_ID_LEN} characters"
        )));
    }
    if !upload_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(TransferError::InvalidUploadId(format!(
            "illegal character in upload id: {upload_id}"
        )));
    }
    Ok(())
}

/// Validates that a requested media filename names a file directly
/// inside the media directory.
///
/// Rejects:
/// - Empty names
/// - Absolute paths
/// - Parent directory traversal (`..`)
/// - Nested paths (`a/b.mp4`) and `.` components
/// - Windows prefix components (`C:`, `\\server`)
pub fn validate_media_filename(filename: &str) -> Result<(), TransferError> {
    if filename.is_empty() {
        return Err(TransferError::InvalidPath("empty path".into()));
    }

    let path = Path::new(filename);
    if path.is_absolute() {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {filename}"
        )));
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::ParentDir), _) | (_, Some(Component::ParentDir)) => Err(
            TransferError::InvalidPath(format!(
                "parent directory traversal not allowed: {filename}"
            )),
        ),
        (Some(Component::Prefix(_)), _) => Err(TransferError::InvalidPath(format!(
            "path prefix not allowed: {filename}"
        ))),
        _ => Err(TransferError::InvalidPath(format!(
            "nested path not allowed: {filename}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_generated_upload_id() {
        assert!(validate_upload_id("1718029384123-k3j9x0a1b").is_ok());
        assert!(validate_upload_id("abc_DEF-123").is_ok());
    }

    #[test]
    fn rejects_empty_upload_id() {
        assert!(validate_upload_id("").is_err());
    }

    #[test]
    fn rejects_upload_id_with_separators() {
        assert!(validate_upload_id("../etc").is_err());
        assert!(validate_upload_id("a/b").is_err());
        assert!(validate_upload_id("a.b").is_err());
    }

    #[test]
    fn rejects_overlong_upload_id() {
        let id = "a".repeat(MAX_UPLOAD_ID_LEN + 1);
        assert!(validate_upload_id(&id).is_err());
        assert!(validate_upload_id(&id[1..]).is_ok());
    }

    #[test]
    fn accepts_plain_filename() {
        assert!(validate_media_filename("3f2a9c.mp4").is_ok());
        assert!(validate_media_filename(".hidden").is_ok());
    }

    #[test]
    fn rejects_empty_filename() {
        assert!(validate_media_filename("").is_err());
    }

    #[test]
    fn rejects_parent_dir_traversal() {
        assert!(validate_media_filename("..").is_err());
        assert!(validate_media_filename("../secret.mp4").is_err());
        assert!(validate_media_filename("a/../../b").is_err());
    }

    #[test]
    fn rejects_absolute_path() {
        assert!(validate_media_filename("/etc/passwd").is_err());
    }

    #[test]
    fn rejects_nested_path() {
        assert!(validate_media_filename("sub/video.mp4").is_err());
        assert!(validate_media_filename("./video.mp4").is_err());
    }
}

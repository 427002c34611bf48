//! Extension to content-type lookup for served media.

use std::path::Path;

const DEFAULT_VIDEO_TYPE: &str = "video/mp4";
const DEFAULT_IMAGE_TYPE: &str = "application/octet-stream";

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Content type of a stored video. Unknown extensions fall back to `video/mp4`.
pub fn video_content_type(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg") => "video/ogg",
        Some("avi") => "video/x-msvideo",
        Some("mov") => "video/quicktime",
        _ => DEFAULT_VIDEO_TYPE,
    }
}

/// Content type of a stored image.
pub fn image_content_type(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => DEFAULT_IMAGE_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_table() {
        assert_eq!(video_content_type(Path::new("a.mp4")), "video/mp4");
        assert_eq!(video_content_type(Path::new("a.webm")), "video/webm");
        assert_eq!(video_content_type(Path::new("a.ogg")), "video/ogg");
        assert_eq!(video_content_type(Path::new("a.avi")), "video/x-msvideo");
        assert_eq!(video_content_type(Path::new("a.mov")), "video/quicktime");
    }

    #[test]
    fn video_default_and_case() {
        assert_eq!(video_content_type(Path::new("a.MOV")), "video/quicktime");
        assert_eq!(video_content_type(Path::new("a.mkv")), "video/mp4");
        assert_eq!(video_content_type(Path::new("noext")), "video/mp4");
    }

    #[test]
    fn image_table() {
        assert_eq!(image_content_type(Path::new("p.JPG")), "image/jpeg");
        assert_eq!(image_content_type(Path::new("p.jpeg")), "image/jpeg");
        assert_eq!(image_content_type(Path::new("p.webp")), "image/webp");
        assert_eq!(image_content_type(Path::new("p.bin")), "application/octet-stream");
    }
}

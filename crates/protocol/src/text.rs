//! User-facing messages (Persian, matching the marketplace locale).

/// Generic chunk failure when the server gave no message.
pub const CHUNK_UPLOAD_FAILED: &str = "خطا در آپلود قطعه فایل";

/// Generic finalization failure when the server gave no message.
pub const FINALIZE_FAILED: &str = "خطا در نهایی‌سازی آپلود";

/// Chunk request aborted by the client-side timeout.
pub const CHUNK_TIMEOUT: &str = "زمان ارسال قطعه به پایان رسید";

/// Missing or rejected credential.
pub const UNAUTHORIZED: &str = "دسترسی غیرمجاز";

/// Requested media file does not exist.
pub const FILE_NOT_FOUND: &str = "فایل یافت نشد";

/// Finalize called before every chunk arrived.
pub const MISSING_CHUNKS: &str = "برخی از قطعات فایل دریافت نشده‌اند";

/// Finalize called for an upload the server does not know.
pub const UPLOAD_NOT_FOUND: &str = "آپلود مورد نظر یافت نشد";

/// Original file has an extension the server does not store.
pub const UNSUPPORTED_FORMAT: &str = "فرمت فایل پشتیبانی نمی‌شود";

/// Malformed chunk metadata.
pub const INVALID_CHUNK: &str = "اطلاعات قطعه نامعتبر است";

/// Server-side storage failure.
pub const SERVER_ERROR: &str = "خطای داخلی سرور";

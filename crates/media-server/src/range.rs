//! `Range` header parsing for single byte ranges.

/// Inclusive byte range `start..=end` inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered (never zero).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a file of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{size}", self.start, self.end)
    }
}

/// How a media request should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No usable range: send the whole file with 200.
    Full,
    /// Send the range with 206.
    Partial(ByteRange),
    /// Well-formed range outside the file: 416.
    Unsatisfiable,
}

/// Interprets a `Range` header value against a file of `size` bytes.
///
/// Only the single-range form `bytes=<start>-[<end>]` is honored. A
/// missing `end` means the last byte, and an `end` past the file is
/// clamped to it. Anything else (suffix ranges, multiple ranges, other
/// units, garbage) is ignored and the full file is served.
pub fn parse_range(header: Option<&str>, size: u64) -> RangeRequest {
    let Some(ranges) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeRequest::Full;
    };
    let Some((start, end)) = ranges.split_once('-') else {
        return RangeRequest::Full;
    };

    let Some(start) = parse_position(start) else {
        return RangeRequest::Full;
    };
    let end = match end.trim() {
        "" => None,
        e => match parse_position(e) {
            Some(e) => Some(e),
            None => return RangeRequest::Full,
        },
    };

    if start >= size || end.is_some_and(|e| e < start) {
        return RangeRequest::Unsatisfiable;
    }

    let last = size - 1;
    RangeRequest::Partial(ByteRange {
        start,
        end: end.map_or(last, |e| e.min(last)),
    })
}

fn parse_position(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

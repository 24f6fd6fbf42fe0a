use thiserror::Error;

pub type Result<T> = std::result::Result<T, MediaError>;

/// Unified error type for tape decoding and system image composition.
///
/// Every variant is fatal to a build: callers are expected to report it and stop rather than
/// continue with partial data.
///
/// Note: [`MediaError::Io`] stores a human-readable `String` rather than `std::io::Error` so the
/// in-memory and file backends can surface failures through the same type.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Malformed tape footer, incomplete system area, truncated block or record.
    #[error("format error: {0}")]
    Format(&'static str),

    #[error("{region}: length mismatch (expected {expected} bytes, got {actual})")]
    Length {
        region: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{region}: out of bounds: offset={offset} len={len} capacity={capacity}")]
    Bounds {
        region: &'static str,
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("unit spec '{source_name}' row {row}: {reason}")]
    RowFormat {
        source_name: String,
        row: usize,
        reason: String,
    },

    #[error("unknown media type '{0}'")]
    UnknownMedia(String),

    #[error("integer overflow while computing byte offsets")]
    OffsetOverflow,

    /// Generic I/O failure from a storage backend.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

use std::fmt;

/// Machine-stable error taxonomy for the binary-format parsers and the output planners.
///
/// Every bounds violation carries enough context (requested count, current offset,
/// remaining bytes) to pinpoint the failure without re-reading the file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bad magic at offset 0: expected {expected:?}, found {found:?}")]
    FormatMagic {
        expected: &'static str,
        found: [u8; 4],
    },

    #[error("unsupported version {found:?}, expected one of {expected:?}")]
    FormatVersion {
        expected: &'static [&'static str],
        found: [u8; 4],
    },

    #[error("truncated read: wanted {requested} bytes at offset {offset}, only {remaining} remaining")]
    Truncated {
        requested: usize,
        offset: usize,
        remaining: usize,
    },

    #[error("malformed navigation command at command offset {offset}")]
    NavCommandDecode { offset: usize },

    #[error("failed to read {path}: {source}")]
    IoRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("output path escapes target directory: {path}")]
    PathTraversal { path: String },

    #[error("unsupported image format {found:?}, expected one of {expected:?}")]
    UnsupportedFormat {
        expected: &'static [&'static str],
        found: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A 4-byte ASCII tag, used for magic/version comparisons and for surfacing
/// offending bytes in [`Error::FormatMagic`] / [`Error::FormatVersion`].
pub(crate) fn tag4(bytes: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    let n = bytes.len().min(4);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable string codes for errors and warnings, independent of the `Display` message,
/// so a host (or a test) can match on them without parsing prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    FormatMagic,
    FormatVersion,
    Truncated,
    NavCommandDecode,
    IoRead,
    PathTraversal,
    UnsupportedFormat,
    Duplicates,
    NoEpisodes,
    PlayAllOnly,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FormatMagic => "FormatMagic",
            ErrorCode::FormatVersion => "FormatVersion",
            ErrorCode::Truncated => "Truncated",
            ErrorCode::NavCommandDecode => "NavCommandDecode",
            ErrorCode::IoRead => "IoRead",
            ErrorCode::PathTraversal => "PathTraversal",
            ErrorCode::UnsupportedFormat => "UnsupportedFormat",
            ErrorCode::Duplicates => "DUPLICATES",
            ErrorCode::NoEpisodes => "NO_EPISODES",
            ErrorCode::PlayAllOnly => "PLAY_ALL_ONLY",
        }
    }
}

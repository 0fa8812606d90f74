//! Error types for the anlib container.

use thiserror::Error;

/// Kind of an externally written asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Atlas,
    Sound,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Atlas => f.write_str("atlas"),
            AssetKind::Sound => f.write_str("sound"),
        }
    }
}

/// Main error type for container operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid magic bytes at start of file
    #[error("Invalid animation library: expected container magic bytes")]
    InvalidMagic,

    /// Unsupported container format version
    #[error("Unsupported container version: {0}")]
    UnsupportedVersion(u32),

    /// Stream is truncated
    #[error("Unexpected end of data at position {0}")]
    UnexpectedEof(u64),

    /// Variable-length integer did not terminate
    #[error("Variable-length integer at position {0} exceeds the maximum byte count")]
    VarIntOverflow(u64),

    /// Invalid data structure in stream
    #[error("Invalid container structure: {0}")]
    InvalidStructure(String),

    /// Unknown symbol kind tag
    #[error("Unknown symbol kind tag: {0}")]
    UnknownSymbolKind(u32),

    /// String looked up without having been added to the pool
    #[error("String was never added to the pool: {0:?}")]
    StringNotInterned(String),

    /// String pool used before `finalize`
    #[error("String pool looked up before finalize")]
    PoolNotFinalized,

    /// Shape references an atlas missed by the asset pre-pass
    #[error("Atlas not registered in the asset table")]
    AtlasNotRegistered,

    /// Action references a symbol id that is not a sound
    #[error("Sound symbol not registered: {0}")]
    SoundNotRegistered(u32),

    /// Named state points at a sub-timeline missing from the distinct list
    #[error("Sub-timeline not registered for state {0:?}")]
    SubTimelineNotRegistered(String),

    /// Quantized value does not fit its encoding
    #[error("Value out of range for {field}: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    /// External asset sink failed
    #[error("Failed to write {kind} {index}: {source}")]
    AssetWrite {
        kind: AssetKind,
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON error in uid extra properties
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Wrap a sink failure with the asset it was writing.
    pub fn asset_write(kind: AssetKind, index: usize, source: Error) -> Self {
        Self::AssetWrite { kind, index, source: Box::new(source) }
    }
}

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidMagic;
        assert!(e.to_string().contains("magic"));

        let e = Error::OutOfRange { field: "rect.x", value: 1e12 };
        assert!(e.to_string().contains("rect.x"));

        let e = Error::asset_write(AssetKind::Sound, 3, Error::other("disk full"));
        let msg = e.to_string();
        assert!(msg.contains("sound 3"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}

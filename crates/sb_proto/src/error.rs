use thiserror::Error;

/// Errors from the fixed-layout header codec.
///
/// Magic and version mismatches are distinct so callers can tell "not a
/// backup file" from "backup from a newer client".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Not a backup file (magic mismatch)")]
    UnknownMagic,

    #[error("Unsupported backup version {found:?}")]
    UnsupportedVersion { found: [u8; 2] },

    #[error("Header truncated: need {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
}

/// Errors from the schema payload codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Payload encoding failed: {0}")]
    Encode(String),

    #[error("Payload decoding failed: {0}")]
    Decode(String),
}

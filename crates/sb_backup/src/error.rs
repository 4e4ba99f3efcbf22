use thiserror::Error;

use crate::validate::EntityKind;

/// Failure taxonomy for export and import runs.
///
/// `Format` and `IdentityMismatch` are detected before any bulk decryption;
/// `Authentication` is the one callers may recover from by re-prompting for
/// the passphrase. No partial plaintext is ever surfaced on any failure.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The file is not a backup, or is a version this codec cannot read.
    /// Decryption is never attempted once this fires.
    #[error(transparent)]
    Format(#[from] sb_proto::FormatError),

    /// The stored identity hash does not match the importing user.
    #[error("Backup was created by a different account")]
    IdentityMismatch,

    /// An AEAD chunk failed to authenticate. Usually a wrong passphrase;
    /// callers may re-prompt and retry with the same bytes.
    #[error("Backup decryption failed (wrong passphrase or corrupted file)")]
    Authentication,

    /// A hard validation invariant failed during export. Nothing was emitted.
    #[error("Export aborted: invalid {kind}: {reason}")]
    ValidationAbort { kind: EntityKind, reason: String },

    /// Schema payload encode/decode failure.
    #[error(transparent)]
    Codec(#[from] sb_proto::CodecError),

    /// Cryptographic failure other than chunk authentication.
    #[error("Crypto error: {0}")]
    Crypto(sb_crypto::CryptoError),

    /// Underlying stream read/write failure unrelated to format or crypto.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sb_crypto::CryptoError> for BackupError {
    fn from(e: sb_crypto::CryptoError) -> Self {
        use sb_crypto::CryptoError;
        match e {
            // A stream that fails a tag check or ends early is handled the
            // same way: the caller gets to retry with another passphrase.
            CryptoError::AeadDecrypt | CryptoError::TruncatedStream => Self::Authentication,
            CryptoError::Io(io) => Self::Io(io),
            other => Self::Crypto(other),
        }
    }
}

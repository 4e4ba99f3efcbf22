//! Import and peek pipeline.
//!
//! `peek` classifies a file as encrypted or plaintext from the header region
//! alone; it never derives keys and never fails. `import` runs three gates
//! in a fixed order: format validity (magic, version), then the identity
//! hash, then chunk-by-chunk AEAD authentication. The identity gate runs
//! strictly before bulk decryption; both gates must pass independently.
//! Decrypted bytes live in a private buffer that is dropped wholesale on
//! any failure, so no partial plaintext ever reaches the caller.

use tracing::debug;

use sb_crypto::{kdf, stream};
use sb_proto::{decode_payload, BackupHeader, BackupMetadata, Conversation, Message, Reaction,
    User, HEADER_LEN};

use crate::error::BackupError;
use crate::pager::Pager;
use crate::passphrase::BackupPassphrase;

/// Classification returned by [`peek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peek {
    pub encrypted: bool,
}

/// Classify a backup file without decrypting it.
///
/// Inspects only the fixed-size header region. Anything that does not carry
/// the backup magic is treated as a plaintext payload; the schema decoder
/// produces the real error for garbage input when `import` runs.
pub fn peek(bytes: &[u8]) -> Peek {
    Peek {
        encrypted: BackupHeader::has_magic(bytes),
    }
}

/// Recovered history, one forward-only pager per entity kind.
///
/// Pages preserve the original encoding order within each kind and are
/// bounded by [`crate::pager::PAGE_SIZE`], so importing an arbitrarily large
/// history never hands the caller more than one page at a time.
#[derive(Debug)]
pub struct ImportedBackup {
    pub metadata: BackupMetadata,
    pub users: Pager<User>,
    pub conversations: Pager<Conversation>,
    pub messages: Pager<Message>,
    pub reactions: Pager<Reaction>,
}

/// Decode a backup file into pagers.
pub async fn import(
    bytes: &[u8],
    passphrase: &BackupPassphrase,
) -> Result<ImportedBackup, BackupError> {
    let payload = if peek(bytes).encrypted {
        let plaintext = decrypt_file(bytes, passphrase).await?;
        decode_payload(&plaintext)?
    } else {
        // A file without the magic is either a plaintext backup or not a
        // backup at all; the schema decoder settles which.
        debug!("plaintext backup, decoding payload directly");
        decode_payload(bytes).map_err(|e| {
            debug!(error = %e, "payload decode failed, not a backup file");
            BackupError::Format(sb_proto::FormatError::UnknownMagic)
        })?
    };

    Ok(ImportedBackup {
        metadata: payload.metadata,
        users: Pager::new(payload.users),
        conversations: Pager::new(payload.conversations),
        messages: Pager::new(payload.messages),
        reactions: Pager::new(payload.reactions),
    })
}

async fn decrypt_file(
    bytes: &[u8],
    passphrase: &BackupPassphrase,
) -> Result<Vec<u8>, BackupError> {
    // Gate 1: format. Magic or version mismatch stops everything before any
    // key derivation happens.
    let header = BackupHeader::decode(bytes)?;

    // Gate 2: identity. The header's cost parameters are echoed back into
    // the derivation, so a header tampered towards cheaper parameters still
    // produces a mismatching hash.
    let identity_hash =
        kdf::derive_identity_hash(&passphrase.user_id, &header.salt, &header.kdf_params)?;
    if identity_hash != header.identity_hash {
        return Err(BackupError::IdentityMismatch);
    }

    // Gate 3: chunk-by-chunk AEAD authentication.
    let key = kdf::derive_cipher_key(&passphrase.password, &header.salt, &header.kdf_params)?;
    let mut plaintext = Vec::new();
    stream::decrypt(&key, &mut &bytes[HEADER_LEN..], &mut plaintext).await?;

    debug!(bytes = plaintext.len(), "backup stream authenticated");
    Ok(plaintext)
}

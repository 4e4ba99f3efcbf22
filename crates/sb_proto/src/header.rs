//! Fixed-layout clear header, written before the ciphertext stream.
//!
//! Layout (63 bytes, big-endian integers):
//!
//! | offset | size | field                     |
//! |--------|------|---------------------------|
//! | 0      | 4    | magic `"SBAK"`            |
//! | 4      | 1    | reserved `0x00`           |
//! | 5      | 2    | version `"03"`            |
//! | 7      | 16   | Argon2id salt             |
//! | 23     | 32   | identity hash             |
//! | 55     | 4    | ops limit (u32)           |
//! | 59     | 4    | mem limit in bytes (u32)  |
//!
//! The header performs no cryptography; it only carries the inputs the
//! import side needs to re-derive keys. Decoding never consumes more than
//! [`HEADER_LEN`] bytes, so the ciphertext stream behind it stays untouched.

use sb_crypto::kdf::{KdfParams, SALT_LEN};

use crate::error::FormatError;

/// ASCII tag identifying the backup format.
pub const MAGIC: [u8; 4] = *b"SBAK";

/// On-disk format version, ASCII.
pub const VERSION: [u8; 2] = *b"03";

/// Total header length in bytes.
pub const HEADER_LEN: usize = 63;

const RESERVED: u8 = 0x00;

const SALT_OFFSET: usize = 7;
const IDENTITY_OFFSET: usize = 23;
const OPS_OFFSET: usize = 55;
const MEM_OFFSET: usize = 59;

/// Clear-text backup file header.
///
/// Built fresh on every export (fresh random salt), reconstructed by parsing
/// on every import. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupHeader {
    pub salt: [u8; SALT_LEN],
    pub identity_hash: [u8; 32],
    pub kdf_params: KdfParams,
}

impl BackupHeader {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&MAGIC);
        out[4] = RESERVED;
        out[5..7].copy_from_slice(&VERSION);
        out[SALT_OFFSET..IDENTITY_OFFSET].copy_from_slice(&self.salt);
        out[IDENTITY_OFFSET..OPS_OFFSET].copy_from_slice(&self.identity_hash);
        out[OPS_OFFSET..MEM_OFFSET].copy_from_slice(&self.kdf_params.ops_limit.to_be_bytes());
        out[MEM_OFFSET..HEADER_LEN].copy_from_slice(&self.kdf_params.mem_limit.to_be_bytes());
        out
    }

    /// Parse the header region of `buf`. Trailing bytes are ignored.
    ///
    /// Fields are validated incrementally: length, then magic (including the
    /// reserved gap), then version, before anything else is read.
    pub fn decode(buf: &[u8]) -> Result<Self, FormatError> {
        if buf.len() < HEADER_LEN {
            return Err(FormatError::Truncated {
                expected: HEADER_LEN,
                got: buf.len(),
            });
        }
        if buf[0..4] != MAGIC || buf[4] != RESERVED {
            return Err(FormatError::UnknownMagic);
        }
        if buf[5..7] != VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: [buf[5], buf[6]],
            });
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&buf[SALT_OFFSET..IDENTITY_OFFSET]);

        let mut identity_hash = [0u8; 32];
        identity_hash.copy_from_slice(&buf[IDENTITY_OFFSET..OPS_OFFSET]);

        let ops_limit = u32::from_be_bytes([
            buf[OPS_OFFSET],
            buf[OPS_OFFSET + 1],
            buf[OPS_OFFSET + 2],
            buf[OPS_OFFSET + 3],
        ]);
        let mem_limit = u32::from_be_bytes([
            buf[MEM_OFFSET],
            buf[MEM_OFFSET + 1],
            buf[MEM_OFFSET + 2],
            buf[MEM_OFFSET + 3],
        ]);

        Ok(Self {
            salt,
            identity_hash,
            kdf_params: KdfParams {
                ops_limit,
                mem_limit,
            },
        })
    }

    /// True when `buf` starts with the backup magic tag.
    ///
    /// This is the whole of the "peek" classification: it reads nothing past
    /// the tag region and never fails.
    pub fn has_magic(buf: &[u8]) -> bool {
        buf.len() > 4 && buf[0..4] == MAGIC && buf[4] == RESERVED
    }
}

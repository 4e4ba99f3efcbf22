//! Key derivation
//!
//! Two Argon2id derivations share one salt and one set of cost parameters:
//!
//! `derive_cipher_key`    — passphrase → 32-byte backup encryption key
//! `derive_identity_hash` — user id    → 32-byte identity binding hash
//!
//! The cost parameters are carried in the backup header, so old backups stay
//! decryptable after the defaults change.

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

/// Salt length in bytes. One fresh salt per export.
pub const SALT_LEN: usize = 16;

/// Default iteration cost for new exports.
pub const DEFAULT_OPS_LIMIT: u32 = 3;

/// Default memory cost for new exports, in bytes (64 MiB).
pub const DEFAULT_MEM_LIMIT: u32 = 64 * 1024 * 1024;

/// Cost parameters shared by both derivations.
///
/// One struct on purpose: the cipher key and the identity hash must never be
/// derived with diverging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Iteration count (Argon2 `t_cost`).
    pub ops_limit: u32,
    /// Memory cost in bytes.
    pub mem_limit: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            ops_limit: DEFAULT_OPS_LIMIT,
            mem_limit: DEFAULT_MEM_LIMIT,
        }
    }
}

/// 32-byte backup encryption key. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct CipherKey(pub [u8; 32]);

fn argon2id(params: &KdfParams) -> Result<Argon2<'static>, CryptoError> {
    let params = Params::new(
        params.mem_limit / 1024, // Argon2 m_cost is in KiB, the header stores bytes
        params.ops_limit,
        1, // p_cost: single lane
        Some(32),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn derive(input: &[u8], salt: &[u8; SALT_LEN], params: &KdfParams) -> Result<[u8; 32], CryptoError> {
    let mut output = [0u8; 32];
    argon2id(params)?
        .hash_password_into(input, salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(output)
}

/// Derive the backup encryption key from the user's passphrase.
pub fn derive_cipher_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<CipherKey, CryptoError> {
    derive(password.as_bytes(), salt, params).map(CipherKey)
}

/// Derive the identity binding hash from the exporting user's id.
///
/// Same salt and parameters as the cipher key, different input string. The
/// hash is stored in the clear header as an explicit sanity gate; it does
/// NOT replace AEAD authentication.
pub fn derive_identity_hash(
    user_id: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<[u8; 32], CryptoError> {
    derive(user_id.as_bytes(), salt, params)
}

/// Generate a fresh random salt (one per export; stored in the clear header).
pub fn generate_salt() -> [u8; SALT_LEN] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    // Small costs so the tests stay fast; production defaults are far higher.
    fn test_params() -> KdfParams {
        KdfParams {
            ops_limit: 1,
            mem_limit: 1024 * 1024,
        }
    }

    #[test]
    fn cipher_key_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        let a = derive_cipher_key("hunter2", &salt, &test_params()).unwrap();
        let b = derive_cipher_key("hunter2", &salt, &test_params()).unwrap();
        assert_eq!(a.0, b.0);
    }

    #[test]
    fn salt_changes_the_key() {
        let a = derive_cipher_key("hunter2", &[1u8; SALT_LEN], &test_params()).unwrap();
        let b = derive_cipher_key("hunter2", &[2u8; SALT_LEN], &test_params()).unwrap();
        assert_ne!(a.0, b.0);
    }

    #[test]
    fn cost_parameters_change_the_key() {
        let salt = [7u8; SALT_LEN];
        let a = derive_cipher_key("hunter2", &salt, &test_params()).unwrap();
        let b = derive_cipher_key(
            "hunter2",
            &salt,
            &KdfParams {
                ops_limit: 2,
                mem_limit: 1024 * 1024,
            },
        )
        .unwrap();
        assert_ne!(a.0, b.0);
    }

    #[test]
    fn identity_hash_tracks_the_user_id() {
        let salt = [7u8; SALT_LEN];
        let alice = derive_identity_hash("alice", &salt, &test_params()).unwrap();
        let again = derive_identity_hash("alice", &salt, &test_params()).unwrap();
        let bob = derive_identity_hash("bob", &salt, &test_params()).unwrap();
        assert_eq!(alice, again);
        assert_ne!(alice, bob);
    }

    #[test]
    fn generated_salts_are_unique() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn rejects_degenerate_memory_cost() {
        let err = derive_cipher_key("pw", &[0u8; SALT_LEN], &KdfParams {
            ops_limit: 1,
            mem_limit: 0,
        });
        assert!(matches!(err, Err(CryptoError::KeyDerivation(_))));
    }
}

//! sb_crypto — Satchel Backup cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - Cost parameters travel with the ciphertext, never hard-coded at decode time.
//!
//! # Module layout
//! - `kdf`    — Argon2id derivation of the backup key and the identity hash
//! - `stream` — chunked XChaCha20-Poly1305 streaming encrypt/decrypt
//! - `error`  — unified error type

pub mod error;
pub mod kdf;
pub mod stream;

pub use error::CryptoError;

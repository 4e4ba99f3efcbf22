//! sb_backup — Satchel Backup export and import pipelines
//!
//! Export: buffered entities are validated, encoded with the schema codec,
//! and (when a passphrase is supplied) wrapped in a clear header plus a
//! chunked authenticated ciphertext stream.
//!
//! Import: a cheap `peek` classifies a file as encrypted or plaintext
//! without touching key derivation; `import` runs the format, identity, and
//! authentication gates in that order and exposes the recovered entities
//! through forward-only, memory-bounded pagers.
//!
//! # Modules
//! - `validate`   — per-entity Accept / Drop / Abort policy
//! - `export`     — accumulation buffer and export pipeline
//! - `import`     — peek classification and import pipeline
//! - `pager`      — forward-only page cursors
//! - `passphrase` — passphrase bound to the account it protects
//! - `error`      — failure taxonomy

pub mod error;
pub mod export;
pub mod import;
pub mod pager;
pub mod passphrase;
pub mod validate;

pub use error::BackupError;
pub use export::{ExportOutcome, Exporter};
pub use import::{import, peek, ImportedBackup, Peek};
pub use pager::{Pager, PAGE_SIZE};
pub use passphrase::BackupPassphrase;
pub use validate::{DropEvent, EntityKind, Verdict};

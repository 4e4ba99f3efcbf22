//! sb_proto — Satchel Backup file format types and codecs
//!
//! The on-disk backup file is `clear header || ciphertext stream` when
//! encrypted, or the bare payload bytes when not. The clear header is a
//! fixed-layout byte structure; the payload is a compact schema-defined
//! binary encoding (CBOR) that the pipelines treat as an opaque service.
//!
//! # Modules
//! - `header`   — fixed-layout 63-byte clear header codec
//! - `entities` — domain entities carried in a backup
//! - `payload`  — export metadata + entity collections, and their codec
//! - `error`    — format and codec error types

pub mod entities;
pub mod error;
pub mod header;
pub mod payload;

pub use entities::{Conversation, Message, MessageContent, Reaction, User};
pub use error::{CodecError, FormatError};
pub use header::{BackupHeader, HEADER_LEN, MAGIC, VERSION};
pub use payload::{
    decode_payload, encode_payload, BackupMetadata, BackupPayload, PAYLOAD_FORMAT_VERSION,
};

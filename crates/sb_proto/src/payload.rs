//! Backup payload: export metadata plus the entity collections.
//!
//! Serialised with a compact schema-defined binary encoding (CBOR). The
//! export/import pipelines call [`encode_payload`] / [`decode_payload`] and
//! treat everything in between as an opaque service; nothing else in the
//! codebase depends on the wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Conversation, Message, Reaction, User};
use crate::error::CodecError;

/// Schema version embedded in the payload. Distinct from the clear header's
/// on-disk format version.
pub const PAYLOAD_FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Tag for the platform that produced the export.
    pub platform: String,
    pub format_version: String,
    /// Id of the exporting user.
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupPayload {
    pub metadata: BackupMetadata,
    pub users: Vec<User>,
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub reactions: Vec<Reaction>,
}

pub fn encode_payload(payload: &BackupPayload) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    ciborium::into_writer(payload, &mut out).map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(out)
}

pub fn decode_payload(bytes: &[u8]) -> Result<BackupPayload, CodecError> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

//! Domain entities carried in a backup.
//!
//! Read-only snapshots of the client's local history. Identity fields (ids,
//! conversation/sender references) are what export-time validation checks;
//! the types themselves stay dumb data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub handle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sent_at: DateTime<Utc>,
    pub content: MessageContent,
}

/// Message body variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        body: String,
    },
    Asset {
        filename: String,
        mime_type: String,
        size_bytes: u64,
        /// Hash of the unencrypted content.
        content_hash: String,
        /// Server-side reference for the encrypted blob.
        storage_ref: String,
        /// Decryption key for the blob; empty until the upload completed.
        asset_key: String,
    },
    Location {
        latitude: f64,
        longitude: f64,
        name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub emoji: String,
    pub sent_at: DateTime<Utc>,
}

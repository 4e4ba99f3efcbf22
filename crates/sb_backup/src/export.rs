//! Export pipeline.
//!
//! Entities accumulate in an [`Exporter`] owned by the single in-flight
//! export call. `export` validates the buffer, encodes the survivors with
//! the schema codec, and wraps the payload in `clear header || ciphertext
//! stream` when a passphrase is supplied. With the empty-password sentinel
//! the encoded payload is returned unmodified.

use chrono::Utc;
use tracing::{debug, warn};

use sb_crypto::kdf::{self, KdfParams};
use sb_crypto::stream;
use sb_proto::{
    encode_payload, BackupHeader, BackupMetadata, BackupPayload, Conversation, Message, Reaction,
    User, PAYLOAD_FORMAT_VERSION,
};

use crate::error::BackupError;
use crate::passphrase::BackupPassphrase;
use crate::validate::{self, DropEvent, EntityKind, Verdict};

/// Platform tag embedded in export metadata.
pub const PLATFORM: &str = "satchel";

/// Observer for soft-validation drops. Must not panic.
pub type DropSink = Box<dyn FnMut(&DropEvent) + Send>;

/// Result of a successful export run.
pub struct ExportOutcome {
    /// Complete backup file contents.
    pub bytes: Vec<u8>,
    /// Entities excluded by soft validation, in encounter order.
    pub dropped: Vec<DropEvent>,
}

/// Accumulation buffer for one export run.
///
/// Exclusively owned by the caller; `export` consumes it, so a buffer can
/// never be shared by two concurrent runs or exported twice.
pub struct Exporter {
    users: Vec<User>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    reactions: Vec<Reaction>,
    kdf_params: KdfParams,
    drop_sink: Option<DropSink>,
}

impl Exporter {
    pub fn new() -> Self {
        Self {
            users: Vec::new(),
            conversations: Vec::new(),
            messages: Vec::new(),
            reactions: Vec::new(),
            kdf_params: KdfParams::default(),
            drop_sink: None,
        }
    }

    /// Override the KDF cost parameters for this export. The parameters are
    /// stored in the clear header, so import does not depend on defaults.
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf_params = params;
        self
    }

    /// Install an observer for soft-validation drops. Drops are also logged
    /// and reported in the [`ExportOutcome`]; the sink must not panic.
    pub fn with_drop_sink(mut self, sink: DropSink) -> Self {
        self.drop_sink = Some(sink);
        self
    }

    pub fn add_user(&mut self, user: User) {
        self.users.push(user);
    }

    pub fn add_conversation(&mut self, conversation: Conversation) {
        self.conversations.push(conversation);
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn add_reaction(&mut self, reaction: Reaction) {
        self.reactions.push(reaction);
    }

    /// Produce the backup file contents.
    ///
    /// Any hard validation failure aborts the whole run before a byte is
    /// produced. A cancelled or failed call leaves no usable output; partial
    /// files must be discarded by the caller.
    pub async fn export(
        mut self,
        passphrase: &BackupPassphrase,
    ) -> Result<ExportOutcome, BackupError> {
        let mut dropped = Vec::new();

        let users = sift(
            std::mem::take(&mut self.users),
            EntityKind::User,
            |u| u.id.clone(),
            validate::validate_user,
            &mut dropped,
            &mut self.drop_sink,
        )?;
        let conversations = sift(
            std::mem::take(&mut self.conversations),
            EntityKind::Conversation,
            |c| c.id.clone(),
            validate::validate_conversation,
            &mut dropped,
            &mut self.drop_sink,
        )?;
        let messages = sift(
            std::mem::take(&mut self.messages),
            EntityKind::Message,
            |m| m.id.clone(),
            validate::validate_message,
            &mut dropped,
            &mut self.drop_sink,
        )?;
        let reactions = sift(
            std::mem::take(&mut self.reactions),
            EntityKind::Reaction,
            |r| r.message_id.clone(),
            validate::validate_reaction,
            &mut dropped,
            &mut self.drop_sink,
        )?;

        let payload = BackupPayload {
            metadata: BackupMetadata {
                platform: PLATFORM.into(),
                format_version: PAYLOAD_FORMAT_VERSION.into(),
                user_id: passphrase.user_id.clone(),
                created_at: Utc::now(),
            },
            users,
            conversations,
            messages,
            reactions,
        };
        let encoded = encode_payload(&payload)?;

        if !passphrase.requests_encryption() {
            debug!(bytes = encoded.len(), "plaintext export complete");
            return Ok(ExportOutcome {
                bytes: encoded,
                dropped,
            });
        }

        let salt = kdf::generate_salt();
        let key = kdf::derive_cipher_key(&passphrase.password, &salt, &self.kdf_params)?;
        let identity_hash =
            kdf::derive_identity_hash(&passphrase.user_id, &salt, &self.kdf_params)?;

        let header = BackupHeader {
            salt,
            identity_hash,
            kdf_params: self.kdf_params,
        };

        let mut bytes = Vec::with_capacity(sb_proto::HEADER_LEN + encoded.len());
        bytes.extend_from_slice(&header.encode());
        stream::encrypt(&key, &mut encoded.as_slice(), &mut bytes).await?;

        debug!(bytes = bytes.len(), "encrypted export complete");
        Ok(ExportOutcome { bytes, dropped })
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one entity kind through validation, keeping survivors in order.
fn sift<T>(
    entities: Vec<T>,
    kind: EntityKind,
    entity_id: impl Fn(&T) -> String,
    validate: impl Fn(&T) -> Verdict,
    dropped: &mut Vec<DropEvent>,
    sink: &mut Option<DropSink>,
) -> Result<Vec<T>, BackupError> {
    let mut kept = Vec::with_capacity(entities.len());
    for entity in entities {
        match validate(&entity) {
            Verdict::Accept => kept.push(entity),
            Verdict::Drop(reason) => {
                let event = DropEvent {
                    kind,
                    entity_id: entity_id(&entity),
                    reason,
                };
                warn!(kind = %event.kind, id = %event.entity_id, reason = %event.reason,
                    "entity dropped from export");
                if let Some(sink) = sink.as_mut() {
                    sink(&event);
                }
                dropped.push(event);
            }
            Verdict::Abort(reason) => {
                return Err(BackupError::ValidationAbort { kind, reason });
            }
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sb_proto::MessageContent;
    use std::sync::{Arc, Mutex};

    fn text_message(id: &str) -> Message {
        Message {
            id: id.into(),
            conversation_id: "c-1".into(),
            sender_id: "u-1".into(),
            sent_at: Utc::now(),
            content: MessageContent::Text {
                body: "hello".into(),
            },
        }
    }

    fn pending_asset(id: &str) -> Message {
        Message {
            content: MessageContent::Asset {
                filename: "cat.png".into(),
                mime_type: "image/png".into(),
                size_bytes: 1024,
                content_hash: "abc123".into(),
                storage_ref: "assets/abc123".into(),
                asset_key: String::new(),
            },
            ..text_message(id)
        }
    }

    #[tokio::test]
    async fn hard_invariant_aborts_with_no_output() {
        let mut exporter = Exporter::new();
        exporter.add_message(text_message("m-1"));
        exporter.add_message(text_message("")); // empty id

        let err = exporter
            .export(&BackupPassphrase::unencrypted("u-1"))
            .await;
        assert!(matches!(
            err,
            Err(BackupError::ValidationAbort {
                kind: EntityKind::Message,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn soft_invariant_drops_and_continues() {
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink_events = Arc::clone(&observed);

        let mut exporter = Exporter::new().with_drop_sink(Box::new(move |e: &DropEvent| {
            sink_events.lock().unwrap().push(e.entity_id.clone());
        }));
        exporter.add_message(text_message("m-1"));
        exporter.add_message(pending_asset("m-2"));
        exporter.add_message(text_message("m-3"));

        let outcome = exporter
            .export(&BackupPassphrase::unencrypted("u-1"))
            .await
            .unwrap();

        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.dropped[0].entity_id, "m-2");
        assert_eq!(*observed.lock().unwrap(), vec!["m-2".to_string()]);

        let payload = sb_proto::decode_payload(&outcome.bytes).unwrap();
        let ids: Vec<&str> = payload.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m-1", "m-3"]);
    }

    #[tokio::test]
    async fn plaintext_export_is_the_bare_payload() {
        let mut exporter = Exporter::new();
        exporter.add_user(User {
            id: "u-1".into(),
            name: "Alice".into(),
            handle: "alice".into(),
        });

        let outcome = exporter
            .export(&BackupPassphrase::unencrypted("u-1"))
            .await
            .unwrap();

        let payload = sb_proto::decode_payload(&outcome.bytes).unwrap();
        assert_eq!(payload.metadata.user_id, "u-1");
        assert_eq!(payload.metadata.platform, PLATFORM);
        assert_eq!(payload.users.len(), 1);
    }

    #[tokio::test]
    async fn encrypted_export_starts_with_the_clear_header() {
        let exporter = Exporter::new().with_kdf_params(KdfParams {
            ops_limit: 1,
            mem_limit: 1024 * 1024,
        });

        let outcome = exporter
            .export(&BackupPassphrase::new("hunter2", "u-1"))
            .await
            .unwrap();

        let header = BackupHeader::decode(&outcome.bytes).unwrap();
        assert_eq!(header.kdf_params.ops_limit, 1);
        assert_eq!(header.kdf_params.mem_limit, 1024 * 1024);
        // Header, stream header, one tag-only-ish final chunk at minimum.
        assert!(outcome.bytes.len() > sb_proto::HEADER_LEN + stream::STREAM_HEADER_LEN);
    }

    #[tokio::test]
    async fn fresh_salt_per_export() {
        let params = KdfParams {
            ops_limit: 1,
            mem_limit: 1024 * 1024,
        };
        let passphrase = BackupPassphrase::new("hunter2", "u-1");

        let a = Exporter::new()
            .with_kdf_params(params)
            .export(&passphrase)
            .await
            .unwrap();
        let b = Exporter::new()
            .with_kdf_params(params)
            .export(&passphrase)
            .await
            .unwrap();

        let header_a = BackupHeader::decode(&a.bytes).unwrap();
        let header_b = BackupHeader::decode(&b.bytes).unwrap();
        assert_ne!(header_a.salt, header_b.salt);
        assert_ne!(header_a.identity_hash, header_b.identity_hash);
    }
}

//! Entity validation at export time.
//!
//! Hard invariants abort the whole export; soft invariants drop the entity
//! and the run continues. The distinction is a three-way verdict, not a
//! boolean, so callers and tests can assert the exact classification per
//! entity type.

use std::fmt;

use sb_proto::{Conversation, Message, MessageContent, Reaction, User};

/// Entity kind, for drop and abort reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Conversation,
    Message,
    Reaction,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Conversation => "conversation",
            Self::Message => "message",
            Self::Reaction => "reaction",
        };
        f.write_str(name)
    }
}

/// Validation verdict for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Entity is included in the export.
    Accept,
    /// Entity is excluded; the export continues.
    Drop(String),
    /// The whole export fails.
    Abort(String),
}

/// Emitted to the drop sink for every soft-invariant exclusion.
#[derive(Debug, Clone)]
pub struct DropEvent {
    pub kind: EntityKind,
    pub entity_id: String,
    pub reason: String,
}

pub fn validate_user(user: &User) -> Verdict {
    if user.id.is_empty() {
        return Verdict::Abort("user id is empty".into());
    }
    Verdict::Accept
}

pub fn validate_conversation(conversation: &Conversation) -> Verdict {
    if conversation.id.is_empty() {
        return Verdict::Abort("conversation id is empty".into());
    }
    Verdict::Accept
}

pub fn validate_message(message: &Message) -> Verdict {
    if message.id.is_empty() {
        return Verdict::Abort("message id is empty".into());
    }
    if message.conversation_id.is_empty() {
        return Verdict::Abort("message conversation id is empty".into());
    }
    if message.sender_id.is_empty() {
        return Verdict::Abort("message sender id is empty".into());
    }
    match &message.content {
        MessageContent::Text { body } => {
            if body.is_empty() {
                return Verdict::Abort("text message body is empty".into());
            }
            Verdict::Accept
        }
        MessageContent::Location {
            latitude,
            longitude,
            ..
        } => {
            if !latitude.is_finite()
                || !longitude.is_finite()
                || *latitude == 0.0
                || *longitude == 0.0
            {
                return Verdict::Abort("location coordinates are zero or not finite".into());
            }
            Verdict::Accept
        }
        MessageContent::Asset {
            content_hash,
            asset_key,
            ..
        } => {
            // Asset crypto material that never finished uploading is a known
            // state, not a corrupt history: skip the message, keep the run.
            if asset_key.is_empty() {
                return Verdict::Drop("asset key missing".into());
            }
            if content_hash.is_empty() {
                return Verdict::Drop("asset content hash missing".into());
            }
            Verdict::Accept
        }
    }
}

pub fn validate_reaction(reaction: &Reaction) -> Verdict {
    if reaction.message_id.is_empty() {
        return Verdict::Abort("reaction message id is empty".into());
    }
    if reaction.conversation_id.is_empty() {
        return Verdict::Abort("reaction conversation id is empty".into());
    }
    if reaction.sender_id.is_empty() {
        return Verdict::Abort("reaction sender id is empty".into());
    }
    Verdict::Accept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn text_message() -> Message {
        Message {
            id: "m-1".into(),
            conversation_id: "c-1".into(),
            sender_id: "u-1".into(),
            sent_at: Utc::now(),
            content: MessageContent::Text {
                body: "hello".into(),
            },
        }
    }

    fn asset_message() -> Message {
        Message {
            content: MessageContent::Asset {
                filename: "cat.png".into(),
                mime_type: "image/png".into(),
                size_bytes: 1024,
                content_hash: "abc123".into(),
                storage_ref: "assets/abc123".into(),
                asset_key: "a2V5".into(),
            },
            ..text_message()
        }
    }

    #[test]
    fn valid_entities_are_accepted() {
        assert_eq!(
            validate_user(&User {
                id: "u-1".into(),
                name: "Alice".into(),
                handle: "alice".into()
            }),
            Verdict::Accept
        );
        assert_eq!(validate_message(&text_message()), Verdict::Accept);
        assert_eq!(validate_message(&asset_message()), Verdict::Accept);
    }

    #[test]
    fn empty_identity_fields_abort() {
        let m = Message {
            id: String::new(),
            ..text_message()
        };
        assert!(matches!(validate_message(&m), Verdict::Abort(_)));

        let m = Message {
            conversation_id: String::new(),
            ..text_message()
        };
        assert!(matches!(validate_message(&m), Verdict::Abort(_)));

        let m = Message {
            sender_id: String::new(),
            ..text_message()
        };
        assert!(matches!(validate_message(&m), Verdict::Abort(_)));

        assert!(matches!(
            validate_user(&User {
                id: String::new(),
                name: "Alice".into(),
                handle: "alice".into()
            }),
            Verdict::Abort(_)
        ));
        assert!(matches!(
            validate_conversation(&Conversation {
                id: String::new(),
                name: "general".into()
            }),
            Verdict::Abort(_)
        ));
    }

    #[test]
    fn empty_text_body_aborts() {
        let m = Message {
            content: MessageContent::Text {
                body: String::new(),
            },
            ..text_message()
        };
        assert!(matches!(validate_message(&m), Verdict::Abort(_)));
    }

    #[test]
    fn bad_location_coordinates_abort() {
        for (lat, lon) in [(f64::NAN, 1.0), (1.0, f64::INFINITY), (0.0, 0.0), (0.0, 9.5)] {
            let m = Message {
                content: MessageContent::Location {
                    latitude: lat,
                    longitude: lon,
                    name: None,
                },
                ..text_message()
            };
            assert!(
                matches!(validate_message(&m), Verdict::Abort(_)),
                "({lat}, {lon}) should abort"
            );
        }

        let m = Message {
            content: MessageContent::Location {
                latitude: 47.37,
                longitude: 8.54,
                name: Some("Zurich".into()),
            },
            ..text_message()
        };
        assert_eq!(validate_message(&m), Verdict::Accept);
    }

    #[test]
    fn asset_without_crypto_material_is_dropped_not_aborted() {
        let no_key = Message {
            content: MessageContent::Asset {
                filename: "cat.png".into(),
                mime_type: "image/png".into(),
                size_bytes: 1024,
                content_hash: "abc123".into(),
                storage_ref: "assets/abc123".into(),
                asset_key: String::new(),
            },
            ..text_message()
        };
        assert!(matches!(validate_message(&no_key), Verdict::Drop(_)));

        let no_hash = Message {
            content: MessageContent::Asset {
                filename: "cat.png".into(),
                mime_type: "image/png".into(),
                size_bytes: 1024,
                content_hash: String::new(),
                storage_ref: "assets/abc123".into(),
                asset_key: "a2V5".into(),
            },
            ..text_message()
        };
        assert!(matches!(validate_message(&no_hash), Verdict::Drop(_)));
    }

    #[test]
    fn reaction_identity_fields_abort_when_empty() {
        let valid = Reaction {
            message_id: "m-1".into(),
            conversation_id: "c-1".into(),
            sender_id: "u-1".into(),
            emoji: "👍".into(),
            sent_at: Utc::now(),
        };
        assert_eq!(validate_reaction(&valid), Verdict::Accept);

        let r = Reaction {
            message_id: String::new(),
            ..valid.clone()
        };
        assert!(matches!(validate_reaction(&r), Verdict::Abort(_)));
    }
}

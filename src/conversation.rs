//! Assembling a [`Conversation`] from one flattened UID sequence.

use sha1::{Digest, Sha1};
use tracing::warn;

use crate::model::message::{placeholder_body, Conversation, Message, Uid};
use crate::normalize::Normalizer;
use crate::store::raw::RawStore;

/// Conversation identifier: lowercase hex SHA-1 of the given bytes.
///
/// Applied to the first message's raw bytes, or to its placeholder body text
/// when those bytes were never fetched.
pub fn conversation_id(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Builds conversations from the raw store, one sequence at a time.
pub struct ConversationBuilder<'a> {
    store: &'a RawStore,
    normalizer: &'a Normalizer,
}

impl<'a> ConversationBuilder<'a> {
    pub fn new(store: &'a RawStore, normalizer: &'a Normalizer) -> Self {
        Self { store, normalizer }
    }

    /// Build the conversation for `uids`, preserving their order.
    ///
    /// Every UID yields exactly one message; UIDs without raw bytes become
    /// `"Missing <uid>"` placeholders. Returns `None` for an empty sequence.
    pub fn build(&self, uids: &[Uid]) -> Option<Conversation> {
        let (&primary, _) = uids.split_first()?;

        let mut id = None;
        let mut messages = Vec::with_capacity(uids.len());
        for (position, &uid) in uids.iter().enumerate() {
            let message = match self.load(uid) {
                Some(raw) => {
                    if position == 0 {
                        id = Some(conversation_id(&raw));
                    }
                    self.normalizer.normalize(uid, &raw)
                }
                None => Message::placeholder(uid),
            };
            messages.push(message);
        }

        let id = id.unwrap_or_else(|| {
            warn!(uid = primary, "First message of thread missing, identifier derived from placeholder");
            conversation_id(placeholder_body(primary).as_bytes())
        });

        Some(Conversation::new(id, messages))
    }

    /// Raw bytes for `uid`, treating read errors like a missing message.
    fn load(&self, uid: Uid) -> Option<Vec<u8>> {
        match self.store.get(uid) {
            Ok(Some(raw)) => Some(raw),
            Ok(None) => {
                warn!(uid, "Not fetched");
                None
            }
            Err(e) => {
                warn!(uid, error = %e, "Could not read raw message");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::RawMessage;

    fn store_with(dir: &std::path::Path, messages: &[(Uid, &str)]) -> RawStore {
        let store = RawStore::open(dir).unwrap();
        for (uid, content) in messages {
            store
                .put(&RawMessage {
                    uid: *uid,
                    content: content.as_bytes().to_vec(),
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_conversation_id_is_sha1_hex() {
        assert_eq!(conversation_id(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        let id = conversation_id(b"Subject: x\r\n\r\n");
        assert_eq!(id.len(), 40);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_build_keeps_order_and_hashes_first() {
        let tmp = tempfile::tempdir().unwrap();
        let first = "Subject: one\r\n\r\nfirst";
        let store = store_with(
            tmp.path(),
            &[(101, first), (102, "Subject: two\r\n\r\nsecond"), (103, "Subject: three\r\n\r\nthird")],
        );
        let normalizer = Normalizer::default();
        let conv = ConversationBuilder::new(&store, &normalizer)
            .build(&[101, 102, 103])
            .unwrap();
        assert_eq!(conv.id, conversation_id(first.as_bytes()));
        assert_eq!(conv.count, 3);
        let uids: Vec<Uid> = conv.messages.iter().map(|m| m.uid).collect();
        assert_eq!(uids, vec![101, 102, 103]);
        assert_eq!(conv.messages[2].body, "third");
    }

    #[test]
    fn test_build_with_missing_message() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with(
            tmp.path(),
            &[(101, "Subject: a\r\n\r\nA"), (103, "Subject: c\r\n\r\nC")],
        );
        let normalizer = Normalizer::default();
        let conv = ConversationBuilder::new(&store, &normalizer)
            .build(&[101, 102, 103])
            .unwrap();
        assert_eq!(conv.count, 3);
        assert_eq!(conv.messages[1].body, "Missing 102");
        assert!(conv.messages[1].header.is_none());
    }

    #[test]
    fn test_missing_primary_uses_placeholder_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with(tmp.path(), &[(2, "Subject: b\r\n\r\nB")]);
        let normalizer = Normalizer::default();
        let builder = ConversationBuilder::new(&store, &normalizer);
        let conv = builder.build(&[1, 2]).unwrap();
        assert_eq!(conv.id, conversation_id(b"Missing 1"));
        assert_eq!(conv.count, 2);
        // Stable across runs
        assert_eq!(builder.build(&[1, 2]).unwrap().id, conv.id);
    }

    #[test]
    fn test_empty_sequence() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with(tmp.path(), &[]);
        let normalizer = Normalizer::default();
        assert!(ConversationBuilder::new(&store, &normalizer).build(&[]).is_none());
    }
}

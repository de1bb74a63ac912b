//! Normalized message, conversation, and summary records.
//!
//! Field names on the wire follow the archive's document format
//! (`Id`/`Count`/`Msgs`, `Header`/`UID`/`Date`/`Body`), which the landing
//! page reads directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::address::EmailAddress;

/// Mail-store message identifier (IMAP UID).
pub type Uid = u32;

/// Raw bytes of one message as fetched from the mail store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub uid: Uid,
    pub content: Vec<u8>,
}

/// Value kept for a header after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    /// Header that occurred once.
    Text(String),
    /// Header that occurred several times, values in message order.
    List(Vec<String>),
    /// `To` / `From` / `Cc` after structured parsing.
    Addresses(Vec<EmailAddress>),
}

/// Header map of a normalized message. Sorted so documents are stable.
pub type HeaderMap = BTreeMap<String, HeaderValue>;

/// A normalized message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Pruned headers; `None` for placeholders of messages we never fetched.
    #[serde(rename = "Header")]
    pub header: Option<HeaderMap>,

    #[serde(rename = "UID")]
    pub uid: Uid,

    /// RFC 3339 date, or the raw `Date` header when it could not be parsed.
    #[serde(rename = "Date")]
    pub date: String,

    /// Plain-text body.
    #[serde(rename = "Body")]
    pub body: String,
}

impl Message {
    /// Stand-in for a message whose raw bytes are not in the store.
    pub fn placeholder(uid: Uid) -> Self {
        Self {
            header: None,
            uid,
            date: String::new(),
            body: placeholder_body(uid),
        }
    }
}

/// Body text used for a message that could not be loaded.
pub fn placeholder_body(uid: Uid) -> String {
    format!("Missing {uid}")
}

/// One flattened thread, fully normalized.
///
/// `count` always equals `messages.len()`; construct through
/// [`Conversation::new`] to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Lowercase hex SHA-1 of the first message's raw bytes.
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Msgs")]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: String, messages: Vec<Message>) -> Self {
        Self {
            id,
            count: messages.len(),
            messages,
        }
    }

    /// Index entry for the summary document: first message only, body cleared.
    pub fn summary(&self) -> SummaryEntry {
        let first = self.messages.first().map(|m| Message {
            body: String::new(),
            ..m.clone()
        });
        SummaryEntry {
            id: self.id.clone(),
            count: self.count,
            messages: first.into_iter().collect(),
        }
    }
}

/// Entry of the summary document (`mail.json`).
///
/// Same shape as a [`Conversation`], but `count` keeps the full
/// conversation size while `messages` holds at most one bodiless message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Msgs")]
    pub messages: Vec<Message>,
}

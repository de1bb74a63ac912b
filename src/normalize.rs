//! Turning one raw message into a compact [`Message`] record.
//!
//! Normalization never fails: a multi-part body that cannot be decoded
//! becomes an error description, an unparsable `Date` is kept verbatim, and
//! an address header that cannot be parsed is dropped.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::model::address::EmailAddress;
use crate::model::message::{HeaderMap, HeaderValue, Message, Uid};
use crate::parser::{header, mime};

/// Headers removed from every message to keep the archive small.
///
/// Names are in canonical form (see [`header::canonical_name`]).
pub const PRUNED_HEADERS: &[&str] = &[
    "Accept-Language",
    "Content-Disposition",
    "Content-Language",
    "Content-Transfer-Encoding",
    "Content-Type",
    "Delivered-To",
    "Dkim-Signature",
    "Errors-To",
    "In-Reply-To",
    "List-Archive",
    "List-Help",
    "List-Id",
    "List-Post",
    "List-Subscribe",
    "List-Unsubscribe",
    "Message-Id",
    "Mime-Version",
    "Precedence",
    "Received",
    "References",
    "Reply-To",
    "Resent-Cc",
    "Resent-Date",
    "Resent-From",
    "Resent-Message-Id",
    "Resent-Sender",
    "Resent-To",
    "Return-Path",
    "Sender",
    "Thread-Index",
    "Thread-Topic",
    "User-Agent",
];

/// Every header starting with this prefix is pruned as well.
pub const PRUNED_PREFIX: &str = "X-";

/// Headers replaced by a structured address list when they parse.
const ADDRESS_HEADERS: [&str; 3] = ["To", "From", "Cc"];

/// The set of header names dropped during normalization.
///
/// Built once at startup from [`PRUNED_HEADERS`] plus any names added in the
/// configuration file.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    denylist: HashSet<String>,
}

impl HeaderPolicy {
    /// Built-in denylist extended with `extra` names (any capitalization).
    pub fn new(extra: &[String]) -> Self {
        let denylist = PRUNED_HEADERS
            .iter()
            .map(|name| name.to_string())
            .chain(extra.iter().map(|name| header::canonical_name(name.trim())))
            .collect();
        Self { denylist }
    }

    /// Whether a canonical header name must be removed.
    pub fn is_pruned(&self, name: &str) -> bool {
        name.starts_with(PRUNED_PREFIX) || self.denylist.contains(name)
    }
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Normalizes raw messages under a fixed [`HeaderPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    policy: HeaderPolicy,
}

impl Normalizer {
    pub fn new(policy: HeaderPolicy) -> Self {
        Self { policy }
    }

    /// Build the normalized record for one message.
    pub fn normalize(&self, uid: Uid, raw: &[u8]) -> Message {
        let (header_bytes, body_bytes) = header::split_message(raw);
        let headers = header::parse_header_block(&header::decode_header_bytes(header_bytes));

        let mut subject_override = None;
        let body = match mime::content_type(&headers).filter(|ct| mime::is_multipart(ct)) {
            Some(ct) => match mime::extract_text(raw, ct) {
                Ok(decoded) => {
                    subject_override = decoded.subject;
                    decoded.text
                }
                Err(e) => {
                    warn!(uid, error = %e, "Could not extract text from multipart message");
                    e.to_string()
                }
            },
            None => String::from_utf8_lossy(body_bytes).into_owned(),
        };

        let mut date = None;
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in headers {
            if self.policy.is_pruned(&name) {
                continue;
            }
            if name == "Date" {
                date.get_or_insert(value);
                continue;
            }
            grouped.entry(name).or_default().push(value);
        }
        if let Some(subject) = subject_override {
            grouped.insert("Subject".to_string(), vec![subject]);
        }

        let date = match date {
            Some(raw_date) => match header::canonical_date(&raw_date) {
                Some(iso) => iso,
                None => {
                    warn!(uid, date = %raw_date, "Could not parse date, keeping it verbatim");
                    raw_date
                }
            },
            None => String::new(),
        };

        let mut header_map: HeaderMap = grouped
            .into_iter()
            .map(|(name, mut values)| {
                let value = if values.len() == 1 {
                    HeaderValue::Text(values.remove(0))
                } else {
                    HeaderValue::List(values)
                };
                (name, value)
            })
            .collect();

        for name in ADDRESS_HEADERS {
            let Some(value) = header_map.remove(name) else {
                continue;
            };
            let joined = match value {
                HeaderValue::Text(text) => text,
                HeaderValue::List(values) => values.join(", "),
                HeaderValue::Addresses(addrs) => {
                    header_map.insert(name.to_string(), HeaderValue::Addresses(addrs));
                    continue;
                }
            };
            match EmailAddress::parse_list(&joined) {
                Ok(addrs) => {
                    header_map.insert(name.to_string(), HeaderValue::Addresses(addrs));
                }
                Err(e) => {
                    debug!(uid, header = name, error = %e, "Dropping unparsable address header");
                }
            }
        }

        Message {
            header: Some(header_map),
            uid,
            date,
            body,
        }
    }
}

//! Multi-part detection and plain-text extraction.

use mail_parser::MessageParser;

use crate::error::{ArchiveError, Result};

/// Decoded content of a multi-part message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeText {
    /// Decoded plain-text body (HTML-only messages are rendered to text).
    pub text: String,
    /// Decoded `Subject`, when the message has one.
    pub subject: Option<String>,
}

/// Return the `Content-Type` value from an unfolded header list.
pub fn content_type(headers: &[(String, String)]) -> Option<&str> {
    headers
        .iter()
        .find(|(k, _)| k == "Content-Type")
        .map(|(_, v)| v.as_str())
}

/// Whether a `Content-Type` value names a `multipart/*` media type.
pub fn is_multipart(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|media| media.trim().to_ascii_lowercase().starts_with("multipart/"))
        .unwrap_or(false)
}

/// Extract the decoded plain-text body of a multi-part message.
///
/// Fails when the content type has no `boundary`, when `mail-parser` cannot
/// make sense of the bytes, or when no textual part exists.
pub fn extract_text(raw_message: &[u8], content_type: &str) -> Result<MimeText> {
    if boundary(content_type).is_none() {
        return Err(ArchiveError::Mime(
            "multipart content without boundary parameter".into(),
        ));
    }

    let msg = MessageParser::default()
        .parse(raw_message)
        .ok_or_else(|| ArchiveError::Mime("unable to parse MIME structure".into()))?;

    let text = msg
        .body_text(0)
        .map(|s| s.into_owned())
        .ok_or_else(|| ArchiveError::Mime("no text part in multipart message".into()))?;

    Ok(MimeText {
        text,
        subject: msg.subject().map(str::to_string),
    })
}

/// The `boundary` parameter of a `Content-Type` value, unquoted.
fn boundary(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("boundary") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then_some(value)
        } else {
            None
        }
    })
}

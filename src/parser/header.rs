//! RFC 5322 header block handling: splitting, unfolding, name canonicalization,
//! encoded-words (RFC 2047), and `Date` canonicalization.

use chrono::{DateTime, SecondsFormat};
use mail_parser::MessageParser;

/// Layout of a `Date` header as sent by well-behaved clients
/// (`Mon, 02 Jan 2006 15:04:05 -0700`).
const RFC1123Z: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Split a raw message into header bytes and body bytes at the first blank line.
///
/// Lines may end in `\n` or `\r\n`, mixed freely. A message without a blank
/// line is all headers and has an empty body.
pub fn split_message(data: &[u8]) -> (&[u8], &[u8]) {
    let mut line_start = 0;
    while line_start < data.len() {
        let rest = &data[line_start..];
        if rest.starts_with(b"\n") {
            return (&data[..line_start], &data[line_start + 1..]);
        }
        if rest.starts_with(b"\r\n") {
            return (&data[..line_start], &data[line_start + 2..]);
        }
        match rest.iter().position(|&b| b == b'\n') {
            Some(end) => line_start += end + 1,
            None => break,
        }
    }
    (data, &[])
}

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
pub fn decode_header_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Unfold a header block into `(canonical_name, value)` pairs in message order.
///
/// Continuation lines (starting with space or tab) are joined to the previous
/// header with a single space. Lines that are neither a header nor a
/// continuation are dropped.
pub fn parse_header_block(text: &str) -> Vec<(String, String)> {
    let mut result: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = result.last_mut() {
                let continuation = line.trim();
                if !continuation.is_empty() {
                    if !last.1.is_empty() {
                        last.1.push(' ');
                    }
                    last.1.push_str(continuation);
                }
            }
        } else if let Some(colon_pos) = line.find(':') {
            let name = line[..colon_pos].trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                continue;
            }
            let value = line[colon_pos + 1..].trim().to_string();
            result.push((canonical_name(name), value));
        }
    }

    result
}

/// Canonical header name: first letter and every letter after a hyphen
/// uppercase, the rest lowercase (`message-ID` → `Message-Id`, `CC` → `Cc`).
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for ch in name.chars() {
        if upper {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        upper = ch == '-';
    }
    out
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Values without encoded-words, or that `mail-parser` cannot decode, come
/// back unchanged.
pub fn decode_encoded_words(input: &str) -> String {
    if !input.contains("=?") {
        return input.to_string();
    }
    // Wrap the value in a minimal message so mail-parser decodes it for us
    let fake_msg = format!("Subject: {input}\n\n");
    MessageParser::default()
        .parse(fake_msg.as_bytes())
        .and_then(|msg| msg.subject().map(str::to_string))
        .unwrap_or_else(|| input.to_string())
}

/// Reformat an RFC 1123 date with numeric zone as RFC 3339.
///
/// Returns `None` when the value does not match that layout exactly; callers
/// keep the original text in that case.
pub fn canonical_date(date_str: &str) -> Option<String> {
    DateTime::parse_from_str(date_str.trim(), RFC1123Z)
        .ok()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

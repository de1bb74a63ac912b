//! Email address lists (RFC 5322 §3.4).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::header::decode_encoded_words;

/// A parsed mailbox: display name plus bare address.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    #[serde(rename = "Name")]
    pub display_name: String,
    /// The bare email address (`user@domain`).
    #[serde(rename = "Address")]
    pub address: String,
}

/// Why an address header could not be turned into a list.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("address list is empty")]
    Empty,
    #[error("unbalanced quote or angle bracket")]
    Unbalanced,
    #[error("invalid address '{0}'")]
    Invalid(String),
}

impl EmailAddress {
    /// Parse a single mailbox.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        if let Some(angle_start) = trimmed.rfind('<') {
            let angle_end = trimmed.rfind('>').ok_or(AddressError::Unbalanced)?;
            if angle_end < angle_start || !trimmed[angle_end + 1..].trim().is_empty() {
                return Err(AddressError::Invalid(trimmed.to_string()));
            }
            let address = trimmed[angle_start + 1..angle_end].trim();
            if !is_addr_spec(address) {
                return Err(AddressError::Invalid(trimmed.to_string()));
            }
            let display_name = decode_encoded_words(&strip_quotes(&trimmed[..angle_start]));
            return Ok(Self {
                display_name,
                address: address.to_string(),
            });
        }

        if is_addr_spec(trimmed) {
            return Ok(Self {
                display_name: String::new(),
                address: trimmed.to_string(),
            });
        }

        Err(AddressError::Invalid(trimmed.to_string()))
    }

    /// Parse a comma-separated list of addresses.
    ///
    /// Handles quoted commas: `"Last, First" <a@b.com>, other@c.com`.
    /// Any malformed entry fails the whole list.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, AddressError> {
        let mut results = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut in_angle = false;

        for ch in raw.chars() {
            match ch {
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(ch);
                }
                '<' if !in_quotes => {
                    in_angle = true;
                    current.push(ch);
                }
                '>' if !in_quotes => {
                    in_angle = false;
                    current.push(ch);
                }
                ',' if !in_quotes && !in_angle => {
                    // Empty elements between commas are tolerated
                    if !current.trim().is_empty() {
                        results.push(Self::parse(&current)?);
                    }
                    current.clear();
                }
                _ => current.push(ch),
            }
        }

        if in_quotes || in_angle {
            return Err(AddressError::Unbalanced);
        }
        if !current.trim().is_empty() {
            results.push(Self::parse(&current)?);
        }

        if results.is_empty() {
            return Err(AddressError::Empty);
        }
        Ok(results)
    }
}

/// `local@domain` with no whitespace on either side of the `@`.
fn is_addr_spec(s: &str) -> bool {
    match s.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !s.chars().any(|c| c.is_whitespace() || c == '<' || c == '>')
        }
        None => false,
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

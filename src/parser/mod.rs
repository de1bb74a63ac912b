//! Structured-email parsing: header blocks, encoded-words, dates, and MIME bodies.

pub mod header;
pub mod mime;

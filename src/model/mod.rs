//! Core data model: raw and normalized messages, conversations, addresses.

pub mod address;
pub mod message;

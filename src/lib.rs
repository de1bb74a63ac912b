//! `threadarchive`: mirror an IMAP mailbox into a static, conversation-grouped
//! JSON archive.
//!
//! A run has two phases. The fetch phase asks the server for its thread
//! structure, then stores every message's raw bytes under `raw/`. The build
//! phase normalizes those bytes and writes one document per conversation
//! plus a summary index, next to a static HTML viewer.

pub mod archive;
pub mod config;
pub mod conversation;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod thread;

//! Mail-store session: mailbox URL, credentials, and the IMAP client.

pub mod client;
pub mod netrc;
pub mod url;

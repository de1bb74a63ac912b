//! Blocking IMAP session: connect, authenticate, open the mailbox, ask for
//! the thread structure, and stream message bodies.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::url::{Credentials, MailboxUrl};
use crate::error::{ArchiveError, Result};
use crate::model::message::{RawMessage, Uid};
use crate::thread::{parse_thread_response, ThreadNode};

/// Capability advertised by servers implementing RFC 5256 reference threading.
const THREAD_CAPABILITY: &str = "THREAD=REFERENCES";
const THREAD_COMMAND: &str = "UID THREAD REFERENCES UTF-8 ALL";
const FETCH_ITEMS: &str = "(UID BODY.PEEK[])";

/// Byte stream under the IMAP client, plain or TLS.
pub trait Transport: Read + Write + Send {}
impl<T: Read + Write + Send> Transport for T {}

type Stream = Box<dyn Transport>;

/// A connected, not yet authenticated server.
pub struct Connection {
    client: imap::Client<Stream>,
    socket: TcpStream,
    host: String,
}

impl Connection {
    /// Open a TCP (and for `imaps`, TLS) connection and read the greeting.
    ///
    /// `debug` turns on the client's raw protocol trace on stderr.
    pub fn connect(url: &MailboxUrl, debug: bool) -> Result<Self> {
        let connect_err = |reason: String| ArchiveError::Connect {
            host: url.host.clone(),
            reason,
        };

        let socket = TcpStream::connect((url.host.as_str(), url.port))
            .map_err(|e| connect_err(e.to_string()))?;
        debug!(host = %url.host, port = url.port, "TCP connection established");
        let control = socket.try_clone().map_err(|e| connect_err(e.to_string()))?;

        let stream: Stream = if url.secure {
            info!(host = %url.host, "Making a secure connection");
            let tls = native_tls::TlsConnector::builder()
                .build()
                .map_err(|e| connect_err(e.to_string()))?;
            Box::new(
                tls.connect(&url.host, socket)
                    .map_err(|e| connect_err(e.to_string()))?,
            )
        } else {
            Box::new(socket)
        };

        let mut client = imap::Client::new(stream);
        client.debug = debug;
        client
            .read_greeting()
            .map_err(|e| connect_err(e.to_string()))?;

        Ok(Self {
            client,
            socket: control,
            host: url.host.clone(),
        })
    }

    /// Log in with `credentials`, or anonymously when there are none.
    pub fn authenticate(self, credentials: Option<&Credentials>) -> Result<MailSession> {
        let host = self.host;
        let session = match credentials {
            Some(creds) => {
                info!(user = %creds.username, "Logging in");
                self.client
                    .login(&creds.username, &creds.password)
                    .map_err(|(e, _)| ArchiveError::Login {
                        host: host.clone(),
                        reason: e.to_string(),
                    })?
            }
            None => {
                info!("Logging in anonymously");
                self.client
                    .authenticate("ANONYMOUS", &Anonymous)
                    .map_err(|(e, _)| ArchiveError::Login {
                        host: host.clone(),
                        reason: e.to_string(),
                    })?
            }
        };
        Ok(MailSession {
            session,
            socket: self.socket,
            host,
        })
    }
}

/// SASL ANONYMOUS (RFC 4505): the trace string is all we send.
struct Anonymous;

impl imap::Authenticator for Anonymous {
    type Response = &'static str;

    fn process(&self, _challenge: &[u8]) -> Self::Response {
        "anonymous"
    }
}

/// An authenticated session.
pub struct MailSession {
    session: imap::Session<Stream>,
    socket: TcpStream,
    host: String,
}

impl MailSession {
    /// Open `mailbox` read-only. Returns the number of messages in it.
    pub fn select(&mut self, mailbox: &str) -> Result<u32> {
        let info = self.session.examine(mailbox)?;
        info!(mailbox, exists = info.exists, "Selected mailbox");
        Ok(info.exists)
    }

    /// Ask the server how the mailbox's messages group into threads.
    ///
    /// Fails with [`ArchiveError::ThreadUnsupported`] if the server lacks
    /// reference threading.
    pub fn threads(&mut self) -> Result<Vec<ThreadNode>> {
        let supported = self.session.capabilities()?.has_str(THREAD_CAPABILITY);
        if !supported {
            return Err(ArchiveError::ThreadUnsupported {
                host: self.host.clone(),
            });
        }

        let response = self
            .session
            .run_command_and_read_response(THREAD_COMMAND)
            .map_err(|e| {
                warn!(error = %e, "THREAD command rejected");
                ArchiveError::ThreadUnsupported {
                    host: self.host.clone(),
                }
            })?;
        parse_thread_response(&response)
    }

    /// Stream every message of the selected mailbox, `batch_size` UIDs per
    /// `UID FETCH`.
    pub fn fetch_all(&mut self, batch_size: usize) -> Result<FetchStream<'_>> {
        let mut uids: Vec<Uid> = self.session.uid_search("ALL")?.into_iter().collect();
        uids.sort_unstable();
        debug!(count = uids.len(), "Messages to fetch");
        Ok(FetchStream::new(&mut self.session, uids, batch_size))
    }

    /// Log out, giving the server at most `timeout` to answer.
    ///
    /// Errors are logged; the archive no longer depends on the session.
    pub fn logout(mut self, timeout: Duration) {
        let timeout = (!timeout.is_zero()).then_some(timeout);
        if let Err(e) = self.socket.set_read_timeout(timeout) {
            warn!(error = %e, "Could not set logout timeout");
        }
        match self.session.logout() {
            Ok(()) => debug!("Logged out"),
            Err(e) => warn!(error = %e, "Logout failed"),
        }
    }
}

/// Lazy, finite, non-restartable stream of fetched messages.
///
/// Each batch is requested only once the previous one has been consumed.
/// After an error the stream ends.
pub struct FetchStream<'a> {
    session: &'a mut imap::Session<Stream>,
    batches: VecDeque<Vec<Uid>>,
    ready: VecDeque<RawMessage>,
    total: usize,
    finished: bool,
}

impl<'a> FetchStream<'a> {
    fn new(session: &'a mut imap::Session<Stream>, uids: Vec<Uid>, batch_size: usize) -> Self {
        let total = uids.len();
        let batches = uids
            .chunks(batch_size.max(1))
            .map(<[Uid]>::to_vec)
            .collect();
        Self {
            session,
            batches,
            ready: VecDeque::new(),
            total,
            finished: false,
        }
    }

    /// Number of UIDs the server reported when the stream was opened.
    pub fn total(&self) -> usize {
        self.total
    }

    fn fetch_batch(&mut self, batch: &[Uid]) -> Result<()> {
        let set = uid_set(batch);
        debug!(uids = batch.len(), "Fetching batch");
        let fetches = self.session.uid_fetch(&set, FETCH_ITEMS)?;
        for fetch in fetches.iter() {
            match (fetch.uid, fetch.body()) {
                (Some(uid), Some(body)) => self.ready.push_back(RawMessage {
                    uid,
                    content: body.to_vec(),
                }),
                _ => warn!(seq = fetch.message, "Skipping fetch response without UID or body"),
            }
        }
        Ok(())
    }
}

impl Iterator for FetchStream<'_> {
    type Item = Result<RawMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(message) = self.ready.pop_front() {
                return Some(Ok(message));
            }
            if self.finished {
                return None;
            }
            let Some(batch) = self.batches.pop_front() else {
                self.finished = true;
                return None;
            };
            if let Err(e) = self.fetch_batch(&batch) {
                self.finished = true;
                self.batches.clear();
                return Some(Err(e));
            }
        }
    }
}

/// Compact IMAP sequence set for sorted UIDs: `[1,2,3,7,9,10]` → `"1:3,7,9:10"`.
pub fn uid_set(uids: &[Uid]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = uids.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(&next) = iter.peek() {
            if Some(next) != end.checked_add(1) {
                break;
            }
            end = next;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{start}:{end}"));
        }
    }
    parts.join(",")
}

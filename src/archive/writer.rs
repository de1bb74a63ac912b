//! Writing conversation documents, the summary index, and the landing page.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::model::message::{Conversation, SummaryEntry};

/// Default landing page; `VERSION` is replaced with the crate version.
const LANDING_PAGE: &str = include_str!("../../assets/index.html");

/// Writes archive documents under a fixed layout.
///
/// ```text
/// <output_dir>/
///   c/<id>.json   ← one per conversation
///   mail.json     ← summary of all conversations
///   index.html    ← written once, never overwritten
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    conversation_dir: PathBuf,
    summary_path: PathBuf,
    landing_path: PathBuf,
}

impl ArchiveWriter {
    /// Prepare the writer, creating the conversation directory.
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        let conversation_dir = config.conversation_path();
        std::fs::create_dir_all(&conversation_dir)
            .map_err(|e| ArchiveError::io(&conversation_dir, e))?;
        Ok(Self {
            conversation_dir,
            summary_path: config.summary_path(),
            landing_path: config.landing_path(),
        })
    }

    /// Path of the document for a conversation identifier.
    pub fn conversation_path(&self, id: &str) -> PathBuf {
        self.conversation_dir.join(format!("{id}.json"))
    }

    /// Write the full conversation document. Returns its path.
    pub fn write_conversation(&self, conversation: &Conversation) -> Result<PathBuf> {
        let path = self.conversation_path(&conversation.id);
        write_json(&path, conversation)?;
        info!(id = %conversation.id, count = conversation.count, "Wrote conversation");
        Ok(path)
    }

    /// Write the summary document, one entry per conversation in the given order.
    pub fn write_summary(&self, entries: &[SummaryEntry]) -> Result<PathBuf> {
        write_json(&self.summary_path, entries)?;
        info!(
            path = %self.summary_path.display(),
            conversations = entries.len(),
            "Wrote summary"
        );
        Ok(self.summary_path.clone())
    }

    /// Write the default landing page unless one already exists.
    ///
    /// Returns `true` if the page was created.
    pub fn ensure_landing_page(&self) -> Result<bool> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.landing_path);
        let mut file = match file {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %self.landing_path.display(), "Landing page exists, leaving it");
                return Ok(false);
            }
            Err(e) => return Err(ArchiveError::io(&self.landing_path, e)),
        };
        let page = LANDING_PAGE.replace("VERSION", env!("CARGO_PKG_VERSION"));
        file.write_all(page.as_bytes())
            .map_err(|e| ArchiveError::io(&self.landing_path, e))?;
        info!(path = %self.landing_path.display(), "Created landing page");
        Ok(true)
    }
}

/// Serialize `value` with a one-space indent and write it to `path`.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    std::fs::write(path, &buf).map_err(|e| ArchiveError::io(path, e))
}

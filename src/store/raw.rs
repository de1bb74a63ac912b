//! Raw message store: one file per UID under a directory.
//!
//! ```text
//! raw/
//!   101.txt   ← full message bytes as fetched
//!   102.txt
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{ArchiveError, Result};
use crate::model::message::{RawMessage, Uid};

/// Directory-backed store of raw message bytes keyed by UID.
///
/// Written once per UID during the fetch phase, read any number of times
/// afterwards. Entries are never deleted.
#[derive(Debug, Clone)]
pub struct RawStore {
    dir: PathBuf,
}

impl RawStore {
    /// Open (creating if needed) the store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| ArchiveError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `uid`.
    pub fn path_for(&self, uid: Uid) -> PathBuf {
        self.dir.join(format!("{uid}.txt"))
    }

    /// Persist one message. Existing bytes for the same UID are replaced.
    pub fn put(&self, message: &RawMessage) -> Result<()> {
        let path = self.path_for(message.uid);
        std::fs::write(&path, &message.content).map_err(|e| ArchiveError::io(&path, e))?;
        trace!(uid = message.uid, bytes = message.content.len(), "Stored raw message");
        Ok(())
    }

    /// Read the bytes stored for `uid`; `Ok(None)` if it was never fetched.
    pub fn get(&self, uid: Uid) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(uid);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(uid, "Raw message not fetched");
                Ok(None)
            }
            Err(e) => Err(ArchiveError::io(&path, e)),
        }
    }
}

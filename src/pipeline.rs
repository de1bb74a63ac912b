//! The two phases of a run.
//!
//! 1. **Fetch**: drain the mail store's message stream into the [`RawStore`].
//! 2. **Build**: turn each flattened thread into a conversation document and
//!    write the summary. Runs only after the fetch phase has completed.
//!
//! ```text
//! let conversations = build_conversations(&store, &normalizer, &threads);
//! let summary = write_archive(&writer, conversations)?;
//! ```

use tracing::{info, warn};

use crate::archive::writer::ArchiveWriter;
use crate::conversation::ConversationBuilder;
use crate::error::Result;
use crate::model::message::{Conversation, RawMessage, SummaryEntry, Uid};
use crate::normalize::Normalizer;
use crate::store::raw::RawStore;

/// Write every streamed message into `store` before pulling the next one.
///
/// The first stream or write error aborts the phase. The progress callback
/// receives the number of messages stored so far. Returns that number.
pub fn store_fetched<I>(
    store: &RawStore,
    stream: I,
    progress: Option<&dyn Fn(u64)>,
) -> Result<u64>
where
    I: IntoIterator<Item = Result<RawMessage>>,
{
    let mut stored = 0u64;
    for item in stream {
        let message = item?;
        store.put(&message)?;
        stored += 1;
        if let Some(progress) = progress {
            progress(stored);
        }
    }
    info!(count = stored, dir = %store.dir().display(), "Fetch complete");
    Ok(stored)
}

/// Build one conversation per non-empty sequence, lazily and in order.
pub fn build_conversations<'a>(
    store: &'a RawStore,
    normalizer: &'a Normalizer,
    sequences: &'a [Vec<Uid>],
) -> impl Iterator<Item = Conversation> + 'a {
    let builder = ConversationBuilder::new(store, normalizer);
    sequences.iter().filter_map(move |uids| {
        let conversation = builder.build(uids);
        if conversation.is_none() {
            warn!("Skipping thread without any message UID");
        }
        conversation
    })
}

/// Write each conversation document as it arrives, then the summary document.
///
/// Returns the summary entries in conversation order.
pub fn write_archive<I>(writer: &ArchiveWriter, conversations: I) -> Result<Vec<SummaryEntry>>
where
    I: IntoIterator<Item = Conversation>,
{
    let mut summary = Vec::new();
    for conversation in conversations {
        writer.write_conversation(&conversation)?;
        summary.push(conversation.summary());
    }
    writer.write_summary(&summary)?;
    info!(conversations = summary.len(), "Archive written");
    Ok(summary)
}

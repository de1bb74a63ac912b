//! Archive output: per-conversation documents, the summary index, and the
//! static landing page.

pub mod writer;

//! Post-merge combiner.
//!
//! Concatenates already-produced output buffers into one document. Pages
//! are copied as-is: no watermarking, no rotation change. Used to offer one
//! download for several independently processed outputs.

use crate::error::{Error, Result};
use crate::pdf::{OutputBuilder, SourceDocument};

/// Combine the buffers, in order, into a single document.
pub fn combine(buffers: &[Vec<u8>]) -> Result<Vec<u8>> {
    if buffers.is_empty() {
        return Err(Error::Parse("no documents to combine".to_string()));
    }

    // Single buffer: already a finished output, pass it through
    if buffers.len() == 1 {
        return Ok(buffers[0].clone());
    }

    let mut builder = OutputBuilder::new();
    for (index, bytes) in buffers.iter().enumerate() {
        let source = SourceDocument::parse(bytes)
            .map_err(|e| Error::merge(format!("buffer {index}"), e))?;
        builder.copy_all_pages(&source)?;
    }

    tracing::debug!("Combined {} buffers into one document", buffers.len());
    builder.finish()
}

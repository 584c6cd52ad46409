//! PDF Composer Core Library
//!
//! This library provides the core functionality for assembling PDF
//! documents:
//! - Merging multiple source files into one watermarked output
//! - Per-file batch processing with a caller-supplied watermark
//! - Synthesized cover pages when no cover file is given
//! - Page-level editing (reorder, rotate, delete, recombine) with
//!   per-source parse caching and thumbnail previews
//! - Combining already-produced outputs without re-stamping
//!
//! All pipelines are synchronous sequences of fallible steps over in-memory
//! byte buffers. Progress is surfaced through injected callbacks; errors
//! abort the operation in progress and never yield a partial output buffer.

pub mod combine;
pub mod config;
pub mod cover;
pub mod editor;
pub mod error;
pub mod merge;
pub mod pdf;
pub mod util;
pub mod watermark;

pub use combine::combine;
pub use config::{
    AppConfig, DEFAULT_STAMP_TEXT, DEFAULT_THUMBNAIL_SCALE, Rgb, STRICT_WATERMARK, WatermarkConfig,
};
pub use cover::{COVER_PAGE_HEIGHT, COVER_PAGE_WIDTH, draw_cover_page};
pub use editor::{
    EditorPage, SourceCache, SourceFile, SourceId, ThumbnailOptions, compile, ingest,
};
pub use error::{Error, Result};
pub use merge::{
    BatchOptions, BatchOutput, CoverSource, MergeInput, MergeOptions, merge_single, process_batch,
    process_file,
};
pub use pdf::{
    Canvas, ImageHandle, ImageKind, Logo, OutputBuilder, PageRenderer, PdfMetadata,
    SourceDocument, StandardFont, TextOp, ThumbnailFormat,
};
pub use watermark::stamp_page;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.stamp_text, DEFAULT_STAMP_TEXT);
        assert!((config.thumbnail_scale - DEFAULT_THUMBNAIL_SCALE).abs() < f32::EPSILON);
    }
}

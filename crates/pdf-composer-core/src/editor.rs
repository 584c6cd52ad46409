//! Page-level editor pipeline.
//!
//! A source file is ingested into one [`EditorPage`] per page, each
//! independently rotatable and removable from the caller's ordered list.
//! Compilation walks that list and copies each referenced page from its
//! source document into a fresh output, parsing every source at most once
//! per compile call through a [`SourceCache`] that is dropped when the call
//! returns.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DEFAULT_THUMBNAIL_SCALE;
use crate::error::{Error, Result};
use crate::pdf::{OutputBuilder, PageRenderer, SourceDocument, ThumbnailFormat};

/// Identifier tying editor pages back to the source file they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an id from the file content itself (MD5 hex).
    pub fn from_content(bytes: &[u8]) -> Self {
        Self(format!("{:x}", md5::compute(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page's desired presence and orientation in a compiled output.
///
/// `source` and `page_index` are identity fields fixed at ingestion; only
/// the rotation delta changes afterwards.
#[derive(Debug, Clone)]
pub struct EditorPage {
    pub id: Uuid,
    source: SourceId,
    page_index: usize,
    rotation_delta: u16,
    /// Rendered preview, if thumbnails were requested at ingestion
    pub thumbnail: Option<Vec<u8>>,
}

impl EditorPage {
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub const fn page_index(&self) -> usize {
        self.page_index
    }

    pub const fn rotation_delta(&self) -> u16 {
        self.rotation_delta
    }

    /// Rotate a quarter turn clockwise; four rotations return to zero.
    pub fn rotate(&mut self) {
        self.rotation_delta = (self.rotation_delta + 90) % 360;
    }
}

/// A source file supplied to a compile call.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: SourceId,
    pub bytes: Vec<u8>,
}

/// Preview rendering settings for ingestion.
#[derive(Debug, Clone)]
pub struct ThumbnailOptions {
    pub scale: f32,
    pub format: ThumbnailFormat,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_THUMBNAIL_SCALE,
            format: ThumbnailFormat::Png,
        }
    }
}

/// Ingest a source file: one `EditorPage` per page, in natural order.
///
/// With `thumbnails` set, each page gets a low-resolution preview. The
/// preview never affects compiled output resolution.
pub fn ingest(
    id: &SourceId,
    bytes: &[u8],
    thumbnails: Option<&ThumbnailOptions>,
) -> Result<Vec<EditorPage>> {
    let document = SourceDocument::parse(bytes)?;
    let page_count = document.page_count();
    tracing::debug!("Ingested source '{}' with {} pages", id, page_count);

    let renderer = thumbnails
        .map(|options| PageRenderer::from_bytes(bytes, options.scale))
        .transpose()?;

    (0..page_count)
        .map(|page_index| {
            let thumbnail = match (&renderer, thumbnails) {
                (Some(renderer), Some(options)) => {
                    Some(renderer.render_page_as(page_index, options.format)?)
                }
                _ => None,
            };
            Ok(EditorPage {
                id: Uuid::new_v4(),
                source: id.clone(),
                page_index,
                rotation_delta: 0,
                thumbnail,
            })
        })
        .collect()
}

/// Parsed-source cache for one compile call.
///
/// Parse counts are observable so callers (and tests) can verify each
/// source is parsed at most once.
pub struct SourceCache<'a> {
    files: &'a [SourceFile],
    parsed: HashMap<SourceId, SourceDocument>,
    parse_count: usize,
}

impl<'a> SourceCache<'a> {
    pub fn new(files: &'a [SourceFile]) -> Self {
        Self {
            files,
            parsed: HashMap::new(),
            parse_count: 0,
        }
    }

    /// How many sources have actually been parsed so far.
    pub const fn parse_count(&self) -> usize {
        self.parse_count
    }

    fn get(&mut self, id: &SourceId) -> Result<&SourceDocument> {
        if !self.parsed.contains_key(id) {
            let file = self
                .files
                .iter()
                .find(|file| &file.id == id)
                .ok_or_else(|| Error::MissingSource(id.clone()))?;
            let document = SourceDocument::parse(&file.bytes)?;
            self.parse_count += 1;
            self.parsed.insert(id.clone(), document);
        }
        self.parsed
            .get(id)
            .ok_or_else(|| Error::MissingSource(id.clone()))
    }
}

/// Compile the page list into one output document.
///
/// Pages are copied in list order; each page's rotation becomes
/// `(current + delta) mod 360`. A page referencing a source id missing from
/// `sources` is a caller contract violation and fails the whole compile.
pub fn compile(pages: &[EditorPage], sources: &[SourceFile]) -> Result<Vec<u8>> {
    let mut cache = SourceCache::new(sources);
    compile_with_cache(pages, &mut cache)
}

/// Compile against an externally owned cache (exposed for instrumentation).
pub fn compile_with_cache(pages: &[EditorPage], cache: &mut SourceCache<'_>) -> Result<Vec<u8>> {
    let mut builder = OutputBuilder::new();

    for page in pages {
        let source = cache.get(&page.source)?;
        let current = source.page_rotation(page.page_index)?;
        let copied = builder.copy_pages(source, &[page.page_index])?;
        builder.set_page_rotation(
            copied[0],
            i64::from(current) + i64::from(page.rotation_delta),
        )?;
    }

    tracing::info!(
        "Compiled {} pages from {} sources",
        pages.len(),
        cache.parse_count()
    );
    builder.finish()
}

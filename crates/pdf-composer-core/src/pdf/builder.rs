//! Output document assembly.
//!
//! [`OutputBuilder`] is the single mutable handle for a document under
//! construction: pages are deep-copied in from parsed sources or created
//! blank, drawing primitives are applied through [`Canvas`], and the whole
//! document is serialized exactly once by [`OutputBuilder::finish`], which
//! consumes the builder.
//!
//! Copying is cached per source: every indirect object pulled in from a
//! given source document is copied at most once, so pages sharing fonts or
//! images also share them in the output.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::content::{Canvas, gs_name};
use super::document::{SourceDocument, normalize_rotation};
use super::font::StandardFont;
use super::image::{ImageHandle, Logo, embed_image};
use crate::error::{Error, Result};

/// Producer string written into the Info dictionary.
const PRODUCER: &str = concat!("pdf-composer ", env!("CARGO_PKG_VERSION"));

/// Document metadata applied to an output before serialization.
///
/// Absent fields are not written.
#[derive(Debug, Clone, Default)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// A PDF document under construction.
pub struct OutputBuilder {
    doc: Document,
    /// Output pages in append order
    pages: Vec<ObjectId>,
    /// Embedded standard fonts, one object per family
    fonts: HashMap<StandardFont, ObjectId>,
    /// Opacity graphics states keyed by percentage
    gstates: HashMap<u16, ObjectId>,
    /// (source content id, source object id) -> copied object id
    copy_cache: HashMap<(String, ObjectId), ObjectId>,
    metadata: Option<PdfMetadata>,
    image_seq: u32,
}

impl OutputBuilder {
    /// Create an empty output document.
    pub fn new() -> Self {
        Self {
            doc: Document::with_version("1.5"),
            pages: Vec::new(),
            fonts: HashMap::new(),
            gstates: HashMap::new(),
            copy_cache: HashMap::new(),
            metadata: None,
            image_seq: 0,
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Copy the pages at the given 0-based indices from a source document,
    /// appending them in the order given. Returns the new page ids.
    pub fn copy_pages(
        &mut self,
        source: &SourceDocument,
        indices: &[usize],
    ) -> Result<Vec<ObjectId>> {
        indices.iter().map(|&i| self.copy_page(source, i)).collect()
    }

    /// Copy every page of a source document in its original order.
    pub fn copy_all_pages(&mut self, source: &SourceDocument) -> Result<Vec<ObjectId>> {
        let indices: Vec<usize> = (0..source.page_count()).collect();
        self.copy_pages(source, &indices)
    }

    fn copy_page(&mut self, source: &SourceDocument, index: usize) -> Result<ObjectId> {
        let src_page_id = source.page_id(index)?;
        let src_dict = source
            .doc()
            .get_dictionary(src_page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to read source page: {e}")))?
            .clone();

        // The page dict itself is never cached: copying the same source page
        // twice must yield independent pages (each individually rotatable).
        let new_page_id = self.doc.new_object_id();
        // Annotations can point back at their page; seed the cache so that
        // cycle resolves to the copy being built.
        self.copy_cache
            .insert((source.content_id().to_string(), src_page_id), new_page_id);

        let mut new_dict = Dictionary::new();
        for (key, value) in src_dict.iter() {
            if key == b"Parent" {
                continue;
            }
            new_dict.set(key.clone(), self.copy_object(source, value)?);
        }

        // Dropping Parent loses inherited attributes; materialize them.
        for key in [
            b"Resources".as_slice(),
            b"MediaBox".as_slice(),
            b"Rotate".as_slice(),
            b"CropBox".as_slice(),
        ] {
            if new_dict.get(key).is_err()
                && let Some(value) = source.resolve_page_attr(src_page_id, key)
            {
                let copied = self.copy_object(source, &value)?;
                new_dict.set(key, copied);
            }
        }

        self.doc
            .objects
            .insert(new_page_id, Object::Dictionary(new_dict));
        self.pages.push(new_page_id);
        Ok(new_page_id)
    }

    /// Deep-copy an object graph from a source document, following
    /// references. Each source object is copied at most once per source.
    fn copy_object(&mut self, source: &SourceDocument, obj: &Object) -> Result<Object> {
        match obj {
            Object::Reference(id) => {
                let key = (source.content_id().to_string(), *id);
                if let Some(&new_id) = self.copy_cache.get(&key) {
                    return Ok(Object::Reference(new_id));
                }

                let referenced = source
                    .doc()
                    .get_object(*id)
                    .map_err(|e| Error::Lopdf(format!("Dangling reference in source: {e}")))?
                    .clone();

                // Reserve the id before recursing so reference cycles terminate
                let new_id = self.doc.new_object_id();
                self.copy_cache.insert(key, new_id);
                let copied = self.copy_object(source, &referenced)?;
                self.doc.objects.insert(new_id, copied);
                Ok(Object::Reference(new_id))
            }
            Object::Dictionary(dict) => {
                let mut new_dict = Dictionary::new();
                for (key, value) in dict.iter() {
                    // Parent links would drag the whole source page tree in
                    if key == b"Parent" {
                        continue;
                    }
                    new_dict.set(key.clone(), self.copy_object(source, value)?);
                }
                Ok(Object::Dictionary(new_dict))
            }
            Object::Array(arr) => {
                let copied: Result<Vec<_>> =
                    arr.iter().map(|item| self.copy_object(source, item)).collect();
                Ok(Object::Array(copied?))
            }
            Object::Stream(stream) => {
                let mut new_dict = Dictionary::new();
                for (key, value) in stream.dict.iter() {
                    new_dict.set(key.clone(), self.copy_object(source, value)?);
                }
                Ok(Object::Stream(Stream {
                    dict: new_dict,
                    content: stream.content.clone(),
                    allows_compression: stream.allows_compression,
                    start_position: None,
                }))
            }
            other => Ok(other.clone()),
        }
    }

    /// Append a fresh blank page of the given size in points.
    pub fn add_blank_page(&mut self, width: f32, height: f32) -> ObjectId {
        let page_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(width),
                    Object::Real(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
        ]));
        self.pages.push(page_id);
        page_id
    }

    /// Embed a logo image, returning a handle usable with [`Canvas::image`].
    pub fn embed_logo(&mut self, logo: &Logo) -> Result<ImageHandle> {
        self.image_seq += 1;
        let name = format!("Im{}", self.image_seq);
        embed_image(&mut self.doc, &logo.bytes, logo.kind, name)
    }

    /// Size (width, height) of an output page in points.
    pub fn page_size(&self, page_id: ObjectId) -> (f32, f32) {
        self.doc
            .get_dictionary(page_id)
            .ok()
            .and_then(|dict| dict.get(b"MediaBox").ok())
            .and_then(media_box_size)
            .unwrap_or((612.0, 792.0))
    }

    /// Current /Rotate of an output page, normalized.
    pub fn page_rotation(&self, page_id: ObjectId) -> u16 {
        self.doc
            .get_dictionary(page_id)
            .ok()
            .and_then(|dict| dict.get(b"Rotate").ok())
            .and_then(|obj| obj.as_i64().ok())
            .map_or(0, normalize_rotation)
    }

    /// Set the /Rotate attribute of an output page (normalized mod 360).
    pub fn set_page_rotation(&mut self, page_id: ObjectId, degrees: i64) -> Result<()> {
        let normalized = normalize_rotation(degrees);
        let page = self
            .doc
            .get_object_mut(page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;
        if let Object::Dictionary(dict) = page {
            dict.set("Rotate", Object::Integer(i64::from(normalized)));
        }
        Ok(())
    }

    /// Apply a drawn canvas to a page: append its operator stream to the
    /// page contents and merge the required resources.
    pub fn apply_canvas(&mut self, page_id: ObjectId, canvas: Canvas) -> Result<()> {
        if canvas.is_empty() {
            return Ok(());
        }
        let parts = canvas.into_parts();

        let font_refs: Vec<(&'static str, ObjectId)> = parts
            .fonts
            .iter()
            .map(|&font| (font.resource_name(), self.font_id(font)))
            .collect();
        let gs_refs: Vec<(String, ObjectId)> = parts
            .alphas
            .iter()
            .map(|&percent| (gs_name(percent), self.gstate_id(percent)))
            .collect();

        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), parts.ops.into_bytes()));

        let mut resources = self.resolved_resources(page_id);
        if !font_refs.is_empty() {
            let mut fonts = resolved_sub_dict(&self.doc, &resources, b"Font");
            for (name, id) in font_refs {
                fonts.set(name, Object::Reference(id));
            }
            resources.set("Font", Object::Dictionary(fonts));
        }
        if !gs_refs.is_empty() {
            let mut gstates = resolved_sub_dict(&self.doc, &resources, b"ExtGState");
            for (name, id) in gs_refs {
                gstates.set(name, Object::Reference(id));
            }
            resources.set("ExtGState", Object::Dictionary(gstates));
        }
        if !parts.images.is_empty() {
            let mut xobjects = resolved_sub_dict(&self.doc, &resources, b"XObject");
            for (name, id) in &parts.images {
                xobjects.set(name.as_str(), Object::Reference(*id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));
        }

        let page = self
            .doc
            .get_object_mut(page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

        if let Object::Dictionary(dict) = page {
            let existing_contents = dict.get(b"Contents").ok().cloned();
            match existing_contents {
                Some(Object::Reference(existing_id)) => {
                    dict.set(
                        "Contents",
                        Object::Array(vec![
                            Object::Reference(existing_id),
                            Object::Reference(content_id),
                        ]),
                    );
                }
                Some(Object::Array(mut arr)) => {
                    arr.push(Object::Reference(content_id));
                    dict.set("Contents", Object::Array(arr));
                }
                _ => {
                    dict.set("Contents", Object::Reference(content_id));
                }
            }
            dict.set("Resources", Object::Dictionary(resources));
        }

        Ok(())
    }

    /// Record metadata to be written into the Info dictionary at
    /// serialization time.
    pub fn set_metadata(&mut self, metadata: PdfMetadata) {
        self.metadata = Some(metadata);
    }

    /// Serialize the document. This is terminal: the builder is consumed and
    /// the page tree is finalized exactly once.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let pages_id = self.doc.new_object_id();

        for &page_id in &self.pages {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object_mut(page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }

        let kids: Vec<Object> = self.pages.iter().map(|&id| Object::Reference(id)).collect();
        #[allow(clippy::cast_possible_wrap)]
        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(self.pages.len() as i64)),
        ]);
        self.doc
            .objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        if let Some(metadata) = self.metadata.take() {
            let mut info = Dictionary::new();
            if let Some(title) = metadata.title {
                info.set("Title", Object::string_literal(title));
            }
            if let Some(author) = metadata.author {
                info.set("Author", Object::string_literal(author));
            }
            info.set("Producer", Object::string_literal(PRODUCER));
            let info_id = self.doc.add_object(Object::Dictionary(info));
            self.doc.trailer.set("Info", Object::Reference(info_id));
        }

        self.doc.renumber_objects();
        self.doc.compress();

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| Error::Serialize(e.to_string()))?;
        Ok(output)
    }

    fn font_id(&mut self, font: StandardFont) -> ObjectId {
        if let Some(&id) = self.fonts.get(&font) {
            return id;
        }
        let id = self.doc.add_object(Object::Dictionary(font.font_dict()));
        self.fonts.insert(font, id);
        id
    }

    fn gstate_id(&mut self, percent: u16) -> ObjectId {
        if let Some(&id) = self.gstates.get(&percent) {
            return id;
        }
        let alpha = f32::from(percent) / 100.0;
        let dict = Dictionary::from_iter([
            ("Type", Object::Name(b"ExtGState".to_vec())),
            ("ca", Object::Real(alpha)),
            ("CA", Object::Real(alpha)),
        ]);
        let id = self.doc.add_object(Object::Dictionary(dict));
        self.gstates.insert(percent, id);
        id
    }

    /// Resolve a page's Resources dictionary (inline or indirect) to an
    /// owned dictionary. Copied pages always carry materialized resources;
    /// blank pages carry an empty inline dict.
    fn resolved_resources(&self, page_id: ObjectId) -> Dictionary {
        let Ok(dict) = self.doc.get_dictionary(page_id) else {
            return Dictionary::new();
        };
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(resources)) => resources.clone(),
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Dictionary(resources)) => resources.clone(),
                _ => Dictionary::new(),
            },
            _ => Dictionary::new(),
        }
    }
}

impl Default for OutputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a category sub-dictionary of Resources (e.g. Font), following an
/// indirect reference if needed.
fn resolved_sub_dict(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    match resources.get(key) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        },
        _ => Dictionary::new(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn media_box_size(obj: &Object) -> Option<(f32, f32)> {
    let arr = obj.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let value = |i: usize| match &arr[i] {
        Object::Integer(n) => Some(*n as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    };
    Some((value(2)? - value(0)?, value(3)? - value(1)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Rgb;
    use crate::pdf::content::TextOp;
    use crate::pdf::test_support::sample_pdf;

    #[test]
    fn test_copy_all_pages_preserves_count() {
        let source = SourceDocument::parse(&sample_pdf(3)).unwrap();
        let mut builder = OutputBuilder::new();
        builder.copy_all_pages(&source).unwrap();
        assert_eq!(builder.page_count(), 3);

        let bytes = builder.finish().unwrap();
        let reparsed = SourceDocument::parse(&bytes).unwrap();
        assert_eq!(reparsed.page_count(), 3);
    }

    #[test]
    fn test_copy_pages_subset_and_order() {
        let source = SourceDocument::parse(&sample_pdf(4)).unwrap();
        let mut builder = OutputBuilder::new();
        // Reversed subset
        builder.copy_pages(&source, &[3, 0]).unwrap();
        let bytes = builder.finish().unwrap();

        let reparsed = SourceDocument::parse(&bytes).unwrap();
        assert_eq!(reparsed.page_count(), 2);
    }

    #[test]
    fn test_copy_pages_out_of_range() {
        let source = SourceDocument::parse(&sample_pdf(2)).unwrap();
        let mut builder = OutputBuilder::new();
        assert!(matches!(
            builder.copy_pages(&source, &[5]),
            Err(Error::PageOutOfRange { page: 5, total: 2 })
        ));
    }

    #[test]
    fn test_shared_objects_copied_once() {
        // All sample pages share one font object; the copy cache must
        // deduplicate it across pages.
        let source = SourceDocument::parse(&sample_pdf(3)).unwrap();
        let mut builder = OutputBuilder::new();
        builder.copy_all_pages(&source).unwrap();

        let font_objects = builder
            .doc
            .objects
            .values()
            .filter(|obj| {
                obj.as_dict()
                    .ok()
                    .and_then(|d| d.get(b"BaseFont").ok())
                    .is_some()
            })
            .count();
        assert_eq!(font_objects, 1);
    }

    #[test]
    fn test_same_page_copied_twice_is_independent() {
        let source = SourceDocument::parse(&sample_pdf(1)).unwrap();
        let mut builder = OutputBuilder::new();
        let first = builder.copy_pages(&source, &[0]).unwrap()[0];
        let second = builder.copy_pages(&source, &[0]).unwrap()[0];
        assert_ne!(first, second);

        builder.set_page_rotation(second, 90).unwrap();
        assert_eq!(builder.page_rotation(first), 0);
        assert_eq!(builder.page_rotation(second), 90);
    }

    #[test]
    fn test_blank_page_size() {
        let mut builder = OutputBuilder::new();
        let page = builder.add_blank_page(595.28, 841.89);
        let (w, h) = builder.page_size(page);
        assert!((w - 595.28).abs() < 0.01);
        assert!((h - 841.89).abs() < 0.01);
    }

    #[test]
    fn test_rotation_normalization() {
        let mut builder = OutputBuilder::new();
        let page = builder.add_blank_page(612.0, 792.0);
        builder.set_page_rotation(page, 360 + 90).unwrap();
        assert_eq!(builder.page_rotation(page), 90);
    }

    #[test]
    fn test_canvas_adds_contents_and_resources() {
        let mut builder = OutputBuilder::new();
        let page = builder.add_blank_page(612.0, 792.0);

        let mut canvas = Canvas::new();
        canvas.text(&TextOp {
            text: "hello",
            font: StandardFont::Helvetica,
            size: 12.0,
            x: 10.0,
            y: 20.0,
            color: Rgb::black(),
            opacity: 0.5,
            rotation: 0.0,
        });
        builder.apply_canvas(page, canvas).unwrap();

        let dict = builder.doc.get_dictionary(page).unwrap();
        assert!(dict.get(b"Contents").is_ok());
        let resources = dict.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.get(b"FHelv").is_ok());
        let gstates = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
        assert!(gstates.get(b"GS50").is_ok());
    }

    #[test]
    fn test_second_canvas_appends_contents() {
        let source = SourceDocument::parse(&sample_pdf(1)).unwrap();
        let mut builder = OutputBuilder::new();
        let page = builder.copy_pages(&source, &[0]).unwrap()[0];

        let mut canvas = Canvas::new();
        canvas.rect(0.0, 0.0, 10.0, 10.0, Rgb::black(), 1.0);
        builder.apply_canvas(page, canvas).unwrap();

        let contents = builder
            .doc
            .get_dictionary(page)
            .unwrap()
            .get(b"Contents")
            .unwrap();
        assert!(matches!(contents, Object::Array(arr) if arr.len() == 2));
    }

    #[test]
    fn test_metadata_written_only_when_present() {
        let source = SourceDocument::parse(&sample_pdf(1)).unwrap();

        let mut builder = OutputBuilder::new();
        builder.copy_all_pages(&source).unwrap();
        builder.set_metadata(PdfMetadata {
            title: Some("Bundle".to_string()),
            author: None,
        });
        let bytes = builder.finish().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert!(info.get(b"Title").is_ok());
        assert!(info.get(b"Author").is_err());
        assert!(info.get(b"Producer").is_ok());
    }

    #[test]
    fn test_no_metadata_means_no_info() {
        let mut builder = OutputBuilder::new();
        builder.add_blank_page(612.0, 792.0);
        let bytes = builder.finish().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.trailer.get(b"Info").is_err());
    }
}

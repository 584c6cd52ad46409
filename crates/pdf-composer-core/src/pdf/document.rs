//! Parsed, page-addressable source documents.

use lopdf::{Document, Object, ObjectId};

use crate::error::{Error, Result};

/// Maximum Parent-chain depth when resolving inherited page attributes.
/// Guards against malformed PDFs with circular Parent references.
const MAX_PARENT_DEPTH: usize = 10;

/// A parsed source PDF.
///
/// Owns the lopdf object model for one input byte buffer and exposes its
/// pages by 0-based index for copying into an output document. The
/// underlying bytes are not retained; the object model is the working
/// representation.
pub struct SourceDocument {
    doc: Document,
    /// Page object ids in document order
    pages: Vec<ObjectId>,
    /// Content-derived identifier (MD5 hex of the input bytes)
    content_id: String,
}

impl SourceDocument {
    /// Parse a PDF from raw bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| Error::Parse(e.to_string()))?;
        let pages = doc.get_pages().into_values().collect();
        let content_id = format!("{:x}", md5::compute(bytes));

        Ok(Self {
            doc,
            pages,
            content_id,
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Identifier derived from the input bytes, stable across re-parses.
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub(crate) const fn doc(&self) -> &Document {
        &self.doc
    }

    /// Object id for the page at a 0-based index.
    pub(crate) fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.pages.get(index).copied().ok_or(Error::PageOutOfRange {
            page: index,
            total: self.pages.len(),
        })
    }

    /// Current rotation of a page, normalized to 0/90/180/270.
    pub fn page_rotation(&self, index: usize) -> Result<u16> {
        let page_id = self.page_id(index)?;
        let rotation = self
            .resolve_page_attr(page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);
        Ok(normalize_rotation(rotation))
    }

    /// Page size (width, height) in points, before rotation.
    pub fn page_size(&self, index: usize) -> Result<(f32, f32)> {
        let page_id = self.page_id(index)?;
        Ok(self
            .resolve_page_attr(page_id, b"MediaBox")
            .and_then(|obj| media_box_size(&obj))
            // Default to US Letter when the MediaBox is missing or malformed
            .unwrap_or((612.0, 792.0)))
    }

    /// Look up a page attribute, following inheritance up the Pages tree.
    ///
    /// Inheritable attributes (MediaBox, Resources, Rotate) may live on any
    /// ancestor node rather than on the page itself.
    pub(crate) fn resolve_page_attr(&self, page_id: ObjectId, key: &[u8]) -> Option<Object> {
        let mut current = page_id;

        for _ in 0..MAX_PARENT_DEPTH {
            let dict = self.doc.get_dictionary(current).ok()?;

            if let Ok(value) = dict.get(key) {
                // The attribute itself may be stored indirectly
                return match value {
                    Object::Reference(id) => self.doc.get_object(*id).ok().cloned(),
                    other => Some(other.clone()),
                };
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current = *parent_id,
                _ => return None,
            }
        }

        None
    }
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("page_count", &self.pages.len())
            .field("content_id", &self.content_id)
            .finish()
    }
}

/// Normalize a rotation value to 0/90/180/270.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn normalize_rotation(degrees: i64) -> u16 {
    degrees.rem_euclid(360) as u16
}

fn media_box_size(obj: &Object) -> Option<(f32, f32)> {
    let arr = obj.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let values: Vec<f32> = arr.iter().filter_map(object_as_f32).collect();
    if values.len() == 4 {
        Some((values[2] - values[0], values[3] - values[1]))
    } else {
        None
    }
}

#[allow(clippy::cast_precision_loss)]
fn object_as_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::test_support::sample_pdf;

    #[test]
    fn test_parse_counts_pages() {
        let doc = SourceDocument::parse(&sample_pdf(3)).unwrap();
        assert_eq!(doc.page_count(), 3);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            SourceDocument::parse(&[0, 1, 2, 3]),
            Err(Error::Parse(_))
        ));
        assert!(SourceDocument::parse(&[]).is_err());
    }

    #[test]
    fn test_page_id_out_of_range() {
        let doc = SourceDocument::parse(&sample_pdf(2)).unwrap();
        assert!(doc.page_id(1).is_ok());
        assert!(matches!(
            doc.page_id(2),
            Err(Error::PageOutOfRange { page: 2, total: 2 })
        ));
    }

    #[test]
    fn test_content_id_is_stable() {
        let bytes = sample_pdf(1);
        let a = SourceDocument::parse(&bytes).unwrap();
        let b = SourceDocument::parse(&bytes).unwrap();
        assert_eq!(a.content_id(), b.content_id());
    }

    #[test]
    fn test_page_size_reads_media_box() {
        let doc = SourceDocument::parse(&sample_pdf(1)).unwrap();
        let (w, h) = doc.page_size(0).unwrap();
        assert!((w - 612.0).abs() < 0.01);
        assert!((h - 792.0).abs() < 0.01);
    }

    #[test]
    fn test_unrotated_page_reports_zero() {
        let doc = SourceDocument::parse(&sample_pdf(1)).unwrap();
        assert_eq!(doc.page_rotation(0).unwrap(), 0);
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(0), 0);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(360), 0);
    }
}

//! Raster image embedding for logos.
//!
//! Logos arrive as raw PNG or JPEG bytes. The declared kind comes from the
//! caller (MIME type or filename extension); anything else is a hard failure
//! rather than a best-effort sniff. JPEG data passes through untouched as a
//! DCTDecode stream; PNG data is decoded and re-embedded as raw samples, with
//! the alpha channel split off into an SMask when present.

use image::GenericImageView;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Declared type of a logo image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Resolve a declared MIME type.
    pub fn from_mime(mime: &str) -> Result<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Ok(Self::Png),
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            other => Err(Error::UnsupportedImage(other.to_string())),
        }
    }

    /// Resolve from a filename extension (e.g. "logo.PNG").
    pub fn from_file_name(name: &str) -> Result<Self> {
        let mime = mime_guess::from_path(name)
            .first_raw()
            .ok_or_else(|| Error::UnsupportedImage(name.to_string()))?;
        Self::from_mime(mime)
    }

    const fn as_image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// A logo image: raw bytes plus their declared kind.
#[derive(Debug, Clone)]
pub struct Logo {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

impl Logo {
    pub fn new(bytes: impl Into<Vec<u8>>, kind: ImageKind) -> Self {
        Self {
            bytes: bytes.into(),
            kind,
        }
    }

    /// Build a logo from a filename and its bytes, inferring the kind from
    /// the extension.
    pub fn from_named_bytes(name: &str, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Ok(Self::new(bytes, ImageKind::from_file_name(name)?))
    }
}

/// Handle to an image XObject embedded in an output document.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pub(crate) id: ObjectId,
    pub(crate) resource_name: String,
    /// Intrinsic pixel width
    pub width: u32,
    /// Intrinsic pixel height
    pub height: u32,
}

impl ImageHandle {
    /// Intrinsic aspect ratio (height / width).
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect(&self) -> f32 {
        self.height as f32 / self.width.max(1) as f32
    }
}

/// Embed an image into a document as an Image XObject.
///
/// Decoding failures and kind mismatches surface as `UnsupportedImage`
/// before anything is written into the document.
pub(crate) fn embed_image(
    doc: &mut Document,
    bytes: &[u8],
    kind: ImageKind,
    resource_name: String,
) -> Result<ImageHandle> {
    let decoded = image::load_from_memory_with_format(bytes, kind.as_image_format())
        .map_err(|e| Error::UnsupportedImage(format!("{kind:?} decode failed: {e}")))?;
    let (width, height) = decoded.dimensions();

    let id = match kind {
        ImageKind::Jpeg => embed_jpeg(doc, bytes, &decoded, width, height),
        ImageKind::Png => embed_png(doc, &decoded, width, height),
    };

    Ok(ImageHandle {
        id,
        resource_name,
        width,
        height,
    })
}

/// JPEG bytes go into the PDF as-is with a DCTDecode filter.
fn embed_jpeg(
    doc: &mut Document,
    bytes: &[u8],
    decoded: &image::DynamicImage,
    width: u32,
    height: u32,
) -> ObjectId {
    let color_space: &[u8] = if decoded.color().has_color() {
        b"DeviceRGB"
    } else {
        b"DeviceGray"
    };

    let mut dict = image_dict(width, height, color_space);
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

    // Already compressed; lopdf must not flate it again
    doc.add_object(Stream::new(dict, bytes.to_vec()).with_compression(false))
}

/// PNGs are decoded to raw RGB samples; alpha becomes a grayscale SMask.
fn embed_png(
    doc: &mut Document,
    decoded: &image::DynamicImage,
    width: u32,
    height: u32,
) -> ObjectId {
    let rgba = decoded.to_rgba8();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut has_alpha = false;

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
        if pixel.0[3] != u8::MAX {
            has_alpha = true;
        }
    }

    let mut dict = image_dict(width, height, b"DeviceRGB");

    if has_alpha {
        let smask_id = doc.add_object(
            Stream::new(image_dict(width, height, b"DeviceGray"), alpha).with_compression(true),
        );
        dict.set("SMask", Object::Reference(smask_id));
    }

    doc.add_object(Stream::new(dict, rgb).with_compression(true))
}

fn image_dict(width: u32, height: u32, color_space: &[u8]) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ])
}

//! Raster page previews.
//!
//! Thumbnails are rendered through MuPDF at a fixed low-resolution scale and
//! encoded as PNG or WebP. Previews never feed back into document assembly:
//! compilation always copies the original full-resolution page.

use image::{ImageEncoder, RgbaImage};
use mupdf::{Colorspace, Document as MuDocument, Matrix};
use webp::Encoder as WebpEncoder;

use crate::error::{Error, Result};

/// Encoding for rendered previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFormat {
    /// Lossless, fast compression
    Png,
    /// Lossy quality 85
    Webp,
}

/// Renders pages of one PDF byte buffer at a fixed scale.
pub struct PageRenderer {
    doc: MuDocument,
    page_count: usize,
    scale: f32,
}

impl PageRenderer {
    /// Open a renderer over raw PDF bytes.
    pub fn from_bytes(bytes: &[u8], scale: f32) -> Result<Self> {
        let doc = MuDocument::from_bytes(bytes, "")
            .map_err(|e| Error::Parse(format!("Failed to open PDF for rendering: {e}")))?;
        let page_count = doc
            .page_count()
            .map_err(|e| Error::Parse(format!("Failed to get page count: {e}")))?;

        Ok(Self {
            doc,
            page_count: usize::try_from(page_count).unwrap_or(0),
            scale,
        })
    }

    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Render a page to an RGBA image buffer.
    pub fn render_page(&self, page_num: usize) -> Result<RgbaImage> {
        if page_num >= self.page_count {
            return Err(Error::Render {
                page: page_num,
                reason: format!("page out of range (document has {})", self.page_count),
            });
        }
        let index = i32::try_from(page_num).map_err(|_| Error::Render {
            page: page_num,
            reason: "page index too large".to_string(),
        })?;

        let page = self.doc.load_page(index).map_err(|e| Error::Render {
            page: page_num,
            reason: format!("Failed to load page: {e}"),
        })?;

        let matrix = Matrix::new_scale(self.scale, self.scale);
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
            .map_err(|e| Error::Render {
                page: page_num,
                reason: format!("Failed to render: {e}"),
            })?;

        let pixels = pixmap.samples();
        let img_width = pixmap.width();
        let img_height = pixmap.height();

        // mupdf may hand back RGB, RGBA or grayscale samples
        let n = pixmap.n() as usize;
        let mut rgba_pixels = Vec::with_capacity((img_width * img_height * 4) as usize);

        for chunk in pixels.chunks(n) {
            match n {
                3 => {
                    rgba_pixels.extend_from_slice(chunk);
                    rgba_pixels.push(255);
                }
                4 => {
                    rgba_pixels.extend_from_slice(chunk);
                }
                1 => {
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(255);
                }
                _ => {
                    return Err(Error::Render {
                        page: page_num,
                        reason: format!("Unexpected pixel format with {n} components"),
                    });
                }
            }
        }

        RgbaImage::from_raw(img_width, img_height, rgba_pixels).ok_or_else(|| Error::Render {
            page: page_num,
            reason: "Failed to create image buffer".to_string(),
        })
    }

    /// Render a page to PNG bytes.
    pub fn render_page_png(&self, page_num: usize) -> Result<Vec<u8>> {
        let img = self.render_page(page_num)?;

        let mut png_data = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new_with_quality(
            &mut png_data,
            image::codecs::png::CompressionType::Fast,
            image::codecs::png::FilterType::Adaptive,
        );

        encoder
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| Error::Render {
                page: page_num,
                reason: format!("Failed to encode PNG: {e}"),
            })?;

        Ok(png_data)
    }

    /// Render a page to WebP bytes (lossy, quality 85).
    pub fn render_page_webp(&self, page_num: usize) -> Result<Vec<u8>> {
        let img = self.render_page(page_num)?;

        let encoder = WebpEncoder::from_rgba(img.as_raw(), img.width(), img.height());
        let webp_data = encoder.encode(85.0);

        Ok(webp_data.to_vec())
    }

    /// Render a page in the requested encoding.
    pub fn render_page_as(&self, page_num: usize, format: ThumbnailFormat) -> Result<Vec<u8>> {
        match format {
            ThumbnailFormat::Png => self.render_page_png(page_num),
            ThumbnailFormat::Webp => self.render_page_webp(page_num),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::test_support::sample_pdf;

    #[test]
    fn test_renderer_reports_page_count() {
        let renderer = PageRenderer::from_bytes(&sample_pdf(2), 0.4).unwrap();
        assert_eq!(renderer.page_count(), 2);
    }

    #[test]
    fn test_render_png_magic_bytes() {
        let renderer = PageRenderer::from_bytes(&sample_pdf(1), 0.4).unwrap();
        let png = renderer.render_page_png(0).unwrap();
        assert!(png.starts_with(&[0x89, 0x50, 0x4E, 0x47]));
    }

    #[test]
    fn test_render_webp_magic_bytes() {
        let renderer = PageRenderer::from_bytes(&sample_pdf(1), 0.4).unwrap();
        let webp = renderer.render_page_webp(0).unwrap();
        assert!(webp.starts_with(b"RIFF") && webp.len() > 12 && &webp[8..12] == b"WEBP");
    }

    #[test]
    fn test_render_out_of_range() {
        let renderer = PageRenderer::from_bytes(&sample_pdf(1), 0.4).unwrap();
        assert!(matches!(
            renderer.render_page_png(5),
            Err(Error::Render { page: 5, .. })
        ));
    }

    #[test]
    fn test_scale_changes_output_size() {
        let small = PageRenderer::from_bytes(&sample_pdf(1), 0.25).unwrap();
        let large = PageRenderer::from_bytes(&sample_pdf(1), 0.5).unwrap();
        let small_img = small.render_page(0).unwrap();
        let large_img = large.render_page(0).unwrap();
        assert!(large_img.width() > small_img.width());
    }
}

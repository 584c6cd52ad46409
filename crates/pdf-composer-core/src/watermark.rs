//! Watermark engine.
//!
//! Stamps a page in place: an optional centered logo first (so text stays
//! legible on top), then any enabled text stamps. Rotated stamps are centered
//! by their *visual* bounding box: the draw origin is the page center minus
//! the text's half-extent vector rotated by the stamp angle. Drawing at the
//! page center and then rotating would orbit the box around the center
//! instead of keeping it centered.

use lopdf::ObjectId;

use crate::config::WatermarkConfig;
use crate::error::Result;
use crate::pdf::{Canvas, ImageHandle, OutputBuilder, StandardFont, TextOp};

/// Angle of the `diagonal` stamp in degrees.
const DIAGONAL_ANGLE: f32 = 60.0;

/// Angle of the `crossed` stamp in degrees.
const CROSSED_ANGLE: f32 = -60.0;

/// Rotated stamp font size as a fraction of the smaller page dimension.
const ROTATED_SIZE_FACTOR: f32 = 0.11;

/// Font size of the top/bottom edge stamps in points.
const EDGE_STAMP_SIZE: f32 = 10.0;

/// Distance of the bottom stamp baseline from the bottom edge in points.
const BOTTOM_MARGIN: f32 = 15.0;

/// Distance of the top stamp baseline from the top edge in points.
const TOP_MARGIN: f32 = 25.0;

/// Opacity added to edge stamps so they stay legible as footers/headers.
const EDGE_OPACITY_BOOST: f32 = 0.4;

/// Font used for all stamps.
const STAMP_FONT: StandardFont = StandardFont::Helvetica;

/// Stamp a page that is already part of the output document.
///
/// A config with all four flags off and no logo draws nothing; that is a
/// valid invocation, not an error.
pub fn stamp_page(
    builder: &mut OutputBuilder,
    page: ObjectId,
    config: &WatermarkConfig,
    text: &str,
    logo: Option<&ImageHandle>,
) -> Result<()> {
    let (page_width, page_height) = builder.page_size(page);
    let mut canvas = Canvas::new();

    if let Some(logo) = logo {
        draw_centered_logo(&mut canvas, logo, config, page_width, page_height);
    }

    for (enabled, angle) in [
        (config.diagonal, DIAGONAL_ANGLE),
        (config.crossed, CROSSED_ANGLE),
    ] {
        if !enabled {
            continue;
        }
        let size = ROTATED_SIZE_FACTOR * page_width.min(page_height);
        let (x, y) = rotated_stamp_origin(text, size, angle, page_width, page_height);
        canvas.text(&TextOp {
            text,
            font: STAMP_FONT,
            size,
            x,
            y,
            color: config.text_color,
            opacity: config.text_opacity,
            rotation: angle,
        });
    }

    if config.bottom {
        canvas.text(&edge_stamp(text, config, page_width, BOTTOM_MARGIN));
    }
    if config.top {
        canvas.text(&edge_stamp(text, config, page_width, page_height - TOP_MARGIN));
    }

    builder.apply_canvas(page, canvas)
}

fn draw_centered_logo(
    canvas: &mut Canvas,
    logo: &ImageHandle,
    config: &WatermarkConfig,
    page_width: f32,
    page_height: f32,
) {
    #[allow(clippy::cast_precision_loss)]
    let scale_factor = (page_width * config.logo_scale) / logo.width.max(1) as f32;
    #[allow(clippy::cast_precision_loss)]
    let scaled_width = logo.width as f32 * scale_factor;
    #[allow(clippy::cast_precision_loss)]
    let scaled_height = logo.height as f32 * scale_factor;

    canvas.image(
        logo,
        (page_width - scaled_width) / 2.0,
        (page_height - scaled_height) / 2.0,
        scaled_width,
        scaled_height,
        config.logo_opacity,
    );
}

/// Small horizontal stamp centered at the given baseline height.
fn edge_stamp<'a>(
    text: &'a str,
    config: &WatermarkConfig,
    page_width: f32,
    y: f32,
) -> TextOp<'a> {
    let text_width = STAMP_FONT.text_width(text, EDGE_STAMP_SIZE);
    TextOp {
        text,
        font: STAMP_FONT,
        size: EDGE_STAMP_SIZE,
        x: (page_width - text_width) / 2.0,
        y,
        color: config.text_color,
        opacity: edge_opacity(config.text_opacity),
        rotation: 0.0,
    }
}

/// Edge stamps boost opacity for legibility, hard-clamped at 1.0.
fn edge_opacity(base: f32) -> f32 {
    (base + EDGE_OPACITY_BOOST).min(1.0)
}

/// Draw origin keeping the rotated text's visual center on the page center.
///
/// The half-extent vector `(w/2, h/2)` of the un-rotated bounding box is
/// rotated by the stamp angle and subtracted from the page center:
/// `x = cx - (w/2·cosθ - h/2·sinθ)`, `y = cy - (w/2·sinθ + h/2·cosθ)`.
fn rotated_stamp_origin(
    text: &str,
    size: f32,
    angle_deg: f32,
    page_width: f32,
    page_height: f32,
) -> (f32, f32) {
    let half_w = STAMP_FONT.text_width(text, size) / 2.0;
    let half_h = STAMP_FONT.text_height(size) / 2.0;
    let (cx, cy) = (page_width / 2.0, page_height / 2.0);

    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let x = cx - (half_w * cos - half_h * sin);
    let y = cy - (half_w * sin + half_h * cos);
    (x, y)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{Rgb, STRICT_WATERMARK, WatermarkConfig};
    use crate::pdf::SourceDocument;
    use crate::pdf::test_support::{page_content_text, sample_pdf};

    #[test]
    fn test_edge_opacity_clamps_at_one() {
        assert!((edge_opacity(0.3) - 0.7).abs() < f32::EPSILON);
        assert!((edge_opacity(0.9) - 1.0).abs() < f32::EPSILON);
        assert!((edge_opacity(1.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rotated_origin_is_deterministic() {
        let a = rotated_stamp_origin("CONFIDENTIAL", 65.0, 60.0, 595.28, 841.89);
        let b = rotated_stamp_origin("CONFIDENTIAL", 65.0, 60.0, 595.28, 841.89);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unrotated_origin_centers_box() {
        // At angle 0 the formula reduces to centering the bounding box.
        let (x, y) = rotated_stamp_origin("HI", 100.0, 0.0, 600.0, 800.0);
        let w = STAMP_FONT.text_width("HI", 100.0);
        let h = STAMP_FONT.text_height(100.0);
        assert!((x - (300.0 - w / 2.0)).abs() < 0.01);
        assert!((y - (400.0 - h / 2.0)).abs() < 0.01);
    }

    #[test]
    fn test_crossed_angle_mirrors_diagonal_x() {
        // cos is even and sin odd, so flipping the angle moves the origin
        // symmetrically about the vertical through the page center for the
        // y term while keeping the same cos contribution.
        let (x_pos, _) = rotated_stamp_origin("MARK", 50.0, 60.0, 600.0, 800.0);
        let (x_neg, _) = rotated_stamp_origin("MARK", 50.0, -60.0, 600.0, 800.0);
        assert!(x_neg < x_pos);
    }

    #[test]
    fn test_all_flags_off_draws_nothing() {
        let source = SourceDocument::parse(&sample_pdf(1)).unwrap();
        let mut builder = OutputBuilder::new();
        let page = builder.copy_all_pages(&source).unwrap()[0];

        let config = WatermarkConfig {
            diagonal: false,
            bottom: false,
            top: false,
            crossed: false,
            ..WatermarkConfig::default()
        };
        stamp_page(&mut builder, page, &config, "MARK", None).unwrap();

        let bytes = builder.finish().unwrap();
        let content = page_content_text(&bytes, 0);
        assert!(!content.contains("MARK"));
    }

    #[test]
    fn test_strict_config_draws_two_stamps() {
        let source = SourceDocument::parse(&sample_pdf(1)).unwrap();
        let mut builder = OutputBuilder::new();
        let page = builder.copy_all_pages(&source).unwrap()[0];

        stamp_page(&mut builder, page, &STRICT_WATERMARK, "MARK", None).unwrap();

        let bytes = builder.finish().unwrap();
        let content = page_content_text(&bytes, 0);
        // Diagonal + bottom stamp
        assert_eq!(content.matches("(MARK) Tj").count(), 2);
    }

    #[test]
    fn test_bottom_only_stamp_position() {
        let source = SourceDocument::parse(&sample_pdf(1)).unwrap();
        let mut builder = OutputBuilder::new();
        let page = builder.copy_all_pages(&source).unwrap()[0];

        let config = WatermarkConfig {
            diagonal: false,
            bottom: true,
            top: false,
            crossed: false,
            text_color: Rgb::black(),
            ..WatermarkConfig::default()
        };
        stamp_page(&mut builder, page, &config, "MARK", None).unwrap();

        let bytes = builder.finish().unwrap();
        let content = page_content_text(&bytes, 0);
        assert_eq!(content.matches("(MARK) Tj").count(), 1);

        // 15pt from the bottom edge, horizontally centered on the 612pt page
        let expected_x = (612.0 - STAMP_FONT.text_width("MARK", EDGE_STAMP_SIZE)) / 2.0;
        assert!(content.contains(&format!("{expected_x:.2} 15.00 Tm")));
    }
}

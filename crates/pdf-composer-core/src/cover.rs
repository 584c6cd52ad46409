//! Cover page synthesizer.
//!
//! Draws a fixed informational page onto a freshly created A4 page: a header
//! band with title, subtitle and optional logo, two content cards, rows of
//! pill buttons, an icon panel and a footer band. Every coordinate derives
//! from the page dimensions. List markers and pill icons are vector shapes
//! (circles and diamonds) rather than glyphs: bullet characters are not safe
//! in WinAnsiEncoding.
//!
//! Exactly one page is appended per call, regardless of input.

use lopdf::ObjectId;

use crate::config::Rgb;
use crate::error::Result;
use crate::pdf::{Canvas, Logo, OutputBuilder, StandardFont, TextOp};

/// Synthesized cover page size in points (A4 portrait).
pub const COVER_PAGE_WIDTH: f32 = 595.28;
pub const COVER_PAGE_HEIGHT: f32 = 841.89;

// Palette
const BAND: Rgb = Rgb::new(0.13, 0.16, 0.30);
const ACCENT: Rgb = Rgb::new(0.17, 0.45, 0.70);
const CARD: Rgb = Rgb::new(0.94, 0.95, 0.97);
const INK: Rgb = Rgb::new(0.15, 0.17, 0.22);
const MUTED: Rgb = Rgb::new(0.42, 0.46, 0.52);

const TITLE: &str = "Document Package";
const SUBTITLE: &str = "Assembled and stamped for distribution";
const FOOTER: &str = "Generated with PDF Composer";

const CARD_LINES: [&str; 4] = [
    "This file was assembled from one or more",
    "source documents. Pages keep their original",
    "order and resolution; only the stamps shown",
    "on the right were added during processing.",
];

const BULLETS: [&str; 4] = [
    "Sources merged in upload order",
    "Watermark applied to content pages",
    "Cover pages left unstamped",
    "Single output, serialized once",
];

const PILLS: [&str; 6] = [
    "Print ready",
    "Searchable text",
    "Original resolution",
    "Uniform stamping",
    "Standard fonts",
    "A4 cover",
];

const PANEL_ENTRIES: [&str; 3] = ["Merged", "Stamped", "Checked"];

/// Append the synthesized cover page to the output document.
///
/// The logo, when supplied, is embedded into the document and drawn in the
/// header band above the title.
pub fn draw_cover_page(builder: &mut OutputBuilder, logo: Option<&Logo>) -> Result<ObjectId> {
    let logo_handle = logo.map(|l| builder.embed_logo(l)).transpose()?;

    let page = builder.add_blank_page(COVER_PAGE_WIDTH, COVER_PAGE_HEIGHT);
    let (w, h) = (COVER_PAGE_WIDTH, COVER_PAGE_HEIGHT);
    let mut canvas = Canvas::new();

    // Header band: top ~35% of the page
    let band_h = h * 0.35;
    canvas.rect(0.0, h - band_h, w, band_h, BAND, 1.0);

    if let Some(handle) = &logo_handle {
        let logo_w = w * 0.18;
        let logo_h = logo_w * handle.aspect();
        canvas.image(handle, (w - logo_w) / 2.0, h * 0.85, logo_w, logo_h, 1.0);
    }

    centered_text(&mut canvas, TITLE, StandardFont::HelveticaBold, 30.0, w, h * 0.78, Rgb::white());
    centered_text(&mut canvas, SUBTITLE, StandardFont::Helvetica, 13.0, w, h * 0.74, CARD);

    // Two side-by-side content cards
    let margin = w * 0.07;
    let gap = w * 0.04;
    let card_w = (w - 2.0 * margin - gap) / 2.0;
    let card_h = h * 0.20;
    let card_y = h * 0.40;

    canvas.rect(margin, card_y, card_w, card_h, CARD, 1.0);
    canvas.text(&TextOp {
        text: "About this file",
        font: StandardFont::HelveticaBold,
        size: 13.0,
        x: margin + 12.0,
        y: card_y + card_h - 24.0,
        color: INK,
        opacity: 1.0,
        rotation: 0.0,
    });
    for (i, line) in CARD_LINES.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = card_y + card_h - 44.0 - i as f32 * 14.0;
        canvas.text(&TextOp {
            text: line,
            font: StandardFont::Helvetica,
            size: 9.5,
            x: margin + 12.0,
            y,
            color: MUTED,
            opacity: 1.0,
            rotation: 0.0,
        });
    }

    let accent_x = margin + card_w + gap;
    canvas.rect(accent_x, card_y, card_w, card_h, ACCENT, 1.0);
    canvas.text(&TextOp {
        text: "Included processing",
        font: StandardFont::HelveticaBold,
        size: 13.0,
        x: accent_x + 12.0,
        y: card_y + card_h - 24.0,
        color: Rgb::white(),
        opacity: 1.0,
        rotation: 0.0,
    });
    for (i, bullet) in BULLETS.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = card_y + card_h - 44.0 - i as f32 * 16.0;
        canvas.circle(accent_x + 16.0, y + 3.0, 2.2, Rgb::white());
        canvas.text(&TextOp {
            text: bullet,
            font: StandardFont::Helvetica,
            size: 9.5,
            x: accent_x + 24.0,
            y,
            color: Rgb::white(),
            opacity: 1.0,
            rotation: 0.0,
        });
    }

    // Three rows of two pill buttons with diamond icons
    let pill_h = h * 0.032;
    let pill_gap = h * 0.014;
    for (i, label) in PILLS.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let (col, row) = ((i % 2) as f32, (i / 2) as f32);
        let x = margin + col * (card_w + gap);
        let y = h * 0.33 - row * (pill_h + pill_gap);

        canvas.rect(x, y, card_w, pill_h, CARD, 1.0);
        diamond(&mut canvas, x + 16.0, y + pill_h / 2.0, 4.0, ACCENT);
        canvas.text(&TextOp {
            text: label,
            font: StandardFont::Helvetica,
            size: 10.0,
            x: x + 28.0,
            y: y + pill_h / 2.0 - 3.5,
            color: INK,
            opacity: 1.0,
            rotation: 0.0,
        });
    }

    // Icon panel with three entries
    let panel_y = h * 0.10;
    let panel_h = h * 0.08;
    let panel_w = w - 2.0 * margin;
    canvas.rect(margin, panel_y, panel_w, panel_h, CARD, 1.0);
    for (i, entry) in PANEL_ENTRIES.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let slot_center = margin + panel_w * (0.5 + i as f32) / 3.0;
        canvas.circle(slot_center, panel_y + panel_h * 0.62, 5.0, ACCENT);
        let label_w = StandardFont::Helvetica.text_width(entry, 9.0);
        canvas.text(&TextOp {
            text: entry,
            font: StandardFont::Helvetica,
            size: 9.0,
            x: slot_center - label_w / 2.0,
            y: panel_y + panel_h * 0.22,
            color: INK,
            opacity: 1.0,
            rotation: 0.0,
        });
    }

    // Footer band
    let footer_h = h * 0.06;
    canvas.rect(0.0, 0.0, w, footer_h, BAND, 1.0);
    centered_text(
        &mut canvas,
        FOOTER,
        StandardFont::Helvetica,
        9.0,
        w,
        footer_h / 2.0 - 3.0,
        Rgb::white(),
    );

    builder.apply_canvas(page, canvas)?;
    Ok(page)
}

fn centered_text(
    canvas: &mut Canvas,
    text: &str,
    font: StandardFont,
    size: f32,
    page_width: f32,
    y: f32,
    color: Rgb,
) {
    let text_width = font.text_width(text, size);
    canvas.text(&TextOp {
        text,
        font,
        size,
        x: (page_width - text_width) / 2.0,
        y,
        color,
        opacity: 1.0,
        rotation: 0.0,
    });
}

fn diamond(canvas: &mut Canvas, cx: f32, cy: f32, size: f32, color: Rgb) {
    canvas.polygon(
        &[
            (cx, cy + size),
            (cx + size, cy),
            (cx, cy - size),
            (cx - size, cy),
        ],
        color,
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::SourceDocument;
    use crate::pdf::test_support::page_content_text;

    #[test]
    fn test_exactly_one_page_appended() {
        let mut builder = OutputBuilder::new();
        draw_cover_page(&mut builder, None).unwrap();
        assert_eq!(builder.page_count(), 1);

        let bytes = builder.finish().unwrap();
        let doc = SourceDocument::parse(&bytes).unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_cover_page_is_a4() {
        let mut builder = OutputBuilder::new();
        draw_cover_page(&mut builder, None).unwrap();
        let bytes = builder.finish().unwrap();

        let doc = SourceDocument::parse(&bytes).unwrap();
        let (w, h) = doc.page_size(0).unwrap();
        assert!((w - 595.28).abs() < 0.01);
        assert!((h - 841.89).abs() < 0.01);
    }

    #[test]
    fn test_cover_draws_title_and_footer() {
        let mut builder = OutputBuilder::new();
        draw_cover_page(&mut builder, None).unwrap();
        let bytes = builder.finish().unwrap();

        let content = page_content_text(&bytes, 0);
        assert!(content.contains("(Document Package) Tj"));
        assert!(content.contains("(Generated with PDF Composer) Tj"));
    }

    #[test]
    fn test_cover_draws_vector_markers() {
        let mut builder = OutputBuilder::new();
        draw_cover_page(&mut builder, None).unwrap();
        let bytes = builder.finish().unwrap();

        let content = page_content_text(&bytes, 0);
        // Six diamond pills (closed filled paths) and seven circles
        // (4 bullets + 3 panel icons, four Bezier arcs each)
        assert_eq!(content.matches("h\nf").count(), 6);
        assert_eq!(content.matches(" c\n").count(), 7 * 4);
    }

    #[test]
    fn test_cover_without_logo_has_no_xobject() {
        let mut builder = OutputBuilder::new();
        draw_cover_page(&mut builder, None).unwrap();
        let bytes = builder.finish().unwrap();

        let content = page_content_text(&bytes, 0);
        assert!(!content.contains(" Do"));
    }
}

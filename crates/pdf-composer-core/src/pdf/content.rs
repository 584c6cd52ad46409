//! Content-stream drawing primitives.
//!
//! # Coordinate System
//!
//! All coordinates are PDF user-space points with a **bottom-left origin**:
//! (0, 0) is the bottom-left page corner, X grows right, Y grows up.
//! Rotations are counter-clockwise, in degrees, about the draw origin.
//!
//! A [`Canvas`] accumulates drawing operators plus the resources they
//! reference (fonts, opacity graphics states, image XObjects). It is applied
//! to a page by [`super::builder::OutputBuilder::apply_canvas`], which appends
//! the operator stream to the page contents and merges the collected
//! resources into the page's Resources dictionary.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use lopdf::ObjectId;

use super::font::StandardFont;
use super::image::ImageHandle;
use crate::config::Rgb;

/// Magic constant for approximating quarter circles with cubic Béziers.
const CIRCLE_KAPPA: f32 = 0.552_284_75;

/// A single positioned text draw.
#[derive(Debug, Clone)]
pub struct TextOp<'a> {
    pub text: &'a str,
    pub font: StandardFont,
    /// Font size in points
    pub size: f32,
    /// Draw origin (text baseline start)
    pub x: f32,
    pub y: f32,
    pub color: Rgb,
    /// Fill opacity in [0, 1]; 1.0 draws without a graphics-state change
    pub opacity: f32,
    /// Counter-clockwise rotation in degrees about the draw origin
    pub rotation: f32,
}

/// Accumulates content-stream operators and their resource requirements.
#[derive(Debug, Default)]
pub struct Canvas {
    ops: String,
    fonts: BTreeSet<StandardFont>,
    /// Required fill alphas, as clamped percentages
    alphas: BTreeSet<u16>,
    /// Image resource name -> XObject id
    images: BTreeMap<String, ObjectId>,
}

/// Resource name for an opacity graphics state ("GS30" for 30%).
pub(crate) fn gs_name(percent: u16) -> String {
    format!("GS{percent}")
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Register an opacity and emit its `gs` operator unless fully opaque.
    fn push_opacity(&mut self, opacity: f32) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = (opacity.clamp(0.0, 1.0) * 100.0).round() as u16;
        if percent < 100 {
            self.alphas.insert(percent);
            let _ = writeln!(self.ops, "/{} gs", gs_name(percent));
        }
    }

    fn push_fill_color(&mut self, color: Rgb) {
        let _ = writeln!(self.ops, "{:.3} {:.3} {:.3} rg", color.r, color.g, color.b);
    }

    /// Draw a line of text.
    pub fn text(&mut self, op: &TextOp<'_>) {
        self.fonts.insert(op.font);

        self.ops.push_str("q\n");
        self.push_opacity(op.opacity);
        self.ops.push_str("BT\n");
        let _ = writeln!(self.ops, "/{} {:.2} Tf", op.font.resource_name(), op.size);
        self.push_fill_color(op.color);

        // The text matrix both rotates and positions: glyph space is rotated
        // about the draw origin, so the baseline starts at (x, y) and runs
        // along the rotated X axis.
        let rad = op.rotation.to_radians();
        let (sin, cos) = rad.sin_cos();
        let _ = writeln!(
            self.ops,
            "{:.4} {:.4} {:.4} {:.4} {:.2} {:.2} Tm",
            cos, sin, -sin, cos, op.x, op.y
        );

        let _ = writeln!(self.ops, "({}) Tj", escape_pdf_string(op.text));
        self.ops.push_str("ET\nQ\n");
    }

    /// Draw an embedded image scaled into the given rectangle.
    pub fn image(&mut self, image: &ImageHandle, x: f32, y: f32, width: f32, height: f32, opacity: f32) {
        self.images.insert(image.resource_name.clone(), image.id);

        self.ops.push_str("q\n");
        self.push_opacity(opacity);
        // The unit image square is mapped onto the target rect
        let _ = writeln!(self.ops, "{width:.2} 0 0 {height:.2} {x:.2} {y:.2} cm");
        let _ = writeln!(self.ops, "/{} Do", image.resource_name);
        self.ops.push_str("Q\n");
    }

    /// Draw a filled axis-aligned rectangle.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb, opacity: f32) {
        self.ops.push_str("q\n");
        self.push_opacity(opacity);
        self.push_fill_color(color);
        let _ = writeln!(self.ops, "{x:.2} {y:.2} {width:.2} {height:.2} re f");
        self.ops.push_str("Q\n");
    }

    /// Draw a filled circle from four Bézier arcs.
    ///
    /// Used for hand-drawn bullet glyphs: Unicode bullets are unsafe in
    /// WinAnsiEncoding, so list markers are vector shapes instead.
    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb) {
        let k = radius * CIRCLE_KAPPA;
        let (right, left) = (cx + radius, cx - radius);
        let (top, bottom) = (cy + radius, cy - radius);

        self.ops.push_str("q\n");
        self.push_fill_color(color);
        let _ = writeln!(self.ops, "{right:.2} {cy:.2} m");
        // Four quarter arcs, counter-clockwise from the rightmost point
        let _ = writeln!(
            self.ops,
            "{right:.2} {:.2} {:.2} {top:.2} {cx:.2} {top:.2} c",
            cy + k,
            cx + k
        );
        let _ = writeln!(
            self.ops,
            "{:.2} {top:.2} {left:.2} {:.2} {left:.2} {cy:.2} c",
            cx - k,
            cy + k
        );
        let _ = writeln!(
            self.ops,
            "{left:.2} {:.2} {:.2} {bottom:.2} {cx:.2} {bottom:.2} c",
            cy - k,
            cx - k
        );
        let _ = writeln!(
            self.ops,
            "{:.2} {bottom:.2} {right:.2} {:.2} {right:.2} {cy:.2} c",
            cx + k,
            cy - k
        );
        self.ops.push_str("f\nQ\n");
    }

    /// Draw a filled closed polygon through the given points.
    ///
    /// Used for the diamond icon glyphs on the cover page.
    pub fn polygon(&mut self, points: &[(f32, f32)], color: Rgb) {
        let Some(((first_x, first_y), rest)) = points.split_first() else {
            return;
        };

        self.ops.push_str("q\n");
        self.push_fill_color(color);
        let _ = writeln!(self.ops, "{first_x:.2} {first_y:.2} m");
        for (x, y) in rest {
            let _ = writeln!(self.ops, "{x:.2} {y:.2} l");
        }
        self.ops.push_str("h\nf\nQ\n");
    }

    /// Break the canvas into its operator stream and resource requirements.
    pub(crate) fn into_parts(self) -> CanvasParts {
        CanvasParts {
            ops: self.ops,
            fonts: self.fonts,
            alphas: self.alphas,
            images: self.images,
        }
    }
}

pub(crate) struct CanvasParts {
    pub ops: String,
    pub fonts: BTreeSet<StandardFont>,
    pub alphas: BTreeSet<u16>,
    pub images: BTreeMap<String, ObjectId>,
}

/// Escape special characters in a PDF literal string.
fn escape_pdf_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' => result.push_str("\\("),
            ')' => result.push_str("\\)"),
            '\\' => result.push_str("\\\\"),
            _ => result.push(c),
        }
    }
    result
}

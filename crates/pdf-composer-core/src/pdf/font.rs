//! Standard-14 font support for drawn text.
//!
//! The engine only ever draws Latin text (watermark stamps and the cover
//! page), so it relies on the PDF Base-14 fonts: no font program is embedded,
//! only a Type1 font dictionary with WinAnsiEncoding. Text measurement uses
//! the standard AFM advance widths, expressed in 1/1000ths of the font size.

use lopdf::{Dictionary, Object};

/// A PDF Base-14 font usable by the drawing primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
}

impl StandardFont {
    /// PostScript base font name.
    pub const fn base_name(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Courier => "Courier",
        }
    }

    /// Resource name used in content streams (e.g. "/FHelv 12 Tf").
    pub const fn resource_name(self) -> &'static str {
        match self {
            Self::Helvetica => "FHelv",
            Self::HelveticaBold => "FHelvB",
            Self::Courier => "FCour",
        }
    }

    /// Build the Type1 font dictionary for this font.
    pub(crate) fn font_dict(self) -> Dictionary {
        Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            (
                "BaseFont",
                Object::Name(self.base_name().as_bytes().to_vec()),
            ),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ])
    }

    /// Advance width of a single character in 1/1000ths of the font size.
    fn char_width_units(self, c: char) -> f32 {
        match self {
            Self::Courier => 600.0,
            Self::Helvetica => ascii_width(c, &HELVETICA_WIDTHS),
            Self::HelveticaBold => ascii_width(c, &HELVETICA_BOLD_WIDTHS),
        }
    }

    /// Width of a string in points at the given font size.
    pub fn text_width(self, text: &str, font_size: f32) -> f32 {
        let units: f32 = text.chars().map(|c| self.char_width_units(c)).sum();
        units * font_size / 1000.0
    }

    /// Ascender in 1/1000ths of the font size.
    pub const fn ascender(self) -> f32 {
        match self {
            Self::Helvetica | Self::HelveticaBold => 718.0,
            Self::Courier => 629.0,
        }
    }

    /// Descender in 1/1000ths of the font size (negative).
    pub const fn descender(self) -> f32 {
        match self {
            Self::Helvetica | Self::HelveticaBold => -207.0,
            Self::Courier => -157.0,
        }
    }

    /// Visual height of a line of text in points at the given font size.
    ///
    /// This is the ascender-to-descender extent, the same quantity the
    /// watermark geometry uses as the text bounding-box height.
    pub fn text_height(self, font_size: f32) -> f32 {
        (self.ascender() - self.descender()) * font_size / 1000.0
    }
}

fn ascii_width(c: char, table: &[f32; 95]) -> f32 {
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) {
        table[(code - 0x20) as usize]
    } else {
        // WinAnsiEncoding covers more, but drawn text is ASCII; approximate.
        500.0
    }
}

/// Helvetica advance widths for ASCII 0x20..=0x7E (standard AFM metrics).
#[rustfmt::skip]
const HELVETICA_WIDTHS: [f32; 95] = [
    278.0, 278.0, 355.0, 556.0, 556.0, 889.0, 667.0, 191.0, // space ! " # $ % & '
    333.0, 333.0, 389.0, 584.0, 278.0, 333.0, 278.0, 278.0, // ( ) * + , - . /
    556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, // 0-7
    556.0, 556.0, 278.0, 278.0, 584.0, 584.0, 584.0, 556.0, // 8 9 : ; < = > ?
    1015.0, 667.0, 667.0, 722.0, 722.0, 667.0, 611.0, 778.0, // @ A B C D E F G
    722.0, 278.0, 500.0, 667.0, 556.0, 833.0, 722.0, 778.0, // H I J K L M N O
    667.0, 778.0, 722.0, 667.0, 611.0, 722.0, 667.0, 944.0, // P Q R S T U V W
    667.0, 667.0, 611.0, 278.0, 278.0, 278.0, 469.0, 556.0, // X Y Z [ \ ] ^ _
    333.0, 556.0, 556.0, 500.0, 556.0, 556.0, 278.0, 556.0, // ` a b c d e f g
    556.0, 222.0, 222.0, 500.0, 222.0, 833.0, 556.0, 556.0, // h i j k l m n o
    556.0, 556.0, 333.0, 500.0, 278.0, 556.0, 500.0, 722.0, // p q r s t u v w
    500.0, 500.0, 500.0, 334.0, 260.0, 334.0, 584.0,        // x y z { | } ~
];

/// Helvetica-Bold advance widths for ASCII 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [f32; 95] = [
    278.0, 333.0, 474.0, 556.0, 556.0, 889.0, 722.0, 238.0, // space ! " # $ % & '
    333.0, 333.0, 389.0, 584.0, 278.0, 333.0, 278.0, 278.0, // ( ) * + , - . /
    556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, // 0-7
    556.0, 556.0, 333.0, 333.0, 584.0, 584.0, 584.0, 611.0, // 8 9 : ; < = > ?
    975.0, 722.0, 722.0, 722.0, 722.0, 667.0, 611.0, 778.0, // @ A B C D E F G
    722.0, 278.0, 556.0, 722.0, 611.0, 833.0, 722.0, 778.0, // H I J K L M N O
    667.0, 778.0, 722.0, 667.0, 611.0, 722.0, 667.0, 944.0, // P Q R S T U V W
    667.0, 667.0, 611.0, 333.0, 278.0, 333.0, 584.0, 556.0, // X Y Z [ \ ] ^ _
    333.0, 556.0, 611.0, 556.0, 611.0, 556.0, 333.0, 611.0, // ` a b c d e f g
    611.0, 278.0, 278.0, 556.0, 278.0, 889.0, 611.0, 611.0, // h i j k l m n o
    611.0, 611.0, 389.0, 556.0, 333.0, 611.0, 556.0, 778.0, // p q r s t u v w
    556.0, 556.0, 500.0, 389.0, 280.0, 389.0, 584.0,        // x y z { | } ~
];

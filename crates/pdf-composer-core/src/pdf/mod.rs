mod builder;
mod content;
mod document;
mod font;
pub mod image;
mod render;

pub use builder::{OutputBuilder, PdfMetadata};
pub use content::{Canvas, TextOp};
pub use document::SourceDocument;
pub use font::StandardFont;
pub use image::{ImageHandle, ImageKind, Logo};
pub use render::{PageRenderer, ThumbnailFormat};

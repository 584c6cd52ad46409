use serde::{Deserialize, Serialize};

use crate::pdf::image::Logo;

/// An RGB color with components in the 0.0-1.0 range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    pub const fn gray() -> Self {
        Self::new(0.5, 0.5, 0.5)
    }

    pub const fn dark_red() -> Self {
        Self::new(0.8, 0.0, 0.0)
    }

    /// Parse a hex color string like "#1A2B3C" or "1A2B3C".
    ///
    /// Returns `None` when the string is not six hex digits.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        ))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::gray()
    }
}

/// Watermark settings for one pipeline invocation.
///
/// Immutable per invocation. The single-merge product mode always uses
/// [`STRICT_WATERMARK`]; batch mode accepts a caller-supplied instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Rotated stamp at +60 degrees across the page center
    #[serde(default)]
    pub diagonal: bool,

    /// Small horizontal stamp 15pt from the bottom edge
    #[serde(default)]
    pub bottom: bool,

    /// Small horizontal stamp 25pt from the top edge
    #[serde(default)]
    pub top: bool,

    /// Rotated stamp at -60 degrees, crossing the diagonal one
    #[serde(default)]
    pub crossed: bool,

    /// Stamp text color
    #[serde(default)]
    pub text_color: Rgb,

    /// Stamp text opacity in [0, 1]
    #[serde(default = "default_text_opacity")]
    pub text_opacity: f32,

    /// Optional logo image drawn centered beneath the text stamps
    #[serde(skip)]
    pub logo: Option<Logo>,

    /// Logo opacity in [0, 1]
    #[serde(default = "default_logo_opacity")]
    pub logo_opacity: f32,

    /// Logo width as a fraction of the page width, in [0, 1]
    #[serde(default = "default_logo_scale")]
    pub logo_scale: f32,
}

const fn default_text_opacity() -> f32 {
    0.3
}

const fn default_logo_opacity() -> f32 {
    0.3
}

const fn default_logo_scale() -> f32 {
    0.5
}

impl Default for WatermarkConfig {
    /// Defaults mirror the strict settings: diagonal and bottom stamps in
    /// translucent gray. Config files opt into flags explicitly instead.
    fn default() -> Self {
        Self {
            diagonal: true,
            bottom: true,
            top: false,
            crossed: false,
            text_color: Rgb::gray(),
            text_opacity: default_text_opacity(),
            logo: None,
            logo_opacity: default_logo_opacity(),
            logo_scale: default_logo_scale(),
        }
    }
}

/// The fixed watermark settings applied uniformly in single-merge mode.
pub const STRICT_WATERMARK: WatermarkConfig = WatermarkConfig {
    diagonal: true,
    bottom: true,
    top: false,
    crossed: false,
    text_color: Rgb::gray(),
    text_opacity: 0.3,
    logo: None,
    logo_opacity: 0.3,
    logo_scale: 0.5,
};

/// Stamp text used when the caller does not supply one.
pub const DEFAULT_STAMP_TEXT: &str = "PDF COMPOSER";

/// Scale factor for editor thumbnails (previews only; compilation always
/// copies the full-resolution page)
pub const DEFAULT_THUMBNAIL_SCALE: f32 = 0.4;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default watermark settings for batch processing
    #[serde(default)]
    pub watermark: WatermarkConfig,

    /// Default stamp text
    #[serde(default = "default_stamp_text")]
    pub stamp_text: String,

    /// Thumbnail rendering scale factor
    #[serde(default = "default_thumbnail_scale")]
    pub thumbnail_scale: f32,
}

fn default_stamp_text() -> String {
    DEFAULT_STAMP_TEXT.to_string()
}

const fn default_thumbnail_scale() -> f32 {
    DEFAULT_THUMBNAIL_SCALE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            watermark: WatermarkConfig::default(),
            stamp_text: default_stamp_text(),
            thumbnail_scale: default_thumbnail_scale(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load from default locations (~/.config/pdf-composer/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-composer").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        // Return defaults
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_config_shape() {
        assert!(STRICT_WATERMARK.diagonal);
        assert!(STRICT_WATERMARK.bottom);
        assert!(!STRICT_WATERMARK.top);
        assert!(!STRICT_WATERMARK.crossed);
        assert!(STRICT_WATERMARK.logo.is_none());
    }

    #[test]
    fn test_rgb_from_hex() {
        let color = Rgb::from_hex("#FF0000").unwrap();
        assert!((color.r - 1.0).abs() < f32::EPSILON);
        assert!(color.g.abs() < f32::EPSILON);

        assert!(Rgb::from_hex("nope").is_none());
        assert!(Rgb::from_hex("#12345").is_none());
    }

    #[test]
    fn test_watermark_config_toml_roundtrip() {
        let toml_str = r#"
            diagonal = true
            crossed = true
            text_opacity = 0.5
        "#;
        let config: WatermarkConfig = toml::from_str(toml_str).unwrap();
        assert!(config.diagonal);
        assert!(config.crossed);
        assert!(!config.bottom);
        assert!((config.text_opacity - 0.5).abs() < f32::EPSILON);
        assert!((config.logo_scale - 0.5).abs() < f32::EPSILON);
    }
}

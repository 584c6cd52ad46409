//! Utility functions shared across the crate.

use std::path::PathBuf;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Derive a download filename as `stem_suffix.pdf`.
///
/// Idempotent: a stem already ending in `_suffix` is left alone.
pub fn derive_output_name(original: &str, suffix: &str) -> String {
    let base = original.rsplit('/').next().unwrap_or(original);
    let stem = base
        .strip_suffix(".pdf")
        .or_else(|| base.strip_suffix(".PDF"))
        .unwrap_or(base);

    let marker = format!("_{suffix}");
    if stem.ends_with(&marker) {
        format!("{stem}.pdf")
    } else {
        format!("{stem}{marker}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_output_name_appends_suffix() {
        assert_eq!(derive_output_name("report.pdf", "stamped"), "report_stamped.pdf");
    }

    #[test]
    fn test_derive_output_name_is_idempotent() {
        assert_eq!(
            derive_output_name("report_stamped.pdf", "stamped"),
            "report_stamped.pdf"
        );
    }

    #[test]
    fn test_derive_output_name_strips_directories() {
        assert_eq!(
            derive_output_name("uploads/batch/report.pdf", "stamped"),
            "report_stamped.pdf"
        );
    }

    #[test]
    fn test_derive_output_name_without_extension() {
        assert_eq!(derive_output_name("report", "stamped"), "report_stamped.pdf");
    }
}

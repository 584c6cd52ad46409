//! Merge pipeline.
//!
//! Two product modes share the same assembly machinery:
//!
//! - [`merge_single`] produces one document: optional cover pages (copied
//!   verbatim, never watermarked), then every content file's pages stamped
//!   with the fixed [`STRICT_WATERMARK`] config.
//! - [`process_file`] / [`process_batch`] produce one output per content
//!   file with a caller-supplied watermark config and an optional shared
//!   cover.
//!
//! Any input that fails to parse aborts the whole operation; no partial
//! output buffer is ever returned.

use crate::config::{DEFAULT_STAMP_TEXT, STRICT_WATERMARK, WatermarkConfig};
use crate::cover::draw_cover_page;
use crate::error::{Error, Result};
use crate::pdf::{Logo, OutputBuilder, PdfMetadata, SourceDocument};
use crate::watermark::stamp_page;

/// Progress callback, invoked with values in `[0, 100]`.
///
/// Advisory only: the engine never depends on the callback being invoked
/// promptly or at all, and values never decrease within one invocation.
pub type ProgressFn<'a> = &'a mut dyn FnMut(f32);

/// One content input: a display name (for error reporting) plus raw bytes.
#[derive(Debug, Clone)]
pub struct MergeInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl MergeInput {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Where the cover of a single merged output comes from.
///
/// A supplied cover file is used verbatim; the synthesizer only runs when
/// explicitly requested and no file is given.
#[derive(Debug, Clone, Default)]
pub enum CoverSource {
    /// No cover pages at all
    #[default]
    None,
    /// Exactly one synthesized page
    Synthesized,
    /// All pages of the supplied file, in their original order
    File(Vec<u8>),
}

/// Options for a single-output merge.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub cover: CoverSource,
    pub metadata: Option<PdfMetadata>,
    /// Passed through to the cover synthesizer only; the strict watermark
    /// never stamps a logo.
    pub logo: Option<Logo>,
    pub stamp_text: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            cover: CoverSource::None,
            metadata: None,
            logo: None,
            stamp_text: DEFAULT_STAMP_TEXT.to_string(),
        }
    }
}

/// Merge content files into one output with the strict watermark.
///
/// Progress checkpoints: 5 after cover handling, 15 to 95 linearly across
/// content files, 100 on completion.
pub fn merge_single(
    contents: &[MergeInput],
    options: &MergeOptions,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<Vec<u8>> {
    let mut builder = OutputBuilder::new();
    let mut report = |value: f32| {
        if let Some(callback) = progress.as_mut() {
            callback(value);
        }
    };

    match &options.cover {
        CoverSource::None => {}
        CoverSource::Synthesized => {
            draw_cover_page(&mut builder, options.logo.as_ref())?;
        }
        CoverSource::File(bytes) => {
            let cover = SourceDocument::parse(bytes)
                .map_err(|e| Error::merge("cover", e))?;
            builder.copy_all_pages(&cover)?;
            tracing::debug!("Copied {} unwatermarked cover pages", cover.page_count());
        }
    }
    report(5.0);

    #[allow(clippy::cast_precision_loss)]
    let total = contents.len() as f32;
    for (index, input) in contents.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        report(15.0 + 80.0 * index as f32 / total);

        let source = SourceDocument::parse(&input.bytes)
            .map_err(|e| Error::merge(input.name.as_str(), e))?;
        let pages = builder
            .copy_all_pages(&source)
            .map_err(|e| Error::merge(input.name.as_str(), e))?;
        for page in pages {
            stamp_page(&mut builder, page, &STRICT_WATERMARK, &options.stamp_text, None)
                .map_err(|e| Error::merge(input.name.as_str(), e))?;
        }
        tracing::info!(
            "Merged '{}' ({} pages, strict watermark)",
            input.name,
            source.page_count()
        );
    }

    if let Some(metadata) = options.metadata.clone() {
        builder.set_metadata(metadata);
    }

    let output = builder.finish()?;
    report(100.0);
    Ok(output)
}

/// Options shared by every file of one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub config: WatermarkConfig,
    pub stamp_text: String,
    /// Shared cover file, copied unwatermarked in front of each output
    pub cover: Option<Vec<u8>>,
    pub metadata: Option<PdfMetadata>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            config: WatermarkConfig::default(),
            stamp_text: DEFAULT_STAMP_TEXT.to_string(),
            cover: None,
            metadata: None,
        }
    }
}

/// One processed batch result.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub original_name: String,
    pub bytes: Vec<u8>,
    /// Page count of the produced document (cover included)
    pub pages: usize,
}

/// Process one content file into its own output document.
///
/// The caller logo (if any) is embedded once per output document; the logo
/// must decode before any page is copied or drawn.
pub fn process_file(content: &MergeInput, options: &BatchOptions) -> Result<Vec<u8>> {
    let mut builder = OutputBuilder::new();

    let logo_handle = options
        .config
        .logo
        .as_ref()
        .map(|logo| builder.embed_logo(logo))
        .transpose()?;

    if let Some(cover_bytes) = &options.cover {
        let cover = SourceDocument::parse(cover_bytes)
            .map_err(|e| Error::merge("cover", e))?;
        builder.copy_all_pages(&cover)?;
    }

    let source = SourceDocument::parse(&content.bytes)
        .map_err(|e| Error::merge(content.name.as_str(), e))?;
    let pages = builder
        .copy_all_pages(&source)
        .map_err(|e| Error::merge(content.name.as_str(), e))?;
    for page in pages {
        stamp_page(
            &mut builder,
            page,
            &options.config,
            &options.stamp_text,
            logo_handle.as_ref(),
        )
        .map_err(|e| Error::merge(content.name.as_str(), e))?;
    }

    if let Some(metadata) = options.metadata.clone() {
        builder.set_metadata(metadata);
    }

    builder.finish()
}

/// Process every file in order, accumulating one named output per file.
///
/// Progress is reported as `(index / total) * 100` before each file starts.
/// A single bad file aborts the entire batch; no partial result list is
/// returned.
pub fn process_batch(
    files: &[MergeInput],
    options: &BatchOptions,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<Vec<BatchOutput>> {
    #[allow(clippy::cast_precision_loss)]
    let total = files.len() as f32;
    let mut outputs = Vec::with_capacity(files.len());

    for (index, file) in files.iter().enumerate() {
        if let Some(callback) = progress.as_mut() {
            #[allow(clippy::cast_precision_loss)]
            callback(index as f32 / total * 100.0);
        }

        let bytes = process_file(file, options)?;
        let pages = SourceDocument::parse(&bytes)?.page_count();
        tracing::info!("Processed '{}' into {} pages", file.name, pages);
        outputs.push(BatchOutput {
            original_name: file.name.clone(),
            bytes,
            pages,
        });
    }

    Ok(outputs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::test_support::{page_content_text, sample_pdf};

    #[test]
    fn test_merge_page_count_invariant() {
        // cover 2 pages + content 3 + 1 = 6
        let contents = vec![
            MergeInput::new("a.pdf", sample_pdf(3)),
            MergeInput::new("b.pdf", sample_pdf(1)),
        ];
        let options = MergeOptions {
            cover: CoverSource::File(sample_pdf(2)),
            ..MergeOptions::default()
        };

        let output = merge_single(&contents, &options, None).unwrap();
        let doc = SourceDocument::parse(&output).unwrap();
        assert_eq!(doc.page_count(), 6);
    }

    #[test]
    fn test_merge_cover_unstamped_content_stamped() {
        let contents = vec![
            MergeInput::new("a.pdf", sample_pdf(3)),
            MergeInput::new("b.pdf", sample_pdf(1)),
        ];
        let options = MergeOptions {
            cover: CoverSource::File(sample_pdf(2)),
            ..MergeOptions::default()
        };

        let output = merge_single(&contents, &options, None).unwrap();

        // Pages 1-2 (cover) carry no stamps; pages 3-6 carry diagonal+bottom
        let marker = format!("({DEFAULT_STAMP_TEXT}) Tj");
        for index in 0..2 {
            assert_eq!(page_content_text(&output, index).matches(&marker).count(), 0);
        }
        for index in 2..6 {
            assert_eq!(page_content_text(&output, index).matches(&marker).count(), 2);
        }
    }

    #[test]
    fn test_merge_synthesized_cover_is_one_page() {
        let contents = vec![MergeInput::new("a.pdf", sample_pdf(2))];
        let options = MergeOptions {
            cover: CoverSource::Synthesized,
            ..MergeOptions::default()
        };

        let output = merge_single(&contents, &options, None).unwrap();
        let doc = SourceDocument::parse(&output).unwrap();
        assert_eq!(doc.page_count(), 3);
    }

    #[test]
    fn test_merge_without_cover() {
        let contents = vec![MergeInput::new("a.pdf", sample_pdf(2))];
        let output = merge_single(&contents, &MergeOptions::default(), None).unwrap();
        let doc = SourceDocument::parse(&output).unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_merge_bad_input_aborts() {
        let contents = vec![
            MergeInput::new("good.pdf", sample_pdf(1)),
            MergeInput::new("bad.pdf", vec![1, 2, 3]),
        ];
        let result = merge_single(&contents, &MergeOptions::default(), None);
        assert!(matches!(result, Err(Error::Merge { input, .. }) if input == "bad.pdf"));
    }

    #[test]
    fn test_merge_progress_checkpoints() {
        let contents = vec![
            MergeInput::new("a.pdf", sample_pdf(1)),
            MergeInput::new("b.pdf", sample_pdf(1)),
        ];
        let mut seen: Vec<f32> = Vec::new();
        let mut record = |value: f32| seen.push(value);

        merge_single(&contents, &MergeOptions::default(), Some(&mut record)).unwrap();

        assert_eq!(seen.first().copied(), Some(5.0));
        assert_eq!(seen.last().copied(), Some(100.0));
        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
        // 15..95 interpolation over two files: 15 and 55
        assert!(seen.contains(&15.0));
        assert!(seen.contains(&55.0));
    }

    #[test]
    fn test_merge_writes_metadata() {
        let contents = vec![MergeInput::new("a.pdf", sample_pdf(1))];
        let options = MergeOptions {
            metadata: Some(PdfMetadata {
                title: Some("Bundle".to_string()),
                author: Some("QA".to_string()),
            }),
            ..MergeOptions::default()
        };

        let output = merge_single(&contents, &options, None).unwrap();
        let doc = lopdf::Document::load_mem(&output).unwrap();
        assert!(doc.trailer.get(b"Info").is_ok());
    }

    #[test]
    fn test_batch_bottom_only_single_stamp() {
        let options = BatchOptions {
            config: WatermarkConfig {
                diagonal: false,
                bottom: true,
                top: false,
                crossed: false,
                ..WatermarkConfig::default()
            },
            stamp_text: "MARK".to_string(),
            ..BatchOptions::default()
        };

        let output =
            process_file(&MergeInput::new("a.pdf", sample_pdf(1)), &options).unwrap();
        let content = page_content_text(&output, 0);
        assert_eq!(content.matches("(MARK) Tj").count(), 1);
        assert!(content.contains("15.00 Tm"));
    }

    #[test]
    fn test_batch_outputs_match_input_order() {
        let files = vec![
            MergeInput::new("first.pdf", sample_pdf(2)),
            MergeInput::new("second.pdf", sample_pdf(1)),
        ];
        let outputs = process_batch(&files, &BatchOptions::default(), None).unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].original_name, "first.pdf");
        assert_eq!(outputs[0].pages, 2);
        assert_eq!(outputs[1].original_name, "second.pdf");
        assert_eq!(outputs[1].pages, 1);
    }

    #[test]
    fn test_batch_shared_cover_counts() {
        let files = vec![MergeInput::new("a.pdf", sample_pdf(2))];
        let options = BatchOptions {
            cover: Some(sample_pdf(1)),
            ..BatchOptions::default()
        };
        let outputs = process_batch(&files, &options, None).unwrap();
        assert_eq!(outputs[0].pages, 3);
    }

    #[test]
    fn test_batch_progress_before_each_file() {
        let files = vec![
            MergeInput::new("a.pdf", sample_pdf(1)),
            MergeInput::new("b.pdf", sample_pdf(1)),
        ];
        let mut seen: Vec<f32> = Vec::new();
        let mut record = |value: f32| seen.push(value);

        process_batch(&files, &BatchOptions::default(), Some(&mut record)).unwrap();
        assert_eq!(seen, vec![0.0, 50.0]);
    }

    #[test]
    fn test_batch_aborts_on_first_failure() {
        let files = vec![
            MergeInput::new("good.pdf", sample_pdf(1)),
            MergeInput::new("bad.pdf", vec![0; 4]),
            MergeInput::new("unreached.pdf", sample_pdf(1)),
        ];
        let result = process_batch(&files, &BatchOptions::default(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_logo_fails_before_drawing() {
        // GIF magic bytes declared as PNG
        let options = BatchOptions {
            config: WatermarkConfig {
                logo: Some(crate::pdf::Logo::new(
                    b"GIF89a not an image".to_vec(),
                    crate::pdf::ImageKind::Png,
                )),
                ..WatermarkConfig::default()
            },
            ..BatchOptions::default()
        };

        let result = process_file(&MergeInput::new("a.pdf", sample_pdf(1)), &options);
        assert!(matches!(result, Err(Error::UnsupportedImage(_))));
    }
}

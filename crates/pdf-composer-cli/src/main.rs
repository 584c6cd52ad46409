//! PDF Composer CLI - Command line tool for assembling and watermarking PDFs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_composer_core::{
    AppConfig, BatchOptions, CoverSource, Logo, MergeInput, MergeOptions, PageRenderer,
    PdfMetadata, Rgb, ThumbnailFormat, combine, merge_single, process_batch,
    util::derive_output_name,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, ValueEnum)]
enum FormatOption {
    Png,
    Webp,
}

impl From<FormatOption> for ThumbnailFormat {
    fn from(opt: FormatOption) -> Self {
        match opt {
            FormatOption::Png => Self::Png,
            FormatOption::Webp => Self::Webp,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pdf-compose")]
#[command(author, version, about = "Assemble, watermark and recombine PDF documents", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge inputs into one document with the strict watermark
    Merge {
        /// Content PDF files, merged in the order given
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Cover PDF copied in front, unwatermarked
        #[arg(long)]
        cover: Option<PathBuf>,

        /// Synthesize a default cover page instead of supplying one
        #[arg(long, conflicts_with = "cover")]
        default_cover: bool,

        /// Logo image (PNG/JPEG) for the synthesized cover
        #[arg(long)]
        logo: Option<PathBuf>,

        /// Document title metadata
        #[arg(long)]
        title: Option<String>,

        /// Document author metadata
        #[arg(long)]
        author: Option<String>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Process each input into its own watermarked output
    Batch {
        /// Content PDF files, processed in the order given
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Shared cover PDF copied in front of every output, unwatermarked
        #[arg(long)]
        cover: Option<PathBuf>,

        /// Logo image (PNG/JPEG) stamped beneath the text
        #[arg(long)]
        logo: Option<PathBuf>,

        /// Enable the diagonal stamp (overrides config flags when any stamp
        /// flag is given)
        #[arg(long)]
        diagonal: bool,

        /// Enable the bottom edge stamp
        #[arg(long)]
        bottom: bool,

        /// Enable the top edge stamp
        #[arg(long)]
        top: bool,

        /// Enable the crossed stamp
        #[arg(long)]
        crossed: bool,

        /// Stamp text
        #[arg(long)]
        text: Option<String>,

        /// Stamp color as hex, e.g. "#888888"
        #[arg(long)]
        color: Option<String>,

        /// Stamp text opacity (0-1)
        #[arg(long)]
        opacity: Option<f32>,

        /// Logo width as a fraction of page width (0-1)
        #[arg(long)]
        logo_scale: Option<f32>,

        /// Logo opacity (0-1)
        #[arg(long)]
        logo_opacity: Option<f32>,

        /// Suffix for derived output names (name_suffix.pdf)
        #[arg(long, default_value = "stamped")]
        suffix: String,

        /// Directory for the outputs
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Print a JSON manifest of the produced files
        #[arg(long)]
        manifest: bool,
    },

    /// Concatenate already-processed outputs without re-stamping
    Combine {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render per-page preview images
    Thumbs {
        input: PathBuf,

        /// Directory for the previews
        #[arg(long, default_value = "thumbs")]
        out_dir: PathBuf,

        /// Render scale (defaults to the config value)
        #[arg(long)]
        scale: Option<f32>,

        #[arg(long, value_enum, default_value = "png")]
        format: FormatOption,
    },
}

#[derive(Serialize)]
struct ManifestEntry {
    original: String,
    output: String,
    pages: usize,
}

fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    match args.command {
        Command::Merge {
            inputs,
            cover,
            default_cover,
            logo,
            title,
            author,
            output,
        } => run_merge(&config, &inputs, cover, default_cover, logo, title, author, &output),
        Command::Batch {
            inputs,
            cover,
            logo,
            diagonal,
            bottom,
            top,
            crossed,
            text,
            color,
            opacity,
            logo_scale,
            logo_opacity,
            suffix,
            out_dir,
            manifest,
        } => {
            let mut wm_config = config.watermark.clone();
            if diagonal || bottom || top || crossed {
                wm_config.diagonal = diagonal;
                wm_config.bottom = bottom;
                wm_config.top = top;
                wm_config.crossed = crossed;
            }
            if let Some(hex) = color {
                wm_config.text_color =
                    Rgb::from_hex(&hex).with_context(|| format!("Invalid color '{hex}'"))?;
            }
            if let Some(value) = opacity {
                wm_config.text_opacity = value;
            }
            if let Some(value) = logo_scale {
                wm_config.logo_scale = value;
            }
            if let Some(value) = logo_opacity {
                wm_config.logo_opacity = value;
            }
            if let Some(path) = logo {
                wm_config.logo = Some(load_logo(&path)?);
            }

            let options = BatchOptions {
                config: wm_config,
                stamp_text: text.unwrap_or_else(|| config.stamp_text.clone()),
                cover: cover.map(|path| read_input(&path)).transpose()?,
                metadata: None,
            };
            run_batch(&inputs, &options, &suffix, &out_dir, manifest)
        }
        Command::Combine { inputs, output } => run_combine(&inputs, &output),
        Command::Thumbs {
            input,
            out_dir,
            scale,
            format,
        } => run_thumbs(&input, &out_dir, scale.unwrap_or(config.thumbnail_scale), format.into()),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_merge(
    config: &AppConfig,
    inputs: &[PathBuf],
    cover: Option<PathBuf>,
    default_cover: bool,
    logo: Option<PathBuf>,
    title: Option<String>,
    author: Option<String>,
    output: &Path,
) -> Result<()> {
    let contents = read_inputs(inputs)?;

    let cover_source = if let Some(path) = cover {
        CoverSource::File(read_input(&path)?)
    } else if default_cover {
        CoverSource::Synthesized
    } else {
        CoverSource::None
    };

    let metadata = (title.is_some() || author.is_some()).then(|| PdfMetadata { title, author });

    let options = MergeOptions {
        cover: cover_source,
        metadata,
        logo: logo.map(|path| load_logo(&path)).transpose()?,
        stamp_text: config.stamp_text.clone(),
    };

    let pb = progress_bar();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut on_progress = |value: f32| pb.set_position(value as u64);

    let bytes = merge_single(&contents, &options, Some(&mut on_progress))?;
    pb.finish_with_message("Merge complete");

    std::fs::write(output, bytes)
        .context(format!("Failed to write output: {}", output.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Merged PDF saved to: {}", output.display());
    }
    Ok(())
}

fn run_batch(
    inputs: &[PathBuf],
    options: &BatchOptions,
    suffix: &str,
    out_dir: &Path,
    manifest: bool,
) -> Result<()> {
    let files = read_inputs(inputs)?;

    let pb = progress_bar();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut on_progress = |value: f32| pb.set_position(value as u64);

    let outputs = process_batch(&files, options, Some(&mut on_progress))?;
    pb.finish_with_message("Batch complete");

    std::fs::create_dir_all(out_dir)
        .context(format!("Failed to create {}", out_dir.display()))?;

    let mut entries = Vec::with_capacity(outputs.len());
    for result in outputs {
        let file_name = derive_output_name(&result.original_name, suffix);
        let path = out_dir.join(&file_name);
        std::fs::write(&path, &result.bytes)
            .context(format!("Failed to write {}", path.display()))?;
        info!("Wrote {} ({} pages)", path.display(), result.pages);
        entries.push(ManifestEntry {
            original: result.original_name,
            output: path.display().to_string(),
            pages: result.pages,
        });
    }

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        if manifest {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            println!("Processed {} files into {}", entries.len(), out_dir.display());
        }
    }
    Ok(())
}

fn run_combine(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let buffers: Result<Vec<Vec<u8>>> = inputs.iter().map(|path| read_input(path)).collect();
    let bytes = combine(&buffers?)?;

    std::fs::write(output, bytes)
        .context(format!("Failed to write output: {}", output.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Combined PDF saved to: {}", output.display());
    }
    Ok(())
}

fn run_thumbs(input: &Path, out_dir: &Path, scale: f32, format: ThumbnailFormat) -> Result<()> {
    let bytes = read_input(input)?;
    let renderer = PageRenderer::from_bytes(&bytes, scale)?;

    std::fs::create_dir_all(out_dir)
        .context(format!("Failed to create {}", out_dir.display()))?;

    let extension = match format {
        ThumbnailFormat::Png => "png",
        ThumbnailFormat::Webp => "webp",
    };
    for page_num in 0..renderer.page_count() {
        let preview = renderer.render_page_as(page_num, format)?;
        let path = out_dir.join(format!("page_{:03}.{extension}", page_num + 1));
        std::fs::write(&path, preview)
            .context(format!("Failed to write {}", path.display()))?;
    }

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!(
            "Rendered {} previews into {}",
            renderer.page_count(),
            out_dir.display()
        );
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).context(format!("Failed to read {}", path.display()))
}

fn read_inputs(paths: &[PathBuf]) -> Result<Vec<MergeInput>> {
    paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("input.pdf")
                .to_string();
            Ok(MergeInput::new(name, read_input(path)?))
        })
        .collect()
}

fn load_logo(path: &Path) -> Result<Logo> {
    let name = path.to_string_lossy();
    let bytes = read_input(path)?;
    Logo::from_named_bytes(&name, bytes)
        .context(format!("Unsupported logo image: {}", path.display()))
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% ")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

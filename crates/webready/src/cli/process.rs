//! The `webready process` command: discover, process, write, summarize.

use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use webready_core::{
    BatchItem, BatchOptions, BatchResult, Config, EncodeSpec, ImageProcessor, ReportFormat,
    ReportWriter, ResizeSpec, SourceFormat, WatermarkSpec,
};

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Image file or directory to process
    #[arg(required = true)]
    pub input: PathBuf,

    /// Directory to write derivatives into
    #[arg(short, long, default_value = "./webready-out")]
    pub out_dir: PathBuf,

    /// Size preset: web, portfolio, instagram, instagram-portrait, instagram-story
    #[arg(long)]
    pub preset: Option<String>,

    /// Explicit long-edge target in pixels (overrides --preset)
    #[arg(long)]
    pub long_edge: Option<u32>,

    /// Resampling filter: nearest, triangle, catmull-rom, lanczos3
    #[arg(long)]
    pub filter: Option<String>,

    /// Output format: jpeg or webp
    #[arg(short, long)]
    pub format: Option<String>,

    /// Codec quality, 1-100
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Suffix appended to output filenames, e.g. "_web"
    #[arg(long)]
    pub suffix: Option<String>,

    /// Watermark overlay image (enables watermarking)
    #[arg(long)]
    pub watermark: Option<PathBuf>,

    /// Watermark anchor, e.g. "bottom-right"
    #[arg(long)]
    pub position: Option<String>,

    /// Watermark size as a fraction of the image's shorter edge, (0, 1]
    #[arg(long)]
    pub scale: Option<f32>,

    /// Watermark opacity, 0.0-1.0
    #[arg(long)]
    pub opacity: Option<f32>,

    /// Watermark margin from the anchored edges in pixels
    #[arg(long)]
    pub margin: Option<u32>,

    /// Invert the watermark's colors (for dark logos on dark photos)
    #[arg(long)]
    pub invert: bool,

    /// Skip watermarking even if the config enables it
    #[arg(long)]
    pub no_watermark: bool,

    /// Keep EXIF metadata in the output
    #[arg(long)]
    pub keep_metadata: bool,

    /// Emit baseline JPEG instead of progressive
    #[arg(long)]
    pub baseline: bool,

    /// Do not descend into subdirectories
    #[arg(long)]
    pub no_recurse: bool,

    /// Write a machine-readable report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format: json or jsonl
    #[arg(long, default_value = "json")]
    pub report_format: String,
}

/// Execute the process command.
pub fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    let resize = resolve_resize(&args, &config)?;
    let encode = resolve_encode(&args, &config)?;
    let watermark = resolve_watermark(&args, &config)?;
    let options = BatchOptions {
        name_suffix: args
            .suffix
            .clone()
            .unwrap_or_else(|| config.output.suffix.clone()),
    };

    let files = discover_files(&args.input, !args.no_recurse)?;
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to process", files.len());

    let mut items = Vec::with_capacity(files.len());
    for path in &files {
        let bytes = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("failed to read {:?}: {e}", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let declared = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(SourceFormat::from_extension);
        let mut item = BatchItem::new(name, bytes);
        item.format = declared;
        items.push(item);
    }

    let progress = create_progress_bar(items.len() as u64);
    let start_time = std::time::Instant::now();

    let processor = ImageProcessor::new();
    let result = processor.process_batch_with(
        &items,
        &resize,
        watermark.as_ref(),
        &encode,
        &options,
        |item| {
            progress.inc(1);
            if let Err(failure) = &item.outcome {
                progress.println(format!("  {} {}: {}", console::style("✗").red(), item.input_name, failure.message));
            }
        },
    );
    progress.finish_and_clear();

    std::fs::create_dir_all(&args.out_dir)?;
    for item in &result.items {
        if let Ok(output) = &item.outcome {
            std::fs::write(args.out_dir.join(&output.output_name), &output.image.bytes)?;
        }
    }
    tracing::info!("Derivatives written to {:?}", args.out_dir);

    if let Some(report_path) = &args.report {
        write_report(report_path, &args.report_format, &result)?;
        tracing::info!("Report written to {:?}", report_path);
    }

    print_summary(&result, start_time.elapsed());

    if result.stats.succeeded == 0 {
        anyhow::bail!("all {} image(s) failed to process", result.stats.total);
    }
    Ok(())
}

/// Resolve the resize spec from config, with CLI overrides on top.
fn resolve_resize(args: &ProcessArgs, config: &Config) -> anyhow::Result<ResizeSpec> {
    let mut resize = config.resize.clone();
    if let Some(preset) = &args.preset {
        resize.preset = preset.clone();
        resize.long_edge = None;
    }
    if let Some(long_edge) = args.long_edge {
        if long_edge == 0 {
            anyhow::bail!("--long-edge must be > 0");
        }
        resize.long_edge = Some(long_edge);
    }
    if let Some(filter) = &args.filter {
        resize.filter = filter.clone();
    }
    resize.to_spec().ok_or_else(|| {
        anyhow::anyhow!(
            "unknown preset '{}' or filter '{}'",
            resize.preset,
            resize.filter
        )
    })
}

/// Resolve the encode spec from config, with CLI overrides on top.
fn resolve_encode(args: &ProcessArgs, config: &Config) -> anyhow::Result<EncodeSpec> {
    let mut output = config.output.clone();
    if let Some(format) = &args.format {
        output.format = format.clone();
    }
    if let Some(quality) = args.quality {
        if quality == 0 || quality > 100 {
            anyhow::bail!("--quality must be between 1 and 100");
        }
        output.quality = quality;
    }
    if args.keep_metadata {
        output.strip_metadata = false;
    }
    if args.baseline {
        output.progressive = false;
    }
    output
        .to_spec()
        .ok_or_else(|| anyhow::anyhow!("unknown output format '{}'", output.format))
}

/// Resolve the watermark spec, loading the overlay image if enabled.
fn resolve_watermark(args: &ProcessArgs, config: &Config) -> anyhow::Result<Option<WatermarkSpec>> {
    if args.no_watermark {
        return Ok(None);
    }

    let mut watermark = config.watermark.clone();
    if let Some(path) = &args.watermark {
        watermark.enabled = true;
        watermark.path = path.to_string_lossy().into_owned();
    }
    if !watermark.enabled {
        return Ok(None);
    }
    if let Some(position) = &args.position {
        watermark.position = position.clone();
    }
    if let Some(scale) = args.scale {
        watermark.scale = scale;
    }
    if let Some(opacity) = args.opacity {
        watermark.opacity = opacity;
    }
    if let Some(margin) = args.margin {
        watermark.margin = margin;
    }
    if args.invert {
        watermark.invert = true;
    }

    let overlay_path = watermark.resolved_path();
    let overlay = image::open(&overlay_path)
        .map_err(|e| anyhow::anyhow!("failed to load watermark {:?}: {e}", overlay_path))?;
    watermark
        .to_spec(overlay)
        .ok_or_else(|| anyhow::anyhow!("unknown watermark position '{}'", watermark.position))
        .map(Some)
}

/// Collect supported image files under `root`, sorted for deterministic order.
fn discover_files(root: &Path, recurse: bool) -> anyhow::Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        anyhow::bail!("input path does not exist: {:?}", root);
    }

    let max_depth = if recurse { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(SourceFormat::from_extension)
                .is_some()
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Write the batch report to a file.
fn write_report(path: &Path, format: &str, result: &BatchResult) -> anyhow::Result<()> {
    let report_format = ReportFormat::parse(format)
        .ok_or_else(|| anyhow::anyhow!("unknown report format '{format}'"))?;
    let file = File::create(path)?;
    let mut writer = ReportWriter::new(
        BufWriter::new(file),
        report_format,
        matches!(report_format, ReportFormat::Json),
    );
    writer.write(result)?;
    writer.flush()?;
    Ok(())
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary after batch processing.
fn print_summary(result: &BatchResult, elapsed: std::time::Duration) {
    let stats = &result.stats;
    let rate = if elapsed.as_secs_f64() > 0.0 {
        stats.succeeded as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    let in_mb = stats.input_bytes as f64 / 1_000_000.0;
    let out_mb = stats.output_bytes as f64 / 1_000_000.0;
    let saved = if stats.input_bytes > 0 {
        100.0 * (1.0 - stats.output_bytes as f64 / stats.input_bytes as f64)
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               {}", console::style("Summary").bold());
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.succeeded);
    if stats.failed > 0 {
        eprintln!(
            "    Failed:       {:>8}",
            console::style(stats.failed).red()
        );
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("    Size:         {:>5.1} MB -> {:.1} MB ({:.0}% smaller)", in_mb, out_mb, saved);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn default_args(input: PathBuf, out_dir: PathBuf) -> ProcessArgs {
        ProcessArgs {
            input,
            out_dir,
            preset: None,
            long_edge: None,
            filter: None,
            format: None,
            quality: None,
            suffix: None,
            watermark: None,
            position: None,
            scale: None,
            opacity: None,
            margin: None,
            invert: false,
            no_watermark: false,
            keep_metadata: false,
            baseline: false,
            no_recurse: false,
            report: None,
            report_format: "json".to_string(),
        }
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        DynamicImage::new_rgb8(width, height)
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn test_discover_finds_nested_images_and_skips_others() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("top.png"), 10, 10);
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_png(&dir.path().join("nested/deep.png"), 10, 10);
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let files = discover_files(dir.path(), true).unwrap();
        assert_eq!(files.len(), 2);

        let flat = discover_files(dir.path(), false).unwrap();
        assert_eq!(flat.len(), 1);
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.png");
        write_png(&path, 10, 10);
        let files = discover_files(&path, true).unwrap();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn test_resolve_resize_overrides() {
        let config = Config::default();
        let mut args = default_args(PathBuf::new(), PathBuf::new());
        args.long_edge = Some(640);
        let spec = resolve_resize(&args, &config).unwrap();
        assert_eq!(spec.target_long_edge, 640);

        args.long_edge = None;
        args.preset = Some("portfolio".to_string());
        let spec = resolve_resize(&args, &config).unwrap();
        assert_eq!(spec.target_long_edge, 2048);

        args.preset = Some("billboard".to_string());
        assert!(resolve_resize(&args, &config).is_err());
    }

    #[test]
    fn test_resolve_encode_overrides() {
        let config = Config::default();
        let mut args = default_args(PathBuf::new(), PathBuf::new());
        args.format = Some("webp".to_string());
        args.quality = Some(70);
        args.keep_metadata = true;
        let spec = resolve_encode(&args, &config).unwrap();
        assert_eq!(spec.format, webready_core::OutputFormat::WebP);
        assert_eq!(spec.quality, 70);
        assert!(!spec.strip_metadata);

        args.quality = Some(0);
        assert!(resolve_encode(&args, &config).is_err());
    }

    #[test]
    fn test_no_watermark_flag_wins_over_config() {
        let mut config = Config::default();
        config.watermark.enabled = true;
        config.watermark.path = "/nonexistent/logo.png".to_string();
        let mut args = default_args(PathBuf::new(), PathBuf::new());
        args.no_watermark = true;
        assert!(resolve_watermark(&args, &config).unwrap().is_none());
    }

    #[test]
    fn test_execute_writes_derivatives_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photos");
        std::fs::create_dir(&input).unwrap();
        write_png(&input.join("a.png"), 100, 80);
        write_png(&input.join("b.png"), 50, 50);

        let out_dir = dir.path().join("export");
        let report = dir.path().join("report.json");
        let mut args = default_args(input, out_dir.clone());
        args.suffix = Some("_web".to_string());
        args.report = Some(report.clone());

        execute(args, Config::default()).unwrap();

        assert!(out_dir.join("a_web.jpg").exists());
        assert!(out_dir.join("b_web.jpg").exists());
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(parsed["stats"]["succeeded"], 2);
    }
}

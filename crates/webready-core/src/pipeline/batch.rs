//! Batch orchestration over named image blobs.
//!
//! Items are processed independently and strictly in input order; one
//! item's failure is recorded and the run continues. Output names are
//! derived from input stems and disambiguated with a numeric suffix on
//! collision, so a batch never overwrites its own outputs.

use std::collections::HashSet;
use std::path::Path;

use crate::types::{
    BatchItem, BatchItemOutput, BatchItemResult, BatchResult, BatchStats, EncodeSpec, ItemFailure,
    OutputFormat, ResizeSpec, WatermarkSpec,
};

use super::processor::ImageProcessor;

/// Naming options for a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Appended to each output stem before the extension, e.g. "_web".
    pub name_suffix: String,
}

impl ImageProcessor {
    /// Process a batch of named blobs with shared specs.
    pub fn process_batch(
        &self,
        items: &[BatchItem],
        resize: &ResizeSpec,
        watermark: Option<&WatermarkSpec>,
        encode: &EncodeSpec,
        options: &BatchOptions,
    ) -> BatchResult {
        self.process_batch_with(items, resize, watermark, encode, options, |_| {})
    }

    /// Like [`process_batch`](Self::process_batch), invoking `observe` after
    /// each item so a front-end can track progress.
    pub fn process_batch_with<F>(
        &self,
        items: &[BatchItem],
        resize: &ResizeSpec,
        watermark: Option<&WatermarkSpec>,
        encode: &EncodeSpec,
        options: &BatchOptions,
        mut observe: F,
    ) -> BatchResult
    where
        F: FnMut(&BatchItemResult),
    {
        let mut namer = OutputNamer::new(options.name_suffix.clone());
        let mut results = Vec::with_capacity(items.len());
        let mut stats = BatchStats {
            total: items.len(),
            ..BatchStats::default()
        };

        for item in items {
            stats.input_bytes += item.bytes.len() as u64;
            let outcome = match self.process(
                &item.name,
                &item.bytes,
                item.format,
                resize,
                watermark,
                encode,
            ) {
                Ok(image) => {
                    stats.succeeded += 1;
                    stats.output_bytes += image.byte_size;
                    Ok(BatchItemOutput {
                        output_name: namer.assign(&item.name, encode.format),
                        image,
                    })
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!("Failed: {} - {}", item.name, e);
                    Err(ItemFailure::from(&e))
                }
            };
            let result = BatchItemResult {
                input_name: item.name.clone(),
                input_bytes: item.bytes.len() as u64,
                outcome,
            };
            observe(&result);
            results.push(result);
        }

        tracing::debug!(
            "Batch complete: {}/{} succeeded, {} -> {} bytes",
            stats.succeeded,
            stats.total,
            stats.input_bytes,
            stats.output_bytes
        );
        BatchResult {
            items: results,
            stats,
        }
    }
}

/// Derives collision-free output names from input names.
struct OutputNamer {
    suffix: String,
    used: HashSet<String>,
}

impl OutputNamer {
    fn new(suffix: String) -> Self {
        Self {
            suffix,
            used: HashSet::new(),
        }
    }

    /// `stem + suffix + "." + ext`, with `_1`, `_2`, ... appended to the
    /// stem when an earlier item already claimed the name.
    fn assign(&mut self, input_name: &str, format: OutputFormat) -> String {
        // Inputs pulled out of archives may carry directory components.
        let base = input_name.replace('\\', "/");
        let stem = Path::new(&base)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("image");

        let ext = format.extension();
        let mut candidate = format!("{}{}.{}", stem, self.suffix, ext);
        let mut counter = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{}{}_{}.{}", stem, self.suffix, counter, ext);
            counter += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use std::io::Cursor;

    fn png_item(name: &str, width: u32, height: u32) -> BatchItem {
        let image = DynamicImage::new_rgb8(width, height);
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        BatchItem::new(name, bytes.into_inner())
    }

    fn corrupt_item(name: &str) -> BatchItem {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0xAB; 32]);
        BatchItem::new(name, bytes)
    }

    #[test]
    fn test_duplicate_stems_get_numeric_suffix() {
        let processor = ImageProcessor::new();
        let items = vec![
            png_item("a.png", 10, 10),
            png_item("b.png", 10, 10),
            png_item("a.png", 10, 10),
        ];
        let result = processor.process_batch(
            &items,
            &ResizeSpec::new(1920),
            None,
            &EncodeSpec::jpeg(80),
            &BatchOptions::default(),
        );

        let names: Vec<_> = result
            .items
            .iter()
            .map(|r| r.outcome.as_ref().unwrap().output_name.clone())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "a_1.jpg"]);
    }

    #[test]
    fn test_one_corrupt_item_does_not_abort_the_batch() {
        let processor = ImageProcessor::new();
        let items = vec![
            png_item("first.png", 10, 10),
            corrupt_item("broken.png"),
            png_item("last.png", 10, 10),
        ];
        let result = processor.process_batch(
            &items,
            &ResizeSpec::new(1920),
            None,
            &EncodeSpec::jpeg(80),
            &BatchOptions::default(),
        );

        assert_eq!(result.items.len(), 3);
        assert!(result.items[0].outcome.is_ok());
        assert!(result.items[1].outcome.is_err());
        assert!(result.items[2].outcome.is_ok());
        let failure = result.items[1].outcome.as_ref().unwrap_err();
        assert_eq!(failure.kind, "corrupt_image");
        assert_eq!(result.stats.succeeded, 2);
        assert_eq!(result.stats.failed, 1);
        assert_eq!(
            result.stats.succeeded + result.stats.failed,
            result.stats.total
        );
    }

    #[test]
    fn test_results_keep_input_order() {
        let processor = ImageProcessor::new();
        let items = vec![
            png_item("zebra.png", 10, 10),
            png_item("apple.png", 10, 10),
            png_item("mango.png", 10, 10),
        ];
        let result = processor.process_batch(
            &items,
            &ResizeSpec::new(1920),
            None,
            &EncodeSpec::jpeg(80),
            &BatchOptions::default(),
        );
        let names: Vec<_> = result.items.iter().map(|r| r.input_name.as_str()).collect();
        assert_eq!(names, vec!["zebra.png", "apple.png", "mango.png"]);
    }

    #[test]
    fn test_name_suffix_and_nested_paths() {
        let mut namer = OutputNamer::new("_web".to_string());
        assert_eq!(namer.assign("shoot/raw/IMG_01.tiff", OutputFormat::Jpeg), "IMG_01_web.jpg");
        assert_eq!(namer.assign("IMG_01.png", OutputFormat::Jpeg), "IMG_01_web_1.jpg");
        assert_eq!(namer.assign("IMG_01.png", OutputFormat::Jpeg), "IMG_01_web_2.jpg");
    }

    #[test]
    fn test_namer_falls_back_on_empty_stem() {
        let mut namer = OutputNamer::new(String::new());
        assert_eq!(namer.assign("", OutputFormat::WebP), "image.webp");
    }

    #[test]
    fn test_aggregate_byte_counters() {
        let processor = ImageProcessor::new();
        let items = vec![png_item("a.png", 64, 64), corrupt_item("b.png")];
        let input_total: u64 = items.iter().map(|i| i.bytes.len() as u64).sum();
        let result = processor.process_batch(
            &items,
            &ResizeSpec::new(1920),
            None,
            &EncodeSpec::jpeg(80),
            &BatchOptions::default(),
        );
        assert_eq!(result.stats.input_bytes, input_total);
        let output_total: u64 = result
            .items
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok())
            .map(|o| o.image.byte_size)
            .sum();
        assert_eq!(result.stats.output_bytes, output_total);
    }

    #[test]
    fn test_observer_sees_every_item() {
        let processor = ImageProcessor::new();
        let items = vec![png_item("a.png", 10, 10), corrupt_item("b.png")];
        let mut seen = Vec::new();
        processor.process_batch_with(
            &items,
            &ResizeSpec::new(1920),
            None,
            &EncodeSpec::jpeg(80),
            &BatchOptions::default(),
            |r| seen.push(r.input_name.clone()),
        );
        assert_eq!(seen, vec!["a.png", "b.png"]);
    }
}

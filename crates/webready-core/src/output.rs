//! Batch report output in JSON and JSONL form.
//!
//! A report entry carries everything about one item except the encoded
//! bytes themselves; front-ends write those wherever they package outputs.

use serde::Serialize;
use std::io::{self, Write};

use crate::types::{BatchItemResult, BatchResult, BatchStats};

/// Report format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl ReportFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// One batch item, flattened for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub input_name: String,
    pub input_bytes: u64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&BatchItemResult> for ReportEntry {
    fn from(result: &BatchItemResult) -> Self {
        match &result.outcome {
            Ok(output) => Self {
                input_name: result.input_name.clone(),
                input_bytes: result.input_bytes,
                ok: true,
                output_name: Some(output.output_name.clone()),
                output_format: Some(output.image.format.as_str().to_string()),
                output_bytes: Some(output.image.byte_size),
                width: Some(output.image.width),
                height: Some(output.image.height),
                error_kind: None,
                error: None,
            },
            Err(failure) => Self {
                input_name: result.input_name.clone(),
                input_bytes: result.input_bytes,
                ok: false,
                output_name: None,
                output_format: None,
                output_bytes: None,
                width: None,
                height: None,
                error_kind: Some(failure.kind.clone()),
                error: Some(failure.message.clone()),
            },
        }
    }
}

/// Full report document for JSON output.
#[derive(Debug, Clone, Serialize)]
struct ReportDocument {
    items: Vec<ReportEntry>,
    stats: BatchStats,
}

/// Writes batch reports to any `Write` sink.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    pretty: bool,
}

impl<W: Write> ReportWriter<W> {
    /// `pretty` only affects the JSON format; JSONL is always one compact
    /// object per line.
    pub fn new(writer: W, format: ReportFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    /// Write the whole batch result.
    ///
    /// JSON produces one document with items and stats; JSONL produces one
    /// line per item followed by a stats line.
    pub fn write(&mut self, result: &BatchResult) -> io::Result<()> {
        let entries: Vec<ReportEntry> = result.items.iter().map(ReportEntry::from).collect();
        match self.format {
            ReportFormat::Json => {
                let document = ReportDocument {
                    items: entries,
                    stats: result.stats.clone(),
                };
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, &document)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, &document).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            ReportFormat::JsonLines => {
                for entry in &entries {
                    serde_json::to_writer(&mut self.writer, entry).map_err(io::Error::other)?;
                    writeln!(self.writer)?;
                }
                serde_json::to_writer(&mut self.writer, &result.stats)
                    .map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

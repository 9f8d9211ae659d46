//! Tabular report emission.
//!
//! Detection records are flattened into [`ReportRow`]s and rendered as CSV
//! (through the `csv` crate) or JSON. Both renderings parse back into
//! exactly the rows they were made from; confidence is written either as a
//! fraction or as a percentage, the same way for every row of one emission.
//!
//! # Example
//!
//! ```
//! use framescan::report::{self, ConfidenceStyle, ReportRow};
//! use framescan::Confidence;
//!
//! let rows = vec![ReportRow {
//!     frame_index: 0,
//!     object_count: 3,
//!     primary_class: "person".to_string(),
//!     confidence: Confidence::new(0.875),
//! }];
//!
//! let csv = report::to_csv(&rows, ConfidenceStyle::Percent)?;
//! assert_eq!(csv, "Frame,ObjectsDetected,PrimaryClass,Confidence\n0,3,person,87.50%\n");
//! assert_eq!(report::parse_csv(&csv)?, rows);
//! # Ok::<(), framescan::FrameScanError>(())
//! ```

use std::io;

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    detect::{Confidence, DetectionRecord},
    error::FrameScanError,
};

/// Header of the extended CSV report.
pub const CSV_HEADER: &str = "Frame,ObjectsDetected,PrimaryClass,Confidence";
/// Header of the basic two-column CSV report.
pub const BASIC_CSV_HEADER: &str = "Frame,Objects";

/// One flat report row. Column order is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Sampled frame index.
    pub frame_index: u64,
    /// Number of counted objects.
    pub object_count: u32,
    /// Primary class label.
    pub primary_class: String,
    /// Confidence of the primary class, if any.
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

/// How confidence values are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfidenceStyle {
    /// `0.8750` (a JSON number in JSON output).
    #[default]
    Fraction,
    /// `87.50%` (a JSON string in JSON output).
    Percent,
}

impl ConfidenceStyle {
    fn render(self, confidence: Confidence) -> String {
        match self {
            ConfidenceStyle::Fraction => confidence.to_fraction_string(),
            ConfidenceStyle::Percent => confidence.to_percent_string(),
        }
    }
}

/// Flatten records into rows ordered by frame index.
pub fn to_rows(records: &[DetectionRecord]) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = records
        .iter()
        .map(|record| ReportRow {
            frame_index: record.frame_index,
            object_count: record.object_count,
            primary_class: record.primary_class.clone(),
            confidence: record.confidence,
        })
        .collect();
    rows.sort_by_key(|row| row.frame_index);
    rows
}

/// One extended CSV record as laid out on disk.
#[derive(Serialize, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Frame")]
    frame: u64,
    #[serde(rename = "ObjectsDetected")]
    objects: u32,
    #[serde(rename = "PrimaryClass")]
    class: String,
    #[serde(rename = "Confidence")]
    confidence: String,
}

#[derive(Serialize, Deserialize)]
struct BasicCsvRecord {
    #[serde(rename = "Frame")]
    frame: u64,
    #[serde(rename = "Objects")]
    objects: u32,
}

/// Write `header`, then every record. Empty reports still carry the header.
fn write_csv<T: Serialize>(
    header: &str,
    records: impl IntoIterator<Item = T>,
) -> Result<String, FrameScanError> {
    let mut buffer = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut buffer);
        writer.write_record(header.split(','))?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    String::from_utf8(buffer)
        .map_err(|error| FrameScanError::Io(io::Error::new(io::ErrorKind::InvalidData, error)))
}

/// Render the extended CSV report.
pub fn to_csv(rows: &[ReportRow], style: ConfidenceStyle) -> Result<String, FrameScanError> {
    write_csv(
        CSV_HEADER,
        rows.iter().map(|row| CsvRecord {
            frame: row.frame_index,
            objects: row.object_count,
            class: row.primary_class.clone(),
            confidence: row
                .confidence
                .map(|confidence| style.render(confidence))
                .unwrap_or_default(),
        }),
    )
}

/// Render the basic `Frame,Objects` CSV report.
///
/// Class and confidence are dropped; parsing it back yields rows with an
/// empty class and no confidence.
pub fn to_basic_csv(rows: &[ReportRow]) -> Result<String, FrameScanError> {
    write_csv(
        BASIC_CSV_HEADER,
        rows.iter().map(|row| BasicCsvRecord {
            frame: row.frame_index,
            objects: row.object_count,
        }),
    )
}

/// Render rows as a pretty-printed JSON array of records.
pub fn to_json(rows: &[ReportRow], style: ConfidenceStyle) -> Result<String, FrameScanError> {
    let records: Vec<Value> = rows
        .iter()
        .map(|row| {
            let confidence = match (row.confidence, style) {
                (None, _) => Value::Null,
                (Some(confidence), ConfidenceStyle::Fraction) => json!(confidence.value()),
                (Some(confidence), ConfidenceStyle::Percent) => {
                    json!(confidence.to_percent_string())
                }
            };
            json!({
                "frame_index": row.frame_index,
                "object_count": row.object_count,
                "primary_class": row.primary_class,
                "confidence": confidence,
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Parse a JSON report produced by [`to_json`] (either confidence style).
pub fn parse_json(text: &str) -> Result<Vec<ReportRow>, FrameScanError> {
    Ok(serde_json::from_str(text)?)
}

fn parse_error(error: &csv::Error, line: usize) -> FrameScanError {
    FrameScanError::ReportParse {
        line: error
            .position()
            .map_or(line, |position| position.line() as usize),
        reason: error.to_string(),
    }
}

/// Parse a CSV report produced by [`to_csv`] or [`to_basic_csv`].
pub fn parse_csv(text: &str) -> Result<Vec<ReportRow>, FrameScanError> {
    let mut reader = ReaderBuilder::new().from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|error| parse_error(&error, 1))?
        .clone();

    let header = headers.iter().collect::<Vec<_>>().join(",");
    let extended = match header.as_str() {
        CSV_HEADER => true,
        BASIC_CSV_HEADER => false,
        _ => {
            return Err(FrameScanError::ReportParse {
                line: 1,
                reason: format!("unrecognised header {header:?}"),
            });
        }
    };

    reader
        .records()
        .map(|record| {
            let record = record.map_err(|error| parse_error(&error, 0))?;
            let line = record
                .position()
                .map_or(0, |position| position.line() as usize);

            if !extended {
                let basic: BasicCsvRecord = record
                    .deserialize(Some(&headers))
                    .map_err(|error| parse_error(&error, line))?;
                return Ok(ReportRow {
                    frame_index: basic.frame,
                    object_count: basic.objects,
                    primary_class: String::new(),
                    confidence: None,
                });
            }

            let parsed: CsvRecord = record
                .deserialize(Some(&headers))
                .map_err(|error| parse_error(&error, line))?;
            let confidence = match parsed.confidence.trim() {
                "" => None,
                text => Some(Confidence::parse(text).ok_or_else(|| {
                    FrameScanError::ReportParse {
                        line,
                        reason: format!("invalid confidence {text:?}"),
                    }
                })?),
            };

            Ok(ReportRow {
                frame_index: parsed.frame,
                object_count: parsed.objects,
                primary_class: parsed.class,
                confidence,
            })
        })
        .collect()
}

//! Dataset opening with format detection by extension

use crate::{jsonl::JsonlReader, Error, Record, Result};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Streaming record source with progress counters
pub trait DatasetReader: Iterator<Item = Result<Record>> {
    /// Total input size in bytes if known
    fn total_bytes(&self) -> Option<u64>;

    /// Bytes consumed so far
    fn bytes_processed(&self) -> u64;

    /// Records yielded so far
    fn records_processed(&self) -> usize;

    /// Lines skipped because they were not valid JSON
    fn malformed_lines(&self) -> usize;
}

impl<R: Read> DatasetReader for JsonlReader<R> {
    fn total_bytes(&self) -> Option<u64> {
        JsonlReader::total_bytes(self)
    }

    fn bytes_processed(&self) -> u64 {
        JsonlReader::bytes_processed(self)
    }

    fn records_processed(&self) -> usize {
        self.records_read()
    }

    fn malformed_lines(&self) -> usize {
        JsonlReader::malformed_lines(self)
    }
}

/// Open a dataset, picking the reader from the file extension
///
/// Supported formats:
/// - `.jsonl`, `.json` - JSON Lines
/// - `.gz` - gzip-compressed JSON Lines
pub fn open_dataset<P: AsRef<Path>>(path: P) -> Result<Box<dyn DatasetReader>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::UnsupportedFormat("No file extension found".to_string()))?;

    match extension {
        "jsonl" | "json" | "gz" => {
            info!("Opening dataset: {:?} (format: {})", path, extension);
            Ok(Box::new(JsonlReader::open(path)?))
        }
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported file extension: {}",
            extension
        ))),
    }
}

//! Streaming JSON Lines reader and writer
//!
//! Both sides handle gzip transparently when the path ends in `.gz`.

use crate::{Error, Record, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BUFFER_SIZE: usize = 64 * 1024;

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// Streaming JSONL reader that processes input line by line
///
/// Blank lines are skipped. Lines that are not valid JSON are logged and
/// skipped; [`JsonlReader::malformed_lines`] counts them.
pub struct JsonlReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    records_read: usize,
    malformed_lines: usize,
    bytes_read: u64,
    total_bytes: Option<u64>,
}

impl JsonlReader<Box<dyn Read>> {
    /// Open a JSONL file, decompressing `.gz`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        if is_gzip(path) {
            debug!("Opening gzip-compressed JSONL file: {:?}", path);
            let reader: Box<dyn Read> = Box::new(MultiGzDecoder::new(file));
            Ok(Self::with_total_bytes(reader, None))
        } else {
            debug!("Opening plain JSONL file: {:?}", path);
            let total_bytes = file.metadata()?.len();
            let reader: Box<dyn Read> = Box::new(file);
            Ok(Self::with_total_bytes(reader, Some(total_bytes)))
        }
    }
}

impl<R: Read> JsonlReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_total_bytes(reader, None)
    }

    fn with_total_bytes(reader: R, total_bytes: Option<u64>) -> Self {
        Self {
            reader: BufReader::with_capacity(BUFFER_SIZE, reader),
            line_number: 0,
            records_read: 0,
            malformed_lines: 0,
            bytes_read: 0,
            total_bytes,
        }
    }

    pub fn lines_processed(&self) -> usize {
        self.line_number
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    pub fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }

    /// Uncompressed bytes consumed so far
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_read
    }

    /// On-disk size for plain files; unknown for gzip
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }
}

impl<R: Read> Iterator for JsonlReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();

        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(n) => {
                    self.bytes_read += n as u64;
                    self.line_number += 1;

                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<Value>(trimmed) {
                        Ok(value) => {
                            self.records_read += 1;
                            return Some(Ok(Record::new(value, self.line_number)));
                        }
                        Err(e) => {
                            self.malformed_lines += 1;
                            warn!("Skipping malformed JSON at line {}: {}", self.line_number, e);
                        }
                    }
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }
        }
    }
}

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Plain(w) => w,
            Self::Gzip(w) => w,
        }
    }
}

/// JSONL writer, one compact object per line
pub struct JsonlWriter {
    sink: Sink,
    path: PathBuf,
    records_written: usize,
}

impl JsonlWriter {
    /// Create (or truncate) `path`, gzip-compressing when it ends in `.gz`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = BufWriter::with_capacity(BUFFER_SIZE, File::create(path)?);

        let sink = if is_gzip(path) {
            debug!("Creating gzip-compressed JSONL file: {:?}", path);
            Sink::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            debug!("Creating plain JSONL file: {:?}", path);
            Sink::Plain(file)
        };

        Ok(Self {
            sink,
            path: path.to_path_buf(),
            records_written: 0,
        })
    }

    pub fn write_record(&mut self, value: &Value) -> Result<()> {
        let writer = self.sink.writer();
        serde_json::to_writer(&mut *writer, value)?;
        writer.write_all(b"\n")?;
        self.records_written += 1;
        Ok(())
    }

    pub fn write_all<'a, I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        for value in values {
            self.write_record(value)?;
        }
        Ok(())
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffers and write the gzip trailer. Returns the record count.
    pub fn finish(self) -> Result<usize> {
        match self.sink {
            Sink::Plain(mut w) => w.flush()?,
            Sink::Gzip(encoder) => encoder.finish()?.flush()?,
        }
        debug!("Wrote {} records to {:?}", self.records_written, self.path);
        Ok(self.records_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_jsonl_reader_basic() {
        let data = r#"{"text": "hello", "id": 1}
{"text": "world", "id": 2}
{"text": "rust", "id": 3}"#;

        let records: Vec<_> = JsonlReader::new(data.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].data["text"], "hello");
        assert_eq!(records[2].data["id"], 3);
    }

    #[test]
    fn test_blank_and_malformed_lines_skipped() {
        let data = "{\"text\": \"hello\"}\n\n{invalid json}\n   \n{\"text\": \"world\"}\n";

        let mut reader = JsonlReader::new(data.as_bytes());
        let records: Vec<_> = reader.by_ref().collect::<Result<Vec<_>>>().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_line, 1);
        assert_eq!(records[1].source_line, 5);
        assert_eq!(reader.malformed_lines(), 1);
        assert_eq!(reader.records_read(), 2);
        assert_eq!(reader.lines_processed(), 5);
    }

    #[test]
    fn test_progress_tracking() {
        let data = "{\"text\": \"hello\"}\n{\"text\": \"world\"}";
        let mut reader = JsonlReader::new(data.as_bytes());

        assert_eq!(reader.bytes_processed(), 0);
        let _ = reader.next();
        assert_eq!(reader.bytes_processed(), 18);
        let _ = reader.next();
        assert_eq!(reader.bytes_processed(), data.len() as u64);
    }

    #[test]
    fn test_reader_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"{{"text": "hello"}}"#).unwrap();
        writeln!(temp_file, r#"{{"text": "world"}}"#).unwrap();
        temp_file.flush().unwrap();

        let reader = JsonlReader::open(temp_file.path()).unwrap();
        assert!(reader.total_bytes().unwrap() > 0);
        assert_eq!(reader.count(), 2);
    }

    #[test]
    fn test_writer_roundtrip_plain_and_gzip() {
        let dir = TempDir::new().unwrap();
        let records = vec![
            json!({"text": "first line\nsecond line", "id": 1}),
            json!({"text": "", "id": 2}),
        ];

        for name in ["out.jsonl", "out.jsonl.gz"] {
            let path = dir.path().join(name);
            let mut writer = JsonlWriter::create(&path).unwrap();
            writer.write_all(&records).unwrap();
            assert_eq!(writer.records_written(), 2);
            assert_eq!(writer.finish().unwrap(), 2);

            let read: Vec<Value> = JsonlReader::open(&path)
                .unwrap()
                .map(|r| r.unwrap().data)
                .collect();
            assert_eq!(read, records, "{}", name);
        }
    }

    #[test]
    fn test_writer_output_is_one_object_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut writer = JsonlWriter::create(&path).unwrap();
        writer.write_record(&json!({"text": "a\nb"})).unwrap();
        writer.write_record(&json!({"text": "c"})).unwrap();
        writer.finish().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\"text\":\"a\\nb\"}\n{\"text\":\"c\"}\n");
    }
}

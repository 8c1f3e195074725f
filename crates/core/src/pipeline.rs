//! Parallel corpus pipeline
//!
//! Runs the document filter over batches of JSON records with Rayon.
//! Records are processed in chunks; each chunk is filtered in parallel and
//! collected in input order, so output order always matches input order.

use crate::document::{Document, DEFAULT_TEXT_FIELD};
use crate::filter::{DocumentFilter, FilterOutcome, RejectReason};
use crate::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Pipeline statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub total_records: usize,
    pub accepted_records: usize,
    pub rejected_records: usize,
    /// Rejections keyed by [`RejectReason::code`]
    pub rejections: BTreeMap<String, usize>,
    /// Documents the filter abstained on
    pub capability_failures: usize,
    /// Sentences kept in accepted documents
    pub sentences_kept: usize,
    /// Sentences dropped by a predicate in accepted documents
    pub sentences_dropped: usize,
    /// Input text bytes
    pub bytes_processed: u64,
    /// Output text bytes of accepted documents
    pub bytes_retained: u64,
}

impl PipelineStats {
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_records > 0 {
            (self.accepted_records as f64 / self.total_records as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn rejection_rate(&self) -> f64 {
        if self.total_records > 0 {
            (self.rejected_records as f64 / self.total_records as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn rejections_for(&self, code: &str) -> usize {
        self.rejections.get(code).copied().unwrap_or(0)
    }

    /// Account for one filtered document
    pub fn record(&mut self, input_bytes: usize, outcome: &FilterOutcome) {
        self.total_records += 1;
        self.bytes_processed += input_bytes as u64;

        match outcome {
            FilterOutcome::Accepted { text, kept, dropped } => {
                self.accepted_records += 1;
                self.sentences_kept += kept;
                self.sentences_dropped += dropped;
                self.bytes_retained += text.len() as u64;
            }
            FilterOutcome::Rejected(reason) => {
                self.rejected_records += 1;
                if matches!(reason, RejectReason::CapabilityUnavailable { .. }) {
                    self.capability_failures += 1;
                }
                *self.rejections.entry(reason.code().to_string()).or_insert(0) += 1;
            }
        }
    }

    pub fn merge(&mut self, other: &PipelineStats) {
        self.total_records += other.total_records;
        self.accepted_records += other.accepted_records;
        self.rejected_records += other.rejected_records;
        self.capability_failures += other.capability_failures;
        self.sentences_kept += other.sentences_kept;
        self.sentences_dropped += other.sentences_dropped;
        self.bytes_processed += other.bytes_processed;
        self.bytes_retained += other.bytes_retained;
        for (code, count) in &other.rejections {
            *self.rejections.entry(code.clone()).or_insert(0) += count;
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Chunk size for parallel processing
    pub chunk_size: usize,
    /// Number of threads (None = auto-detect)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,
    /// Record field holding the document text
    pub text_field: String,
    /// Propagate capability failures instead of rejecting the document
    pub fail_fast: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            num_threads: None,
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            fail_fast: false,
        }
    }
}

/// A record after filtering
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    /// The record with the cleaned text written back when accepted, the
    /// untouched input otherwise
    pub record: Value,
    pub outcome: FilterOutcome,
}

impl ProcessedRecord {
    pub fn is_accepted(&self) -> bool {
        self.outcome.is_accepted()
    }
}

/// Parallel document filtering pipeline
pub struct Pipeline {
    config: PipelineConfig,
    filter: Arc<DocumentFilter>,
    stats: Arc<Mutex<PipelineStats>>,
}

impl Pipeline {
    /// Create a new pipeline around a filter
    pub fn new(filter: Arc<DocumentFilter>, config: PipelineConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be at least 1".to_string()));
        }
        if config.text_field.is_empty() {
            return Err(Error::InvalidConfig("text_field must not be empty".to_string()));
        }

        // Configure rayon thread pool
        if let Some(num_threads) = config.num_threads {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
            {
                debug!("Keeping existing thread pool: {}", e);
            }
        }

        Ok(Self {
            config,
            filter,
            stats: Arc::new(Mutex::new(PipelineStats::default())),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn filter(&self) -> &DocumentFilter {
        &self.filter
    }

    /// Filter a single record
    ///
    /// A missing or non-string text field is [`Error::InvalidInput`]. Other
    /// errors only surface with `fail_fast`.
    pub fn process_record(&self, record: Value) -> Result<ProcessedRecord> {
        let field = self.config.text_field.as_str();
        let document = Document::from_record(&record, field)?;

        let outcome = if self.config.fail_fast {
            self.filter.evaluate(&document)?
        } else {
            self.filter.outcome(&document)
        };

        let record = match &outcome {
            FilterOutcome::Accepted { text, .. } => {
                Document::new(text.as_str()).write_into(&record, field)
            }
            FilterOutcome::Rejected(_) => record,
        };

        Ok(ProcessedRecord { record, outcome })
    }

    /// Process a chunk of records in parallel, keeping every outcome
    pub fn process_chunk(&self, chunk: Vec<Value>) -> Result<Vec<ProcessedRecord>> {
        let field = self.config.text_field.as_str();

        let results: Vec<(usize, ProcessedRecord)> = chunk
            .into_par_iter()
            .enumerate()
            .map(|(index, record)| {
                let input_bytes = record.get(field).and_then(Value::as_str).map_or(0, str::len);
                self.process_record(record)
                    .map(|processed| (input_bytes, processed))
                    .map_err(|e| match e {
                        Error::InvalidInput(msg) => {
                            Error::InvalidInput(format!("record {}: {}", index, msg))
                        }
                        other => other,
                    })
            })
            .collect::<Result<_>>()?;

        let mut chunk_stats = PipelineStats::default();
        let processed: Vec<ProcessedRecord> = results
            .into_iter()
            .map(|(input_bytes, processed)| {
                chunk_stats.record(input_bytes, &processed.outcome);
                processed
            })
            .collect();

        debug!(
            records = chunk_stats.total_records,
            accepted = chunk_stats.accepted_records,
            "Processed chunk"
        );
        self.lock_stats().merge(&chunk_stats);

        Ok(processed)
    }

    /// Process records in chunks, returning every record with its outcome
    pub fn process_batch_with_outcomes(&self, records: Vec<Value>) -> Result<Vec<ProcessedRecord>> {
        // Chunks run sequentially to maintain ordering
        // (parallel processing happens within each chunk)
        let mut results = Vec::with_capacity(records.len());
        let mut remaining = records.into_iter();
        loop {
            let chunk: Vec<Value> = remaining.by_ref().take(self.config.chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let offset = results.len();
            let mut processed = self.process_chunk(chunk).map_err(|e| match e {
                Error::InvalidInput(msg) => {
                    Error::InvalidInput(format!("chunk at offset {}: {}", offset, msg))
                }
                other => other,
            })?;
            results.append(&mut processed);
        }

        Ok(results)
    }

    /// Process records and keep only accepted ones, with cleaned text
    pub fn process_batch(&self, records: Vec<Value>) -> Result<Vec<Value>> {
        Ok(self
            .process_batch_with_outcomes(records)?
            .into_iter()
            .filter_map(|processed| processed.is_accepted().then_some(processed.record))
            .collect())
    }

    /// Get current statistics
    pub fn stats(&self) -> PipelineStats {
        self.lock_stats().clone()
    }

    /// Reset statistics
    pub fn reset_stats(&self) {
        *self.lock_stats() = PipelineStats::default();
    }

    fn lock_stats(&self) -> MutexGuard<'_, PipelineStats> {
        // Stats stay usable even if a worker panicked mid-merge
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    filter: Arc<DocumentFilter>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new(filter: Arc<DocumentFilter>) -> Self {
        Self {
            filter,
            config: PipelineConfig::default(),
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = Some(threads);
        self
    }

    pub fn text_field(mut self, field: impl Into<String>) -> Self {
        self.config.text_field = field.into();
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.config.fail_fast = fail_fast;
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        Pipeline::new(self.filter, self.config)
    }
}

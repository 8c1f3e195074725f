//! Document filtering for web-text corpora
//!
//! [`DocumentFilter`] turns one raw document into either an empty result
//! (rejected) or its cleaned, newline-joined sentences. [`Pipeline`] runs
//! the filter over JSON records in parallel and keeps statistics.

pub mod document;
pub mod error;
pub mod filter;
pub mod pipeline;

pub use document::Document;
pub use error::{Error, Result};
pub use filter::{DocumentFilter, DocumentFilterConfig, FilterOutcome, FilterState, RejectReason};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineConfig, PipelineStats, ProcessedRecord};

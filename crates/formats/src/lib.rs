//! Dataset readers and writers for corpus filtering
//!
//! Streams JSON Lines records in and out, plain or gzip-compressed, without
//! loading whole files into memory.

pub mod error;
pub mod jsonl;
pub mod reader;
pub mod record;

pub use error::{Error, Result};
pub use jsonl::{JsonlReader, JsonlWriter};
pub use reader::{open_dataset, DatasetReader};
pub use record::Record;

//! Sentence-level quality filters for web text
//!
//! The building blocks of the document filter: encoding repair, language
//! identification, sentence segmentation, sentence predicates and PII
//! redaction. Language identification and segmentation are traits so a
//! different backend can be plugged in.

pub mod error;
pub mod language;
pub mod quality;
pub mod redaction;
pub mod segmenter;
pub mod text_preprocessing;

pub use error::{Error, Result};
pub use language::{LanguageDetector, LanguageEstimate, LanguageFilter, LanguageFilterConfig, WhatlangDetector};
pub use quality::{SentenceFilterConfig, SentencePredicate, SentencePredicates};
pub use redaction::{PiiRedactor, Redaction, RedactionConfig};
pub use segmenter::{SentenceSegmenter, UnicodeSentenceSegmenter};
pub use text_preprocessing::{fix_encoding, normalize_whitespace, TextNormalizer};

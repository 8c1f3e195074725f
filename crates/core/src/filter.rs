//! Document filter
//!
//! Decides whether one raw document is kept and, if so, cleans it into
//! newline-joined sentences. Each document moves through the states of
//! [`FilterState`]:
//!
//! ```text
//! Received → EncodingFixed → DocumentGateChecked → Segmented
//!          → SentencesFiltered → ThresholdChecked → Accepted | Rejected
//! ```
//!
//! The document gate (lorem ipsum, curly brackets, language) looks at the
//! whole repaired text once and short-circuits to rejection. Sentence
//! predicates see the unmodified sentence; redaction only touches sentences
//! that passed every predicate.

use crate::document::Document;
use crate::{Error, Result};
use c4clean_filters::language::{LanguageDetector, LanguageFilter, LanguageFilterConfig, WhatlangDetector};
use c4clean_filters::quality::{
    contains_curly_bracket, contains_lorem_ipsum, SentenceFilterConfig, SentencePredicates,
};
use c4clean_filters::redaction::{PiiRedactor, RedactionConfig};
use c4clean_filters::segmenter::{SentenceSegmenter, UnicodeSentenceSegmenter};
use c4clean_filters::text_preprocessing::TextNormalizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Retained sentences required to accept a document
pub const MIN_SENTENCES: usize = 5;

/// Full filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFilterConfig {
    /// Reject documents mentioning "lorem ipsum"
    pub reject_lorem_ipsum: bool,
    /// Reject documents containing `{` or `}`
    pub reject_curly_brackets: bool,
    pub min_sentences: usize,
    pub normalizer: TextNormalizer,
    pub language: LanguageFilterConfig,
    pub sentences: SentenceFilterConfig,
    pub redaction: RedactionConfig,
}

impl Default for DocumentFilterConfig {
    fn default() -> Self {
        Self {
            reject_lorem_ipsum: true,
            reject_curly_brackets: true,
            min_sentences: MIN_SENTENCES,
            normalizer: TextNormalizer::full(),
            language: LanguageFilterConfig::english_only(),
            sentences: SentenceFilterConfig::default(),
            redaction: RedactionConfig::default(),
        }
    }
}

impl DocumentFilterConfig {
    /// Looser thresholds for small or noisy corpora: three sentences, four
    /// words each, and no phone-number check
    pub fn lenient() -> Self {
        let mut config = Self {
            min_sentences: 3,
            ..Self::default()
        };
        config.sentences.min_word_count = 4;
        config.sentences.reject_phone_numbers = false;
        config
    }
}

/// Stages a document passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterState {
    Received,
    EncodingFixed,
    DocumentGateChecked,
    Segmented,
    SentencesFiltered,
    ThresholdChecked,
    Accepted,
    Rejected,
}

/// Why a document was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    LoremIpsum,
    CurlyBracket,
    NotEnglish,
    TooFewSentences { kept: usize, required: usize },
    /// The filter abstained because a capability failed after `after`
    CapabilityUnavailable { detail: String, after: FilterState },
}

impl RejectReason {
    /// Stable identifier used in statistics and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::LoremIpsum => "lorem_ipsum",
            Self::CurlyBracket => "curly_bracket",
            Self::NotEnglish => "not_english",
            Self::TooFewSentences { .. } => "too_few_sentences",
            Self::CapabilityUnavailable { .. } => "capability_unavailable",
        }
    }

    /// Last state reached before rejection
    pub fn rejected_after(&self) -> FilterState {
        match self {
            Self::LoremIpsum | Self::CurlyBracket | Self::NotEnglish => FilterState::EncodingFixed,
            Self::TooFewSentences { .. } => FilterState::SentencesFiltered,
            Self::CapabilityUnavailable { after, .. } => *after,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoremIpsum => write!(f, "contains lorem ipsum"),
            Self::CurlyBracket => write!(f, "contains a curly bracket"),
            Self::NotEnglish => write!(f, "not detected as an allowed language"),
            Self::TooFewSentences { kept, required } => {
                write!(f, "{} sentences kept, {} required", kept, required)
            }
            Self::CapabilityUnavailable { detail, .. } => write!(f, "abstained: {}", detail),
        }
    }
}

/// Result of filtering one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    Accepted {
        text: String,
        /// Sentences retained
        kept: usize,
        /// Sentences dropped by a predicate
        dropped: usize,
    },
    Rejected(RejectReason),
}

impl FilterOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Rejected(reason) => Some(reason),
            Self::Accepted { .. } => None,
        }
    }

    pub fn state(&self) -> FilterState {
        match self {
            Self::Accepted { .. } => FilterState::Accepted,
            Self::Rejected(_) => FilterState::Rejected,
        }
    }

    pub fn into_document(self) -> Document {
        match self {
            Self::Accepted { text, .. } => Document::new(text),
            Self::Rejected(_) => Document::rejected(),
        }
    }
}

/// Immutable, thread-safe document filter
///
/// Capabilities are injected once and shared read-only, so one filter can
/// serve every worker thread.
#[derive(Clone)]
pub struct DocumentFilter {
    config: DocumentFilterConfig,
    language: LanguageFilter,
    segmenter: Arc<dyn SentenceSegmenter>,
    predicates: SentencePredicates,
    redactor: PiiRedactor,
}

impl fmt::Debug for DocumentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFilter")
            .field("config", &self.config)
            .field("language", &self.language)
            .field("predicates", &self.predicates)
            .field("redactor", &self.redactor)
            .finish_non_exhaustive()
    }
}

impl DocumentFilter {
    /// Build a filter, validating the configuration
    pub fn new(
        config: DocumentFilterConfig,
        detector: Arc<dyn LanguageDetector>,
        segmenter: Arc<dyn SentenceSegmenter>,
    ) -> Result<Self> {
        if config.min_sentences == 0 {
            return Err(Error::InvalidConfig(
                "min_sentences must be at least 1".to_string(),
            ));
        }

        let language = LanguageFilter::new(&config.language, detector)?;
        let predicates = SentencePredicates::from_config(&config.sentences)?;
        let redactor = PiiRedactor::from_config(&config.redaction);

        Ok(Self {
            config,
            language,
            segmenter,
            predicates,
            redactor,
        })
    }

    /// Filter backed by whatlang and Unicode sentence boundaries
    pub fn with_default_capabilities(config: DocumentFilterConfig) -> Result<Self> {
        Self::new(
            config,
            Arc::new(WhatlangDetector::new()),
            Arc::new(UnicodeSentenceSegmenter::new()),
        )
    }

    pub fn config(&self) -> &DocumentFilterConfig {
        &self.config
    }

    /// Run the full state machine
    ///
    /// Capability failures propagate as errors; see [`Self::outcome`] for
    /// the abstaining variant.
    pub fn evaluate(&self, document: &Document) -> Result<FilterOutcome> {
        let mut reached = FilterState::Received;
        self.run(document, &mut reached)
    }

    /// State machine body; `reached` tracks the last completed stage so a
    /// capability failure can report where it happened
    fn run(&self, document: &Document, reached: &mut FilterState) -> Result<FilterOutcome> {
        let text = self.config.normalizer.fix_encoding(&document.text);
        *reached = FilterState::EncodingFixed;
        trace!(state = ?reached, bytes = text.len(), "Repaired encoding");

        if let Some(reason) = self.gate(&text)? {
            debug!(reason = reason.code(), "Rejected document at gate");
            return Ok(FilterOutcome::Rejected(reason));
        }
        *reached = FilterState::DocumentGateChecked;
        trace!(state = ?reached, "Passed document gate");

        let sentences = self.segmenter.segment(&text)?;
        *reached = FilterState::Segmented;
        trace!(state = ?reached, sentences = sentences.len(), "Segmented");

        let mut kept = Vec::with_capacity(sentences.len());
        let mut dropped = 0;
        for sentence in sentences {
            if let Some(failed) = self.predicates.first_failure(sentence) {
                trace!(predicate = failed.name(), sentence, "Dropped sentence");
                dropped += 1;
                continue;
            }
            kept.push(self.redactor.redact(sentence));
        }
        *reached = FilterState::SentencesFiltered;
        trace!(state = ?reached, kept = kept.len(), dropped, "Filtered sentences");

        if kept.len() < self.config.min_sentences {
            let reason = RejectReason::TooFewSentences {
                kept: kept.len(),
                required: self.config.min_sentences,
            };
            debug!(reason = reason.code(), kept = kept.len(), "Rejected document");
            return Ok(FilterOutcome::Rejected(reason));
        }
        trace!(state = ?FilterState::ThresholdChecked, "Accepted document");

        Ok(FilterOutcome::Accepted {
            kept: kept.len(),
            text: kept.join("\n"),
            dropped,
        })
    }

    /// Like [`Self::evaluate`], but a failing capability rejects the
    /// document instead of returning an error
    pub fn outcome(&self, document: &Document) -> FilterOutcome {
        let mut reached = FilterState::Received;
        match self.run(document, &mut reached) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(after = ?reached, "Abstaining on document: {}", e);
                FilterOutcome::Rejected(RejectReason::CapabilityUnavailable {
                    detail: e.to_string(),
                    after: reached,
                })
            }
        }
    }

    /// Filter one document. Never fails; rejection yields empty text.
    pub fn filter_document(&self, document: &Document) -> Document {
        self.outcome(document).into_document()
    }

    /// Fail-fast variant of [`Self::filter_document`]
    pub fn try_filter_document(&self, document: &Document) -> Result<Document> {
        self.evaluate(document).map(FilterOutcome::into_document)
    }

    fn gate(&self, text: &str) -> Result<Option<RejectReason>> {
        if self.config.reject_lorem_ipsum && contains_lorem_ipsum(text) {
            return Ok(Some(RejectReason::LoremIpsum));
        }
        if self.config.reject_curly_brackets && contains_curly_bracket(text) {
            return Ok(Some(RejectReason::CurlyBracket));
        }
        if !self.language.is_accepted(text)? {
            return Ok(Some(RejectReason::NotEnglish));
        }
        Ok(None)
    }
}

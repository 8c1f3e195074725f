//! Language detection and filtering
//!
//! Language identification is an injected capability: anything implementing
//! [`LanguageDetector`] can back a [`LanguageFilter`]. The default backend is
//! whatlang, a trigram model.
//!
//! whatlang does not report a probability. Its confidence measures how far
//! the winning language's trigram score leads the runner-up, scaled to a
//! length-dependent margin. [`WhatlangDetector`] calibrates that into a
//! probability: a lead of at least [`DEFAULT_MIN_MARGIN`] puts all of the
//! mass on the winner, anything weaker is passed through unchanged and so
//! stays below the English threshold.
//!
//! Detection is statistical. Very short texts and mixed-language texts yield
//! a weak lead and tend to be rejected. That is an accepted limitation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use whatlang::Lang;

/// Minimum probability for a document to count as English
pub const ENGLISH_THRESHOLD: f64 = 0.99;

/// Smallest whatlang confidence treated as a clear winner
pub const DEFAULT_MIN_MARGIN: f64 = 0.25;

/// One (language, probability) pair reported by a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEstimate {
    /// ISO 639-1 or 639-3 code
    pub code: String,
    /// Probability in `0.0..=1.0`
    pub probability: f64,
}

impl LanguageEstimate {
    pub fn new(code: impl Into<String>, probability: f64) -> Self {
        Self {
            code: code.into(),
            probability,
        }
    }
}

/// Language identification capability
///
/// Implementations are shared read-only across worker threads.
pub trait LanguageDetector: Send + Sync {
    /// Estimate which languages `text` is written in. An empty result means
    /// nothing could be detected.
    fn detect_languages(&self, text: &str) -> Result<Vec<LanguageEstimate>>;
}

/// Detector backed by whatlang
#[derive(Debug, Clone, Copy)]
pub struct WhatlangDetector {
    min_margin: f64,
}

impl WhatlangDetector {
    pub fn new() -> Self {
        Self {
            min_margin: DEFAULT_MIN_MARGIN,
        }
    }

    /// Override the confidence at which the winner takes all of the mass
    pub fn with_min_margin(min_margin: f64) -> Result<Self> {
        if !(min_margin > 0.0 && min_margin <= 1.0) {
            return Err(Error::InvalidConfig(
                "Minimum margin must be in (0.0, 1.0]".to_string(),
            ));
        }
        Ok(Self { min_margin })
    }

    pub fn min_margin(&self) -> f64 {
        self.min_margin
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Map whatlang's margin-based confidence to a probability for the winner
pub fn calibrated_probability(confidence: f64, min_margin: f64) -> f64 {
    if confidence >= min_margin {
        1.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect_languages(&self, text: &str) -> Result<Vec<LanguageEstimate>> {
        Ok(whatlang::detect(text)
            .map(|info| {
                let probability = calibrated_probability(info.confidence(), self.min_margin);
                vec![LanguageEstimate::new(info.lang().code(), probability)]
            })
            .unwrap_or_default())
    }
}

/// Language filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageFilterConfig {
    /// List of allowed language codes (ISO 639-1 or 639-3)
    pub allowed_languages: Vec<String>,
    /// Minimum probability threshold (0.0 to 1.0)
    pub confidence_threshold: f64,
}

impl Default for LanguageFilterConfig {
    fn default() -> Self {
        Self::english_only()
    }
}

impl LanguageFilterConfig {
    /// English at the 0.99 threshold
    pub fn english_only() -> Self {
        Self {
            allowed_languages: vec!["eng".to_string()],
            confidence_threshold: ENGLISH_THRESHOLD,
        }
    }
}

/// Document-level language gate
#[derive(Clone)]
pub struct LanguageFilter {
    allowed_languages: HashSet<&'static str>,
    confidence_threshold: f64,
    detector: Arc<dyn LanguageDetector>,
}

impl std::fmt::Debug for LanguageFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageFilter")
            .field("allowed_languages", &self.allowed_languages)
            .field("confidence_threshold", &self.confidence_threshold)
            .finish_non_exhaustive()
    }
}

impl LanguageFilter {
    /// Create a new language filter from configuration and a detector
    pub fn new(config: &LanguageFilterConfig, detector: Arc<dyn LanguageDetector>) -> Result<Self> {
        let mut allowed_languages = HashSet::new();

        for lang_code in &config.allowed_languages {
            let lang = parse_language_code(lang_code)?;
            allowed_languages.insert(lang.code());
        }

        if allowed_languages.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one language must be specified".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&config.confidence_threshold) {
            return Err(Error::InvalidConfig(
                "Confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(Self {
            allowed_languages,
            confidence_threshold: config.confidence_threshold,
            detector,
        })
    }

    /// English-only filter at the default threshold
    pub fn english_only(detector: Arc<dyn LanguageDetector>) -> Result<Self> {
        Self::new(&LanguageFilterConfig::english_only(), detector)
    }

    /// Check if text passes the language filter
    ///
    /// True when any estimate names an allowed language with at least the
    /// configured probability. Detector failures propagate.
    pub fn is_accepted(&self, text: &str) -> Result<bool> {
        let estimates = self.detector.detect_languages(text)?;

        Ok(estimates.iter().any(|estimate| {
            estimate.probability >= self.confidence_threshold
                && parse_language_code(&estimate.code)
                    .map(|lang| self.allowed_languages.contains(lang.code()))
                    .unwrap_or(false)
        }))
    }

    /// Raw estimates from the underlying detector
    pub fn detect_with_confidence(&self, text: &str) -> Result<Vec<LanguageEstimate>> {
        self.detector.detect_languages(text)
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }
}

/// True when `detector` puts English at or above [`ENGLISH_THRESHOLD`]
pub fn is_english(detector: &dyn LanguageDetector, text: &str) -> Result<bool> {
    Ok(detector
        .detect_languages(text)?
        .iter()
        .any(|estimate| {
            estimate.probability >= ENGLISH_THRESHOLD
                && matches!(parse_language_code(&estimate.code), Ok(Lang::Eng))
        }))
}

/// Parse language code (ISO 639-1 or 639-3)
pub fn parse_language_code(code: &str) -> Result<Lang> {
    match code.to_lowercase().as_str() {
        "eng" | "en" => Ok(Lang::Eng),
        "spa" | "es" => Ok(Lang::Spa),
        "fra" | "fr" => Ok(Lang::Fra),
        "deu" | "de" => Ok(Lang::Deu),
        "por" | "pt" => Ok(Lang::Por),
        "rus" | "ru" => Ok(Lang::Rus),
        "jpn" | "ja" => Ok(Lang::Jpn),
        "zho" | "cmn" | "zh" => Ok(Lang::Cmn),
        "ara" | "ar" => Ok(Lang::Ara),
        "hin" | "hi" => Ok(Lang::Hin),
        "ita" | "it" => Ok(Lang::Ita),
        "nld" | "nl" => Ok(Lang::Nld),
        "pol" | "pl" => Ok(Lang::Pol),
        "tur" | "tr" => Ok(Lang::Tur),
        "vie" | "vi" => Ok(Lang::Vie),
        "kor" | "ko" => Ok(Lang::Kor),
        "swe" | "sv" => Ok(Lang::Swe),
        "dan" | "da" => Ok(Lang::Dan),
        "fin" | "fi" => Ok(Lang::Fin),
        "nob" | "nor" | "no" => Ok(Lang::Nob),
        _ => Err(Error::InvalidConfig(format!(
            "Unsupported language code: {}",
            code
        ))),
    }
}

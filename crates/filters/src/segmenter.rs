//! Sentence segmentation
//!
//! [`UnicodeSentenceSegmenter`] starts from the UAX #29 sentence boundaries,
//! which already handle decimals, ellipses followed by lowercase, and closing
//! quotes. It then re-joins boundaries that fall right after a known
//! abbreviation ("Dr.", "etc.") or an initial ("J.", "U.S.").

use crate::Result;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Abbreviations that end in a period without ending the sentence
const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "ft", "vs", "etc", "inc", "ltd",
    "co", "corp", "dept", "gen", "gov", "sen", "rep", "capt", "lt", "col", "sgt", "rev",
    "vol", "fig", "approx", "est", "jan", "feb", "mar", "apr", "jun", "jul", "aug",
    "sep", "sept", "oct", "nov", "dec", "e.g", "i.e", "al", "cf",
];

/// Sentence segmentation capability
///
/// Implementations return trimmed, non-empty slices of `text` in order of
/// appearance.
pub trait SentenceSegmenter: Send + Sync {
    fn segment<'a>(&self, text: &'a str) -> Result<Vec<&'a str>>;
}

/// Rule-based segmenter over Unicode sentence boundaries
#[derive(Debug, Clone)]
pub struct UnicodeSentenceSegmenter {
    abbreviations: HashSet<String>,
}

impl UnicodeSentenceSegmenter {
    pub fn new() -> Self {
        Self {
            abbreviations: DEFAULT_ABBREVIATIONS.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Add extra abbreviations (case-insensitive, without the final period)
    pub fn with_abbreviations<I, S>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.abbreviations.extend(
            abbreviations
                .into_iter()
                .map(|a| a.as_ref().trim_end_matches('.').to_lowercase()),
        );
        self
    }

    fn ends_with_abbreviation(&self, candidate: &str) -> bool {
        let mut tokens = candidate.split_whitespace().rev();
        let last = match tokens.next() {
            Some(token) if token.ends_with('.') => token,
            _ => return false,
        };

        let word = bare_word(last);
        if word.is_empty() {
            return false;
        }

        if self.abbreviations.contains(&word.to_lowercase()) {
            return true;
        }

        // Dotted initials: "U.S."
        if word.contains('.') {
            return word.split('.').all(is_single_letter);
        }

        // A lone capital is an initial only at the start of a sentence or
        // after a name ("J. K. Rowling", "John F. Kennedy"), not in
        // "than I." or "vitamin C."
        if !word.chars().all(char::is_uppercase) || !is_single_letter(word) {
            return false;
        }
        match tokens.next() {
            None => true,
            Some(previous) => bare_word(previous)
                .chars()
                .next()
                .is_some_and(char::is_uppercase),
        }
    }
}

fn bare_word(token: &str) -> &str {
    token
        .trim_end_matches('.')
        .trim_start_matches(|c: char| !c.is_alphanumeric())
}

fn is_single_letter(part: &str) -> bool {
    let mut chars = part.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}

impl Default for UnicodeSentenceSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceSegmenter for UnicodeSentenceSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Result<Vec<&'a str>> {
        let mut sentences = Vec::new();
        let mut start: Option<usize> = None;

        for (offset, piece) in text.split_sentence_bound_indices() {
            let begin = *start.get_or_insert(offset);
            let candidate = &text[begin..offset + piece.len()];

            if self.ends_with_abbreviation(candidate) {
                continue;
            }

            let trimmed = candidate.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed);
            }
            start = None;
        }

        if let Some(begin) = start {
            let trimmed = text[begin..].trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed);
            }
        }

        Ok(sentences)
    }
}

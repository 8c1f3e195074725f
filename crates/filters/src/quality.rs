//! Sentence quality predicates and document gate checks
//!
//! A sentence survives only if every predicate in [`SentencePredicates`]
//! passes. The predicates are pure and independent, so evaluation order never
//! changes the verdict; the list order only decides which failure gets
//! reported first.
//!
//! The phone-number and URL patterns are loose on purpose and have known
//! misses in both directions:
//! - any three digit groups of 2-5 digits count as a phone number, which
//!   includes SSN-shaped strings (`123-45-6789`), card numbers and some
//!   space-separated numbers such as `2024 2025`
//! - `192.168.1.1` is not a phone number (a group of one digit breaks it),
//!   `192.168.10.1` is
//! - URLs need a scheme or `www.`, so `example.com/page` passes

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// Configuration for per-sentence filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentenceFilterConfig {
    pub require_terminal_punctuation: bool,
    pub min_word_count: usize,
    pub reject_javascript: bool,
    pub reject_phone_numbers: bool,
    pub reject_urls: bool,
    pub min_char_length: usize,
    /// Optional minimum share (percent) of alphanumeric characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_alphanumeric_percentage: Option<f64>,
}

impl Default for SentenceFilterConfig {
    fn default() -> Self {
        Self {
            require_terminal_punctuation: true,
            min_word_count: 3,
            reject_javascript: true,
            reject_phone_numbers: true,
            reject_urls: true,
            min_char_length: 3,
            min_alphanumeric_percentage: None,
        }
    }
}

/// A single pure check over one sentence
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SentencePredicate {
    TerminalPunctuation,
    MinWordCount(usize),
    NoJavascriptMention,
    NoPhoneNumber,
    NoUrl,
    MinCharLength(usize),
    MinAlphanumericPercentage(f64),
}

impl SentencePredicate {
    /// Whether `sentence` satisfies this predicate
    pub fn passes(&self, sentence: &str) -> bool {
        match *self {
            Self::TerminalPunctuation => is_terminal_punctuation(sentence),
            Self::MinWordCount(min) => word_count(sentence) >= min,
            Self::NoJavascriptMention => !contains_javascript(sentence),
            Self::NoPhoneNumber => !contains_phone_number(sentence),
            Self::NoUrl => !contains_url(sentence),
            Self::MinCharLength(min) => has_min_chars(sentence, min),
            Self::MinAlphanumericPercentage(pct) => has_min_alphanumeric_percentage(sentence, pct),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TerminalPunctuation => "terminal_punctuation",
            Self::MinWordCount(_) => "min_word_count",
            Self::NoJavascriptMention => "no_javascript",
            Self::NoPhoneNumber => "no_phone_number",
            Self::NoUrl => "no_url",
            Self::MinCharLength(_) => "min_char_length",
            Self::MinAlphanumericPercentage(_) => "min_alphanumeric_percentage",
        }
    }
}

/// Ordered list of sentence predicates
#[derive(Debug, Clone, PartialEq)]
pub struct SentencePredicates {
    predicates: Vec<SentencePredicate>,
}

impl SentencePredicates {
    /// Build the predicate list described by `config`
    pub fn from_config(config: &SentenceFilterConfig) -> Result<Self> {
        let mut predicates = Vec::new();

        if config.require_terminal_punctuation {
            predicates.push(SentencePredicate::TerminalPunctuation);
        }
        if config.min_word_count > 0 {
            predicates.push(SentencePredicate::MinWordCount(config.min_word_count));
        }
        if config.reject_javascript {
            predicates.push(SentencePredicate::NoJavascriptMention);
        }
        if config.reject_phone_numbers {
            predicates.push(SentencePredicate::NoPhoneNumber);
        }
        if config.reject_urls {
            predicates.push(SentencePredicate::NoUrl);
        }
        if config.min_char_length > 0 {
            predicates.push(SentencePredicate::MinCharLength(config.min_char_length));
        }
        if let Some(pct) = config.min_alphanumeric_percentage {
            if !(0.0..=100.0).contains(&pct) {
                return Err(Error::InvalidConfig(format!(
                    "Alphanumeric percentage {} must be between 0 and 100",
                    pct
                )));
            }
            predicates.push(SentencePredicate::MinAlphanumericPercentage(pct));
        }

        Ok(Self { predicates })
    }

    /// Append a predicate after the existing ones
    pub fn push(&mut self, predicate: SentencePredicate) {
        self.predicates.push(predicate);
    }

    /// First predicate `sentence` fails, if any
    pub fn first_failure(&self, sentence: &str) -> Option<SentencePredicate> {
        self.predicates.iter().copied().find(|p| !p.passes(sentence))
    }

    /// True when every predicate passes
    pub fn accepts(&self, sentence: &str) -> bool {
        self.first_failure(sentence).is_none()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SentencePredicate> {
        self.predicates.iter()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl Default for SentencePredicates {
    fn default() -> Self {
        Self {
            predicates: vec![
                SentencePredicate::TerminalPunctuation,
                SentencePredicate::MinWordCount(3),
                SentencePredicate::NoJavascriptMention,
                SentencePredicate::NoPhoneNumber,
                SentencePredicate::NoUrl,
                SentencePredicate::MinCharLength(3),
            ],
        }
    }
}

static JAVASCRIPT_REGEX: OnceLock<Regex> = OnceLock::new();
static LOREM_IPSUM_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_javascript_regex() -> &'static Regex {
    JAVASCRIPT_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\b(?:java\s*script|js)\b").expect("Failed to compile javascript regex")
    })
}

fn get_lorem_ipsum_regex() -> &'static Regex {
    LOREM_IPSUM_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\blorem\s*ipsum\b").expect("Failed to compile lorem ipsum regex")
    })
}

fn get_url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r"(?:(?:http|https|ftp)://|www\.)[\w/\-?=%.]+\.[\w/\-?=%.]+")
            .expect("Failed to compile url regex")
    })
}

fn get_phone_regex() -> &'static Regex {
    PHONE_REGEX.get_or_init(|| {
        Regex::new(
            r"\b(?:\+\d{1,3})?[-. (]*(?:\d{1,3})?[-. )]*\d{2,5}[-. (]*\d{2,5}[-. )]*\d{2,5}\b",
        )
        .expect("Failed to compile phone regex")
    })
}

/// Ends with `.`, `?`, `!` or `"` after trailing whitespace
pub fn is_terminal_punctuation(sentence: &str) -> bool {
    sentence.trim_end().ends_with(['.', '?', '!', '"'])
}

/// Word tokens in `text`; punctuation marks count as tokens of their own
pub fn tokenize_words(text: &str) -> Vec<&str> {
    text.split_word_bounds()
        .filter(|token| !token.trim().is_empty())
        .collect()
}

pub fn word_count(text: &str) -> usize {
    tokenize_words(text).len()
}

/// Whole-word, case-insensitive "javascript" / "java script" / "js"
pub fn contains_javascript(sentence: &str) -> bool {
    get_javascript_regex().is_match(sentence)
}

pub fn contains_phone_number(sentence: &str) -> bool {
    get_phone_regex().is_match(sentence)
}

pub fn contains_url(sentence: &str) -> bool {
    get_url_regex().is_match(sentence)
}

/// At least `min_chars` characters (not bytes)
pub fn has_min_chars(text: &str, min_chars: usize) -> bool {
    text.chars().count() >= min_chars
}

/// Share of alphanumeric characters is at least `min_percentage` percent
pub fn has_min_alphanumeric_percentage(text: &str, min_percentage: f64) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return false;
    }

    let alphanumeric = text.chars().filter(|c| c.is_alphanumeric()).count();
    (alphanumeric as f64 / total as f64) * 100.0 >= min_percentage
}

/// Document gate: placeholder text
pub fn contains_lorem_ipsum(text: &str) -> bool {
    get_lorem_ipsum_regex().is_match(text)
}

/// Document gate: code-like or templated text
pub fn contains_curly_bracket(text: &str) -> bool {
    text.contains(['{', '}'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_lorem_ipsum() {
        assert!(contains_lorem_ipsum("This is a sentence with lorem ipsum text."));
        assert!(contains_lorem_ipsum("Lorem ipsum dolor sit amet, consectetur adipiscing elit."));
        assert!(contains_lorem_ipsum("LOREMIPSUM"));
        assert!(!contains_lorem_ipsum("This is a normal sentence without it."));
    }

    #[test]
    fn test_contains_curly_bracket() {
        assert!(contains_curly_bracket("This is a sentence with a { curly bracket."));
        assert!(contains_curly_bracket("The code snippet is: function() { return true; }"));
        assert!(!contains_curly_bracket("This is a normal sentence without any curly brackets."));
    }

    #[test]
    fn test_is_terminal_punctuation() {
        assert!(is_terminal_punctuation("This sentence ends with a period."));
        assert!(is_terminal_punctuation("What a great day!"));
        assert!(is_terminal_punctuation("Is this a question?"));
        assert!(is_terminal_punctuation("He said \"hello\""));
        assert!(is_terminal_punctuation("Trailing space.  \t"));
        assert!(!is_terminal_punctuation("This sentence does not have terminal punctuation"));
    }

    #[test]
    fn test_word_count() {
        assert!(word_count("This sentence has at least three words.") >= 3);
        assert_eq!(word_count("Only three words."), 4);
        assert_eq!(word_count("One."), 2);
        assert_eq!(tokenize_words("Hello, world!"), vec!["Hello", ",", "world", "!"]);
    }

    #[test]
    fn test_contains_phone_number() {
        assert!(contains_phone_number("Call me at (123) 456-7890."));
        assert!(contains_phone_number("My number is +1 (555) 123-4567."));
        assert!(contains_phone_number("You can reach me at 9876543210."));
        assert!(!contains_phone_number("The temperature is 100F today."));
        assert!(!contains_phone_number("This is a regular sentence without a phone number."));
        assert!(!contains_phone_number(
            "The number you are trying to reach is no longer in service."
        ));
    }

    #[test]
    fn test_phone_number_known_false_positives() {
        assert!(contains_phone_number("My SSN is 123-45-6789."));
        assert!(contains_phone_number("Between 2024 2025 prices rose."));
        assert!(contains_phone_number("Server 192.168.10.1 is down."));
        assert!(!contains_phone_number("Server 192.168.1.1 is down."));
    }

    #[test]
    fn test_contains_javascript() {
        assert!(contains_javascript("This page requires JavaScript to run properly."));
        assert!(contains_javascript("Please enable Javascript in your browser."));
        assert!(contains_javascript("This is a sentence with the word javascript."));
        assert!(contains_javascript("Built with JS and love."));
        assert!(contains_javascript("Uses java script heavily."));
        assert!(!contains_javascript("This page uses CSS for styling."));
        assert!(!contains_javascript("This is a regular sentence without the word."));
        assert!(!contains_javascript("Java and Python are popular programming languages."));
        assert!(!contains_javascript("The jsonl format is common."));
    }

    #[test]
    fn test_contains_url() {
        assert!(contains_url("Visit our website at https://www.example.com."));
        assert!(contains_url("You can find the article at http://example.org/article."));
        assert!(contains_url("Check out our blog: www.blog.example.net"));
        assert!(contains_url("visit www.example.com now"));
        assert!(contains_url("Mirror at ftp://files.example.com/pub."));
        assert!(!contains_url("My email is john@example.com"));
        assert!(!contains_url("The price is $20,000."));
        assert!(!contains_url("This is a regular sentence without a URL."));
        assert!(!contains_url("Go to example.com/page for details."));
    }

    #[test]
    fn test_has_min_chars() {
        assert!(has_min_chars("This sentence has more than 20 characters.", 20));
        assert!(has_min_chars("This sentence has less.", 20));
        assert!(!has_min_chars("Hi", 3));
        assert!(has_min_chars("héé", 3));
    }

    #[test]
    fn test_has_min_alphanumeric_percentage() {
        assert!(has_min_alphanumeric_percentage(
            "This is a normal sentence with enough alpha numeric characters.",
            75.0
        ));
        assert!(!has_min_alphanumeric_percentage("$%#@!&*^", 75.0));
        assert!(has_min_alphanumeric_percentage(
            "A sentence with 20% alpha numeric characters.",
            75.0
        ));
        assert!(!has_min_alphanumeric_percentage("A12_+%# $()?", 75.0));
        assert!(!has_min_alphanumeric_percentage("", 0.0));
    }

    #[test]
    fn test_default_predicates_match_default_config() {
        let from_config = SentencePredicates::from_config(&SentenceFilterConfig::default()).unwrap();
        assert_eq!(from_config, SentencePredicates::default());
        assert_eq!(from_config.len(), 6);
    }

    #[test]
    fn test_predicates_accept_good_sentence() {
        let predicates = SentencePredicates::default();
        assert!(predicates.accepts("The quick brown fox jumps over the lazy dog."));
    }

    #[test]
    fn test_predicates_first_failure() {
        let predicates = SentencePredicates::default();
        assert_eq!(
            predicates.first_failure("no punctuation here"),
            Some(SentencePredicate::TerminalPunctuation)
        );
        assert_eq!(
            predicates.first_failure("Enable JavaScript please."),
            Some(SentencePredicate::NoJavascriptMention)
        );
        assert_eq!(
            predicates.first_failure("Please visit www.example.com now."),
            Some(SentencePredicate::NoUrl)
        );
        assert_eq!(
            predicates.first_failure("Call 555-123-4567 today."),
            Some(SentencePredicate::NoPhoneNumber)
        );
    }

    #[test]
    fn test_predicate_order_does_not_change_verdict() {
        let sentences = [
            "The quick brown fox jumps over the lazy dog.",
            "Enable JavaScript please.",
            "Hi.",
            "Call 555-123-4567 today.",
        ];
        let forward = SentencePredicates::default();
        let mut reversed = SentencePredicates::from_config(&SentenceFilterConfig {
            require_terminal_punctuation: false,
            min_word_count: 0,
            reject_javascript: false,
            reject_phone_numbers: false,
            reject_urls: false,
            min_char_length: 0,
            min_alphanumeric_percentage: None,
        })
        .unwrap();
        assert!(reversed.is_empty());
        for predicate in forward.iter().rev() {
            reversed.push(*predicate);
        }

        for sentence in sentences {
            assert_eq!(forward.accepts(sentence), reversed.accepts(sentence));
        }
    }

    #[test]
    fn test_alphanumeric_predicate_from_config() {
        let config = SentenceFilterConfig {
            min_alphanumeric_percentage: Some(75.0),
            ..Default::default()
        };
        let predicates = SentencePredicates::from_config(&config).unwrap();
        assert_eq!(predicates.len(), 7);
        assert!(!predicates.accepts("A $%#@! (), &*^ ?"));

        let invalid = SentenceFilterConfig {
            min_alphanumeric_percentage: Some(150.0),
            ..Default::default()
        };
        assert!(matches!(
            SentencePredicates::from_config(&invalid),
            Err(Error::InvalidConfig(_))
        ));
    }
}

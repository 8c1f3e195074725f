//! PII redaction for accepted sentences
//!
//! Matches are erased, not replaced with a placeholder. Erasure leaves gaps,
//! so whitespace normalization always runs as the final step. No step ever
//! makes a sentence longer.

use crate::text_preprocessing::normalize_whitespace;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Runs of this many identical characters or more collapse to one
const MIN_REPEAT_RUN: usize = 4;

/// Which redactions to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    pub ssn: bool,
    pub repeated_chars: bool,
    pub ip_addresses: bool,
    pub credit_cards: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            ssn: true,
            repeated_chars: true,
            ip_addresses: true,
            credit_cards: true,
        }
    }
}

/// A single text rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redaction {
    Ssn,
    RepeatedChars,
    IpAddress,
    CreditCard,
    Whitespace,
}

impl Redaction {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::Ssn => remove_ssn(text),
            Self::RepeatedChars => remove_repeated_chars(text),
            Self::IpAddress => remove_ip_addresses(text),
            Self::CreditCard => remove_credit_card_numbers(text),
            Self::Whitespace => normalize_whitespace(text),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ssn => "ssn",
            Self::RepeatedChars => "repeated_chars",
            Self::IpAddress => "ip_address",
            Self::CreditCard => "credit_card",
            Self::Whitespace => "whitespace",
        }
    }
}

/// Ordered redaction steps, always ending with whitespace normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiiRedactor {
    steps: Vec<Redaction>,
}

impl PiiRedactor {
    pub fn from_config(config: &RedactionConfig) -> Self {
        let mut steps = Vec::with_capacity(5);

        if config.ssn {
            steps.push(Redaction::Ssn);
        }
        if config.repeated_chars {
            steps.push(Redaction::RepeatedChars);
        }
        if config.ip_addresses {
            steps.push(Redaction::IpAddress);
        }
        if config.credit_cards {
            steps.push(Redaction::CreditCard);
        }
        steps.push(Redaction::Whitespace);

        Self { steps }
    }

    /// Add a step after the existing rewrites; whitespace normalization
    /// stays last.
    pub fn push(&mut self, step: Redaction) {
        if step == Redaction::Whitespace {
            return;
        }
        let position = self.steps.len().saturating_sub(1);
        self.steps.insert(position, step);
    }

    /// Apply every step, in order, exactly once
    pub fn redact(&self, sentence: &str) -> String {
        let mut result = sentence.to_string();
        for step in &self.steps {
            result = step.apply(&result);
        }
        result
    }

    pub fn steps(&self) -> &[Redaction] {
        &self.steps
    }
}

impl Default for PiiRedactor {
    fn default() -> Self {
        Self::from_config(&RedactionConfig::default())
    }
}

static SSN_REGEX: OnceLock<Regex> = OnceLock::new();
static IP_REGEX: OnceLock<Regex> = OnceLock::new();
static CREDIT_CARD_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_ssn_regex() -> &'static Regex {
    SSN_REGEX.get_or_init(|| {
        Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("Failed to compile ssn regex")
    })
}

fn get_ip_regex() -> &'static Regex {
    IP_REGEX.get_or_init(|| {
        Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("Failed to compile ip regex")
    })
}

fn get_credit_card_regex() -> &'static Regex {
    CREDIT_CARD_REGEX.get_or_init(|| {
        Regex::new(r"\b(?:\d{4}[ -]?){3}\d{4}\b").expect("Failed to compile credit card regex")
    })
}

/// Erase `DDD-DD-DDDD`
pub fn remove_ssn(text: &str) -> String {
    get_ssn_regex().replace_all(text, "").into_owned()
}

/// Erase four dot-separated groups of 1-3 digits
pub fn remove_ip_addresses(text: &str) -> String {
    get_ip_regex().replace_all(text, "").into_owned()
}

/// Erase four groups of four digits, optionally space or dash separated
pub fn remove_credit_card_numbers(text: &str) -> String {
    get_credit_card_regex().replace_all(text, "").into_owned()
}

/// Collapse runs of four or more identical characters to one ("soooome" →
/// "some"). Newlines are left alone.
pub fn remove_repeated_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let mut run = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }

        let keep = if run >= MIN_REPEAT_RUN && c != '\n' { 1 } else { run };
        out.extend(std::iter::repeat(c).take(keep));
    }

    out
}

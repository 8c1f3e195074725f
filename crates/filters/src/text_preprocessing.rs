//! Encoding repair and whitespace normalization
//!
//! Web text arrives with every kind of decoding accident: UTF-8 read as
//! Windows-1252, HTML entities left escaped, typographic quotes, invisible
//! control characters and a zoo of Unicode spaces. [`TextNormalizer`] repairs
//! the encoding side, [`normalize_whitespace`] flattens the spacing.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Characters mapped to an ASCII space before whitespace is collapsed.
const WHITESPACE_CATALOG: &[char] = &[
    ' ',
    '\u{00A0}', // no-break space
    '\u{0084}',
    '\u{2002}', // en space
    '\u{2003}', // em space
    '\u{2005}',
    '\u{2008}',
    '\u{2009}', // thin space
    '\u{200A}', // hair space
    '\u{200D}', // zero-width joiner
    '\u{202F}', // narrow no-break space
    '\u{3000}', // ideographic space
    '\u{FFFC}', // object replacement character
];

/// Encoding repair configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextNormalizer {
    /// Decode HTML entities when the text does not look like markup
    pub unescape_html: bool,
    /// Undo UTF-8 that was decoded as Windows-1252 / Latin-1
    pub fix_mojibake: bool,
    /// Convert CRLF, CR and Unicode line separators to `\n`
    pub fix_line_breaks: bool,
    /// Drop invisible control and formatting characters
    pub remove_control_chars: bool,
    /// Expand Latin ligatures such as `ﬁ`
    pub fix_latin_ligatures: bool,
    /// Map fullwidth ASCII forms to ASCII
    pub fix_character_width: bool,
    /// Replace curly quotes with straight ones
    pub uncurl_quotes: bool,
    /// Apply Unicode NFC normalization
    pub unicode_normalize: bool,
}

static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_entity_regex() -> &'static Regex {
    ENTITY_REGEX.get_or_init(|| {
        Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|([a-zA-Z]{2,6}));")
            .expect("Failed to compile entity regex")
    })
}

fn get_whitespace_regex() -> &'static Regex {
    WHITESPACE_REGEX.get_or_init(|| {
        Regex::new(r"\s+").expect("Failed to compile whitespace regex")
    })
}

impl TextNormalizer {
    /// Every repair enabled (default)
    pub fn full() -> Self {
        Self {
            unescape_html: true,
            fix_mojibake: true,
            fix_line_breaks: true,
            remove_control_chars: true,
            fix_latin_ligatures: true,
            fix_character_width: true,
            uncurl_quotes: true,
            unicode_normalize: true,
        }
    }

    /// Only undo mis-decoding; leave typography alone.
    pub fn encoding_only() -> Self {
        Self {
            unescape_html: false,
            fix_mojibake: true,
            fix_line_breaks: false,
            remove_control_chars: false,
            fix_latin_ligatures: false,
            fix_character_width: false,
            uncurl_quotes: false,
            unicode_normalize: true,
        }
    }

    /// Repair mis-decoded text
    ///
    /// Steps run in the order of the struct fields and the whole sequence is
    /// repeated until a pass leaves the text unchanged, so
    /// `fix_encoding(fix_encoding(x)) == fix_encoding(x)`.
    ///
    /// Entity decoding and mojibake repair always shorten the text. The other
    /// steps never produce input they would change again, so the loop ends.
    pub fn fix_encoding(&self, text: &str) -> String {
        let mut current = self.repair_pass(text);
        let mut passes = 1;
        loop {
            let next = self.repair_pass(&current);
            if next == current {
                break;
            }
            current = next;
            passes += 1;
        }
        if passes > 2 {
            tracing::trace!(passes, "Nested encoding damage repaired");
        }
        current
    }

    fn repair_pass(&self, text: &str) -> String {
        let mut result: Cow<'_, str> = Cow::Borrowed(text);

        if self.unescape_html {
            if let Some(s) = unescape_html(&result) {
                result = Cow::Owned(s);
            }
        }
        if self.fix_mojibake {
            if let Some(s) = fix_mojibake(&result) {
                result = Cow::Owned(s);
            }
        }
        if self.fix_line_breaks {
            if let Some(s) = fix_line_breaks(&result) {
                result = Cow::Owned(s);
            }
        }
        if self.remove_control_chars && result.chars().any(is_removable_control) {
            result = Cow::Owned(result.chars().filter(|c| !is_removable_control(*c)).collect());
        }
        if self.fix_latin_ligatures && result.chars().any(|c| ligature(c).is_some()) {
            let mut out = String::with_capacity(result.len());
            for c in result.chars() {
                match ligature(c) {
                    Some(expanded) => out.push_str(expanded),
                    None => out.push(c),
                }
            }
            result = Cow::Owned(out);
        }
        if self.fix_character_width && result.chars().any(is_fullwidth_ascii) {
            result = Cow::Owned(result.chars().map(narrow_fullwidth).collect());
        }
        if self.uncurl_quotes && result.chars().any(|c| uncurl(c) != c) {
            result = Cow::Owned(result.chars().map(uncurl).collect());
        }
        if self.unicode_normalize && !result.is_ascii() {
            result = Cow::Owned(result.nfc().collect());
        }

        result.into_owned()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::full()
    }
}

/// Repair mis-decoded text with every repair enabled
pub fn fix_encoding(text: &str) -> String {
    TextNormalizer::full().fix_encoding(text)
}

/// Map the whitespace catalog to ASCII spaces, collapse runs and trim
///
/// The output never contains two consecutive spaces and never starts or ends
/// with whitespace. It is never longer than the input.
pub fn normalize_whitespace(text: &str) -> String {
    let mut buffer = String::with_capacity(text.len());
    normalize_whitespace_into(text, &mut buffer);
    buffer
}

/// Whitespace normalization with memory reuse
pub fn normalize_whitespace_into(text: &str, buffer: &mut String) {
    buffer.clear();
    let mapped: String = text
        .chars()
        .map(|c| if WHITESPACE_CATALOG.contains(&c) { ' ' } else { c })
        .collect();
    let regex = get_whitespace_regex();
    buffer.push_str(regex.replace_all(&mapped, " ").trim());
}

fn unescape_html(text: &str) -> Option<String> {
    if !text.contains('&') || text.contains('<') {
        return None;
    }

    let replaced = get_entity_regex().replace_all(text, |caps: &Captures| {
        let decoded = if let Some(dec) = caps.get(1) {
            dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
        } else if let Some(hex) = caps.get(2) {
            u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
        } else {
            caps.get(3).and_then(|name| named_entity(name.as_str()))
        };

        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    });

    match replaced {
        Cow::Owned(s) if s != text => Some(s),
        _ => None,
    }
}

fn named_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => None,
    }
}

/// Byte a character occupies in Windows-1252, falling back to Latin-1 for the
/// five code points Windows-1252 leaves undefined.
fn cp1252_byte(c: char) -> Option<u8> {
    let code = c as u32;
    if code < 0x80 || (0x80..=0xFF).contains(&code) {
        return Some(code as u8);
    }

    let byte = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

fn is_continuation(c: char) -> Option<u8> {
    cp1252_byte(c).filter(|b| (0x80..=0xBF).contains(b))
}

/// Replace every run of characters whose Windows-1252 bytes spell a single
/// well-formed UTF-8 character with that character.
fn fix_mojibake(text: &str) -> Option<String> {
    if text.is_ascii() {
        return None;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let lead = cp1252_byte(c).filter(|b| (0xC2..=0xF4).contains(b));

        if let Some(lead) = lead {
            let needed = match lead {
                0xC2..=0xDF => 1,
                0xE0..=0xEF => 2,
                _ => 3,
            };

            if i + needed < chars.len() {
                let mut bytes = [lead, 0, 0, 0];
                let complete = chars[i + 1..=i + needed]
                    .iter()
                    .zip(bytes[1..].iter_mut())
                    .all(|(ch, slot)| match is_continuation(*ch) {
                        Some(b) => {
                            *slot = b;
                            true
                        }
                        None => false,
                    });

                if complete {
                    if let Ok(decoded) = std::str::from_utf8(&bytes[..=needed]) {
                        out.push_str(decoded);
                        changed = true;
                        i += needed + 1;
                        continue;
                    }
                }
            }
        }

        out.push(c);
        i += 1;
    }

    changed.then_some(out)
}

fn fix_line_breaks(text: &str) -> Option<String> {
    if !text.contains(['\r', '\u{0085}', '\u{2028}', '\u{2029}']) {
        return None;
    }

    Some(
        text.replace("\r\n", "\n")
            .replace(['\r', '\u{0085}', '\u{2028}', '\u{2029}'], "\n"),
    )
}

fn is_removable_control(c: char) -> bool {
    matches!(
        c,
        '\u{0000}'..='\u{0008}'
            | '\u{000B}'
            | '\u{000E}'..='\u{001F}'
            | '\u{007F}'
            | '\u{206A}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
    )
}

fn ligature(c: char) -> Option<&'static str> {
    match c {
        'ﬀ' => Some("ff"),
        'ﬁ' => Some("fi"),
        'ﬂ' => Some("fl"),
        'ﬃ' => Some("ffi"),
        'ﬄ' => Some("ffl"),
        'ﬆ' => Some("st"),
        'Ĳ' => Some("IJ"),
        'ĳ' => Some("ij"),
        'Ǳ' => Some("DZ"),
        'ǲ' => Some("Dz"),
        'ǳ' => Some("dz"),
        'Ǆ' => Some("DŽ"),
        'ǅ' => Some("Dž"),
        'ǆ' => Some("dž"),
        'Ǉ' => Some("LJ"),
        'ǈ' => Some("Lj"),
        'ǉ' => Some("lj"),
        'Ǌ' => Some("NJ"),
        'ǋ' => Some("Nj"),
        'ǌ' => Some("nj"),
        _ => None,
    }
}

fn is_fullwidth_ascii(c: char) -> bool {
    ('\u{FF01}'..='\u{FF5E}').contains(&c)
}

fn narrow_fullwidth(c: char) -> char {
    if is_fullwidth_ascii(c) {
        char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
    } else {
        c
    }
}

fn uncurl(c: char) -> char {
    match c {
        '\u{02BC}' | '\u{2018}'..='\u{201B}' => '\'',
        '\u{201C}'..='\u{201F}' => '"',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_untouched() {
        let text = "This is a normal sentence without any encoding issues.";
        assert_eq!(fix_encoding(text), text);
    }

    #[test]
    fn test_smart_quote_mojibake() {
        assert_eq!(
            fix_encoding("This sentence has â€˜smartâ€™ quotes."),
            "This sentence has 'smart' quotes."
        );
    }

    #[test]
    fn test_latin1_mojibake() {
        assert_eq!(
            fix_encoding("MÃ¶bius strip is a surface with only one side."),
            "Möbius strip is a surface with only one side."
        );
    }

    #[test]
    fn test_double_encoded_mojibake() {
        // "é" encoded as UTF-8 and mis-decoded twice
        assert_eq!(fix_encoding("cafÃƒÂ©"), "café");
    }

    #[test]
    fn test_mixed_valid_and_broken() {
        assert_eq!(fix_encoding("naïve MÃ¶bius"), "naïve Möbius");
    }

    #[test]
    fn test_encoding_only_keeps_curly_quotes() {
        let normalizer = TextNormalizer::encoding_only();
        assert_eq!(normalizer.fix_encoding("â€œquotedâ€\u{9d}"), "“quoted”");
    }

    #[test]
    fn test_html_entities() {
        assert_eq!(fix_encoding("Fish &amp; chips &#8212; &#x41;"), "Fish & chips — A");
        assert_eq!(fix_encoding("&unknown; stays"), "&unknown; stays");
    }

    #[test]
    fn test_deeply_nested_entities_fully_decoded() {
        let nested = format!("Fish {} chips.", format!("&{}", "amp;".repeat(20)));
        let once = fix_encoding(&nested);
        assert_eq!(once, "Fish & chips.");
        assert_eq!(fix_encoding(&once), once);

        let ten = format!("&{}", "amp;".repeat(10));
        assert_eq!(fix_encoding(&ten), "&");
        assert_eq!(fix_encoding(&fix_encoding(&ten)), fix_encoding(&ten));
    }

    #[test]
    fn test_html_entities_skipped_in_markup() {
        let text = "<p>Fish &amp; chips</p>";
        assert_eq!(fix_encoding(text), text);
    }

    #[test]
    fn test_line_breaks_and_controls() {
        assert_eq!(fix_encoding("one\r\ntwo\rthree\u{2028}four"), "one\ntwo\nthree\nfour");
        assert_eq!(fix_encoding("\u{FEFF}bo\u{0007}dy"), "body");
    }

    #[test]
    fn test_ligatures_and_width() {
        assert_eq!(fix_encoding("ﬁnal ﬂow"), "final flow");
        assert_eq!(fix_encoding("ＡＢＣ１２３！"), "ABC123!");
    }

    #[test]
    fn test_nfc() {
        assert_eq!(fix_encoding("cafe\u{0301}"), "café");
    }

    #[test]
    fn test_fix_encoding_idempotent() {
        let samples = [
            "",
            "plain ascii text.",
            "This sentence has â€˜smartâ€™ quotes.",
            "MÃ¶bius",
            "cafÃƒÂ©",
            "&amp;lt;tag&amp;gt;",
            "Â\u{00A0}spaced",
            "ﬁ ＡＢＣ “quoted”",
            "Привет мир こんにちは世界",
            "ÃÃÃ",
        ];

        for sample in samples {
            let once = fix_encoding(sample);
            let twice = fix_encoding(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_normalize_whitespace_plain() {
        let text = "This is a normal sentence without any unusual whitespace.";
        assert_eq!(normalize_whitespace(text), text);
    }

    #[test]
    fn test_normalize_whitespace_thin_spaces() {
        assert_eq!(
            normalize_whitespace("This sentence has\u{2009}different\u{200A}spaces."),
            "This sentence has different spaces."
        );
    }

    #[test]
    fn test_normalize_whitespace_wide_spaces() {
        assert_eq!(
            normalize_whitespace("This\u{3000}sentence\u{2002}has\u{2003}wide\u{2004}spaces."),
            "This sentence has wide spaces."
        );
    }

    #[test]
    fn test_normalize_whitespace_catalog_only_chars() {
        // U+FFFC and U+200D are not Unicode whitespace but are in the catalog
        assert_eq!(normalize_whitespace("a\u{FFFC}b\u{200D}c"), "a b c");
        assert_eq!(normalize_whitespace("a\u{0084}b"), "a b");
    }

    #[test]
    fn test_normalize_whitespace_collapse_and_trim() {
        assert_eq!(normalize_whitespace("   \t\n   "), "");
        assert_eq!(normalize_whitespace("  Hello \n\n  World \t "), "Hello World");
    }

    #[test]
    fn test_normalize_whitespace_invariants() {
        let samples = [
            "  a  b  ",
            "\u{00A0}\u{00A0}x\u{3000}\u{3000}y\u{202F}",
            "tabs\t\tand\r\nnewlines",
            "",
            " ",
        ];

        for sample in samples {
            let result = normalize_whitespace(sample);
            assert!(!result.contains("  "), "double space in {:?}", result);
            assert!(!result.starts_with(' ') && !result.ends_with(' '));
            assert!(result.chars().count() <= sample.chars().count());
            assert!(result.len() <= sample.len());
        }
    }

    #[test]
    fn test_normalize_whitespace_into_reuse() {
        let mut buffer = String::new();

        normalize_whitespace_into("Hello,   WORLD!", &mut buffer);
        assert_eq!(buffer, "Hello, WORLD!");

        normalize_whitespace_into("  Another\u{2009}TEST ", &mut buffer);
        assert_eq!(buffer, "Another TEST");
    }
}

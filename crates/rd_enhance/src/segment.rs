use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PARAGRAPH_RE: Regex = Regex::new(r"\n{2,}").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref CLAUSE_SPLIT_RE: Regex =
        Regex::new(r"(?i);|,\s+and\s+|,\s+but\s+|\s+and\s+|\s+but\s+").unwrap();
}

/// Sentences shorter than this are never broken into clauses.
const LONG_SENTENCE_CHARS: usize = 160;

/// Splits text into paragraphs, sentences, and clauses. The default
/// implementation is a regex heuristic; a statistical segmenter can be swapped
/// in without touching paragraph assembly.
pub trait Segmenter: Send + Sync {
    /// Ordered, trimmed, whitespace-collapsed, non-empty paragraphs, split on
    /// two or more consecutive newlines.
    fn paragraphs(&self, text: &str) -> Vec<String>;

    /// Ordered sentences. A heuristic boundary, not a grammar; mis-splits on
    /// abbreviations and decimals are an accepted limitation.
    fn sentences(&self, text: &str) -> Vec<String>;

    /// Breaks an overly long sentence on semicolons or clause conjunctions.
    /// Returns the sentence unchanged when it is short or has no split point.
    fn break_long(&self, sentence: &str) -> Vec<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RegexSegmenter;

impl Segmenter for RegexSegmenter {
    fn paragraphs(&self, text: &str) -> Vec<String> {
        PARAGRAPH_RE
            .split(text)
            .map(collapse_ws)
            .filter(|p| !p.is_empty())
            .collect()
    }

    fn sentences(&self, text: &str) -> Vec<String> {
        let collapsed = collapse_ws(text);
        if collapsed.is_empty() {
            return Vec::new();
        }

        // Cut after terminal punctuation followed by a space and an
        // uppercase/digit/quote opener. The reference heuristic needs
        // lookbehind, so this walks char indices instead of a single regex.
        let chars: Vec<(usize, char)> = collapsed.char_indices().collect();
        let mut out = Vec::new();
        let mut start = 0usize;
        let mut i = 0usize;
        while i < chars.len() {
            let (idx, c) = chars[i];
            if matches!(c, '.' | '!' | '?') {
                if let (Some(&(space_idx, ' ')), Some(&(_, next))) =
                    (chars.get(i + 1), chars.get(i + 2))
                {
                    if starts_sentence(next) {
                        let piece = collapsed[start..=idx].trim();
                        if !piece.is_empty() {
                            out.push(piece.to_string());
                        }
                        start = space_idx + 1;
                        i += 2;
                        continue;
                    }
                }
            }
            i += 1;
        }
        let tail = collapsed[start..].trim();
        if !tail.is_empty() {
            out.push(tail.to_string());
        }
        out
    }

    fn break_long(&self, sentence: &str) -> Vec<String> {
        if sentence.chars().count() < LONG_SENTENCE_CHARS {
            return vec![sentence.to_string()];
        }
        let parts: Vec<String> = CLAUSE_SPLIT_RE
            .split(sentence)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
        if parts.len() <= 1 {
            vec![sentence.to_string()]
        } else {
            parts
        }
    }
}

fn starts_sentence(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '(')
}

pub(crate) fn collapse_ws(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").to_string()
}

/// Paragraph split that keeps internal line structure. The pattern detector
/// needs to see line lengths, which `paragraphs` collapses away.
pub(crate) fn raw_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_RE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

use lazy_static::lazy_static;
use regex::Regex;

use crate::segment::{collapse_ws, raw_paragraphs, RegexSegmenter, Segmenter};

lazy_static! {
    static ref LIST_MARKER_RE: Regex = Regex::new(r"(?m)^(?:[-*•]|\d+\.)").unwrap();
}

const MAX_HEADING_CHARS: usize = 60;
const MAX_HEADING_TOKENS: usize = 7;
const MAX_LIST_LINE_CHARS: usize = 80;

/// Formatting signal inferred from reference texts, driving restructuring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDescriptor {
    pub target_sentences_per_paragraph: usize,
    pub use_headings: bool,
    pub use_lists: bool,
}

impl Default for PatternDescriptor {
    fn default() -> Self {
        Self {
            target_sentences_per_paragraph: 3,
            use_headings: false,
            use_lists: false,
        }
    }
}

/// Infers a [`PatternDescriptor`] from up to two reference texts. Empty or
/// missing references leave the defaults untouched.
pub struct PatternDetector {
    segmenter: Box<dyn Segmenter>,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(Box::new(RegexSegmenter))
    }
}

impl PatternDetector {
    pub fn new(segmenter: Box<dyn Segmenter>) -> Self {
        Self { segmenter }
    }

    pub fn detect(&self, reference_texts: &[&str]) -> PatternDescriptor {
        let mut sentence_counts: Vec<usize> = Vec::new();
        let mut headings = 0usize;
        let mut lists = 0usize;

        for text in reference_texts {
            if text.trim().is_empty() {
                continue;
            }
            for paragraph in raw_paragraphs(text) {
                if is_heading_candidate(&paragraph) {
                    headings += 1;
                }
                if is_list_candidate(&paragraph) {
                    lists += 1;
                }
                sentence_counts.push(self.segmenter.sentences(&paragraph).len().max(1));
            }
        }

        let mut descriptor = PatternDescriptor::default();
        if !sentence_counts.is_empty() {
            let mean =
                sentence_counts.iter().sum::<usize>() as f64 / sentence_counts.len() as f64;
            descriptor.target_sentences_per_paragraph = (mean.round() as usize).max(1);
        }
        descriptor.use_headings = headings > 0;
        descriptor.use_lists = lists > 0;
        descriptor
    }
}

fn is_heading_candidate(paragraph: &str) -> bool {
    let flat = collapse_ws(paragraph);
    flat.chars().count() <= MAX_HEADING_CHARS
        && !flat.ends_with(&['.', '!', '?'][..])
        && flat.split_whitespace().count() <= MAX_HEADING_TOKENS
}

fn is_list_candidate(paragraph: &str) -> bool {
    if LIST_MARKER_RE.is_match(paragraph) {
        return true;
    }
    let lines: Vec<&str> = paragraph.lines().collect();
    lines.len() > 3 && lines.iter().all(|l| l.trim().chars().count() < MAX_LIST_LINE_CHARS)
}

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use rd_core::{Error, Result};

use crate::patterns::{PatternDescriptor, PatternDetector};
use crate::segment::{collapse_ws, RegexSegmenter, Segmenter};

lazy_static! {
    static ref EXCESS_NEWLINES_RE: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref ENUMERATION_RE: Regex =
        Regex::new(r"(?i),\s+[^,]+,\s+and\s+|(?:first|second|third)\b").unwrap();
    static ref LIST_ITEM_SPLIT_RE: Regex = Regex::new(r"(?i),\s+|\band\b|\bplus\b").unwrap();
    static ref HEADING_STRIP_RE: Regex = Regex::new(r"[^A-Za-z0-9\s]").unwrap();
}

const MAX_TARGET_SENTENCES: usize = 6;
const MAX_HEADING_WORDS: usize = 6;
const MIN_LIST_ITEM_CHARS: usize = 20;
const MAX_LIST_ITEMS: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct RestructureOptions {
    /// Emit headings even when the references show none.
    pub force_headings: bool,
}

enum Block {
    Heading(String),
    Paragraph(String),
    Bullets(Vec<String>),
}

/// Rewrites a text into paragraphs, headings, and bullet lists following a
/// [`PatternDescriptor`]. Only rearranges the text's own tokens; reference
/// material never reaches the output.
pub struct Restructurer {
    segmenter: Box<dyn Segmenter>,
    detector: PatternDetector,
}

impl Default for Restructurer {
    fn default() -> Self {
        Self {
            segmenter: Box::new(RegexSegmenter),
            detector: PatternDetector::default(),
        }
    }
}

impl Restructurer {
    pub fn new(segmenter: Box<dyn Segmenter>, detector: PatternDetector) -> Self {
        Self { segmenter, detector }
    }

    /// Detects formatting patterns from the references and restructures
    /// `original` to match them.
    pub fn enhance(
        &self,
        original: &str,
        ref_a: &str,
        ref_b: &str,
        opts: &RestructureOptions,
    ) -> Result<String> {
        let mut pattern = self.detector.detect(&[ref_a, ref_b]);
        if opts.force_headings {
            pattern.use_headings = true;
        }
        debug!(?pattern, "inferred formatting pattern");
        self.restructure(original, &pattern)
    }

    pub fn restructure(&self, original: &str, pattern: &PatternDescriptor) -> Result<String> {
        if original.trim().is_empty() {
            return Err(Error::Validation("original text is required".to_string()));
        }

        let clean = normalize(original);
        let sentences = self.flat_sentences(&clean);
        if sentences.is_empty() {
            return Ok(String::new());
        }

        let target = pattern
            .target_sentences_per_paragraph
            .clamp(1, MAX_TARGET_SENTENCES);
        let paragraphs = group_sentences(&sentences, target);

        let mut blocks = Vec::new();
        for (i, paragraph) in paragraphs.iter().enumerate() {
            // The intro paragraph never receives a heading.
            if pattern.use_headings && i > 0 {
                blocks.push(Block::Heading(heading_from_paragraph(paragraph)));
            }

            let body = self.flat_sentences(paragraph);
            if pattern.use_lists {
                if let Some(items) = bullet_items(&body) {
                    // Converting to bullets suppresses the paragraph's prose
                    // form entirely, even when the comma split covers only
                    // part of it.
                    blocks.push(Block::Bullets(items));
                    continue;
                }
            }
            blocks.push(Block::Paragraph(body.join(" ")));
        }

        Ok(assemble(&blocks))
    }

    fn flat_sentences(&self, text: &str) -> Vec<String> {
        self.segmenter
            .sentences(text)
            .iter()
            .flat_map(|s| self.segmenter.break_long(s))
            .map(|s| collapse_ws(&s))
            .collect()
    }
}

fn normalize(text: &str) -> String {
    let unix = text.replace("\r\n", "\n");
    EXCESS_NEWLINES_RE
        .replace_all(&unix, "\n\n")
        .trim()
        .to_string()
}

/// First paragraph holds `clamp(round(target / 2), 1, 2)` sentences, the rest
/// are consecutive chunks of `target` sentences; the last chunk may be short.
fn group_sentences(sentences: &[String], target: usize) -> Vec<String> {
    let intro = ((target as f64 / 2.0).round() as usize).clamp(1, 2);
    let intro = intro.min(sentences.len());
    let mut paragraphs = vec![sentences[..intro].join(" ")];
    for chunk in sentences[intro..].chunks(target) {
        paragraphs.push(chunk.join(" "));
    }
    paragraphs
}

/// Short heading built from the paragraph's own alphanumeric tokens.
fn heading_from_paragraph(paragraph: &str) -> String {
    let stripped = HEADING_STRIP_RE.replace_all(paragraph, "");
    let words: Vec<String> = stripped
        .split_whitespace()
        .take(MAX_HEADING_WORDS)
        .map(title_case)
        .collect();
    if words.is_empty() {
        "Overview".to_string()
    } else {
        words.join(" ")
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn bullet_items(sentences: &[String]) -> Option<Vec<String>> {
    if !sentences.iter().any(|s| ENUMERATION_RE.is_match(s)) {
        return None;
    }
    let items: Vec<String> = LIST_ITEM_SPLIT_RE
        .split(&sentences.join(" "))
        .map(str::trim)
        .filter(|item| item.chars().count() > MIN_LIST_ITEM_CHARS)
        .take(MAX_LIST_ITEMS)
        .map(String::from)
        .collect();
    (items.len() >= 2).then_some(items)
}

fn assemble(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Heading(heading) => {
                out.push_str("\n\n");
                out.push_str(heading);
                out.push_str("\n\n");
            }
            Block::Paragraph(paragraph) => {
                out.push('\n');
                out.push_str(paragraph);
                out.push('\n');
            }
            Block::Bullets(items) => {
                out.push('\n');
                for item in items {
                    out.push_str("- ");
                    out.push_str(item);
                    out.push('\n');
                }
            }
        }
    }
    EXCESS_NEWLINES_RE
        .replace_all(&out, "\n\n")
        .trim()
        .to_string()
}

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;
use url::Url;

use rd_core::{Error, Result};

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Page chrome that never contributes article text.
const STRIP_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "noscript", "aside",
];
const STRIP_CLASSES: &[&str] = &["ads", "advert", "cookie-banner", "subscribe", "newsletter"];

/// Content-region fallbacks, tried in order when no semantic container has
/// enough text.
const FALLBACK_SELECTORS: &[&str] = &[
    ".post-content",
    ".entry-content",
    ".article-body",
    ".content",
    ".post",
    ".blog-post",
];

const MIN_REGION_CHARS: usize = 50;
const USER_AGENT: &str = "redraft-extractor/0.1";

/// Fetches a URL and extracts the main readable text, discarding page chrome.
/// Network and parse failures yield an empty string; only a structurally
/// invalid URL argument is an error.
pub struct ContentExtractor {
    client: Client,
}

impl ContentExtractor {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("http client");
        Self { client }
    }

    pub async fn extract(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(url.to_string()));
        }

        match self.try_fetch(url).await {
            Ok(html) => Ok(extract_readable(&html)),
            Err(e) => {
                warn!("content extraction failed for {}: {}", url, e);
                Ok(String::new())
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        Ok(response.text().await?)
    }
}

/// Paragraph-level text of the document's content region, paragraphs joined
/// with a blank line.
pub fn extract_readable(html: &str) -> String {
    let document = Html::parse_document(html);
    let paragraph = Selector::parse("p").unwrap();

    let paragraphs: Vec<String> = match select_region(&document) {
        Some(region) => {
            let found: Vec<String> = region
                .select(&paragraph)
                .filter(|p| !inside_stripped(p))
                .map(|p| clean_text(&p))
                .collect();
            if found.is_empty() {
                // No <p> children: the region's own text is one paragraph.
                vec![clean_text(&region)]
            } else {
                found
            }
        }
        None => document
            .select(&paragraph)
            .filter(|p| !inside_stripped(p))
            .map(|p| clean_text(&p))
            .collect(),
    };

    paragraphs
        .iter()
        .map(|p| collapse(p))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Ordered content-region chain: `<article>`, else `<main>`, then the class
/// fallbacks when the semantic region is too thin; a thin-but-nonempty
/// semantic region still beats the raw document.
fn select_region(document: &Html) -> Option<ElementRef<'_>> {
    let article = Selector::parse("article").unwrap();
    let main = Selector::parse("main").unwrap();
    let primary = document
        .select(&article)
        .next()
        .or_else(|| document.select(&main).next());

    if let Some(region) = primary {
        if clean_text(&region).trim().len() >= MIN_REGION_CHARS {
            return Some(region);
        }
    }

    for fallback in FALLBACK_SELECTORS {
        let selector = Selector::parse(fallback).unwrap();
        if let Some(candidate) = document.select(&selector).next() {
            if clean_text(&candidate).trim().len() > MIN_REGION_CHARS {
                return Some(candidate);
            }
        }
    }

    primary.filter(|region| !clean_text(region).trim().is_empty())
}

fn is_stripped(element: &ElementRef) -> bool {
    let value = element.value();
    if STRIP_TAGS.contains(&value.name()) {
        return true;
    }
    value.classes().any(|class| STRIP_CLASSES.contains(&class))
}

fn inside_stripped(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_stripped(&ancestor))
}

/// Text of a subtree with stripped elements skipped.
fn clean_text(element: &ElementRef) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: &ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_stripped(&child_el) {
                        collect_text(&child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn collapse(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").to_string()
}

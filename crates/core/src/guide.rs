//! Reduction of guide pages to prompt-ready plain text.
//!
//! A guide is a web page whose readable text is injected into the model
//! context. Raw markup carries scripts, navigation and other boilerplate that
//! only inflates the prompt, so those subtrees are dropped before the text is
//! extracted, normalized and capped.

use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};

/// Default cap on the characters kept from a single guide.
pub const DEFAULT_MAX_GUIDE_CHARS: usize = 12_000;

/// Text substituted for any guide that could not be fetched or parsed.
pub const GUIDE_UNAVAILABLE: &str = "Guide content could not be loaded.";

/// Elements whose whole subtree is noise for the model.
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "nav", "header", "footer", "iframe", "svg",
    "template",
];

/// Elements that start a new line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "br",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "li",
    "main",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "td",
    "th",
    "tr",
    "ul",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuideError {
    #[error("page contains no readable text")]
    NoText,
}

/// Whether a guide's text came from the page or is the placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideStatus {
    Loaded,
    Unavailable,
}

/// Cleaned text of one guide, tagged with its source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideText {
    pub url: String,
    pub text: String,
    pub status: GuideStatus,
}

impl GuideText {
    pub fn loaded(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            status: GuideStatus::Loaded,
        }
    }

    /// Placeholder entry for a source that failed.
    pub fn unavailable(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: GUIDE_UNAVAILABLE.to_string(),
            status: GuideStatus::Unavailable,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.status == GuideStatus::Loaded
    }
}

/// Extract clean, size-bounded text from an HTML document.
///
/// Fails only when nothing readable is left once the noise is removed.
pub fn extract_guide_text(html: &str, max_chars: usize) -> Result<String, GuideError> {
    let document = Html::parse_document(html);

    let mut raw = String::with_capacity(html.len() / 2);
    collect_text(document.root_element(), &mut raw);

    let text = normalize_whitespace(&raw);
    if text.is_empty() {
        return Err(GuideError::NoText);
    }

    Ok(truncate_chars(&text, max_chars))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if SKIPPED_ELEMENTS.contains(&name) {
                continue;
            }

            let is_block = BLOCK_ELEMENTS.contains(&name);
            if is_block {
                out.push('\n');
            }
            collect_text(child_element, out);
            if is_block {
                out.push('\n');
            }
        } else if let Node::Text(text) = child.value() {
            // Source line breaks are layout, not content
            out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
        }
    }
}

/// Collapse whitespace runs inside each line to one space and keep at most
/// one blank line between paragraphs.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;

    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }

        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        out.push_str(&collapsed);
        pending_blank = false;
    }

    out
}

/// Keep at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

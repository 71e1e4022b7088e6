//! Semantic label inference for field blocks.
//!
//! The label is the text of the first caption element (`<label>` by
//! default) that opens and closes on one line. Without one, the label
//! falls back to the first `prefix_chars` characters of the block.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::FieldBlock;

pub const DEFAULT_LABEL_ELEMENT: &str = "label";
pub const DEFAULT_PREFIX_CHARS: usize = 50;

static DEFAULT_CAPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| caption_regex(DEFAULT_LABEL_ELEMENT).unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

fn caption_regex(element: &str) -> Result<Regex, regex::Error> {
    let tag = regex::escape(element);
    Regex::new(&format!(r"<{tag}.*?>(.*?)</{tag}>"))
}

/// Derives a short label string from a block.
#[derive(Debug, Clone)]
pub struct LabelExtractor {
    caption: Regex,
    prefix_chars: usize,
}

impl Default for LabelExtractor {
    fn default() -> Self {
        Self {
            caption: DEFAULT_CAPTION_RE.clone(),
            prefix_chars: DEFAULT_PREFIX_CHARS,
        }
    }
}

impl LabelExtractor {
    /// Build an extractor for a custom caption element name.
    pub fn new(element: &str, prefix_chars: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            caption: caption_regex(element)?,
            prefix_chars,
        })
    }

    pub fn label(&self, block: &FieldBlock) -> String {
        self.label_text(&block.text)
    }

    /// Label for raw block text.
    pub fn label_text(&self, text: &str) -> String {
        if let Some(caps) = self.caption.captures(text) {
            let inner = caps.get(1).map_or("", |m| m.as_str());
            return TAG_RE.replace_all(inner, "").trim().to_string();
        }
        let prefix: String = text.chars().take(self.prefix_chars).collect();
        prefix.trim().to_string()
    }
}

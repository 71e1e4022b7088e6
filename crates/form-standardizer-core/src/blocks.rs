//! Line-oriented extraction of balanced field blocks.
//!
//! This is a marker counter, not a markup parser. Each line is searched
//! for the opening and closing markers (by default `<div` and `</div>`)
//! and a nesting depth is tracked across lines:
//!
//! 1. Outside a block, a line with at least one opener starts a new block;
//!    depth becomes the number of openers on that line.
//! 2. Inside a block, every opener on a line increments depth.
//! 3. Every closer decrements depth, saturating at zero. Closers seen
//!    outside a block are ignored.
//! 4. When depth is zero at the end of a line, the block (first line
//!    through current line, inclusive) is emitted with surrounding
//!    whitespace trimmed and scanning resumes outside any block.
//! 5. A block still open at end of input is dropped and reported through
//!    [`Blocks::unterminated`].
//!
//! Markers inside comments, attribute values, or script text are counted
//! like any other. Existing standard-field catalogs are tuned against this
//! behavior, so it must not be upgraded to a real parser.
//!
//! # Example
//!
//! ```rust
//! use form_standardizer_core::blocks::BlockExtractor;
//!
//! let html = "<form>\n<div>\n  <label>Name</label>\n</div>\n</form>";
//! let blocks: Vec<_> = BlockExtractor::default().blocks(html).collect();
//! assert_eq!(blocks.len(), 1);
//! assert_eq!(blocks[0].text, "<div>\n  <label>Name</label>\n</div>");
//! assert_eq!((blocks[0].start_line, blocks[0].end_line), (2, 4));
//! ```

use crate::models::{FieldBlock, MalformedInput};

/// Opening and closing markers that delimit a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMarkers {
    pub open: String,
    pub close: String,
}

impl Default for BlockMarkers {
    fn default() -> Self {
        Self {
            open: "<div".to_string(),
            close: "</div>".to_string(),
        }
    }
}

/// Produces [`Blocks`] iterators over documents.
#[derive(Debug, Clone, Default)]
pub struct BlockExtractor {
    markers: BlockMarkers,
}

impl BlockExtractor {
    pub fn new(markers: BlockMarkers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &BlockMarkers {
        &self.markers
    }

    /// Lazily scan `text` for top-level blocks.
    ///
    /// Each call starts a fresh scan from the beginning of `text`.
    pub fn blocks<'a>(&'a self, text: &'a str) -> Blocks<'a> {
        Blocks {
            text,
            markers: &self.markers,
            pos: 0,
            line_no: 0,
            done: false,
            unterminated: None,
        }
    }

    /// Eagerly collect all blocks plus any unterminated opener.
    pub fn extract(&self, text: &str) -> (Vec<FieldBlock>, Vec<MalformedInput>) {
        let mut iter = self.blocks(text);
        let blocks: Vec<FieldBlock> = iter.by_ref().collect();
        let malformed = iter.unterminated().cloned().into_iter().collect();
        (blocks, malformed)
    }
}

/// Iterator over the top-level blocks of one document.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    text: &'a str,
    markers: &'a BlockMarkers,
    /// Byte offset of the next unread line.
    pos: usize,
    /// Number of lines consumed so far.
    line_no: usize,
    done: bool,
    unterminated: Option<MalformedInput>,
}

impl Blocks<'_> {
    /// The opener left unclosed at end of input, once the iterator is exhausted.
    pub fn unterminated(&self) -> Option<&MalformedInput> {
        self.unterminated.as_ref()
    }

    /// Next raw line as `(start, end)` byte offsets, excluding the `\n`.
    fn next_line(&mut self) -> Option<(usize, usize)> {
        if self.done {
            return None;
        }
        let start = self.pos;
        let rest = &self.text[start..];
        self.line_no += 1;
        match rest.find('\n') {
            Some(i) => {
                self.pos = start + i + 1;
                Some((start, start + i))
            }
            None => {
                self.done = true;
                self.pos = self.text.len();
                Some((start, self.text.len()))
            }
        }
    }
}

impl Iterator for Blocks<'_> {
    type Item = FieldBlock;

    fn next(&mut self) -> Option<FieldBlock> {
        // (byte offset of first line, 1-based line number)
        let mut open: Option<(usize, usize)> = None;
        let mut depth = 0usize;

        while let Some((line_start, line_end)) = self.next_line() {
            let line = &self.text[line_start..line_end];
            let opens = line.matches(self.markers.open.as_str()).count();
            let closes = line.matches(self.markers.close.as_str()).count();

            match open {
                None if opens == 0 => continue,
                None => {
                    open = Some((line_start, self.line_no));
                    depth = opens;
                }
                Some(_) => depth += opens,
            }

            depth = depth.saturating_sub(closes);

            if depth == 0 {
                if let Some((block_start, start_line)) = open {
                    return Some(make_block(
                        self.text,
                        block_start,
                        line_end,
                        start_line,
                        self.line_no,
                    ));
                }
            }
        }

        if let Some((_, start_line)) = open {
            self.unterminated = Some(MalformedInput {
                start_line,
                open_depth: depth,
            });
        }
        None
    }
}

fn make_block(
    text: &str,
    start: usize,
    end: usize,
    start_line: usize,
    end_line: usize,
) -> FieldBlock {
    let raw = &text[start..end];
    let leading = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    let span_start = start + leading;
    FieldBlock {
        text: trimmed.to_string(),
        start_line,
        end_line,
        span: span_start..span_start + trimmed.len(),
    }
}

/// Extract blocks with the default `<div` / `</div>` markers.
pub fn extract_blocks(text: &str) -> (Vec<FieldBlock>, Vec<MalformedInput>) {
    BlockExtractor::default().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        let (blocks, _) = extract_blocks(input);
        blocks.into_iter().map(|b| b.text).collect()
    }

    #[test]
    fn test_no_markers_yields_nothing() {
        assert!(texts("").is_empty());
        assert!(texts("<p>hello</p>\n<span>x</span>").is_empty());
    }

    #[test]
    fn test_counts_top_level_blocks() {
        let html = "\
<form>
<div class=\"a\">
  <label>First</label>
</div>
<p>between</p>
<div class=\"b\">
  <div class=\"inner\">
    <label>Second</label>
  </div>
</div>
<div>third</div>
</form>";
        let (blocks, malformed) = extract_blocks(html);
        assert_eq!(blocks.len(), 3);
        assert!(malformed.is_empty());
        assert_eq!(
            blocks[0].text,
            "<div class=\"a\">\n  <label>First</label>\n</div>"
        );
        assert_eq!((blocks[1].start_line, blocks[1].end_line), (6, 10));
        assert!(blocks[1].text.ends_with("  </div>\n</div>"));
        assert_eq!(blocks[2].text, "<div>third</div>");
        assert_eq!((blocks[2].start_line, blocks[2].end_line), (11, 11));
    }

    #[test]
    fn test_spans_point_at_source_text() {
        let html = "  <p>x</p>\n   <div>\n  <b>y</b>\n</div>   \ntrailing";
        let (blocks, _) = extract_blocks(html);
        assert_eq!(blocks.len(), 1);
        let b = &blocks[0];
        assert_eq!(&html[b.span.clone()], b.text);
        assert_eq!(b.text, "<div>\n  <b>y</b>\n</div>");
    }

    #[test]
    fn test_same_line_nesting_needs_all_closers() {
        let (blocks, malformed) = extract_blocks("<div><div>x</div>");
        assert!(blocks.is_empty());
        assert_eq!(
            malformed,
            vec![MalformedInput {
                start_line: 1,
                open_depth: 1
            }]
        );
        assert_eq!(texts("<div><div>x</div></div>").len(), 1);
    }

    #[test]
    fn test_nested_openers_across_lines() {
        let html = "<div>\n<div>\n<div>\n</div>\n</div>\n";
        let (blocks, malformed) = extract_blocks(html);
        assert!(blocks.is_empty());
        assert_eq!(malformed[0].open_depth, 1);

        let closed = format!("{}</div>\n", html);
        assert_eq!(texts(&closed).len(), 1);
    }

    #[test]
    fn test_stray_closer_ignored() {
        let html = "</div>\n<div>a</div>\n</div>\n<div>b</div>";
        assert_eq!(texts(html), vec!["<div>a</div>", "<div>b</div>"]);
    }

    #[test]
    fn test_unterminated_block_swallows_rest() {
        let html = "<div>a</div>\n<div>\n<div>b</div>\n";
        let extractor = BlockExtractor::default();
        let mut iter = extractor.blocks(html);
        assert_eq!(iter.next().map(|b| b.text), Some("<div>a</div>".to_string()));
        assert!(iter.unterminated().is_none());
        assert!(iter.next().is_none());
        assert_eq!(iter.unterminated().map(|m| m.start_line), Some(2));
    }

    #[test]
    fn test_markers_in_comments_are_counted() {
        // Approximate matcher: the commented opener keeps the block open.
        let html = "<div>\n<!-- <div> -->\n</div>\n";
        let (blocks, malformed) = extract_blocks(html);
        assert!(blocks.is_empty());
        assert_eq!(malformed.len(), 1);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let extractor = BlockExtractor::default();
        let html = "<div>1</div>\n<div>2</div>";
        let first: Vec<_> = extractor.blocks(html).collect();
        let second: Vec<_> = extractor.blocks(html).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_crlf_preserved_inside_block() {
        let html = "<div>\r\n<label>A</label>\r\n</div>\r\n";
        let (blocks, _) = extract_blocks(html);
        assert_eq!(blocks[0].text, "<div>\r\n<label>A</label>\r\n</div>");
        assert!(html.contains(&blocks[0].text));
    }

    #[test]
    fn test_custom_markers() {
        let extractor = BlockExtractor::new(BlockMarkers {
            open: "<fieldset".to_string(),
            close: "</fieldset>".to_string(),
        });
        let html = "<div>ignored</div>\n<fieldset>\n<div>x</div>\n</fieldset>";
        let blocks: Vec<_> = extractor.blocks(html).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 2);
    }
}

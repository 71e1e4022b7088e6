//! Standard-field catalog parsing.
//!
//! The text format lists one entry per field: a name line, a `Class:`
//! line, then the canonical html as a balanced block.
//!
//! ```text
//! Email Address
//! Class: contact
//! <div class="field">
//!   <label>Email</label>
//!   <input type="email">
//! </div>
//! ```
//!
//! An entry header is any non-empty line immediately followed by a line
//! starting with `Class:`. The entry's html is the first balanced block
//! (per [`BlockExtractor`]) between its header and the next one. Entries
//! without a balanced block are skipped and reported.
//!
//! A JSON array of `{"name", "html"}` objects is accepted as well.

use serde::Serialize;

use crate::blocks::BlockExtractor;
use crate::error::CatalogError;
use crate::models::{FieldCatalog, StandardField};

const CLASS_PREFIX: &str = "Class:";

/// An entry header whose body held no balanced block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub name: String,
    /// 1-based line of the entry's name.
    pub line: usize,
}

/// Result of parsing a text catalog.
#[derive(Debug, Clone)]
pub struct ParsedCatalog {
    pub catalog: FieldCatalog,
    pub skipped: Vec<SkippedEntry>,
}

fn is_class_line(line: &str) -> bool {
    line.trim_start().starts_with(CLASS_PREFIX)
}

/// Parse the text catalog format.
pub fn parse_text(text: &str, extractor: &BlockExtractor) -> Result<ParsedCatalog, CatalogError> {
    let lines: Vec<&str> = text.split('\n').collect();

    let headers: Vec<usize> = (0..lines.len().saturating_sub(1))
        .filter(|&i| {
            !lines[i].trim().is_empty() && !is_class_line(lines[i]) && is_class_line(lines[i + 1])
        })
        .collect();

    let mut fields = Vec::with_capacity(headers.len());
    let mut skipped = Vec::new();

    for (k, &header) in headers.iter().enumerate() {
        let name = lines[header].trim().to_string();
        let body_end = headers.get(k + 1).copied().unwrap_or(lines.len());
        let body = lines[header + 2..body_end].join("\n");

        match extractor.blocks(&body).next() {
            Some(block) => fields.push(StandardField::new(name, block.text)),
            None => skipped.push(SkippedEntry {
                name,
                line: header + 1,
            }),
        }
    }

    Ok(ParsedCatalog {
        catalog: FieldCatalog::new(fields)?,
        skipped,
    })
}

/// Parse a JSON array of `{"name": ..., "html": ...}` objects.
pub fn parse_json(text: &str) -> Result<FieldCatalog, CatalogError> {
    let fields: Vec<StandardField> = serde_json::from_str(text)?;
    FieldCatalog::new(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Standard Fields v2

Email Address
Class: contact
<div class=\"field\">
  <label>Email</label>
  <input type=\"email\" name=\"email\">
</div>

Date of Birth
Class: personal
<div class=\"field\">
  <div class=\"row\">
    <label>Date of Birth</label>
  </div>
  <input type=\"date\">
</div>
";

    #[test]
    fn test_parse_text_entries() {
        let parsed = parse_text(SAMPLE, &BlockExtractor::default()).unwrap();
        assert!(parsed.skipped.is_empty());
        let fields = parsed.catalog.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "Email Address");
        assert!(fields[0].html.starts_with("<div class=\"field\">"));
        assert!(fields[0].html.ends_with("</div>"));
        assert_eq!(fields[1].name, "Date of Birth");
        // Nested block kept whole.
        assert!(fields[1].html.contains("<input type=\"date\">"));
        assert_eq!(fields[1].html.matches("</div>").count(), 2);
    }

    #[test]
    fn test_entry_without_block_is_skipped() {
        let text = "Broken\nClass: x\n<div>\n<label>never closed\n\nPhone\nClass: contact\n<div>phone</div>\n";
        let parsed = parse_text(text, &BlockExtractor::default()).unwrap();
        assert_eq!(
            parsed.skipped,
            vec![SkippedEntry {
                name: "Broken".to_string(),
                line: 1
            }]
        );
        assert_eq!(parsed.catalog.names(), vec!["Phone".to_string()]);
    }

    #[test]
    fn test_parse_text_without_entries() {
        let parsed = parse_text("just some text\n<div>x</div>", &BlockExtractor::default()).unwrap();
        assert!(parsed.catalog.is_empty());
    }

    #[test]
    fn test_parse_json() {
        let catalog = parse_json(
            r#"[{"name": "Email", "html": "<div><label>Email</label><input type=email></div>"}]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().name, "Email");
    }

    #[test]
    fn test_parse_json_rejects_blank_html() {
        let err = parse_json(r#"[{"name": "Email", "html": ""}]"#).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyHtml { .. }));
        assert!(matches!(parse_json("{"), Err(CatalogError::Json(_))));
    }
}

//! Front-matter parsing.
//!
//! A document may open with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! date: 03-04-2021
//! tags: a, b
//! ---
//! # Hello
//! ```
//!
//! [`parse`] splits such a document into a [`FrontMatter`] mapping and the
//! body that follows the closing fence. Documents that do not start with a
//! fence have an empty mapping and their full text as body. Malformed YAML
//! is an error: it is never silently dropped.

use serde_yaml::Value;
use std::collections::BTreeMap;
use thiserror::Error;

const FENCE: &str = "---";

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// How a document specifies its tags in front matter.
#[derive(Debug, Clone, PartialEq)]
pub enum TagSpec {
    /// `tags: [a, b]` or a block list.
    List(Vec<String>),
    /// `tags: a, b`, split on commas.
    Csv(String),
    /// Absent, or a value of any other shape.
    None,
}

/// Structured metadata from a document's leading `---` block.
///
/// Empty when the document has no block; always safe to query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: BTreeMap<String, Value>,
}

impl FrontMatter {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The `title` key, when it is a string.
    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    /// The raw `date` key, when it is a string.
    pub fn date(&self) -> Option<&str> {
        self.get("date").and_then(Value::as_str)
    }

    pub fn tags(&self) -> TagSpec {
        match self.get("tags") {
            Some(Value::Sequence(items)) => {
                TagSpec::List(items.iter().filter_map(scalar_to_string).collect())
            }
            Some(Value::String(s)) => TagSpec::Csv(s.clone()),
            _ => TagSpec::None,
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Split `text` into front matter and body.
///
/// - No opening fence on the first line: empty mapping, body is `text`.
/// - Opening fence without a closing one: everything after the opening
///   fence is metadata, body is empty.
/// - An empty block (`---\n---`) yields an empty mapping.
pub fn parse(text: &str) -> Result<(FrontMatter, String), FrontMatterError> {
    let Some(after_open) = strip_fence_line(text) else {
        return Ok((FrontMatter::default(), text.to_string()));
    };

    let (yaml, body) = match find_closing_fence(after_open) {
        Some((yaml_end, body_start)) => (&after_open[..yaml_end], &after_open[body_start..]),
        None => (after_open, ""),
    };

    let fields: Option<BTreeMap<String, Value>> = serde_yaml::from_str(yaml)?;
    Ok((
        FrontMatter {
            fields: fields.unwrap_or_default(),
        },
        body.to_string(),
    ))
}

/// If the first line of `text` is a fence, return what follows that line.
fn strip_fence_line(text: &str) -> Option<&str> {
    let (first, rest) = match text.find('\n') {
        Some(pos) => (&text[..pos], &text[pos + 1..]),
        None => (text, ""),
    };
    (first.trim_end_matches('\r') == FENCE).then_some(rest)
}

/// Locate the next fence line. Returns (end of the YAML region, start of
/// the body), both as byte offsets into `text`.
fn find_closing_fence(text: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == FENCE {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}

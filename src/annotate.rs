//! Line numbers for rendered code blocks.
//!
//! Runs over finished HTML as a text pass. Two block shapes are recognised:
//!
//! ```text
//! <div class="codehilite"><pre><span></span><code>…</code></pre></div>   highlighted
//! <pre><code>…</code></pre>  /  <pre><code class="language-x">…</code></pre>   plain
//! ```
//!
//! Every line of each block gets a `<span class="ln">N</span>` prefix and the
//! block is emitted in the highlighted shape, so plain and highlighted code
//! style the same. A block that already carries `class="ln"` is left alone,
//! which makes [`annotate`] idempotent.

use crate::markdown::codehilite;
use regex::{Captures, Regex};
use std::sync::LazyLock;

const LINE_MARKER: &str = r#"class="ln""#;

static HIGHLIGHTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div class="codehilite">\s*<pre><span></span><code>(.*?)</code></pre>\s*</div>\n?"#)
        .unwrap()
});

static PLAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code(?:\s+class="[^"]*")?>(.*?)</code></pre>\n?"#).unwrap()
});

/// Add line numbers to every code block in `html`.
pub fn annotate(html: &str) -> String {
    let pass = HIGHLIGHTED_RE.replace_all(html, number_block);
    PLAIN_RE.replace_all(&pass, number_block).into_owned()
}

fn number_block(caps: &Captures) -> String {
    let code = &caps[1];
    if code.contains(LINE_MARKER) {
        return caps[0].to_string();
    }
    codehilite(&number_lines(code))
}

/// Prefix each line with its 1-based number. Trailing newlines are dropped
/// first so the closing fence does not produce an empty numbered line.
fn number_lines(code: &str) -> String {
    code.trim_end_matches('\n')
        .split('\n')
        .enumerate()
        .map(|(i, line)| format!(r#"<span class="ln">{}</span>{line}"#, i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_plain_block_and_normalises_wrapper() {
        let out = annotate("<p>x</p>\n<pre><code>a\nb\n</code></pre>\n");
        assert_eq!(
            out,
            "<p>x</p>\n<div class=\"codehilite\"><pre><span></span><code>\
             <span class=\"ln\">1</span>a\n<span class=\"ln\">2</span>b\
             </code></pre></div>\n"
        );
    }

    #[test]
    fn numbers_language_tagged_plain_block() {
        let out = annotate("<pre><code class=\"language-foo\">x\n</code></pre>");
        assert!(out.starts_with("<div class=\"codehilite\">"));
        assert!(out.contains("<span class=\"ln\">1</span>x"));
        assert!(!out.contains("language-foo"));
    }

    #[test]
    fn numbers_highlighted_block() {
        let input = "<div class=\"codehilite\">\n<pre><span></span><code><span class=\"k\">let</span>\nx\n</code></pre>\n</div>\n";
        let out = annotate(input);
        assert!(out.contains("<span class=\"ln\">1</span><span class=\"k\">let</span>"));
        assert!(out.contains("<span class=\"ln\">2</span>x</code>"));
    }

    #[test]
    fn empty_block_gets_one_line() {
        let out = annotate("<pre><code></code></pre>");
        assert!(out.contains("<code><span class=\"ln\">1</span></code>"));
    }

    #[test]
    fn html_without_code_is_unchanged() {
        let html = "<h1 id=\"a\">A</h1>\n<p>text</p>\n";
        assert_eq!(annotate(html), html);
    }

    #[test]
    fn is_idempotent() {
        let html = "<pre><code>one\ntwo\n</code></pre>\n<p>between</p>\n\
                    <div class=\"codehilite\"><pre><span></span><code>three\n</code></pre></div>\n";
        let once = annotate(html);
        assert_eq!(annotate(&once), once);
    }

    #[test]
    fn mermaid_blocks_are_not_numbered() {
        let html = "<pre class=\"mermaid\">graph TD\n</pre>\n";
        assert_eq!(annotate(html), html);
    }
}

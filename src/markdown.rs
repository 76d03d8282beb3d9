//! Markdown to HTML rendering.
//!
//! Built on `pulldown-cmark` with a small event rewrite pass:
//!
//! | Input                     | Output                                                      |
//! |---------------------------|-------------------------------------------------------------|
//! | `# Heading`               | `<h1 id="heading">`, duplicates get `-2`, `-3`, ...           |
//! | ```` ```mermaid ````      | `<pre class="mermaid">` with the source escaped, not parsed |
//! | ```` ```rust ```` (known) | `<div class="codehilite"><pre><span></span><code>` + classed spans |
//! | unknown / indented code   | plain `<pre><code>`                                         |
//!
//! Line numbers are not added here; see [`crate::annotate`].

use crate::highlight::SyntaxHighlighter;
use crate::naming::heading_slug;
use maud::{PreEscaped, html};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html as md_html};
use std::collections::HashSet;

const MERMAID: &str = "mermaid";

/// Markdown renderer. With a highlighter it produces the full post
/// rendering; without one ([`MarkdownRenderer::plain`]) it is the cheap
/// profile used for excerpts.
pub struct MarkdownRenderer {
    highlighter: Option<SyntaxHighlighter>,
}

impl MarkdownRenderer {
    pub fn new(highlighter: SyntaxHighlighter) -> Self {
        Self {
            highlighter: Some(highlighter),
        }
    }

    pub fn plain() -> Self {
        Self { highlighter: None }
    }

    pub fn render(&self, markdown: &str) -> String {
        let mut parser = Parser::new_ext(markdown, options());
        let mut ids = HeadingIds::default();
        let mut events: Vec<Event> = Vec::new();

        while let Some(event) = parser.next() {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    let inner = take_until(&mut parser, |e| matches!(e, Event::End(TagEnd::Heading(_))));
                    let id = match id {
                        Some(explicit) => {
                            ids.reserve(&explicit);
                            explicit
                        }
                        None => CowStr::from(ids.claim(&plain_text(&inner))),
                    };
                    events.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(id),
                        classes,
                        attrs,
                    }));
                    events.extend(inner);
                }
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    let inner = take_until(&mut parser, |e| matches!(e, Event::End(TagEnd::CodeBlock)));
                    let lang = info.split_whitespace().next().unwrap_or("").to_string();
                    let code = plain_text(&inner);
                    match self.fenced_block(&lang, &code) {
                        Some(rendered) => events.push(Event::Html(CowStr::from(rendered))),
                        None => {
                            events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))));
                            events.extend(inner);
                        }
                    }
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        md_html::push_html(&mut out, events.into_iter());
        out
    }

    /// Custom rendering for a fenced block, or `None` to let pulldown-cmark
    /// render it as a plain code block.
    fn fenced_block(&self, lang: &str, code: &str) -> Option<String> {
        if lang.eq_ignore_ascii_case(MERMAID) {
            return Some(html! { pre.mermaid { (code) } }.into_string() + "\n");
        }
        if lang.is_empty() {
            return None;
        }
        let inner = self.highlighter.as_ref()?.highlight(code, lang)?;
        Some(codehilite(&inner))
    }
}

/// The wrapper shared by highlighted blocks and annotated plain blocks.
pub fn codehilite(inner_html: &str) -> String {
    html! {
        div.codehilite { pre { span {} code { (PreEscaped(inner_html)) } } }
    }
    .into_string()
        + "\n"
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Consume events up to and including the first one matching `is_end`.
fn take_until<'a>(
    parser: &mut Parser<'a>,
    is_end: impl Fn(&Event<'a>) -> bool,
) -> Vec<Event<'a>> {
    let mut taken = Vec::new();
    for event in parser.by_ref() {
        let done = is_end(&event);
        taken.push(event);
        if done {
            break;
        }
    }
    taken
}

fn plain_text(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Text(t) | Event::Code(t) => Some(t.as_ref()),
            _ => None,
        })
        .collect()
}

/// Unique heading anchors within one document.
#[derive(Default)]
struct HeadingIds {
    used: HashSet<String>,
}

impl HeadingIds {
    fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    fn claim(&mut self, text: &str) -> String {
        let base = heading_slug(text);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

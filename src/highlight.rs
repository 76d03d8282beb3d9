//! Syntax highlighting for fenced code blocks.
//!
//! Highlighting emits CSS classes rather than inline colours, so the same
//! markup works with any theme. The colours live in a single stylesheet
//! generated from the configured syntect theme and written to
//! `highlight.css` on every build.

use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use thiserror::Error;

pub const DEFAULT_THEME: &str = "InspiredGitHub";

#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("unknown highlight theme '{name}' (available: {available})")]
    UnknownTheme { name: String, available: String },
    #[error("stylesheet generation failed: {0}")]
    Css(#[from] syntect::Error),
}

/// Classed-HTML highlighter over syntect's bundled syntaxes and themes.
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: String,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl SyntaxHighlighter {
    pub fn new(theme: &str) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme: theme.to_string(),
        }
    }

    /// Highlight `code` as `lang`, returning the inner markup of the
    /// `<code>` element. `None` for unknown languages or parse failures,
    /// in which case the caller renders the block plainly.
    pub fn highlight(&self, code: &str, lang: &str) -> Option<String> {
        let syntax = self.syntax_set.find_syntax_by_token(lang)?;
        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntax_set,
            ClassStyle::Spaced,
        );
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .ok()?;
        }
        Some(generator.finalize())
    }

    /// Stylesheet for the configured theme.
    pub fn css(&self) -> Result<String, HighlightError> {
        let theme = self.theme_set.themes.get(&self.theme).ok_or_else(|| {
            HighlightError::UnknownTheme {
                name: self.theme.clone(),
                available: self.theme_names().join(", "),
            }
        })?;
        Ok(css_for_theme_with_class_style(theme, ClassStyle::Spaced)?)
    }

    pub fn theme_names(&self) -> Vec<&str> {
        self.theme_set.themes.keys().map(String::as_str).collect()
    }
}

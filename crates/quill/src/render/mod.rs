//! Markdown rendering for quill.
//!
//! Converts entry bodies from Markdown to HTML with pulldown-cmark,
//! intercepting code blocks so they come out syntax-highlighted via
//! syntect. Both fenced blocks and blocks indented by four spaces are
//! handled: fenced blocks resolve their syntax from the info string,
//! indented blocks fall back to first-line detection, then plain text.

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::{SyntaxReference, SyntaxSet};
use tracing::warn;

/// Highlighting theme applied to code blocks.
const THEME_NAME: &str = "InspiredGitHub";

/// Markdown-to-HTML renderer with code block highlighting.
///
/// Loading the syntax definitions is expensive, so one renderer is built
/// at startup and shared across requests.
#[derive(Debug)]
pub struct MarkdownRenderer {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl MarkdownRenderer {
    /// Build a renderer with the bundled syntax definitions and theme.
    #[must_use]
    pub fn new() -> Self {
        let syntaxes = SyntaxSet::load_defaults_newlines();
        let mut themes = ThemeSet::load_defaults();
        let theme = themes.themes.remove(THEME_NAME).unwrap_or_default();
        Self { syntaxes, theme }
    }

    /// Render a Markdown body to HTML.
    ///
    /// Code blocks are replaced in the event stream with pre-highlighted
    /// HTML; everything else goes through pulldown-cmark's HTML writer.
    #[must_use]
    pub fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code = String::new();
        let mut code_lang: Option<String> = None;
        let mut in_code_block = false;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code.clear();
                    code_lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            let token = info.split_whitespace().next().unwrap_or("");
                            if token.is_empty() {
                                None
                            } else {
                                Some(token.to_string())
                            }
                        }
                        CodeBlockKind::Indented => None,
                    };
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    let highlighted = self.highlight(&code, code_lang.as_deref());
                    events.push(Event::Html(highlighted.into()));
                }
                Event::Text(text) if in_code_block => {
                    code.push_str(&text);
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(markdown.len() * 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    /// Highlight a code block, degrading to an escaped `<pre>` on failure.
    fn highlight(&self, code: &str, token: Option<&str>) -> String {
        let syntax = self.resolve_syntax(code, token);

        highlighted_html_for_string(code, &self.syntaxes, syntax, &self.theme).unwrap_or_else(
            |err| {
                warn!("syntax highlighting failed: {err}");
                plain_code_block(code)
            },
        )
    }

    /// Pick a syntax definition for a block.
    fn resolve_syntax(&self, code: &str, token: Option<&str>) -> &SyntaxReference {
        token
            .and_then(|t| self.syntaxes.find_syntax_by_token(t))
            .or_else(|| self.syntaxes.find_syntax_by_first_line(code))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Escaped, unhighlighted fallback block.
fn plain_code_block(code: &str) -> String {
    let mut escaped = String::with_capacity(code.len());
    let _ = pulldown_cmark_escape::escape_html(&mut escaped, code);
    format!("<pre><code>{escaped}</code></pre>\n")
}

use anyhow::Context;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

// Syntect imports
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::toc::{slugify, split_attributes};

const FALLBACK_THEME: &str = "base16-ocean.dark";

/// Syntax definitions plus the colour theme used for fenced code.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    /// Loads the bundled syntaxes and the named theme, falling back to
    /// `base16-ocean.dark` for unknown names.
    pub fn new(theme_name: &str) -> anyhow::Result<Self> {
        let mut themes = ThemeSet::load_defaults();
        let theme = themes
            .themes
            .remove(theme_name)
            .or_else(|| themes.themes.remove(FALLBACK_THEME))
            .with_context(|| format!("syntax theme '{}' not found", theme_name))?;

        Ok(Self { syntaxes: SyntaxSet::load_defaults_newlines(), theme })
    }

    /// Highlighted `<pre>` block, or `None` if syntect fails on the input.
    pub fn highlight(&self, code: &str, label: &str) -> Option<String> {
        // Info strings may carry extras: "rust,ignore", "js title=x".
        let token = label.split([',', ' ']).next().unwrap_or_default();
        let syntax = self
            .syntaxes
            .find_syntax_by_token(token)
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());
        highlighted_html_for_string(code, &self.syntaxes, syntax, &self.theme).ok()
    }
}

fn is_outline_level(level: HeadingLevel) -> bool {
    matches!(level, HeadingLevel::H2 | HeadingLevel::H3 | HeadingLevel::H4)
}

/// Renders a post body to HTML.
///
/// h2–h4 headings get an `id` built from their source line the same way
/// the table of contents builds its ids, so every outline entry has an
/// anchor to jump to. Fenced code is highlighted when a highlighter is given.
pub fn render_markdown(md: &str, highlighter: Option<&Highlighter>) -> String {
    let parser = Parser::new_ext(md, Options::all()).into_offset_iter();

    let mut events = Vec::new();
    // (info string, collected text) of the fenced block being highlighted
    let mut code: Option<(String, String)> = None;

    for (event, range) in parser {
        match event {
            Event::Start(Tag::Heading { level, id: None, classes, attrs }) if is_outline_level(level) => {
                let line = md[range].lines().next().unwrap_or_default();
                let (text, _) = split_attributes(line);
                let id: CowStr = slugify(text).into();
                events.push(Event::Start(Tag::Heading { level, id: Some(id), classes, attrs }));
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(label))) if highlighter.is_some() => {
                code = Some((label.to_string(), String::new()));
            }
            Event::Text(text) => match code.as_mut() {
                Some((_, buf)) => buf.push_str(&text),
                None => events.push(Event::Text(text)),
            },
            Event::End(TagEnd::CodeBlock) if code.is_some() => {
                let Some((label, text)) = code.take() else { continue };
                match highlighter.and_then(|h| h.highlight(&text, &label)) {
                    Some(highlighted) => events.push(Event::Html(highlighted.into())),
                    None => {
                        events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(label.into()))));
                        events.push(Event::Text(text.into()));
                        events.push(Event::End(TagEnd::CodeBlock));
                    }
                }
            }
            _ if code.is_some() => {}
            _ => events.push(event),
        }
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());
    html_output
}

/// Strips Markdown syntax to produce clean plain text for search indexing.
pub fn strip_markdown(md: &str) -> String {
    let parser = Parser::new(md);
    let mut plain_text = String::new();

    for event in parser {
        match event {
            Event::Text(text) | Event::Code(text) => {
                plain_text.push_str(&text);
                plain_text.push(' ');
            }
            _ => {}
        }
    }
    plain_text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::{flatten_ids, parse_headings};

    #[test]
    fn headings_get_outline_ids() {
        let md = "# Title\n\n## Getting `started`\n\ntext\n\n### Step *one*\n\n##### Tiny";
        let html = render_markdown(md, None);
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains(r#"<h2 id="getting-started">"#));
        assert!(html.contains(r#"<h3 id="step-one">"#));
        assert!(html.contains("<h5>Tiny</h5>"));

        for id in flatten_ids(&parse_headings(md)) {
            assert!(html.contains(&format!("id=\"{}\"", id)), "no anchor for {}", id);
        }
    }

    #[test]
    fn explicit_heading_ids_win() {
        let md = "## Install {#setup}\n\ntext\n\n### Tips {.note}\n\n```` a`b\n\n## Real";
        let html = render_markdown(md, None);
        assert!(html.contains(r#"<h2 id="setup">Install</h2>"#));
        assert!(html.contains(r#"<h3 id="tips" class="note">"#));

        let ids = flatten_ids(&parse_headings(md));
        assert_eq!(ids, vec!["setup", "tips", "real"]);
        for id in ids {
            assert!(html.contains(&format!("id=\"{}\"", id)), "no anchor for {}", id);
        }
    }

    #[test]
    fn plain_code_blocks_are_escaped() {
        let html = render_markdown("```rust\nlet x = a < b;\n```", None);
        assert!(html.contains("<pre><code class=\"language-rust\">"));
        assert!(html.contains("a &lt; b"));
    }

    #[test]
    fn highlights_fenced_code() {
        let highlighter = Highlighter::new("no-such-theme").unwrap();
        let html = render_markdown("```rust,ignore\nfn main() {}\n```\n\nafter", Some(&highlighter));
        assert!(html.contains("<pre style="));
        assert!(html.contains("main"));
        assert!(html.contains("<p>after</p>"));
        assert!(!html.contains("<code class"));
    }

    #[test]
    fn strips_to_plain_text() {
        let text = strip_markdown("## Hi *there*\n\nuse `cargo`");
        assert_eq!(text.split_whitespace().collect::<Vec<_>>(), ["Hi", "there", "use", "cargo"]);
        assert!(!text.contains(['#', '*', '`']));
    }
}

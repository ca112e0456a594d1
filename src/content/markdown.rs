//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::error::SiteError;

/// Placeholder emitted where the source contained raw block-level HTML.
const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->\n";

/// Markdown renderer with syntax highlighting.
///
/// Construction loads the syntect syntax and theme definitions, which is
/// expensive; build one at startup and share it across requests. All methods
/// take `&self`, so concurrent use is safe.
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a renderer using the named syntect theme. An unknown theme
    /// name falls back to the first available default theme.
    pub fn new(theme_name: &str, line_numbers: bool) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(theme_name) {
            Some(theme) => theme,
            None => {
                tracing::warn!(theme = theme_name, "unknown highlight theme, using default");
                themes.into_values().next().unwrap_or_default()
            }
        };

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            line_numbers,
        }
    }

    /// Render markdown to sanitized HTML.
    ///
    /// Raw HTML in the source is never passed through: block-level raw HTML
    /// is replaced with a comment, inline raw HTML is dropped. Soft line
    /// breaks become hard breaks so paragraph line structure survives.
    pub fn render(&self, markdown: &str) -> Result<String, SiteError> {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code_lang: Option<String> = None;
        let mut code_buf = String::new();
        let mut in_code_block = false;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_lang = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                        _ => None,
                    };
                    code_buf.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    let highlighted = self.highlight_code(&code_buf, code_lang.take().as_deref())?;
                    events.push(Event::Html(CowStr::from(highlighted)));
                }
                Event::Text(text) if in_code_block => {
                    code_buf.push_str(&text);
                }
                Event::SoftBreak => {
                    events.push(Event::HardBreak);
                }
                Event::Html(_) => {
                    // Collapse consecutive raw HTML lines into one marker.
                    if !matches!(events.last(), Some(Event::Html(h)) if h.as_ref() == RAW_HTML_OMITTED)
                    {
                        events.push(Event::Html(CowStr::from(RAW_HTML_OMITTED)));
                    }
                }
                Event::InlineHtml(_) => {}
                other => events.push(other),
            }
        }

        add_heading_ids(&mut events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        Ok(html_output)
    }

    /// Highlight a fenced code block.
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> Result<String, SiteError> {
        let lang = lang.unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let highlighted = highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme)?;

        if self.line_numbers {
            Ok(add_line_numbers(&highlighted, lang))
        } else {
            Ok(format!(
                r#"<div class="highlight {}">{}</div>"#,
                lang, highlighted
            ))
        }
    }
}

/// Wrap highlighted code in a gutter table with rendered line numbers.
fn add_line_numbers(code: &str, lang: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let line_count = lines.len();

    let mut gutter = String::new();
    let mut code_lines = String::new();

    for (i, line) in lines.iter().enumerate() {
        gutter.push_str(&format!(r#"<span class="line-number">{}</span>"#, i + 1));
        code_lines.push_str(line);
        if i < line_count - 1 {
            gutter.push('\n');
            code_lines.push('\n');
        }
    }

    format!(
        r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
        lang, gutter, code_lines
    )
}

/// Give every heading without an explicit `{#id}` attribute a slugified id
/// derived from its text, for anchor links.
fn add_heading_ids(events: &mut [Event]) {
    for i in 0..events.len() {
        if !matches!(&events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }

        let mut text = String::new();
        for event in events[i + 1..].iter() {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
        }

        let slug = slug::slugify(&text);
        if slug.is_empty() {
            continue;
        }
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> MarkdownRenderer {
        MarkdownRenderer::new("InspiredGitHub", true)
    }

    #[test]
    fn test_render_basic_markdown() {
        let html = renderer()
            .render("# Hello World\n\nThis is a test.")
            .unwrap();
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_code_block_with_line_numbers() {
        let html = renderer().render("```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains("highlight rust"));
        assert!(html.contains(r#"<span class="line-number">1</span>"#));
    }

    #[test]
    fn test_render_table() {
        let html = renderer()
            .render("| a | b |\n|---|---|\n| 1 | 2 |")
            .unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("</table>"));
    }

    #[test]
    fn test_render_strikethrough_and_tasklist() {
        let html = renderer().render("~~gone~~\n\n- [x] done").unwrap();
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn test_soft_breaks_become_hard_breaks() {
        let html = renderer().render("line one\nline two").unwrap();
        assert!(html.contains("<br />"));
    }

    #[test]
    fn test_explicit_heading_id_is_kept() {
        let html = renderer().render("# Custom {#my-anchor}").unwrap();
        assert!(html.contains(r#"id="my-anchor""#));
    }

    #[test]
    fn test_raw_html_is_omitted() {
        let html = renderer()
            .render("before\n\n<script>alert(1)</script>\n\nafter")
            .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("<!-- raw HTML omitted -->"));
    }

    #[test]
    fn test_inline_html_is_dropped() {
        let html = renderer().render("a <b>bold</b> claim").unwrap();
        assert!(!html.contains("<b>"));
        assert!(html.contains("bold"));
    }

    #[test]
    fn test_footnotes() {
        let html = renderer().render("text[^1]\n\n[^1]: the footnote").unwrap();
        assert!(html.contains("footnote"));
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let r = MarkdownRenderer::new("no-such-theme", false);
        assert!(r.render("plain text").is_ok());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(renderer().render("").unwrap(), "");
    }
}

//! Markdown to sanitized HTML pipeline.
//!
//! # Responsibility
//! - Parse GitHub-flavored markdown with line breaks treated as hard breaks.
//! - Pass the generated HTML through an allow-list sanitizer.
//! - Provide the clamped card preview and a visible-text projection.
//!
//! # Invariants
//! - Empty input renders to empty output.
//! - Rendering is stateless; the same input always yields the same output.
//! - Script/style content and event-handler attributes never survive.
//! - Non-empty output is one `<div>` wrapper with no blank line inside, so
//!   feeding it back through the pipeline keeps it as a single raw HTML
//!   block and the visible text cannot drift.

use ammonia::Builder;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, Options, Parser};
use regex::Regex;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

/// Number of source lines shown on a grid card.
pub const CARD_PREVIEW_LINES: usize = 3;

/// Class of the wrapper element around rendered markdown.
pub const BODY_CLASS: &str = "markdown-body";

static SANITIZER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder
        .add_tags(&["input"])
        .add_tag_attributes("input", &["type", "checked", "disabled"])
        .link_rel(Some("noopener noreferrer"))
        .strip_comments(true);
    builder
});

static TEXT_ONLY: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder.tags(HashSet::new());
    builder
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// HTML that went through the sanitizer and may be injected as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeHtml(String);

impl SafeHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for SafeHtml {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeHtml {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Renders markdown to sanitized HTML.
pub fn render_markdown(markdown: &str) -> SafeHtml {
    if markdown.trim().is_empty() {
        return SafeHtml::default();
    }
    let sanitized = SANITIZER.clean(&parse_to_html(markdown)).to_string();
    let body = close_blank_lines(&sanitized);
    if body.is_empty() {
        return SafeHtml::default();
    }
    SafeHtml(format!("<div class=\"{BODY_CLASS}\">\n{body}</div>\n"))
}

/// Renders the first `lines` non-blank source lines, as shown on a card.
pub fn render_card_preview(markdown: &str, lines: usize) -> SafeHtml {
    let clamped = markdown
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(lines)
        .collect::<Vec<_>>()
        .join("\n");
    render_markdown(&clamped)
}

/// Strips all markup and collapses whitespace.
///
/// Text stays entity-escaped, so two renderings compare equal exactly when
/// a reader would see the same characters.
pub fn visible_text(html: &str) -> String {
    let text = TEXT_ONLY.clean(html).to_string();
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Folds each blank line into the next one as a `&#10;` reference.
///
/// A blank line would end an HTML block on re-parse and expose the rest
/// (typically `<pre>` content) to markdown. The reference decodes to the
/// same newline, so the rendered page is unchanged.
fn close_blank_lines(html: &str) -> String {
    let trimmed = html.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut output = String::with_capacity(trimmed.len() + 1);
    let mut lines = trimmed.split('\n').peekable();
    while let Some(line) = lines.next() {
        output.push_str(line);
        if lines.peek().is_none() {
            break;
        }
        if line.trim().is_empty() {
            output.push_str("&#10;");
        } else {
            output.push('\n');
        }
    }
    output.push('\n');
    output
}

fn parse_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, events);
    output
}

#[cfg(test)]
mod tests {
    use super::{
        close_blank_lines, parse_to_html, render_card_preview, render_markdown, visible_text,
    };

    #[test]
    fn empty_input_renders_empty() {
        assert!(render_markdown("").is_empty());
        assert!(render_markdown("  \n\t").is_empty());
    }

    #[test]
    fn blank_lines_are_folded_into_character_references() {
        assert_eq!(
            close_blank_lines("<pre><code>a\n\n\nb\n</code></pre>\n\n"),
            "<pre><code>a\n&#10;&#10;b\n</code></pre>\n"
        );
        assert_eq!(close_blank_lines("<p>x</p>\n  \n<p>y</p>"), "<p>x</p>\n  &#10;<p>y</p>\n");
        assert_eq!(close_blank_lines("\n\n"), "");
    }

    #[test]
    fn code_block_blank_lines_keep_their_newlines() {
        let html = render_markdown("```\na\n\nb\n```");
        assert!(!html.as_str().contains("\n\n"), "{html}");
        assert_eq!(visible_text(html.as_str()), "a b");
        assert!(html.as_str().contains("a\n&#10;b"), "{html}");
    }

    #[test]
    fn output_is_wrapped_once_and_fully_stripped_input_is_empty() {
        let html = render_markdown("# Hi");
        assert_eq!(html.as_str(), "<div class=\"markdown-body\">\n<h1>Hi</h1>\n</div>\n");
        assert!(render_markdown("<script>alert(1)</script>").is_empty());
    }

    #[test]
    fn soft_breaks_become_hard_breaks() {
        let html = render_markdown("line one\nline two");
        assert!(html.as_str().contains("<br>"), "{html}");
    }

    #[test]
    fn raw_parser_output_keeps_script_but_rendered_does_not() {
        let source = "hello\n\n<script>alert(1)</script>";
        assert!(parse_to_html(source).contains("<script>"));
        let rendered = render_markdown(source);
        assert!(!rendered.as_str().contains("<script"));
        assert!(!rendered.as_str().contains("alert(1)"));
    }

    #[test]
    fn event_handlers_and_javascript_links_are_removed() {
        let rendered = render_markdown(
            "[click](javascript:alert(1))\n\n<img src=\"x.png\" onerror=\"alert(1)\">",
        );
        assert!(!rendered.as_str().contains("javascript:"));
        assert!(!rendered.as_str().contains("onerror"));
    }

    #[test]
    fn links_get_noopener_rel() {
        let rendered = render_markdown("[site](https://example.com)");
        assert!(rendered.as_str().contains("rel=\"noopener noreferrer\""));
    }

    #[test]
    fn gfm_tables_and_strikethrough_render() {
        let rendered = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~");
        assert!(rendered.as_str().contains("<table>"));
        assert!(rendered.as_str().contains("<del>gone</del>"));
    }

    #[test]
    fn card_preview_keeps_first_three_non_blank_lines() {
        let preview = render_card_preview("one\n\ntwo\nthree\nfour", 3);
        let text = visible_text(preview.as_str());
        assert_eq!(text, "one two three");
    }

    #[test]
    fn visible_text_collapses_markup_and_whitespace() {
        assert_eq!(visible_text("<h1>Hi</h1>\n<p>a <em>b</em></p>"), "Hi a b");
    }
}

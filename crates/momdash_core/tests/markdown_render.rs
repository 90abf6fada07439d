use momdash_core::{render_card_preview, render_markdown, visible_text};

#[test]
fn empty_markdown_renders_empty_html() {
    assert_eq!(render_markdown("").as_str(), "");
}

#[test]
fn heading_survives_and_script_is_stripped() {
    let html = render_markdown("# Hi\n<script>alert(1)</script>");
    assert!(html.as_str().contains("<h1>Hi</h1>"), "{html}");
    assert!(!html.as_str().to_ascii_lowercase().contains("<script"), "{html}");
}

#[test]
fn notes_render_heading_and_list_items() {
    let html = render_markdown("## Notes\n- item");
    assert!(html.as_str().contains("<h2>Notes</h2>"), "{html}");
    assert!(html.as_str().contains("<li>item</li>"), "{html}");
}

#[test]
fn task_lists_keep_disabled_checkboxes() {
    let html = render_markdown("- [x] shipped\n- [ ] pending");
    assert!(html.as_str().contains("type=\"checkbox\""), "{html}");
    assert!(html.as_str().contains("disabled"), "{html}");
}

const FRAGMENTS: &[&str] = &[
    "# Hi",
    "## Notes\n- item\n- second",
    "plain *emphasis* and **strong**\nwith a break",
    "```\na\n\n*b*\n```",
    "    indented\n\n    code",
    "> ```\n> a\n>\n> *b*\n> ```",
    "> quoted *text*\n>\n> - [x] done",
    "1. first\n\n2. second",
    "| a | b |\n|---|---|\n| 1 | 2 |",
    "<div>raw\n\n*not raw*</div>",
    "<script>alert(1)</script>",
    "<img src=x onerror=alert(1)> trailing text",
    "[link](javascript:alert(1)) and <a href=\"https://example.com\" onclick=\"x()\">ok</a>",
    "a &amp; b < c ~~gone~~",
];

fn assert_rerender_is_stable(source: &str) {
    let once = render_markdown(source);
    let twice = render_markdown(once.as_str());

    assert_eq!(
        visible_text(once.as_str()),
        visible_text(twice.as_str()),
        "visible text drifted for {source:?}\nonce: {once}\ntwice: {twice}"
    );
    for rendered in [&once, &twice] {
        let lowered = rendered.as_str().to_ascii_lowercase();
        assert!(!lowered.contains("<script"), "{rendered}");
        assert!(!lowered.contains("onerror"), "{rendered}");
        assert!(!lowered.contains("onclick"), "{rendered}");
        assert!(!lowered.contains("javascript:"), "{rendered}");
    }
}

#[test]
fn rerendering_sanitized_output_keeps_visible_text_and_stays_safe() {
    for source in FRAGMENTS {
        assert_rerender_is_stable(source);
    }
}

#[test]
fn quoted_code_block_with_blank_line_rerenders_to_same_text() {
    let source = "> ```\n> a\n>\n> *b*\n> ```";
    let once = render_markdown(source);
    assert!(!once.as_str().contains("\n\n"), "{once}");
    assert_eq!(visible_text(once.as_str()), "a *b*");
    assert_rerender_is_stable(source);
}

#[test]
fn combined_documents_rerender_to_same_text() {
    for first in FRAGMENTS {
        for second in FRAGMENTS {
            for separator in ["\n", "\n\n"] {
                let joined = format!("{first}{separator}{second}");
                assert_rerender_is_stable(&joined);

                let quoted = joined
                    .lines()
                    .map(|line| format!("> {line}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                assert_rerender_is_stable(&quoted);
            }
        }
    }
}

#[test]
fn card_preview_is_clamped_to_three_lines() {
    let content = "# Agenda\n\n- one\n- two\n- three\n- four";
    let preview = render_card_preview(content, 3);
    let text = visible_text(preview.as_str());
    assert!(text.contains("Agenda"));
    assert!(text.contains("two"));
    assert!(!text.contains("three"));
}

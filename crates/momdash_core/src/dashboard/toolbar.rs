//! Markdown formatting toolbar for the editor buffer.
//!
//! Actions operate on a byte selection of the buffer and return the
//! selection to show afterwards. Inline actions wrap the selection, block
//! actions toggle a prefix on every touched line.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static ORDERED_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\. ").expect("valid ordered item regex"));
static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6}) ").expect("valid heading regex"));

const LINK_URL_PLACEHOLDER: &str = "https://";
const TABLE_SKELETON: &str = "| Column 1 | Column 2 | Column 3 |\n\
| -------- | -------- | -------- |\n\
| Text     | Text     | Text     |\n";

/// One toolbar button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatAction {
    Bold,
    Italic,
    Heading,
    Quote,
    UnorderedList,
    OrderedList,
    Link,
    Table,
}

impl FormatAction {
    /// Toolbar order.
    pub const ALL: &'static [FormatAction] = &[
        FormatAction::Bold,
        FormatAction::Italic,
        FormatAction::Heading,
        FormatAction::Quote,
        FormatAction::UnorderedList,
        FormatAction::OrderedList,
        FormatAction::Link,
        FormatAction::Table,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Heading => "heading",
            Self::Quote => "quote",
            Self::UnorderedList => "unordered-list",
            Self::OrderedList => "ordered-list",
            Self::Link => "link",
            Self::Table => "table",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.label() == label.trim())
    }
}

/// Applies `action` to `buffer` and returns the new selection.
pub fn apply_format(
    buffer: &mut String,
    selection: Range<usize>,
    action: FormatAction,
) -> Range<usize> {
    let selection = clamp_selection(buffer, selection);
    match action {
        FormatAction::Bold => wrap_inline(buffer, selection, "**"),
        FormatAction::Italic => wrap_inline(buffer, selection, "*"),
        FormatAction::Heading => transform_lines(buffer, selection, cycle_heading),
        FormatAction::Quote => toggle_prefix(buffer, selection, "> "),
        FormatAction::UnorderedList => toggle_prefix(buffer, selection, "- "),
        FormatAction::OrderedList => toggle_ordered(buffer, selection),
        FormatAction::Link => insert_link(buffer, selection),
        FormatAction::Table => insert_table(buffer, selection),
    }
}

fn clamp_selection(buffer: &str, selection: Range<usize>) -> Range<usize> {
    let start = floor_boundary(buffer, selection.start.min(buffer.len()));
    let end = floor_boundary(buffer, selection.end.min(buffer.len()));
    if start <= end {
        start..end
    } else {
        end..start
    }
}

fn floor_boundary(buffer: &str, mut index: usize) -> usize {
    while !buffer.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn wrap_inline(buffer: &mut String, selection: Range<usize>, marker: &str) -> Range<usize> {
    buffer.insert_str(selection.end, marker);
    buffer.insert_str(selection.start, marker);
    (selection.start + marker.len())..(selection.end + marker.len())
}

fn line_block(buffer: &str, selection: &Range<usize>) -> Range<usize> {
    let start = buffer[..selection.start].rfind('\n').map_or(0, |idx| idx + 1);
    let mut end_anchor = selection.end;
    // A selection ending right after a newline does not touch the next line.
    if end_anchor > selection.start && buffer[..end_anchor].ends_with('\n') {
        end_anchor -= 1;
    }
    let end = buffer[end_anchor..]
        .find('\n')
        .map_or(buffer.len(), |idx| end_anchor + idx);
    start..end.max(start)
}

fn transform_lines(
    buffer: &mut String,
    selection: Range<usize>,
    transform: impl Fn(usize, &str) -> String,
) -> Range<usize> {
    let block = line_block(buffer, &selection);
    let replaced = buffer[block.clone()]
        .split('\n')
        .enumerate()
        .map(|(idx, line)| transform(idx, line))
        .collect::<Vec<_>>()
        .join("\n");
    let new_end = block.start + replaced.len();
    buffer.replace_range(block.clone(), &replaced);
    block.start..new_end
}

fn toggle_prefix(buffer: &mut String, selection: Range<usize>, prefix: &str) -> Range<usize> {
    let block = line_block(buffer, &selection);
    let all_prefixed = buffer[block].split('\n').all(|line| line.starts_with(prefix));
    transform_lines(buffer, selection, |_, line| {
        if all_prefixed {
            line[prefix.len()..].to_string()
        } else {
            format!("{prefix}{line}")
        }
    })
}

fn toggle_ordered(buffer: &mut String, selection: Range<usize>) -> Range<usize> {
    let block = line_block(buffer, &selection);
    let all_numbered = buffer[block]
        .split('\n')
        .all(|line| ORDERED_ITEM_RE.is_match(line));
    transform_lines(buffer, selection, |idx, line| {
        if all_numbered {
            ORDERED_ITEM_RE.replace(line, "").into_owned()
        } else {
            format!("{}. {line}", idx + 1)
        }
    })
}

fn cycle_heading(_: usize, line: &str) -> String {
    match HEADING_RE.captures(line) {
        Some(caps) => {
            let level = caps[1].len();
            let rest = &line[level + 1..];
            if level >= 6 {
                rest.to_string()
            } else {
                format!("{} {rest}", "#".repeat(level + 1))
            }
        }
        None => format!("# {line}"),
    }
}

fn insert_link(buffer: &mut String, selection: Range<usize>) -> Range<usize> {
    let text = buffer[selection.clone()].to_string();
    let link = format!("[{text}]({LINK_URL_PLACEHOLDER})");
    buffer.replace_range(selection.clone(), &link);
    let url_start = selection.start + text.len() + 3;
    url_start..(url_start + LINK_URL_PLACEHOLDER.len())
}

fn insert_table(buffer: &mut String, selection: Range<usize>) -> Range<usize> {
    let at = line_block(buffer, &selection).end;
    let mut insertion = String::new();
    if at > 0 {
        insertion.push_str("\n\n");
    }
    let table_start = at + insertion.len();
    insertion.push_str(TABLE_SKELETON);
    buffer.insert_str(at, &insertion);
    table_start..(table_start + TABLE_SKELETON.len())
}

#[cfg(test)]
mod tests {
    use super::{apply_format, FormatAction};

    fn run(
        text: &str,
        selection: std::ops::Range<usize>,
        action: FormatAction,
    ) -> (String, String) {
        let mut buffer = text.to_string();
        let selected = apply_format(&mut buffer, selection, action);
        let selected_text = buffer[selected].to_string();
        (buffer, selected_text)
    }

    #[test]
    fn bold_wraps_selection_and_keeps_it_selected() {
        let (buffer, selected) = run("make this loud", 5..9, FormatAction::Bold);
        assert_eq!(buffer, "make **this** loud");
        assert_eq!(selected, "this");
    }

    #[test]
    fn italic_on_empty_selection_leaves_cursor_between_markers() {
        let mut buffer = "ab".to_string();
        let selection = apply_format(&mut buffer, 1..1, FormatAction::Italic);
        assert_eq!(buffer, "a**b");
        assert_eq!(selection, 2..2);
    }

    #[test]
    fn heading_cycles_levels_and_wraps_after_six() {
        let (buffer, _) = run("Title", 0..0, FormatAction::Heading);
        assert_eq!(buffer, "# Title");
        let (buffer, _) = run("## Title", 3..3, FormatAction::Heading);
        assert_eq!(buffer, "### Title");
        let (buffer, _) = run("###### Title", 0..0, FormatAction::Heading);
        assert_eq!(buffer, "Title");
    }

    #[test]
    fn unordered_list_toggles_on_every_selected_line() {
        let (buffer, _) = run("one\ntwo\nthree", 0..7, FormatAction::UnorderedList);
        assert_eq!(buffer, "- one\n- two\nthree");
        let (buffer, _) = run(&buffer, 0..11, FormatAction::UnorderedList);
        assert_eq!(buffer, "one\ntwo\nthree");
    }

    #[test]
    fn ordered_list_numbers_lines() {
        let (buffer, _) = run("a\nb", 0..3, FormatAction::OrderedList);
        assert_eq!(buffer, "1. a\n2. b");
        let (buffer, _) = run(&buffer, 0..9, FormatAction::OrderedList);
        assert_eq!(buffer, "a\nb");
    }

    #[test]
    fn quote_prefixes_current_line_only() {
        let (buffer, _) = run("first\nsecond", 8..8, FormatAction::Quote);
        assert_eq!(buffer, "first\n> second");
    }

    #[test]
    fn link_selects_url_placeholder() {
        let (buffer, selected) = run("see docs now", 4..8, FormatAction::Link);
        assert_eq!(buffer, "see [docs](https://) now");
        assert_eq!(selected, "https://");
    }

    #[test]
    fn table_is_inserted_after_current_line() {
        let (buffer, selected) = run("intro\nnext", 2..2, FormatAction::Table);
        assert!(buffer.starts_with("intro\n\n| Column 1"));
        assert!(buffer.ends_with("\nnext"));
        assert!(selected.starts_with("| Column 1"));
    }

    #[test]
    fn selection_is_clamped_to_char_boundaries() {
        let mut buffer = "héllo".to_string();
        let selection = apply_format(&mut buffer, 2..99, FormatAction::Bold);
        assert_eq!(buffer, "h**éllo**");
        assert_eq!(&buffer[selection], "éllo");
    }

    #[test]
    fn labels_round_trip() {
        for action in FormatAction::ALL {
            assert_eq!(FormatAction::from_label(action.label()), Some(*action));
        }
        assert_eq!(FormatAction::from_label("strike"), None);
    }
}

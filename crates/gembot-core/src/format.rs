//! Answer formatting: raw model text to display markup and back to spans
//!
//! The pipeline runs exactly once per answer, in this order:
//! newlines become `<br>`, `**text**` becomes `<b>text</b>`, and lines that
//! start with `"- "` get a `"• "` bullet instead.

use std::sync::OnceLock;

use regex::Regex;

pub const LINE_BREAK: &str = "<br>";
pub const BOLD_OPEN: &str = "<b>";
pub const BOLD_CLOSE: &str = "</b>";
pub const BULLET: &str = "• ";

fn bold_pattern() -> &'static Regex {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"))
}

/// Convert a raw answer into display markup.
///
/// Markup already present in the answer passes through untouched and will be
/// drawn as markup. Use [`format_answer_escaped`] when the answer source is
/// not trusted.
pub fn format_answer(raw: &str) -> String {
    let with_breaks = raw.replace('\n', LINE_BREAK);
    let with_bold = bold_pattern().replace_all(&with_breaks, "<b>${1}</b>");

    with_bold
        .split(LINE_BREAK)
        .map(|line| match line.strip_prefix("- ") {
            Some(item) => format!("{}{}", BULLET, item),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

/// Same as [`format_answer`], but `&`, `<` and `>` in the answer are escaped
/// first so only the pipeline's own markers are markup.
pub fn format_answer_escaped(raw: &str) -> String {
    format_answer(&escape(raw))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// A run of text with a single style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSpan {
    pub text: String,
    pub bold: bool,
}

/// Split display markup into lines of styled spans for rendering.
///
/// Bold carries across line breaks, since a `**...**` pair in the raw answer
/// may enclose a newline. Entities from the escaping pass are decoded.
pub fn parse_markup(markup: &str) -> Vec<Vec<MarkupSpan>> {
    let mut bold = false;

    markup
        .split(LINE_BREAK)
        .map(|line| {
            let mut spans = Vec::new();
            let mut rest = line;

            loop {
                let next_tag = [BOLD_OPEN, BOLD_CLOSE]
                    .into_iter()
                    .filter_map(|tag| rest.find(tag).map(|pos| (pos, tag)))
                    .min_by_key(|(pos, _)| *pos);

                let Some((pos, tag)) = next_tag else {
                    push_span(&mut spans, rest, bold);
                    break;
                };

                push_span(&mut spans, &rest[..pos], bold);
                bold = tag == BOLD_OPEN;
                rest = &rest[pos + tag.len()..];
            }

            spans
        })
        .collect()
}

fn push_span(spans: &mut Vec<MarkupSpan>, text: &str, bold: bool) {
    if !text.is_empty() {
        spans.push(MarkupSpan {
            text: unescape(text),
            bold,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> MarkupSpan {
        MarkupSpan { text: text.to_string(), bold: false }
    }

    fn bold(text: &str) -> MarkupSpan {
        MarkupSpan { text: text.to_string(), bold: true }
    }

    #[test]
    fn test_newline_becomes_line_break() {
        assert_eq!(format_answer("Hello\nWorld"), "Hello<br>World");
    }

    #[test]
    fn test_bold_pair_replaced() {
        let out = format_answer("**bold**");
        assert_eq!(out, "<b>bold</b>");
        assert!(!out.contains('*'));
    }

    #[test]
    fn test_bold_is_non_greedy() {
        assert_eq!(
            format_answer("**a** and **b**"),
            "<b>a</b> and <b>b</b>"
        );
    }

    #[test]
    fn test_unpaired_asterisks_left_alone() {
        assert_eq!(format_answer("**open only"), "**open only");
    }

    #[test]
    fn test_bullets_on_each_line() {
        assert_eq!(
            format_answer("- item one\n- item two"),
            "• item one<br>• item two"
        );
    }

    #[test]
    fn test_dash_mid_line_is_not_a_bullet() {
        assert_eq!(format_answer("well - maybe"), "well - maybe");
    }

    #[test]
    fn test_bullet_with_bold_heading() {
        assert_eq!(
            format_answer("Intro:\n- **Rust**: fast\nDone"),
            "Intro:<br>• <b>Rust</b>: fast<br>Done"
        );
    }

    #[test]
    fn test_bold_can_span_a_newline() {
        assert_eq!(format_answer("**a\nb**"), "<b>a<br>b</b>");
    }

    #[test]
    fn test_format_is_deterministic() {
        let raw = "**x**\n- y";
        assert_eq!(format_answer(raw), format_answer(raw));
    }

    #[test]
    fn test_format_is_one_pass_only() {
        // Only a single pass over raw text is defined. Re-formatting output
        // is not expected to be meaningful, so nothing is asserted about it.
        assert_eq!(format_answer("- **a**"), "• <b>a</b>");
    }

    #[test]
    fn test_escaped_variant_neutralizes_markup() {
        assert_eq!(
            format_answer_escaped("<b>x</b> & **y**"),
            "&lt;b&gt;x&lt;/b&gt; &amp; <b>y</b>"
        );
    }

    #[test]
    fn test_parse_markup_lines_and_bold() {
        let lines = parse_markup("Hi <b>there</b><br>• item");
        assert_eq!(
            lines,
            vec![
                vec![plain("Hi "), bold("there")],
                vec![plain("• item")],
            ]
        );
    }

    #[test]
    fn test_parse_markup_bold_spans_lines() {
        let lines = parse_markup("<b>a<br>b</b> c");
        assert_eq!(lines, vec![vec![bold("a")], vec![bold("b"), plain(" c")]]);
    }

    #[test]
    fn test_parse_markup_decodes_entities() {
        let lines = parse_markup(&format_answer_escaped("a < b && **c**"));
        assert_eq!(lines, vec![vec![plain("a < b && "), bold("c")]]);
    }

    #[test]
    fn test_parse_markup_empty_line() {
        assert_eq!(parse_markup("a<br><br>b").len(), 3);
        assert!(parse_markup("a<br><br>b")[1].is_empty());
    }
}

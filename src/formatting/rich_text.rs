// src/formatting/rich_text.rs
//! Rich text runs to inline markdown.

use crate::types::{Annotations, RichTextItem};

/// Renders a sequence of runs, in order, applying each run's annotations.
pub fn render_rich_text(items: &[RichTextItem]) -> String {
    items
        .iter()
        .filter(|item| !item.plain_text.is_empty())
        .map(|item| apply_styles(&item.plain_text, &item.annotations, item.href.as_deref()))
        .collect()
}

/// Wraps `content` in markdown markers.
///
/// Code is applied innermost, then bold, italic and strikethrough, and the
/// link wraps everything.
pub fn apply_styles(content: &str, annotations: &Annotations, link: Option<&str>) -> String {
    let mut result = content.to_string();

    if annotations.code {
        result = format!("`{}`", result);
    }

    if annotations.bold {
        result = format!("**{}**", result);
    }

    if annotations.italic {
        result = format!("*{}*", result);
    }

    if annotations.strikethrough {
        result = format!("~~{}~~", result);
    }

    if let Some(url) = link {
        result = format!("[{}]({})", result, url);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn styled(text: &str, annotations: Annotations) -> RichTextItem {
        RichTextItem::plain_text(text).with_annotations(annotations)
    }

    #[test]
    fn test_bold_run() {
        let bold = Annotations {
            bold: true,
            ..Default::default()
        };
        assert_eq!(render_rich_text(&[styled("hi", bold)]), "**hi**");
    }

    #[test]
    fn test_bold_italic_nest_in_fixed_order() {
        let both = Annotations {
            bold: true,
            italic: true,
            ..Default::default()
        };
        assert_eq!(render_rich_text(&[styled("hi", both)]), "***hi***");
    }

    #[test]
    fn test_code_is_innermost_and_link_outermost() {
        let all = Annotations {
            bold: true,
            italic: false,
            strikethrough: true,
            code: true,
        };
        let run = styled("x", all).with_link("https://example.com");
        assert_eq!(
            render_rich_text(&[run]),
            "[~~**`x`**~~](https://example.com)"
        );
    }

    #[test]
    fn test_runs_render_in_order_and_empty_runs_vanish() {
        let runs = vec![
            RichTextItem::plain_text("a "),
            RichTextItem::plain_text(""),
            RichTextItem::plain_text("b"),
        ];
        assert_eq!(render_rich_text(&runs), "a b");
    }
}

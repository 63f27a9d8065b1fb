// src/formatting/block_renderer.rs
//! Block rendering engine: converts a loaded block tree to markdown.
//!
//! Rendering is a pure function of the tree. Children have already been
//! fetched by the exporter and attachment link targets resolved, so nothing
//! here touches the network or the filesystem.

use super::rich_text::render_rich_text;
use super::state::FormatContext;
use crate::constants::{CHARS_PER_BLOCK_ESTIMATE, DEFAULT_CALLOUT_ICON};
use crate::model::{
    Block, CalloutBlock, CodeBlock, LinkBlock, MediaBlock, TableBlock, TableRowBlock,
    TextBlockContent,
};
use crate::types::{plain_text_of, BlockId};
use std::collections::HashMap;

const BLOCK_SEPARATOR: &str = "\n\n";

/// Link target for each materialized media block: a path relative to the
/// page file, or the raw source URL when download failed.
pub type AttachmentLinks = HashMap<BlockId, String>;

/// Context passed through the rendering pipeline.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub attachments: &'a AttachmentLinks,
}

impl<'a> RenderContext<'a> {
    pub fn new(attachments: &'a AttachmentLinks) -> Self {
        Self { attachments }
    }
}

// --- Public API ---

/// Renders a slice of sibling blocks into markdown.
pub fn render_blocks(blocks: &[Block], ctx: &RenderContext) -> String {
    log::trace!("Rendering {} top-level blocks", blocks.len());
    render_sequence(blocks, ctx, FormatContext::new())
}

// --- Sequence and nesting ---

fn render_sequence(blocks: &[Block], ctx: &RenderContext, state: FormatContext) -> String {
    let mut rendered: Vec<String> = Vec::with_capacity(blocks.len());
    let mut state = state.exit_list();

    for block in blocks {
        state = if matches!(block, Block::NumberedListItem(_)) {
            state.increment_list_number()
        } else {
            state.exit_list()
        };

        let text = if is_list_item(block) {
            render_block(block, ctx, state)
        } else {
            // Non-list blocks render flush left and are shifted under the
            // enclosing list item as a whole.
            indent_lines(
                &render_block(block, ctx, FormatContext::new()),
                &state.indent(),
            )
        };

        if !text.is_empty() {
            rendered.push(text);
        }
    }

    let mut output = String::with_capacity(rendered.len() * CHARS_PER_BLOCK_ESTIMATE);
    for (i, text) in rendered.iter().enumerate() {
        if i > 0 {
            output.push_str(BLOCK_SEPARATOR);
        }
        output.push_str(text);
    }
    output
}

fn is_list_item(block: &Block) -> bool {
    matches!(
        block,
        Block::BulletedListItem(_) | Block::NumberedListItem(_) | Block::ToDo(_)
    )
}

fn render_block(block: &Block, ctx: &RenderContext, state: FormatContext) -> String {
    match block {
        Block::Paragraph(b) => with_children(render_text(&b.content), block, ctx),
        Block::Heading1(b) => with_children(format!("# {}", render_text(&b.content)), block, ctx),
        Block::Heading2(b) => with_children(format!("## {}", render_text(&b.content)), block, ctx),
        Block::Heading3(b) => {
            with_children(format!("### {}", render_text(&b.content)), block, ctx)
        }

        Block::BulletedListItem(b) => render_list_item("- ", &b.content, block, ctx, state),
        Block::NumberedListItem(b) => {
            let marker = format!("{}. ", state.current_list_number());
            render_list_item(&marker, &b.content, block, ctx, state)
        }
        Block::ToDo(b) => {
            let marker = if b.checked { "- [x] " } else { "- [ ] " };
            render_list_item(marker, &b.content, block, ctx, state)
        }

        Block::Toggle(b) => render_toggle(&b.content, block, ctx),
        Block::Quote(b) => quote_lines(&with_children(render_text(&b.content), block, ctx)),
        Block::Callout(b) => render_callout(b, block, ctx),
        Block::Code(b) => render_code(b),
        Block::Equation(b) => format!("$${}$$", b.expression),
        Block::Divider(_) => "---".to_string(),

        Block::Image(b) => {
            let caption = plain_text_of(&b.caption);
            format!("![{}](<{}>)", caption, attachment_target(b, ctx))
        }
        Block::File(b) | Block::Pdf(b) => {
            let target = attachment_target(b, ctx);
            format!("[{}](<{}>)", attachment_label(b, &target), target)
        }
        Block::Video(b) => {
            let caption = plain_text_of(&b.caption);
            let url = b.source.url();
            let label = if caption.is_empty() { url } else { caption.as_str() };
            format!("[{}]({})", label, url)
        }
        Block::Bookmark(b) | Block::Embed(b) | Block::LinkPreview(b) => render_link(b),

        Block::ChildPage(b) => format!("[[{}]]", b.title),
        Block::ChildDatabase(b) => format!("[[{}]]", b.title),

        Block::Table(b) => render_table(b),
        Block::TableRow(b) => render_table_row(b, b.cells.len()),

        Block::ColumnList(_) | Block::Column(_) | Block::Synced(_) => {
            render_sequence(block.children(), ctx, FormatContext::new())
        }

        Block::Unsupported(b) => {
            log::debug!("Skipping unsupported block {} ({})", b.common.id, b.block_type);
            String::new()
        }
    }
}

fn render_text(content: &TextBlockContent) -> String {
    render_rich_text(&content.rich_text)
}

/// Appends a block's own children below its rendered text.
fn with_children(text: String, block: &Block, ctx: &RenderContext) -> String {
    let children = render_sequence(block.children(), ctx, FormatContext::new());
    join_nonempty(text, children)
}

fn join_nonempty(head: String, tail: String) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (_, true) => head,
        (true, false) => tail,
        (false, false) => format!("{}{}{}", head, BLOCK_SEPARATOR, tail),
    }
}

fn render_list_item(
    marker: &str,
    content: &TextBlockContent,
    block: &Block,
    ctx: &RenderContext,
    state: FormatContext,
) -> String {
    let item = format!("{}{}{}", state.indent(), marker, render_text(content));
    let children = render_sequence(block.children(), ctx, state.enter_children());
    join_nonempty(item, children)
}

fn render_toggle(content: &TextBlockContent, block: &Block, ctx: &RenderContext) -> String {
    let summary = format!("<details><summary>{}</summary>", render_text(content));
    let children = render_sequence(block.children(), ctx, FormatContext::new());
    let body = join_nonempty(summary, children);
    format!("{}{}</details>", body, BLOCK_SEPARATOR)
}

fn render_callout(callout: &CalloutBlock, block: &Block, ctx: &RenderContext) -> String {
    let icon = callout.icon.as_deref().unwrap_or(DEFAULT_CALLOUT_ICON);
    let text = format!("{} {}", icon, render_text(&callout.content));
    quote_lines(&with_children(text, block, ctx))
}

fn render_code(code: &CodeBlock) -> String {
    // Annotations are meaningless inside a fence
    let body = plain_text_of(&code.content.rich_text);
    let language = match code.language.as_str() {
        "plain text" => "",
        other => other,
    };
    format!("```{}\n{}\n```", language, body)
}

fn render_link(link: &LinkBlock) -> String {
    let caption = plain_text_of(&link.caption);
    let label = if caption.is_empty() {
        link.url.as_str()
    } else {
        caption.as_str()
    };
    format!("[{}]({})", label, link.url)
}

fn attachment_target(media: &MediaBlock, ctx: &RenderContext) -> String {
    ctx.attachments
        .get(&media.common.id)
        .cloned()
        .unwrap_or_else(|| media.source.url().to_string())
}

/// Caption, then the original file name, then the last path segment.
fn attachment_label(media: &MediaBlock, target: &str) -> String {
    let caption = plain_text_of(&media.caption);
    if !caption.trim().is_empty() {
        return caption;
    }
    if let Some(name) = &media.name {
        return name.clone();
    }
    target
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("file")
        .to_string()
}

fn render_table(table: &TableBlock) -> String {
    let rows: Vec<&TableRowBlock> = table
        .common
        .children
        .iter()
        .filter_map(|child| match child {
            Block::TableRow(row) => Some(row),
            _ => None,
        })
        .collect();

    let width = rows
        .iter()
        .map(|row| row.cells.len())
        .max()
        .unwrap_or(0)
        .max(table.table_width);
    if rows.is_empty() || width == 0 {
        return String::new();
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.iter().enumerate() {
        lines.push(render_table_row(row, width));
        if i == 0 {
            lines.push(format!("|{}", " --- |".repeat(width)));
        }
    }
    lines.join("\n")
}

fn render_table_row(row: &TableRowBlock, width: usize) -> String {
    let cells: Vec<String> = (0..width)
        .map(|i| {
            row.cells
                .get(i)
                .map(|cell| render_rich_text(cell).replace('|', "\\|").replace('\n', " "))
                .unwrap_or_default()
        })
        .collect();
    format!("| {} |", cells.join(" | "))
}

fn quote_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indents every non-empty line, and every line inside a code fence.
fn indent_lines(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    let mut in_fence = false;
    text.lines()
        .map(|line| {
            let is_fence = line.trim_start().starts_with("```");
            let indented = if line.is_empty() && !in_fence {
                String::new()
            } else {
                format!("{}{}", indent, line)
            };
            if is_fence {
                in_fence = !in_fence;
            }
            indented
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::types::{Annotations, RichTextItem};
    use pretty_assertions::assert_eq;

    fn id(n: u32) -> BlockId {
        BlockId::parse(&format!("{:032x}", n)).unwrap()
    }

    fn text(s: &str) -> TextBlockContent {
        TextBlockContent::new(vec![RichTextItem::plain_text(s)])
    }

    fn paragraph(n: u32, s: &str) -> Block {
        Block::Paragraph(TextBlock {
            common: BlockCommon::new(id(n)),
            content: text(s),
        })
    }

    fn bullet(n: u32, s: &str, children: Vec<Block>) -> Block {
        Block::BulletedListItem(TextBlock {
            common: BlockCommon::new(id(n)).with_children(children),
            content: text(s),
        })
    }

    fn numbered(n: u32, s: &str) -> Block {
        Block::NumberedListItem(TextBlock {
            common: BlockCommon::new(id(n)),
            content: text(s),
        })
    }

    fn todo(n: u32, s: &str, checked: bool) -> Block {
        Block::ToDo(ToDoBlock {
            common: BlockCommon::new(id(n)),
            content: text(s),
            checked,
        })
    }

    fn render(blocks: &[Block]) -> String {
        let links = AttachmentLinks::new();
        render_blocks(blocks, &RenderContext::new(&links))
    }

    #[test]
    fn test_headings_and_paragraphs_are_separated_by_blank_lines() {
        let blocks = vec![
            Block::Heading1(TextBlock {
                common: BlockCommon::new(id(1)),
                content: text("Title"),
            }),
            Block::Heading3(TextBlock {
                common: BlockCommon::new(id(2)),
                content: text("Small"),
            }),
            paragraph(3, "Body"),
        ];
        assert_eq!(render(&blocks), "# Title\n\n### Small\n\nBody");
    }

    #[test]
    fn test_todo_checkboxes() {
        assert_eq!(render(&[todo(1, "open", false)]), "- [ ] open");
        assert_eq!(render(&[todo(2, "done", true)]), "- [x] done");
    }

    #[test]
    fn test_numbering_is_per_run_of_siblings() {
        let blocks = vec![
            numbered(1, "a"),
            numbered(2, "b"),
            paragraph(3, "break"),
            numbered(4, "c"),
        ];
        assert_eq!(render(&blocks), "1. a\n\n2. b\n\nbreak\n\n1. c");
    }

    #[test]
    fn test_nested_list_items_indent_two_spaces_per_level() {
        let blocks = vec![bullet(
            1,
            "outer",
            vec![bullet(2, "inner", vec![bullet(3, "deepest", vec![])])],
        )];
        assert_eq!(render(&blocks), "- outer\n\n  - inner\n\n    - deepest");
    }

    #[test]
    fn test_paragraph_under_list_item_is_indented() {
        let blocks = vec![bullet(1, "item", vec![paragraph(2, "detail")])];
        assert_eq!(render(&blocks), "- item\n\n  detail");
    }

    #[test]
    fn test_toggle_wraps_children_in_details() {
        let toggle = Block::Toggle(TextBlock {
            common: BlockCommon::new(id(1)).with_children(vec![paragraph(2, "hidden")]),
            content: text("More"),
        });
        assert_eq!(
            render(&[toggle]),
            "<details><summary>More</summary>\n\nhidden\n\n</details>"
        );
    }

    #[test]
    fn test_quote_and_callout_with_default_icon() {
        let quote = Block::Quote(TextBlock {
            common: BlockCommon::new(id(1)),
            content: text("wise words"),
        });
        let callout = Block::Callout(CalloutBlock {
            common: BlockCommon::new(id(2)),
            icon: None,
            content: text("note"),
        });
        let custom = Block::Callout(CalloutBlock {
            common: BlockCommon::new(id(3)),
            icon: Some("⚠️".to_string()),
            content: text("careful"),
        });
        assert_eq!(
            render(&[quote, callout, custom]),
            "> wise words\n\n> 💡 note\n\n> ⚠️ careful"
        );
    }

    #[test]
    fn test_code_ignores_annotations() {
        let bold = Annotations {
            bold: true,
            ..Default::default()
        };
        let code = Block::Code(CodeBlock {
            common: BlockCommon::new(id(1)),
            language: "rust".to_string(),
            content: TextBlockContent::new(vec![
                RichTextItem::plain_text("fn main() ").with_annotations(bold),
                RichTextItem::plain_text("{}"),
            ]),
        });
        assert_eq!(render(&[code]), "```rust\nfn main() {}\n```");
    }

    #[test]
    fn test_code_under_list_item_keeps_blank_lines_inside_the_item() {
        let code = Block::Code(CodeBlock {
            common: BlockCommon::new(id(2)),
            language: "plain text".to_string(),
            content: text("first\n\nsecond"),
        });
        let blocks = vec![bullet(1, "item", vec![code, paragraph(3, "after")])];
        assert_eq!(
            render(&blocks),
            "- item\n\n  ```\n  first\n  \n  second\n  ```\n\n  after"
        );
    }

    #[test]
    fn test_table_synthesizes_header_separator() {
        let row = |n: u32, cells: [&str; 2]| {
            Block::TableRow(TableRowBlock {
                common: BlockCommon::new(id(n)),
                cells: cells
                    .iter()
                    .map(|c| vec![RichTextItem::plain_text(c)])
                    .collect(),
            })
        };
        let table = Block::Table(TableBlock {
            common: BlockCommon::new(id(1))
                .with_children(vec![row(2, ["Name", "Qty"]), row(3, ["Apple", "3"])]),
            table_width: 2,
            has_column_header: false,
        });
        assert_eq!(
            render(&[table]),
            "| Name | Qty |\n| --- | --- |\n| Apple | 3 |"
        );
    }

    #[test]
    fn test_child_page_is_a_reference_not_inlined() {
        let child = Block::ChildPage(ChildPageBlock {
            common: BlockCommon::new(id(1)).with_children(vec![paragraph(2, "secret")]),
            title: "Sub Page".to_string(),
        });
        assert_eq!(render(&[child]), "[[Sub Page]]");
    }

    #[test]
    fn test_media_uses_materialized_path_or_falls_back_to_url() {
        let image = Block::Image(MediaBlock {
            common: BlockCommon::new(id(1)),
            source: FileObject::Hosted {
                url: "https://s3.example.com/a/diagram.png?sig=1".to_string(),
            },
            caption: vec![RichTextItem::plain_text("Diagram")],
            name: None,
        });
        let pdf = Block::Pdf(MediaBlock {
            common: BlockCommon::new(id(2)),
            source: FileObject::External {
                url: "https://example.com/report.pdf".to_string(),
            },
            caption: vec![],
            name: None,
        });

        let mut links = AttachmentLinks::new();
        links.insert(id(1), "../attachments/Diagram.png".to_string());

        let output = render_blocks(&[image, pdf], &RenderContext::new(&links));
        assert_eq!(
            output,
            "![Diagram](<../attachments/Diagram.png>)\n\n[report.pdf](<https://example.com/report.pdf>)"
        );
    }

    #[test]
    fn test_links_equation_divider_and_unsupported() {
        let bookmark = Block::Bookmark(LinkBlock {
            common: BlockCommon::new(id(1)),
            url: "https://rust-lang.org".to_string(),
            caption: vec![RichTextItem::plain_text("Rust")],
        });
        let embed = Block::Embed(LinkBlock {
            common: BlockCommon::new(id(2)),
            url: "https://example.com/embed".to_string(),
            caption: vec![],
        });
        let equation = Block::Equation(EquationBlock {
            common: BlockCommon::new(id(3)),
            expression: "e=mc^2".to_string(),
        });
        let divider = Block::Divider(ContainerBlock {
            common: BlockCommon::new(id(4)),
        });
        let unsupported = Block::Unsupported(UnsupportedBlock {
            common: BlockCommon::new(id(5)),
            block_type: "breadcrumb".to_string(),
        });

        assert_eq!(
            render(&[bookmark, unsupported, embed, equation, divider]),
            "[Rust](https://rust-lang.org)\n\n[https://example.com/embed](https://example.com/embed)\n\n$$e=mc^2$$\n\n---"
        );
    }

    #[test]
    fn test_columns_render_their_children() {
        let column = |n: u32, s: &str| {
            Block::Column(ContainerBlock {
                common: BlockCommon::new(id(n)).with_children(vec![paragraph(n + 10, s)]),
            })
        };
        let list = Block::ColumnList(ContainerBlock {
            common: BlockCommon::new(id(1)).with_children(vec![column(2, "left"), column(3, "right")]),
        });
        assert_eq!(render(&[list]), "left\n\nright");
    }
}

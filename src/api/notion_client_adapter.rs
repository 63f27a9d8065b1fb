// src/api/notion_client_adapter.rs
//! Adapter layer for converting notion-client types to our domain model.
//!
//! Every converter takes the raw JSON object. notion-client parses the typed
//! payload, and `ObjectMeta` picks up the timestamps, authors and parent
//! from the same value.

use super::responses::{NotionBlock, NotionDatabase, NotionPage, ObjectMeta, WireParent};
use crate::error::{AppError, NotionClientError};
use crate::model::blocks::*;
use crate::model::common::BlockCommon;
use crate::model::{
    Block, Database, DatabaseTitle, NotionObject, Page, PageTitle, Parent, PropertyValue,
};
use crate::types::{
    plain_text_of, Annotations, BlockId, DatabaseId, DateValue, PageId, PropertyName,
    RichTextItem, SelectOption, User,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

const BODY_PREVIEW_CHARS: usize = 500;

fn deserialize_raw<T: DeserializeOwned>(raw: &Value) -> Result<T, AppError> {
    T::deserialize(raw).map_err(|e| {
        let body: String = raw.to_string().chars().take(BODY_PREVIEW_CHARS).collect();
        NotionClientError::Deserialization { source: e, body }.into()
    })
}

/// Convert a raw page object to our domain Page
///
/// Properties are converted one by one, so a kind notion-client does not
/// know becomes `PropertyValue::Unsupported` instead of failing the page.
pub fn convert_page(raw: &Value) -> Result<Page, AppError> {
    let notion_page: NotionPage = deserialize_raw(&without_properties(raw))?;
    let meta: ObjectMeta = deserialize_raw(raw)?;
    let id = PageId::parse(&notion_page.id)?;

    let created_time = meta.created_time.ok_or_else(|| NotionClientError::ConversionError {
        message: format!("Page {} has no created_time", id),
    })?;
    let last_edited_time = meta.last_edited_time.unwrap_or(created_time);
    let properties = convert_raw_properties(raw);

    Ok(Page {
        title: extract_page_title(&properties),
        url: notion_page.url,
        created_time,
        last_edited_time,
        created_by: meta.created_by.map(|user| user.id),
        last_edited_by: meta.last_edited_by.map(|user| user.id),
        parent: meta.parent.and_then(convert_parent),
        properties,
        blocks: Vec::new(),
        id,
    })
}

/// Convert a raw database object to our domain Database
pub fn convert_database(raw: &Value) -> Result<Database, AppError> {
    let notion_db: NotionDatabase = deserialize_raw(&without_properties(raw))?;
    let meta: ObjectMeta = deserialize_raw(raw)?;

    let id =
        DatabaseId::parse(
            &notion_db
                .id
                .ok_or_else(|| NotionClientError::ConversionError {
                    message: "Database missing required ID field".to_string(),
                })?,
        )?;

    // Only the names matter here; the schema itself is never read
    let property_names: BTreeSet<PropertyName> = raw
        .get("properties")
        .and_then(Value::as_object)
        .map(|schema| schema.keys().map(PropertyName::new).collect())
        .unwrap_or_default();

    Ok(Database {
        id,
        title: DatabaseTitle::new(convert_rich_text_array(notion_db.title)),
        url: notion_db.url,
        parent: meta.parent.and_then(convert_parent),
        property_names,
    })
}

/// Convert a search result, dispatching on its `object` field.
///
/// Returns `Ok(None)` for object kinds the exporter does not handle.
pub fn convert_search_result(raw: &Value) -> Result<Option<NotionObject>, AppError> {
    match raw.get("object").and_then(Value::as_str) {
        Some("page") => Ok(Some(NotionObject::Page(convert_page(raw)?))),
        Some("database") => Ok(Some(NotionObject::Database(convert_database(raw)?))),
        Some(other) => {
            log::debug!("Ignoring search result of kind '{}'", other);
            Ok(None)
        }
        None => Err(AppError::MalformedResponse(
            "Missing 'object' field in search result".to_string(),
        )),
    }
}

/// Convert a raw block object to our domain Block
///
/// A block whose kind notion-client cannot parse becomes
/// `Block::Unsupported` with its common metadata intact.
pub fn convert_block(raw: &Value) -> Result<Block, AppError> {
    use notion_client::objects::block::BlockType;

    let meta: ObjectMeta = deserialize_raw(raw)?;
    let common = convert_block_common(raw, meta)?;
    let block_type = || {
        raw.get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string()
    };

    let notion_block = match NotionBlock::deserialize(raw) {
        Ok(block) => block,
        Err(e) => {
            log::debug!(
                "Block {} of kind '{}' is not recognized: {}",
                common.id,
                block_type(),
                e
            );
            return Ok(Block::Unsupported(UnsupportedBlock {
                common,
                block_type: block_type(),
            }));
        }
    };

    let text = |rich_text| TextBlockContent::new(convert_rich_text_array(rich_text));

    let block = match notion_block.block_type {
        BlockType::Paragraph { paragraph } => Block::Paragraph(TextBlock {
            common,
            content: text(paragraph.rich_text),
        }),

        BlockType::Heading1 { heading_1 } => Block::Heading1(TextBlock {
            common,
            content: text(heading_1.rich_text),
        }),

        BlockType::Heading2 { heading_2 } => Block::Heading2(TextBlock {
            common,
            content: text(heading_2.rich_text),
        }),

        BlockType::Heading3 { heading_3 } => Block::Heading3(TextBlock {
            common,
            content: text(heading_3.rich_text),
        }),

        BlockType::BulletedListItem { bulleted_list_item } => Block::BulletedListItem(TextBlock {
            common,
            content: text(bulleted_list_item.rich_text),
        }),

        BlockType::NumberedListItem { numbered_list_item } => Block::NumberedListItem(TextBlock {
            common,
            content: text(numbered_list_item.rich_text),
        }),

        BlockType::ToDo { to_do } => Block::ToDo(ToDoBlock {
            common,
            content: text(to_do.rich_text),
            checked: to_do.checked.unwrap_or(false),
        }),

        BlockType::Toggle { toggle } => Block::Toggle(TextBlock {
            common,
            content: text(toggle.rich_text),
        }),

        BlockType::Quote { quote } => Block::Quote(TextBlock {
            common,
            content: text(quote.rich_text),
        }),

        BlockType::Callout { callout } => Block::Callout(CalloutBlock {
            common,
            icon: callout.icon.and_then(convert_icon),
            content: text(callout.rich_text),
        }),

        BlockType::Code { code } => Block::Code(CodeBlock {
            common,
            language: code_language_name(&code.language),
            content: text(code.rich_text),
        }),

        BlockType::Equation { equation } => Block::Equation(EquationBlock {
            common,
            expression: equation.expression,
        }),

        BlockType::Divider { .. } => Block::Divider(ContainerBlock { common }),

        BlockType::Image { image } => Block::Image(MediaBlock {
            common,
            source: convert_file_object(image.file_type),
            caption: raw_caption(raw, "image"),
            name: None,
        }),

        BlockType::Video { video } => Block::Video(MediaBlock {
            common,
            source: convert_file_object(video.file_type),
            caption: raw_caption(raw, "video"),
            name: None,
        }),

        BlockType::File { file } => Block::File(MediaBlock {
            common,
            source: convert_file_object(file.file_type),
            caption: convert_rich_text_array(file.caption),
            name: raw_file_name(raw, "file"),
        }),

        BlockType::Pdf { pdf } => Block::Pdf(MediaBlock {
            common,
            source: convert_file_object(pdf.file_type),
            caption: convert_rich_text_array(pdf.caption),
            name: None,
        }),

        BlockType::Bookmark { bookmark } => Block::Bookmark(LinkBlock {
            common,
            url: bookmark.url,
            caption: convert_rich_text_array(bookmark.caption),
        }),

        BlockType::Embed { embed } => Block::Embed(LinkBlock {
            common,
            url: embed.url,
            caption: raw_caption(raw, "embed"),
        }),

        BlockType::LinkPreview { link_preview } => Block::LinkPreview(LinkBlock {
            common,
            url: link_preview.url,
            caption: Vec::new(),
        }),

        BlockType::ChildPage { child_page } => Block::ChildPage(ChildPageBlock {
            common,
            title: child_page.title,
        }),

        BlockType::ChildDatabase { child_database } => Block::ChildDatabase(ChildDatabaseBlock {
            common,
            title: child_database.title,
        }),

        BlockType::Table { table } => Block::Table(TableBlock {
            common,
            table_width: table.table_width as usize,
            has_column_header: table.has_column_header,
        }),

        BlockType::TableRow { table_row } => Block::TableRow(TableRowBlock {
            common,
            cells: table_row
                .cells
                .into_iter()
                .map(convert_rich_text_array)
                .collect(),
        }),

        BlockType::ColumnList { .. } => Block::ColumnList(ContainerBlock { common }),

        BlockType::Column { .. } => Block::Column(ContainerBlock { common }),

        BlockType::SyncedBlock { .. } => Block::Synced(ContainerBlock { common }),

        _ => Block::Unsupported(UnsupportedBlock {
            common,
            block_type: block_type(),
        }),
    };

    Ok(block)
}

/// Convert the wire parent reference. Unknown kinds and unparseable ids
/// yield `None`.
pub fn convert_parent(parent: WireParent) -> Option<Parent> {
    let converted = match parent {
        WireParent::PageId { page_id } => PageId::parse(&page_id).map(|page_id| Parent::Page { page_id }),
        WireParent::DatabaseId { database_id } => {
            DatabaseId::parse(&database_id).map(|database_id| Parent::Database { database_id })
        }
        WireParent::BlockId { block_id } => {
            BlockId::parse(&block_id).map(|block_id| Parent::Block { block_id })
        }
        WireParent::Workspace => return Some(Parent::Workspace),
        WireParent::Other => return None,
    };

    match converted {
        Ok(parent) => Some(parent),
        Err(e) => {
            log::warn!("Ignoring malformed parent reference: {}", e);
            None
        }
    }
}

fn convert_block_common(raw: &Value, meta: ObjectMeta) -> Result<BlockCommon, AppError> {
    let id = raw
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| NotionClientError::ConversionError {
            message: "Block missing required ID field".to_string(),
        })?;

    Ok(BlockCommon {
        id: BlockId::parse(id)?,
        children: Vec::new(),
        has_children: raw
            .get("has_children")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        last_edited_time: meta.last_edited_time,
        parent: meta.parent.and_then(convert_parent),
    })
}

fn convert_rich_text_array(
    rich_texts: Vec<notion_client::objects::rich_text::RichText>,
) -> Vec<RichTextItem> {
    rich_texts.into_iter().map(convert_rich_text).collect()
}

fn convert_rich_text(rich_text: notion_client::objects::rich_text::RichText) -> RichTextItem {
    use notion_client::objects::rich_text::RichText as NcRichText;

    match rich_text {
        NcRichText::Text {
            text,
            annotations,
            plain_text,
            href,
        } => {
            let link = text.link.map(|link| link.url);
            RichTextItem {
                plain_text: plain_text.unwrap_or(text.content),
                annotations: convert_annotations(annotations.unwrap_or_default()),
                href: href.or(link),
            }
        }

        // Mentions and inline equations keep their rendered text
        NcRichText::Mention {
            annotations,
            plain_text,
            href,
            ..
        }
        | NcRichText::Equation {
            annotations,
            plain_text,
            href,
            ..
        } => RichTextItem {
            plain_text,
            annotations: convert_annotations(annotations),
            href,
        },

        _ => {
            log::debug!("Unsupported rich text type, dropping run");
            RichTextItem::plain_text("")
        }
    }
}

fn convert_annotations(annotations: notion_client::objects::rich_text::Annotations) -> Annotations {
    Annotations {
        bold: annotations.bold,
        italic: annotations.italic,
        strikethrough: annotations.strikethrough,
        code: annotations.code,
    }
}

fn convert_file_object(file: notion_client::objects::file::File) -> FileObject {
    use notion_client::objects::file::File as NcFile;

    match file {
        NcFile::External { external } => FileObject::External { url: external.url },
        NcFile::File { file } => FileObject::Hosted { url: file.url },
    }
}

/// Only emoji icons can be printed inline.
fn convert_icon(icon: notion_client::objects::block::Icon) -> Option<String> {
    use notion_client::objects::block::Icon as NcIcon;
    use notion_client::objects::emoji::Emoji;

    match icon {
        NcIcon::Emoji(Emoji::Emoji { emoji }) => Some(emoji),
        _ => None,
    }
}

/// The API's own spelling of a code language, e.g. `rust` or `plain text`.
fn code_language_name<L: serde::Serialize + std::fmt::Debug>(language: &L) -> String {
    match serde_json::to_value(language) {
        Ok(Value::String(name)) => name,
        _ => format!("{:?}", language).to_lowercase(),
    }
}

/// Reads `raw[kind].caption` directly; not every notion-client payload
/// type exposes it.
fn raw_caption(raw: &Value, kind: &str) -> Vec<RichTextItem> {
    raw.get(kind)
        .and_then(|payload| payload.get("caption"))
        .and_then(|caption| {
            Vec::<notion_client::objects::rich_text::RichText>::deserialize(caption).ok()
        })
        .map(convert_rich_text_array)
        .unwrap_or_default()
}

fn raw_file_name(raw: &Value, kind: &str) -> Option<String> {
    raw.get(kind)
        .and_then(|payload| payload.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
}

/// A copy of `raw` with an empty property map, for the typed envelope.
fn without_properties(raw: &Value) -> Value {
    let mut shell = raw.clone();
    if let Some(object) = shell.as_object_mut() {
        object.insert("properties".to_string(), Value::Object(Default::default()));
    }
    shell
}

fn extract_page_title(properties: &HashMap<PropertyName, PropertyValue>) -> PageTitle {
    properties
        .values()
        .find_map(|property| match property {
            PropertyValue::Title { title } => Some(plain_text_of(title)),
            _ => None,
        })
        .filter(|title| !title.trim().is_empty())
        .map(PageTitle::new)
        .unwrap_or_else(|| PageTitle::new("Untitled"))
}

fn convert_raw_properties(raw: &Value) -> HashMap<PropertyName, PropertyValue> {
    let Some(properties) = raw.get("properties").and_then(Value::as_object) else {
        return HashMap::new();
    };

    properties
        .iter()
        .map(|(name, value)| (PropertyName::new(name), convert_raw_property(name, value)))
        .collect()
}

fn convert_raw_property(name: &str, raw: &Value) -> PropertyValue {
    use notion_client::objects::page::PageProperty;

    match PageProperty::deserialize(raw) {
        Ok(property) => convert_page_property(property),
        Err(e) => {
            let type_name = raw.get("type").and_then(Value::as_str).unwrap_or("unknown");
            log::debug!("Property '{}' of kind '{}' skipped: {}", name, type_name, e);
            unsupported(type_name)
        }
    }
}

fn convert_date(date: notion_client::objects::page::DatePropertyValue) -> Option<DateValue> {
    use notion_client::objects::property::DateOrDateTime;

    let render = |value: DateOrDateTime| match value {
        DateOrDateTime::Date(date) => date.format("%Y-%m-%d").to_string(),
        DateOrDateTime::DateTime(time) => time.to_rfc3339(),
    };

    let start = date.start.map(render)?;
    Some(DateValue {
        start,
        end: date.end.map(render),
    })
}

fn convert_select_option(
    option: notion_client::objects::page::SelectPropertyValue,
) -> Option<SelectOption> {
    option
        .name
        .filter(|name| !name.is_empty())
        .map(|name| SelectOption { name })
}

fn convert_page_property(property: notion_client::objects::page::PageProperty) -> PropertyValue {
    use notion_client::objects::page::PageProperty;

    match property {
        PageProperty::Title { title, .. } => PropertyValue::Title {
            title: convert_rich_text_array(title),
        },
        PageProperty::RichText { rich_text, .. } => PropertyValue::RichText {
            rich_text: convert_rich_text_array(rich_text),
        },
        PageProperty::Number { number, .. } => PropertyValue::Number {
            number: number.and_then(|n| n.as_f64()),
        },
        PageProperty::Checkbox { checkbox, .. } => PropertyValue::Checkbox { checkbox },
        PageProperty::Url { url, .. } => PropertyValue::Url { url },
        PageProperty::Email { email, .. } => PropertyValue::Email { email },
        PageProperty::PhoneNumber { phone_number, .. } => {
            PropertyValue::PhoneNumber { phone_number }
        }
        PageProperty::Select { select, .. } => PropertyValue::Select {
            select: select.and_then(convert_select_option),
        },
        PageProperty::MultiSelect { multi_select, .. } => PropertyValue::MultiSelect {
            multi_select: multi_select
                .into_iter()
                .filter_map(convert_select_option)
                .collect(),
        },
        PageProperty::Status { status, .. } => PropertyValue::Status {
            status: status.and_then(convert_select_option),
        },
        PageProperty::Date { date, .. } => PropertyValue::Date {
            date: date.and_then(convert_date),
        },
        PageProperty::People { people, .. } => PropertyValue::People {
            people: people
                .into_iter()
                .map(|user| User {
                    id: user.id,
                    name: user.name,
                })
                .collect(),
        },
        PageProperty::Formula { .. } => unsupported("formula"),
        PageProperty::Rollup { .. } => unsupported("rollup"),
        PageProperty::Relation { .. } => unsupported("relation"),
        PageProperty::Files { .. } => unsupported("files"),
        _ => unsupported("other"),
    }
}

fn unsupported(type_name: &str) -> PropertyValue {
    PropertyValue::Unsupported {
        type_name: type_name.to_string(),
    }
}

// src/formatting/frontmatter.rs
//! YAML frontmatter and whole-document assembly for exported pages.

use super::properties::{extract_property, quote, FrontmatterValue};
use crate::model::{Database, Page};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PLAIN_KEY: Regex = Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_ -]*$")
        .expect("Failed to compile frontmatter key regex - this is a bug in the code");
}

/// Resolved display names of the page's creator and last editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Authors {
    pub created_by: Option<String>,
    pub last_edited_by: Option<String>,
}

/// Ordered frontmatter fields for a page.
///
/// Fixed fields come first, then properties sorted by name so that
/// re-exports of an unchanged page are byte-identical.
pub fn build_frontmatter(
    page: &Page,
    authors: &Authors,
    content_updated: Option<DateTime<Utc>>,
) -> IndexMap<String, FrontmatterValue> {
    let mut fields = IndexMap::new();
    let text = FrontmatterValue::Text;

    fields.insert("id".to_string(), text(page.id.to_dashed()));
    fields.insert("created".to_string(), text(timestamp(&page.created_time)));
    fields.insert("updated".to_string(), text(timestamp(&page.last_edited_time)));
    if let Some(recovered) = content_updated {
        fields.insert("content_updated".to_string(), text(timestamp(&recovered)));
    }
    if let Some(name) = &authors.created_by {
        fields.insert("created_by".to_string(), text(name.clone()));
    }
    if let Some(name) = &authors.last_edited_by {
        fields.insert("last_edited_by".to_string(), text(name.clone()));
    }
    if !page.url.is_empty() {
        fields.insert("url".to_string(), text(page.url.clone()));
    }

    let mut properties: Vec<_> = page
        .properties
        .iter()
        .filter_map(|(name, value)| extract_property(value).map(|v| (name.as_str(), v)))
        .collect();
    properties.sort_by(|a, b| a.0.cmp(b.0));

    for (name, value) in properties {
        // Fixed fields win over a property that happens to share their name
        fields.entry(name.to_string()).or_insert(value);
    }

    fields
}

/// Renders fields between `---` fences.
pub fn render_frontmatter(fields: &IndexMap<String, FrontmatterValue>) -> String {
    let mut output = String::from("---\n");
    for (key, value) in fields {
        let key = if PLAIN_KEY.is_match(key) && !key.ends_with(' ') {
            key.clone()
        } else {
            quote(key)
        };
        output.push_str(&format!("{}: {}\n", key, value.to_yaml()));
    }
    output.push_str("---\n");
    output
}

/// Full markdown document: frontmatter, title heading, then the body.
pub fn render_page_document(
    page: &Page,
    authors: &Authors,
    content_updated: Option<DateTime<Utc>>,
    body: &str,
) -> String {
    let mut document = render_frontmatter(&build_frontmatter(page, authors, content_updated));
    document.push('\n');
    document.push_str(&format!("# {}\n", page.title()));
    if !body.is_empty() {
        document.push('\n');
        document.push_str(body);
        document.push('\n');
    }
    document
}

/// Description file for a database folder: identity, title and columns.
pub fn render_database_document(database: &Database, row_count: usize) -> String {
    let mut fields = IndexMap::new();
    fields.insert(
        "id".to_string(),
        FrontmatterValue::Text(database.id.to_dashed()),
    );
    if !database.url.is_empty() {
        fields.insert("url".to_string(), FrontmatterValue::Text(database.url.clone()));
    }
    fields.insert("pages".to_string(), FrontmatterValue::Number(row_count as f64));

    let mut document = render_frontmatter(&fields);
    document.push('\n');
    document.push_str(&format!("# {}\n\n## Properties\n\n", database.title()));
    for name in &database.property_names {
        document.push_str(&format!("- {}\n", name));
    }
    document
}

fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

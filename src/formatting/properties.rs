// src/formatting/properties.rs
//! Per-kind extraction of page property values for frontmatter.

use crate::model::PropertyValue;
use crate::types::{plain_text_of, DateValue, SelectOption, User};

/// A property value reduced to what frontmatter can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontmatterValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    List(Vec<String>),
}

impl FrontmatterValue {
    /// YAML scalar or flow sequence for this value.
    pub fn to_yaml(&self) -> String {
        match self {
            FrontmatterValue::Text(text) => quote(text),
            FrontmatterValue::Number(n) => format_number(*n),
            FrontmatterValue::Boolean(b) => b.to_string(),
            FrontmatterValue::List(items) => {
                let quoted: Vec<String> = items.iter().map(|item| quote(item)).collect();
                format!("[{}]", quoted.join(", "))
            }
        }
    }
}

/// Extracts a property's exportable value.
///
/// Returns `None` for the title (it becomes the heading), for empty values,
/// and for kinds that are not exported (formula, rollup, relation, files).
pub fn extract_property(value: &PropertyValue) -> Option<FrontmatterValue> {
    use PropertyValue::*;

    match value {
        Title { .. } => None,
        RichText { rich_text } => non_empty_text(plain_text_of(rich_text)),
        Number { number } => number.map(FrontmatterValue::Number),
        Select { select } | Status { status: select } => select_name(select.as_ref()),
        MultiSelect { multi_select } => {
            non_empty_list(multi_select.iter().map(|opt| opt.name.clone()).collect())
        }
        Date { date } => date.as_ref().and_then(format_date),
        Checkbox { checkbox } => Some(FrontmatterValue::Boolean(*checkbox)),
        Url { url } => non_empty_text(url.clone().unwrap_or_default()),
        Email { email } => non_empty_text(email.clone().unwrap_or_default()),
        PhoneNumber { phone_number } => non_empty_text(phone_number.clone().unwrap_or_default()),
        People { people } => non_empty_list(people.iter().map(person_name).collect()),
        Unsupported { type_name } => {
            log::trace!("Omitting property of kind {}", type_name);
            None
        }
    }
}

fn non_empty_text(text: String) -> Option<FrontmatterValue> {
    if text.trim().is_empty() {
        None
    } else {
        Some(FrontmatterValue::Text(text))
    }
}

fn non_empty_list(items: Vec<String>) -> Option<FrontmatterValue> {
    if items.is_empty() {
        None
    } else {
        Some(FrontmatterValue::List(items))
    }
}

fn select_name(select: Option<&SelectOption>) -> Option<FrontmatterValue> {
    select.and_then(|opt| non_empty_text(opt.name.clone()))
}

fn person_name(user: &User) -> String {
    user.name_or_id().to_string()
}

/// `start`, or the ISO 8601 interval `start/end`.
fn format_date(date: &DateValue) -> Option<FrontmatterValue> {
    let text = match &date.end {
        Some(end) => format!("{}/{}", date.start, end),
        None => date.start.clone(),
    };
    non_empty_text(text)
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Double-quoted scalar. JSON string escaping is valid YAML.
pub(crate) fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

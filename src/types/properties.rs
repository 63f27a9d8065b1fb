use serde::{Deserialize, Serialize};

/// Rich text run with formatting annotations.
///
/// `plain_text` is the unformatted projection used for titles, captions and
/// code bodies. `href` is the link target, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextItem {
    pub plain_text: String,
    pub annotations: Annotations,
    pub href: Option<String>,
}

impl RichTextItem {
    /// Create an unannotated text run.
    pub fn plain_text(text: &str) -> Self {
        Self {
            plain_text: text.to_string(),
            annotations: Annotations::default(),
            href: None,
        }
    }

    /// Same run with the given annotations.
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Same run linking to `href`.
    pub fn with_link(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }
}

/// Concatenates the plain text of every run.
pub fn plain_text_of(items: &[RichTextItem]) -> String {
    items.iter().map(|item| item.plain_text.as_str()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
}

/// Select, multi-select and status option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

/// Date property value, kept in the API's own textual form.
///
/// Notion sends either `YYYY-MM-DD` or a full timestamp; both are exported
/// verbatim so no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
    pub end: Option<String>,
}

/// A person referenced by a page property or as a page author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
}

impl User {
    /// Display name, falling back to the raw identity.
    pub fn name_or_id(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_projection_preserves_run_order() {
        let runs = vec![
            RichTextItem::plain_text("Hello, "),
            RichTextItem::plain_text("world").with_annotations(Annotations {
                bold: true,
                ..Default::default()
            }),
        ];
        assert_eq!(plain_text_of(&runs), "Hello, world");
    }

    #[test]
    fn test_user_name_falls_back_to_id() {
        let named = User {
            id: "u1".into(),
            name: Some("Ada".into()),
        };
        let anonymous = User {
            id: "u2".into(),
            name: Some(String::new()),
        };
        assert_eq!(named.name_or_id(), "Ada");
        assert_eq!(anonymous.name_or_id(), "u2");
    }
}

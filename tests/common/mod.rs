// tests/common/mod.rs
//! An in-memory Notion workspace for driving exports without the network.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use notion2markdown::error::NotionErrorCode;
use notion2markdown::model::{
    BlockCommon, ChildDatabaseBlock, ChildPageBlock, DatabaseTitle, FileObject, MediaBlock,
    PageTitle, TextBlock, TextBlockContent, UnsupportedBlock,
};
use notion2markdown::types::{BlockId, DatabaseId, PageId};
use notion2markdown::{
    AppError, Block, Database, NotionId, NotionObject, NotionRepository, Page, Parent,
    PropertyName, PropertyValue, RichTextItem,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

pub fn notion_id(n: u32) -> NotionId {
    NotionId::parse(&format!("{:032x}", n)).unwrap()
}

pub fn page_id(n: u32) -> PageId {
    PageId::parse(&format!("{:032x}", n)).unwrap()
}

pub fn database_id(n: u32) -> DatabaseId {
    DatabaseId::parse(&format!("{:032x}", n)).unwrap()
}

pub fn block_id(n: u32) -> BlockId {
    BlockId::parse(&format!("{:032x}", n)).unwrap()
}

pub fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn edited_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()
}

pub fn in_workspace() -> Parent {
    Parent::Workspace
}

pub fn in_page(n: u32) -> Parent {
    Parent::Page {
        page_id: page_id(n),
    }
}

pub fn in_database(n: u32) -> Parent {
    Parent::Database {
        database_id: database_id(n),
    }
}

// --- Blocks ---

pub fn paragraph(n: u32, text: &str) -> Block {
    paragraph_edited(n, text, edited_at())
}

pub fn paragraph_edited(n: u32, text: &str, at: DateTime<Utc>) -> Block {
    Block::Paragraph(TextBlock {
        common: BlockCommon::new(block_id(n)).edited_at(at),
        content: TextBlockContent::new(vec![RichTextItem::plain_text(text)]),
    })
}

/// A block of a kind the exporter has no rule for.
pub fn unsupported(n: u32, kind: &str) -> Block {
    Block::Unsupported(UnsupportedBlock {
        common: BlockCommon::new(block_id(n)).edited_at(edited_at()),
        block_type: kind.to_string(),
    })
}

pub fn toggle(n: u32, text: &str, children: Vec<Block>) -> Block {
    Block::Toggle(TextBlock {
        common: BlockCommon::new(block_id(n))
            .edited_at(edited_at())
            .with_children(children),
        content: TextBlockContent::new(vec![RichTextItem::plain_text(text)]),
    })
}

/// A child page block; its id is the child page's id.
pub fn child_page(n: u32, title: &str) -> Block {
    let mut common = BlockCommon::new(block_id(n));
    common.has_children = true;
    Block::ChildPage(ChildPageBlock {
        common,
        title: title.to_string(),
    })
}

pub fn child_database(n: u32, title: &str) -> Block {
    Block::ChildDatabase(ChildDatabaseBlock {
        common: BlockCommon::new(block_id(n)),
        title: title.to_string(),
    })
}

pub fn image(n: u32, url: &str, caption: &str) -> Block {
    let caption = if caption.is_empty() {
        Vec::new()
    } else {
        vec![RichTextItem::plain_text(caption)]
    };
    Block::Image(MediaBlock {
        common: BlockCommon::new(block_id(n)),
        source: FileObject::External {
            url: url.to_string(),
        },
        caption,
        name: None,
    })
}

/// A workspace held in maps, with switchable failures.
#[derive(Default)]
pub struct FakeWorkspace {
    order: Vec<NotionId>,
    pages: HashMap<NotionId, Page>,
    databases: HashMap<NotionId, Database>,
    blocks: HashMap<NotionId, Block>,
    children: HashMap<NotionId, Vec<Block>>,
    users: HashMap<String, String>,
    failing_children: Mutex<HashSet<NotionId>>,
    children_requests: Mutex<Vec<NotionId>>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, n: u32, title: &str, parent: Parent) -> &mut Page {
        let id = notion_id(n);
        let page = Page {
            id: page_id(n),
            title: PageTitle::new(title),
            url: format!("https://www.notion.so/{}", id.as_str()),
            created_time: created_at(),
            last_edited_time: edited_at(),
            created_by: None,
            last_edited_by: None,
            parent: Some(parent),
            properties: HashMap::new(),
            blocks: Vec::new(),
        };
        self.order.push(id.clone());
        self.pages.entry(id).or_insert(page)
    }

    pub fn add_database(&mut self, n: u32, title: &str, parent: Parent, columns: &[&str]) {
        let id = notion_id(n);
        let database = Database {
            id: database_id(n),
            title: DatabaseTitle::new(vec![RichTextItem::plain_text(title)]),
            url: format!("https://www.notion.so/{}", id.as_str()),
            parent: Some(parent),
            property_names: columns.iter().map(|c| PropertyName::new(*c)).collect::<BTreeSet<_>>(),
        };
        self.order.push(id.clone());
        self.databases.insert(id, database);
    }

    pub fn set_property(&mut self, page: u32, name: &str, value: PropertyValue) {
        if let Some(page) = self.pages.get_mut(&notion_id(page)) {
            page.properties.insert(PropertyName::new(name), value);
        }
    }

    pub fn add_user(&mut self, id: &str, name: &str) {
        self.users.insert(id.to_string(), name.to_string());
    }

    /// Registers `blocks` as the children of `parent`, and nested children
    /// below their own blocks.
    pub fn add_blocks(&mut self, parent: Parent, blocks: Vec<Block>) {
        let parent_id = match &parent {
            Parent::Page { page_id } => NotionId::from(page_id),
            Parent::Database { database_id } => NotionId::from(database_id),
            Parent::Block { block_id } => NotionId::from(block_id),
            Parent::Workspace => return,
        };

        let mut flat = Vec::with_capacity(blocks.len());
        for mut block in blocks {
            block.common_mut().parent = Some(parent.clone());
            let nested = std::mem::take(&mut block.common_mut().children);
            if !nested.is_empty() {
                block.common_mut().has_children = true;
                self.add_blocks(
                    Parent::Block {
                        block_id: block.id().clone(),
                    },
                    nested,
                );
            }
            self.blocks.insert(NotionId::from(block.id()), block.clone());
            flat.push(block);
        }
        self.children.entry(parent_id).or_default().extend(flat);
    }

    /// Children of `id` fail to load until `heal` is called.
    pub fn fail_children_of(&self, id: &NotionId) {
        self.failing_children.lock().unwrap().insert(id.clone());
    }

    pub fn heal(&self, id: &NotionId) {
        self.failing_children.lock().unwrap().remove(id);
    }

    /// Ids whose children were requested, in order.
    pub fn children_requests(&self) -> Vec<NotionId> {
        self.children_requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.children_requests.lock().unwrap().clear();
    }
}

fn not_found(what: &str, id: &NotionId) -> AppError {
    AppError::NotionService {
        code: NotionErrorCode::ObjectNotFound,
        message: format!("Could not find {} with ID: {}", what, id.to_hyphenated()),
        status: reqwest::StatusCode::NOT_FOUND,
    }
}

#[async_trait]
impl NotionRepository for FakeWorkspace {
    async fn retrieve_page(&self, id: &NotionId) -> Result<Page, AppError> {
        self.pages.get(id).cloned().ok_or_else(|| not_found("page", id))
    }

    async fn retrieve_database(&self, id: &NotionId) -> Result<Database, AppError> {
        self.databases
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("database", id))
    }

    async fn retrieve_block(&self, id: &NotionId) -> Result<Block, AppError> {
        self.blocks.get(id).cloned().ok_or_else(|| not_found("block", id))
    }

    async fn retrieve_children(&self, parent: &NotionId) -> Result<Vec<Block>, AppError> {
        self.children_requests.lock().unwrap().push(parent.clone());
        if self.failing_children.lock().unwrap().contains(parent) {
            return Err(AppError::NotionService {
                code: NotionErrorCode::ServiceUnavailable,
                message: "Notion is unavailable".to_string(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(self.children.get(parent).cloned().unwrap_or_default())
    }

    async fn query_rows(&self, database: &NotionId) -> Result<Vec<Page>, AppError> {
        let rows = self
            .order
            .iter()
            .filter_map(|id| self.pages.get(id))
            .filter(|page| match &page.parent {
                Some(Parent::Database { database_id }) => NotionId::from(database_id) == *database,
                _ => false,
            })
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn retrieve_user_name(&self, user_id: &str) -> Result<String, AppError> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| AppError::MalformedResponse(format!("unknown user {}", user_id)))
    }

    async fn search_all(&self) -> Result<Vec<NotionObject>, AppError> {
        let objects = self
            .order
            .iter()
            .filter_map(|id| {
                self.pages
                    .get(id)
                    .cloned()
                    .map(NotionObject::Page)
                    .or_else(|| self.databases.get(id).cloned().map(NotionObject::Database))
            })
            .collect();
        Ok(objects)
    }
}

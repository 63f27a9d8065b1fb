use super::{Block, Parent};
use crate::types::BlockId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Common fields for all blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCommon {
    pub id: BlockId,
    pub children: Vec<Block>,
    pub has_children: bool,
    pub last_edited_time: Option<DateTime<Utc>>,
    pub parent: Option<Parent>,
}

impl BlockCommon {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            children: Vec::new(),
            has_children: false,
            last_edited_time: None,
            parent: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    pub fn edited_at(mut self, time: DateTime<Utc>) -> Self {
        self.last_edited_time = Some(time);
        self
    }
}

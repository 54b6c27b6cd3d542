use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{BlockId, BoardId, UserId};

/// Free-form per-block properties. Opaque to the store apart from
/// `contentOrder`, see [`Block::content_order`].
pub type Fields = serde_json::Map<String, Value>;

pub const TYPE_CARD: &str = "card";
pub const TYPE_VIEW: &str = "view";
pub const TYPE_COMMENT: &str = "comment";
pub const TYPE_TEXT: &str = "text";
/// Boards stored as blocks before boards got their own table.
pub const TYPE_LEGACY_BOARD: &str = "board";

pub const CONTENT_ORDER_FIELD: &str = "contentOrder";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(default)]
    pub parent_id: BlockId,
    pub root_id: BlockId,
    pub board_id: BoardId,
    #[serde(default)]
    pub created_by: UserId,
    #[serde(default)]
    pub modified_by: UserId,
    #[serde(default)]
    pub schema: i64,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub delete_at: i64,
    /// Physical arrival time of the row. Only meaningful for rows read back
    /// from storage; never written by callers.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub insert_at: String,
}

impl Block {
    pub fn is_deleted(&self) -> bool {
        self.delete_at != 0
    }

    pub fn is_card(&self) -> bool {
        self.block_type == TYPE_CARD
    }

    /// Child ids listed in `fields.contentOrder`. Entries may be nested one
    /// level (rows of side-by-side content); those are flattened.
    pub fn content_order(&self) -> Vec<BlockId> {
        let Some(Value::Array(entries)) = self.fields.get(CONTENT_ORDER_FIELD) else {
            return Vec::new();
        };
        let mut ids = Vec::new();
        for entry in entries {
            match entry {
                Value::String(s) => ids.push(BlockId::from(s.as_str())),
                Value::Array(row) => ids.extend(
                    row.iter()
                        .filter_map(Value::as_str)
                        .map(BlockId::from),
                ),
                _ => {}
            }
        }
        ids
    }

    pub fn set_content_order(&mut self, ids: &[BlockId]) {
        let list = ids.iter().map(|id| Value::String(id.to_string())).collect();
        self.fields
            .insert(CONTENT_ORDER_FIELD.to_string(), Value::Array(list));
    }
}

/// A `contentOrder` value with every id found in `ids` replaced. Nesting is
/// kept, entries outside the map and non-string entries are left alone.
pub fn remap_content_order(value: &Value, ids: &BTreeMap<BlockId, BlockId>) -> Value {
    match value {
        Value::String(s) => match ids.get(&BlockId::from(s.as_str())) {
            Some(new_id) => Value::String(new_id.to_string()),
            None => value.clone(),
        },
        Value::Array(entries) => {
            Value::Array(entries.iter().map(|v| remap_content_order(v, ids)).collect())
        }
        other => other.clone(),
    }
}

/// Field-level overrides applied on top of the current block by `patch`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<i64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub updated_fields: Fields,
    #[serde(default)]
    pub deleted_fields: Vec<String>,
}

impl BlockPatch {
    /// Returns `block` with the overrides applied. Updated fields are set
    /// before deleted fields are removed.
    pub fn apply(&self, mut block: Block) -> Block {
        if let Some(parent_id) = &self.parent_id {
            block.parent_id = parent_id.clone();
        }
        if let Some(root_id) = &self.root_id {
            block.root_id = root_id.clone();
        }
        if let Some(schema) = self.schema {
            block.schema = schema;
        }
        if let Some(block_type) = &self.block_type {
            block.block_type = block_type.clone();
        }
        if let Some(title) = &self.title {
            block.title = title.clone();
        }
        for (key, value) in &self.updated_fields {
            block.fields.insert(key.clone(), value.clone());
        }
        for key in &self.deleted_fields {
            block.fields.remove(key);
        }
        block
    }
}

/// Parallel id/patch sequences, applied pairwise in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatchBatch {
    pub block_ids: Vec<BlockId>,
    pub block_patches: Vec<BlockPatch>,
}

impl BlockPatchBatch {
    pub fn pairs(&self) -> impl Iterator<Item = (&BlockId, &BlockPatch)> {
        self.block_ids.iter().zip(self.block_patches.iter())
    }
}

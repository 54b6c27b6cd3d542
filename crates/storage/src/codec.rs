//! Conversion between [`Block`] values and block-table rows.

use boards_core::{Block, Fields};

use crate::dialect::Dialect;
use crate::error::StorageError;

/// Columns read for every block query, in the order [`RawBlockRow::read`]
/// expects them. `alias` qualifies each column (`l3.id`) for joins.
pub fn block_columns(dialect: &dyn Dialect, alias: Option<&str>) -> Vec<String> {
    let col = |name: &str| match alias {
        Some(a) => format!("{a}.{name}"),
        None => name.to_string(),
    };
    vec![
        col("id"),
        col("parent_id"),
        col("root_id"),
        col("created_by"),
        col("modified_by"),
        col(&dialect.escape_field("schema")),
        col("type"),
        col("title"),
        format!("COALESCE({}, '{{}}')", col("fields")),
        dialect.timestamp_to_char(&col("insert_at"), "insertAt"),
        col("create_at"),
        col("update_at"),
        col("delete_at"),
        format!("COALESCE({}, '0')", col("board_id")),
    ]
}

pub fn fields_to_json(fields: &Fields) -> Result<String, StorageError> {
    Ok(serde_json::to_string(fields)?)
}

pub fn fields_from_json(json: &str) -> Result<Fields, StorageError> {
    if json.is_empty() {
        return Ok(Fields::new());
    }
    Ok(serde_json::from_str(json)?)
}

/// A block row as SQL hands it back, before `fields` is decoded.
#[derive(Debug)]
pub struct RawBlockRow {
    id: String,
    parent_id: String,
    root_id: String,
    created_by: String,
    modified_by: Option<String>,
    schema: i64,
    block_type: String,
    title: String,
    fields: String,
    insert_at: Option<String>,
    create_at: i64,
    update_at: i64,
    delete_at: i64,
    board_id: String,
}

impl RawBlockRow {
    pub fn read(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            root_id: row.get(2)?,
            created_by: row.get(3)?,
            modified_by: row.get(4)?,
            schema: row.get(5)?,
            block_type: row.get(6)?,
            title: row.get(7)?,
            fields: row.get(8)?,
            insert_at: row.get(9)?,
            create_at: row.get(10)?,
            update_at: row.get(11)?,
            delete_at: row.get(12)?,
            board_id: row.get(13)?,
        })
    }

    pub fn into_block(self) -> Result<Block, StorageError> {
        let fields = fields_from_json(&self.fields)?;
        Ok(Block {
            id: self.id.into(),
            parent_id: self.parent_id.into(),
            root_id: self.root_id.into(),
            board_id: self.board_id.into(),
            created_by: self.created_by.into(),
            modified_by: self.modified_by.unwrap_or_default().into(),
            schema: self.schema,
            block_type: self.block_type,
            title: self.title,
            fields,
            create_at: self.create_at,
            update_at: self.update_at,
            delete_at: self.delete_at,
            insert_at: self.insert_at.unwrap_or_default(),
        })
    }
}

//! Block CRUD, history, and the depth-bounded subtree queries.

use std::collections::BTreeMap;

use boards_core::{
    Block, BlockId, BlockPatch, BlockPatchBatch, BoardId, QueryBlockHistoryOptions,
    QuerySubtreeOptions, UserId,
};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params_from_iter};

use crate::codec::{block_columns, fields_to_json};
use crate::error::StorageError;
use crate::query::{Delete, Insert, Select, Update, text};
use crate::store::SqlStore;

impl SqlStore {
    fn block_insert(&self, table: &str, block: &Block) -> Result<Insert, StorageError> {
        Ok(Insert::new(table)
            .value("id", text(&block.id))
            .value("parent_id", text(&block.parent_id))
            .value("root_id", text(&block.root_id))
            .value("board_id", text(&block.board_id))
            .value("created_by", text(&block.created_by))
            .value("modified_by", text(&block.modified_by))
            .value(&self.dialect().escape_field("schema"), SqlValue::Integer(block.schema))
            .value("type", text(&block.block_type))
            .value("title", text(&block.title))
            .value("fields", SqlValue::Text(fields_to_json(&block.fields)?))
            .value("create_at", SqlValue::Integer(block.create_at))
            .value("update_at", SqlValue::Integer(block.update_at))
            .value("delete_at", SqlValue::Integer(block.delete_at)))
    }

    fn append_history(&self, conn: &Connection, block: &Block) -> Result<(), StorageError> {
        let (sql, params) = self
            .block_insert(&self.history_table(), block)?
            .build(self.dialect());
        self.exec(conn, &sql, &params)?;
        Ok(())
    }

    pub fn get_block(
        &self,
        conn: &Connection,
        block_id: &BlockId,
    ) -> Result<Option<Block>, StorageError> {
        let select = self
            .select_blocks(&self.blocks_table())
            .where_eq("id", text(block_id));
        let mut blocks = self.query_blocks(conn, "getBlock", &select)?;
        Ok(if blocks.is_empty() {
            None
        } else {
            Some(blocks.swap_remove(0))
        })
    }

    pub fn get_blocks_for_board(
        &self,
        conn: &Connection,
        board_id: &BoardId,
    ) -> Result<Vec<Block>, StorageError> {
        let select = self
            .select_blocks(&self.blocks_table())
            .where_eq("board_id", text(board_id));
        self.query_blocks(conn, "getBlocksForBoard", &select)
    }

    pub fn get_blocks_with_parent(
        &self,
        conn: &Connection,
        board_id: &BoardId,
        parent_id: &BlockId,
    ) -> Result<Vec<Block>, StorageError> {
        let select = self
            .select_blocks(&self.blocks_table())
            .where_eq("parent_id", text(parent_id))
            .where_eq("board_id", text(board_id));
        self.query_blocks(conn, "getBlocksWithParent", &select)
    }

    pub fn get_blocks_with_parent_and_type(
        &self,
        conn: &Connection,
        board_id: &BoardId,
        parent_id: &BlockId,
        block_type: &str,
    ) -> Result<Vec<Block>, StorageError> {
        let select = self
            .select_blocks(&self.blocks_table())
            .where_eq("board_id", text(board_id))
            .where_eq("parent_id", text(parent_id))
            .where_eq("type", text(block_type));
        self.query_blocks(conn, "getBlocksWithParentAndType", &select)
    }

    pub fn get_blocks_with_root_id(
        &self,
        conn: &Connection,
        board_id: &BoardId,
        root_id: &BlockId,
    ) -> Result<Vec<Block>, StorageError> {
        let select = self
            .select_blocks(&self.blocks_table())
            .where_eq("root_id", text(root_id))
            .where_eq("board_id", text(board_id));
        self.query_blocks(conn, "getBlocksWithRootID", &select)
    }

    pub fn get_blocks_with_type(
        &self,
        conn: &Connection,
        board_id: &BoardId,
        block_type: &str,
    ) -> Result<Vec<Block>, StorageError> {
        let select = self
            .select_blocks(&self.blocks_table())
            .where_eq("type", text(block_type))
            .where_eq("board_id", text(board_id));
        self.query_blocks(conn, "getBlocksWithType", &select)
    }

    fn get_link_column(
        &self,
        conn: &Connection,
        column: &str,
        block_id: &BlockId,
    ) -> Result<BlockId, StorageError> {
        let (sql, params) = Select::new(vec![column.to_string()])
            .from(&self.blocks_table())
            .where_eq("id", text(block_id))
            .build(self.dialect());
        conn.query_row(&sql, params_from_iter(params.iter()), |row| {
            row.get::<_, String>(0)
        })
        .optional()?
        .map(BlockId::from)
        .ok_or_else(|| StorageError::BlockNotFound(block_id.clone()))
    }

    pub fn get_root_id(
        &self,
        conn: &Connection,
        block_id: &BlockId,
    ) -> Result<BlockId, StorageError> {
        self.get_link_column(conn, "root_id", block_id)
    }

    pub fn get_parent_id(
        &self,
        conn: &Connection,
        block_id: &BlockId,
    ) -> Result<BlockId, StorageError> {
        self.get_link_column(conn, "parent_id", block_id)
    }

    /// The block and its direct children.
    pub fn get_subtree2(
        &self,
        conn: &Connection,
        board_id: &BoardId,
        block_id: &BlockId,
        opts: QuerySubtreeOptions,
    ) -> Result<Vec<Block>, StorageError> {
        let mut select = self
            .select_blocks(&self.blocks_table())
            .where_expr("id = ? OR parent_id = ?", vec![text(block_id), text(block_id)])
            .where_eq("board_id", text(board_id));
        if opts.before_update_at != 0 {
            select = select.where_expr("update_at <= ?", vec![opts.before_update_at.into()]);
        }
        if opts.after_update_at != 0 {
            select = select.where_expr("update_at >= ?", vec![opts.after_update_at.into()]);
        }
        select = select.limit(opts.limit);
        self.query_blocks(conn, "getSubTree2", &select)
    }

    /// The block, its children and its grandchildren.
    ///
    /// Each join level matches either a child of the previous level or the
    /// previous level itself, so a block surfaces once per path that
    /// reaches it; the distinct step collapses those to one row per id.
    pub fn get_subtree3(
        &self,
        conn: &Connection,
        board_id: &BoardId,
        block_id: &BlockId,
        opts: QuerySubtreeOptions,
    ) -> Result<Vec<Block>, StorageError> {
        let blocks = self.blocks_table();
        let mut select = Select::new(block_columns(self.dialect(), Some("l3")))
            .options(self.dialect().distinct("l3.id"))
            .from(&format!("{blocks} AS l1"))
            .join(format!("{blocks} AS l2 ON l2.parent_id = l1.id OR l2.id = l1.id"))
            .join(format!("{blocks} AS l3 ON l3.parent_id = l2.id OR l3.id = l2.id"))
            .where_eq("l1.id", text(block_id))
            .where_eq("l3.board_id", text(board_id));
        if opts.before_update_at != 0 {
            select = select.where_expr("l3.update_at <= ?", vec![opts.before_update_at.into()]);
        }
        if opts.after_update_at != 0 {
            select = select.where_expr("l3.update_at >= ?", vec![opts.after_update_at.into()]);
        }
        select = select.limit(opts.limit);
        self.query_blocks(conn, "getSubTree3", &select)
    }

    /// Every recorded state of `block_id`, in arrival order.
    pub fn get_block_history(
        &self,
        conn: &Connection,
        block_id: &BlockId,
        opts: QueryBlockHistoryOptions,
    ) -> Result<Vec<Block>, StorageError> {
        let select = self.block_history_select(block_id, opts);
        self.query_blocks(conn, "getBlockHistory", &select)
    }

    fn block_history_select(&self, block_id: &BlockId, opts: QueryBlockHistoryOptions) -> Select {
        let order = if opts.descending { " DESC" } else { "" };
        let mut select = self
            .select_blocks(&self.history_table())
            .where_eq("id", text(block_id))
            .order_by(&format!("insert_at{order}"));
        if let Some(tiebreak) = self.dialect().history_tiebreak() {
            select = select.order_by(&format!("{tiebreak}{order}"));
        }
        if opts.before_update_at != 0 {
            select = select.where_expr("update_at < ?", vec![opts.before_update_at.into()]);
        }
        if opts.after_update_at != 0 {
            select = select.where_expr("update_at > ?", vec![opts.after_update_at.into()]);
        }
        select.limit(opts.limit)
    }

    /// Create or update `block`, appending the resulting state to history.
    ///
    /// Returns the block as stored. An update whose `board_id` does not
    /// match the live row changes nothing and returns the live row.
    pub fn insert_block(
        &self,
        conn: &Connection,
        block: &Block,
        user_id: &UserId,
    ) -> Result<Block, StorageError> {
        self.write_block(conn, block, user_id, false)
    }

    /// Re-insert a block reconstructed from history. Behaves like
    /// [`SqlStore::insert_block`] except that a newly created live row keeps
    /// the `created_by` / `create_at` carried by `block`.
    pub fn restore_block(
        &self,
        conn: &Connection,
        block: &Block,
        user_id: &UserId,
    ) -> Result<Block, StorageError> {
        self.write_block(conn, block, user_id, true)
    }

    fn write_block(
        &self,
        conn: &Connection,
        block: &Block,
        user_id: &UserId,
        keep_provenance: bool,
    ) -> Result<Block, StorageError> {
        if block.root_id.is_empty() {
            return Err(StorageError::RootIdMissing);
        }
        if block.board_id.is_empty() {
            return Err(StorageError::BoardIdMissing);
        }

        let existing = self.get_block(conn, &block.id)?;
        let now = self.now()?;
        let mut stored = block.clone();
        stored.insert_at = String::new();
        stored.modified_by = user_id.clone();
        stored.update_at = now;

        match existing {
            Some(existing) => {
                stored.created_by = existing.created_by.clone();
                stored.create_at = existing.create_at;
                let (sql, params) = Update::new()
                    .set("parent_id", text(&stored.parent_id))
                    .set("root_id", text(&stored.root_id))
                    .set("modified_by", text(&stored.modified_by))
                    .set(&self.dialect().escape_field("schema"), SqlValue::Integer(stored.schema))
                    .set("type", text(&stored.block_type))
                    .set("title", text(&stored.title))
                    .set("fields", SqlValue::Text(fields_to_json(&stored.fields)?))
                    .set("update_at", SqlValue::Integer(stored.update_at))
                    .set("delete_at", SqlValue::Integer(stored.delete_at))
                    .where_eq("id", text(&stored.id))
                    .where_eq("board_id", text(&stored.board_id))
                    .build(self.dialect(), &self.blocks_table());
                let updated = self.exec(conn, &sql, &params).inspect_err(|e| {
                    log::error!(
                        "insertBlock error updating existing block: block_id={} err={e}",
                        stored.id
                    )
                })?;
                if updated == 0 {
                    log::warn!(
                        "insertBlock board mismatch: block_id={} board_id={} live={}",
                        stored.id,
                        stored.board_id,
                        existing.board_id
                    );
                    return Ok(existing);
                }
            }
            None => {
                if !keep_provenance || stored.created_by.is_empty() {
                    stored.created_by = user_id.clone();
                    stored.create_at = now;
                }
                let (sql, params) = self
                    .block_insert(&self.blocks_table(), &stored)?
                    .build(self.dialect());
                self.exec(conn, &sql, &params)?;
            }
        }

        self.append_history(conn, &stored)?;
        log::debug!(
            "insertBlock: block_id={} board_id={} update_at={}",
            stored.id,
            stored.board_id,
            stored.update_at
        );
        Ok(stored)
    }

    /// Upsert each block in order. Stops at the first failure without
    /// undoing the blocks already written.
    pub fn insert_blocks(
        &self,
        conn: &Connection,
        blocks: &[Block],
        user_id: &UserId,
    ) -> Result<Vec<Block>, StorageError> {
        blocks
            .iter()
            .map(|block| self.insert_block(conn, block, user_id))
            .collect()
    }

    pub fn patch_block(
        &self,
        conn: &Connection,
        block_id: &BlockId,
        patch: &BlockPatch,
        user_id: &UserId,
    ) -> Result<Block, StorageError> {
        let existing = self
            .get_block(conn, block_id)?
            .ok_or_else(|| StorageError::BlockNotFound(block_id.clone()))?;
        self.insert_block(conn, &patch.apply(existing), user_id)
    }

    /// Apply the batch pairwise. Stops at the first failure without undoing
    /// the patches already applied.
    pub fn patch_blocks(
        &self,
        conn: &Connection,
        batch: &BlockPatchBatch,
        user_id: &UserId,
    ) -> Result<Vec<Block>, StorageError> {
        if batch.block_ids.len() != batch.block_patches.len() {
            return Err(StorageError::BatchLengthMismatch {
                ids: batch.block_ids.len(),
                patches: batch.block_patches.len(),
            });
        }
        batch
            .pairs()
            .map(|(block_id, patch)| self.patch_block(conn, block_id, patch, user_id))
            .collect()
    }

    /// Tombstone `block_id` in history and drop its live row. Deleting a
    /// block that is not live succeeds without writing anything.
    pub fn delete_block(
        &self,
        conn: &Connection,
        block_id: &BlockId,
        modified_by: &UserId,
    ) -> Result<(), StorageError> {
        let Some(mut tombstone) = self.get_block(conn, block_id)? else {
            return Ok(());
        };

        let now = self.now()?;
        tombstone.modified_by = modified_by.clone();
        tombstone.update_at = now;
        tombstone.delete_at = now;
        self.append_history(conn, &tombstone)?;

        let (sql, params) = Delete::new(&self.blocks_table())
            .where_eq("id", text(block_id))
            .build(self.dialect());
        self.exec(conn, &sql, &params)?;
        log::debug!("deleteBlock: block_id={block_id} board_id={}", tombstone.board_id);
        Ok(())
    }

    /// Live block counts keyed by block type.
    pub fn count_blocks_by_type(
        &self,
        conn: &Connection,
    ) -> Result<BTreeMap<String, i64>, StorageError> {
        let (sql, params) = Select::new(vec!["type".into(), "COUNT(*) AS count".into()])
            .from(&self.blocks_table())
            .group_by("type")
            .build(self.dialect());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .and_then(|rows| rows.collect::<Result<BTreeMap<_, _>, _>>())
            .inspect_err(|e| log::error!("getBlockCountsByType ERROR: {e}"))?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::dialect::DbType;

    fn history_sql(db_type: DbType, descending: bool) -> String {
        let store = SqlStore::new(&StoreConfig {
            db_type,
            table_prefix: String::new(),
        });
        let opts = QueryBlockHistoryOptions {
            descending,
            ..Default::default()
        };
        store.block_history_select(&"card-1".into(), opts).build(store.dialect()).0
    }

    #[test]
    fn sqlite_history_breaks_ties_on_sequence() {
        let sql = history_sql(DbType::Sqlite, true);
        assert!(sql.ends_with(" ORDER BY insert_at DESC, seq DESC"), "{sql}");
    }

    #[test]
    fn other_backends_order_history_by_arrival_only() {
        for db_type in [DbType::Postgres, DbType::Mysql] {
            let sql = history_sql(db_type, false);
            assert!(sql.ends_with(" ORDER BY insert_at"), "{sql}");
            assert!(!sql.contains("seq"), "{sql}");
        }
    }
}

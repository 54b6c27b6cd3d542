//! Identifier renaming across the live and history tables, used when a
//! tree of blocks is cloned under new ids.

use std::collections::BTreeMap;

use boards_core::block::{CONTENT_ORDER_FIELD, TYPE_CARD, remap_content_order};
use boards_core::{BlockId, BoardId};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};

use crate::codec::{fields_from_json, fields_to_json};
use crate::error::StorageError;
use crate::query::{Select, Update, contains_pattern, text};
use crate::store::SqlStore;

impl SqlStore {
    fn update_blocks_and_history(
        &self,
        conn: &Connection,
        update: &Update,
    ) -> Result<(), StorageError> {
        for table in [self.blocks_table(), self.history_table()] {
            let (sql, params) = update.build(self.dialect(), &table);
            self.exec(conn, &sql, &params)
                .inspect_err(|e| log::error!("replaceBlockID ERROR: table={table} err={e}"))?;
        }
        Ok(())
    }

    /// Rename `current_id` to `new_id` within `board_id` wherever it is a
    /// whole column value: row id, root id and parent id.
    pub fn replace_block_links(
        &self,
        conn: &Connection,
        current_id: &BlockId,
        new_id: &BlockId,
        board_id: &BoardId,
    ) -> Result<(), StorageError> {
        let scoped = |update: Update| update.where_eq("board_id", text(board_id));

        let update_id = scoped(Update::new())
            .set("id", text(new_id))
            .where_eq("id", text(current_id));
        self.update_blocks_and_history(conn, &update_id)?;

        let update_root_id = scoped(Update::new())
            .set("root_id", text(new_id))
            .where_eq("root_id", text(current_id));
        self.update_blocks_and_history(conn, &update_root_id)?;

        let update_parent_id = scoped(Update::new())
            .set("parent_id", text(new_id))
            .where_eq("parent_id", text(current_id));
        self.update_blocks_and_history(conn, &update_parent_id)
    }

    /// Rename `current_id` to `new_id` within `board_id`: as a row id, as a
    /// root id, as a parent id, and inside card `contentOrder` lists.
    ///
    /// The `contentOrder` step is a substring replacement over the whole
    /// `fields` text, so it also hits ids that contain `current_id`.
    /// Renaming many ids at once goes through [`SqlStore::remap_content_orders`]
    /// instead.
    ///
    /// Each step commits with whatever transaction `conn` is in; run it
    /// inside one when the rename must be all-or-nothing.
    pub fn replace_block_id(
        &self,
        conn: &Connection,
        current_id: &BlockId,
        new_id: &BlockId,
        board_id: &BoardId,
    ) -> Result<(), StorageError> {
        self.replace_block_links(conn, current_id, new_id, board_id)?;

        let rewrite = self.dialect().content_order_rewrite();
        let like = format!("{} LIKE ?{}", rewrite.match_target, self.dialect().like_escape());
        let update_content_order = Update::new()
            .set_expr("fields", rewrite.set_expr, vec![text(current_id), text(new_id)])
            .where_eq("board_id", text(board_id))
            .where_expr(&like, vec![text(contains_pattern(current_id.as_str()))])
            .where_eq("type", text(TYPE_CARD));
        self.update_blocks_and_history(conn, &update_content_order)?;

        log::debug!("replaceBlockID: {current_id} -> {new_id} board_id={board_id}");
        Ok(())
    }

    /// Replace every `contentOrder` entry found in `ids` on the cards of
    /// `board_id`, live and history. Entries are matched whole, so one id
    /// never rewrites part of another. Returns the number of rows changed.
    pub fn remap_content_orders(
        &self,
        conn: &Connection,
        board_id: &BoardId,
        ids: &BTreeMap<BlockId, BlockId>,
    ) -> Result<usize, StorageError> {
        let fields_text = self.dialect().fields_text();
        let mut changed = 0;
        for table in [self.blocks_table(), self.history_table()] {
            let (sql, params) = Select::new(vec!["id".into(), fields_text.to_string()])
                .options("DISTINCT".into())
                .from(&table)
                .where_eq("board_id", text(board_id))
                .where_eq("type", text(TYPE_CARD))
                .where_expr("fields IS NOT NULL", vec![])
                .build(self.dialect());
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()
                .inspect_err(|e| log::error!("remapContentOrders ERROR: table={table} err={e}"))?;

            for (id, raw) in rows {
                let mut fields = fields_from_json(&raw)?;
                let Some(order) = fields.get(CONTENT_ORDER_FIELD) else {
                    continue;
                };
                let remapped = remap_content_order(order, ids);
                if &remapped == order {
                    continue;
                }
                fields.insert(CONTENT_ORDER_FIELD.to_string(), remapped);
                let (sql, params) = Update::new()
                    .set("fields", SqlValue::Text(fields_to_json(&fields)?))
                    .where_eq("board_id", text(board_id))
                    .where_eq("id", text(&id))
                    .where_eq("type", text(TYPE_CARD))
                    .where_expr(&format!("{fields_text} = ?"), vec![text(&raw)])
                    .build(self.dialect(), &table);
                changed += self.exec(conn, &sql, &params)?;
            }
        }
        log::debug!("remapContentOrders: board_id={board_id} ids={} rows={changed}", ids.len());
        Ok(changed)
    }
}

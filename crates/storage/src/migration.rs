//! One-shot readers for the upgrade that moved board templates out of the
//! block tables. Not used by steady-state request handling.

use boards_core::{Block, block::TYPE_LEGACY_BOARD};
use rusqlite::Connection;

use crate::error::StorageError;
use crate::query::{Delete, text};
use crate::store::SqlStore;

impl SqlStore {
    /// Template boards still stored as blocks: `(live rows, history rows)`.
    pub fn legacy_board_blocks(
        &self,
        conn: &Connection,
    ) -> Result<(Vec<Block>, Vec<Block>), StorageError> {
        let filter = self.dialect().is_template_filter();

        let live = self
            .select_blocks(&self.blocks_table())
            .where_eq("type", text(TYPE_LEGACY_BOARD))
            .where_expr(filter, vec![]);
        let live = self.query_blocks(conn, "getAllBoardTemplateBlocks", &live)?;

        let history = self
            .select_blocks(&self.history_table())
            .where_eq("type", text(TYPE_LEGACY_BOARD))
            .where_expr(filter, vec![]);
        let history = self.query_blocks(conn, "getAllBoardTemplateBlocks", &history)?;

        Ok((live, history))
    }

    /// Drop the live template-board rows. History keeps its rows.
    pub fn purge_legacy_board_blocks(&self, conn: &Connection) -> Result<usize, StorageError> {
        let (sql, params) = Delete::new(&self.blocks_table())
            .where_eq("type", text(TYPE_LEGACY_BOARD))
            .where_expr(self.dialect().is_template_filter(), vec![])
            .build(self.dialect());
        let purged = self.exec(conn, &sql, &params)?;
        log::debug!("deleteAllBoardTemplateBlocks: purged={purged}");
        Ok(purged)
    }
}

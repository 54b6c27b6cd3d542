//! Resolution of the owning board and nearest card for a block, walking
//! parent links through history so deleted ancestors still count.

use boards_core::{Block, BlockId, Board, QueryBlockHistoryOptions};
use rusqlite::Connection;

use crate::error::StorageError;
use crate::store::SqlStore;

/// Upper bound on parent hops. Parent links are caller data and may loop.
pub const MAX_SEARCH_DEPTH: usize = 50;

impl SqlStore {
    /// Latest recorded state of `block_id`, live or deleted.
    pub fn get_latest_history(
        &self,
        conn: &Connection,
        block_id: &BlockId,
    ) -> Result<Option<Block>, StorageError> {
        let mut blocks =
            self.get_block_history(conn, block_id, QueryBlockHistoryOptions::latest())?;
        Ok(blocks.pop())
    }

    /// Like [`SqlStore::get_board_and_card`], starting from an id that may
    /// already be deleted. Fails with `NotFound` when history has never
    /// seen the id.
    pub fn get_board_and_card_by_id(
        &self,
        conn: &Connection,
        block_id: &BlockId,
    ) -> Result<(Option<Board>, Option<Block>), StorageError> {
        let block = self
            .get_latest_history(conn, block_id)?
            .ok_or_else(|| StorageError::NotFound(block_id.to_string()))?;
        self.get_board_and_card(conn, &block)
    }

    /// The first `card` among `block` and its ancestors, and the board
    /// named by `block.board_id`. Either may be absent.
    pub fn get_board_and_card(
        &self,
        conn: &Connection,
        block: &Block,
    ) -> Result<(Option<Board>, Option<Block>), StorageError> {
        let mut card = None;
        let mut iter = block.clone();
        let mut hops = 0;

        loop {
            if iter.is_card() {
                card = Some(iter);
                break;
            }
            if iter.parent_id.is_empty() {
                break;
            }
            if hops >= MAX_SEARCH_DEPTH {
                log::warn!(
                    "getBoardAndCard hop limit {MAX_SEARCH_DEPTH}: block_id={} stopped_at={}",
                    block.id,
                    iter.id
                );
                break;
            }
            hops += 1;
            match self.get_latest_history(conn, &iter.parent_id)? {
                Some(parent) => iter = parent,
                None => break,
            }
        }

        let board = self.get_board(conn, &block.board_id)?;
        Ok((board, card))
    }
}

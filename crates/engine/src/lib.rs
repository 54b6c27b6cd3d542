//! Workflows built from block store primitives: undelete, all-or-nothing
//! batches, card duplication and id regeneration for imported trees.

pub mod error;
pub mod remap;

pub use error::EngineError;

use std::collections::BTreeMap;

use boards_core::{
    Block, BlockId, BlockPatchBatch, Board, BoardId, QuerySubtreeOptions, UserId,
};
use boards_storage::{BlockStore, SqliteStorage, StorageError};

use crate::remap::remap_block;

pub struct Engine {
    storage: SqliteStorage,
}

impl Engine {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut SqliteStorage {
        &mut self.storage
    }

    /// Bring back a deleted block from its latest history entry. The
    /// restored row keeps its original creator and gets a fresh history row.
    pub fn undelete_block(
        &mut self,
        block_id: &BlockId,
        user_id: &UserId,
    ) -> Result<Block, EngineError> {
        self.storage.with_transaction(|store, tx| {
            if store.get_block(tx, block_id)?.is_some() {
                return Err(EngineError::BlockStillLive(block_id.clone()));
            }
            let mut block = store
                .get_latest_history(tx, block_id)?
                .ok_or_else(|| EngineError::NothingToUndelete(block_id.clone()))?;
            block.delete_at = 0;
            let restored = store.restore_block(tx, &block, user_id)?;
            log::debug!("undeleteBlock: block_id={block_id} board_id={}", restored.board_id);
            Ok(restored)
        })
    }

    /// Batch upsert where a failure on any element leaves nothing written.
    pub fn upsert_blocks_atomic(
        &mut self,
        blocks: &[Block],
        user_id: &UserId,
    ) -> Result<Vec<Block>, EngineError> {
        self.storage
            .with_transaction(|store, tx| Ok(store.insert_blocks(tx, blocks, user_id)?))
    }

    /// Batch patch where a failure on any element leaves nothing written.
    pub fn patch_blocks_atomic(
        &mut self,
        batch: &BlockPatchBatch,
        user_id: &UserId,
    ) -> Result<Vec<Block>, EngineError> {
        self.storage
            .with_transaction(|store, tx| Ok(store.patch_blocks(tx, batch, user_id)?))
    }

    /// Copy a card and its direct children under fresh ids. Returns the id
    /// of the new card.
    pub fn duplicate_card(
        &mut self,
        board_id: &BoardId,
        card_id: &BlockId,
        user_id: &UserId,
    ) -> Result<BlockId, EngineError> {
        self.storage.with_transaction(|store, tx| {
            let subtree =
                store.get_subtree2(tx, board_id, card_id, QuerySubtreeOptions::default())?;
            let ids: BTreeMap<BlockId, BlockId> = subtree
                .iter()
                .map(|b| (b.id.clone(), BlockId::new()))
                .collect();
            let new_card_id = ids
                .get(card_id)
                .cloned()
                .ok_or_else(|| StorageError::BlockNotFound(card_id.clone()))?;

            let copies: Vec<Block> = subtree.iter().map(|b| remap_block(b, &ids)).collect();
            store.insert_blocks(tx, &copies, user_id)?;
            log::debug!(
                "duplicateCard: {card_id} -> {new_card_id} board_id={board_id} blocks={}",
                copies.len()
            );
            Ok(new_card_id)
        })
    }

    /// Give every block of the tree rooted at `root_id` a fresh id, rewriting
    /// live rows, history, and card content orders. Used after importing a
    /// tree whose ids came from elsewhere. Returns old id to new id.
    ///
    /// Links are renamed one id at a time; content orders are rewritten in
    /// a single pass afterwards, matching whole entries, so short or
    /// overlapping imported ids cannot bleed into one another.
    pub fn regenerate_tree_ids(
        &mut self,
        board_id: &BoardId,
        root_id: &BlockId,
    ) -> Result<BTreeMap<BlockId, BlockId>, EngineError> {
        self.storage.with_transaction(|store, tx| {
            let tree = store.get_blocks_with_root_id(tx, board_id, root_id)?;
            let ids: BTreeMap<BlockId, BlockId> = tree
                .iter()
                .map(|b| (b.id.clone(), BlockId::new()))
                .collect();
            for (old_id, new_id) in &ids {
                store.replace_block_links(tx, old_id, new_id, board_id)?;
            }
            let rows = store.remap_content_orders(tx, board_id, &ids)?;
            log::debug!(
                "regenerateTreeIDs: root_id={root_id} board_id={board_id} blocks={} rows={rows}",
                ids.len()
            );
            Ok(ids)
        })
    }

    /// Owning board and nearest card for a block id, live or deleted.
    pub fn board_and_card(
        &self,
        block_id: &BlockId,
    ) -> Result<(Option<Board>, Option<Block>), EngineError> {
        Ok(self.storage.get_board_and_card_by_id(block_id)?)
    }
}

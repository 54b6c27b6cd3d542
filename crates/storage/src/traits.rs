use std::collections::BTreeMap;

use boards_core::{
    Block, BlockId, BlockPatch, BlockPatchBatch, Board, BoardId, QueryBlockHistoryOptions,
    QuerySubtreeOptions, UserId,
};

use crate::error::StorageError;

/// Board-scoped block storage with an append-only history ledger.
///
/// Reads other than by id are constrained to one board; that scoping is
/// the isolation boundary the authorization layer relies on.
pub trait BlockStore {
    fn get_block(&self, block_id: &BlockId) -> Result<Option<Block>, StorageError>;

    fn get_blocks_for_board(&self, board_id: &BoardId) -> Result<Vec<Block>, StorageError>;

    fn get_blocks_with_parent(
        &self,
        board_id: &BoardId,
        parent_id: &BlockId,
    ) -> Result<Vec<Block>, StorageError>;

    fn get_blocks_with_parent_and_type(
        &self,
        board_id: &BoardId,
        parent_id: &BlockId,
        block_type: &str,
    ) -> Result<Vec<Block>, StorageError>;

    fn get_blocks_with_root_id(
        &self,
        board_id: &BoardId,
        root_id: &BlockId,
    ) -> Result<Vec<Block>, StorageError>;

    fn get_blocks_with_type(
        &self,
        board_id: &BoardId,
        block_type: &str,
    ) -> Result<Vec<Block>, StorageError>;

    fn get_root_id(&self, block_id: &BlockId) -> Result<BlockId, StorageError>;

    fn get_parent_id(&self, block_id: &BlockId) -> Result<BlockId, StorageError>;

    fn get_subtree2(
        &self,
        board_id: &BoardId,
        block_id: &BlockId,
        opts: QuerySubtreeOptions,
    ) -> Result<Vec<Block>, StorageError>;

    fn get_subtree3(
        &self,
        board_id: &BoardId,
        block_id: &BlockId,
        opts: QuerySubtreeOptions,
    ) -> Result<Vec<Block>, StorageError>;

    fn get_block_history(
        &self,
        block_id: &BlockId,
        opts: QueryBlockHistoryOptions,
    ) -> Result<Vec<Block>, StorageError>;

    fn insert_block(&mut self, block: &Block, user_id: &UserId) -> Result<Block, StorageError>;

    fn insert_blocks(
        &mut self,
        blocks: &[Block],
        user_id: &UserId,
    ) -> Result<Vec<Block>, StorageError>;

    fn patch_block(
        &mut self,
        block_id: &BlockId,
        patch: &BlockPatch,
        user_id: &UserId,
    ) -> Result<Block, StorageError>;

    fn patch_blocks(
        &mut self,
        batch: &BlockPatchBatch,
        user_id: &UserId,
    ) -> Result<Vec<Block>, StorageError>;

    fn delete_block(&mut self, block_id: &BlockId, modified_by: &UserId)
    -> Result<(), StorageError>;

    fn get_board_and_card(
        &self,
        block: &Block,
    ) -> Result<(Option<Board>, Option<Block>), StorageError>;

    fn get_board_and_card_by_id(
        &self,
        block_id: &BlockId,
    ) -> Result<(Option<Board>, Option<Block>), StorageError>;

    fn count_blocks_by_type(&self) -> Result<BTreeMap<String, i64>, StorageError>;

    fn replace_block_id(
        &mut self,
        current_id: &BlockId,
        new_id: &BlockId,
        board_id: &BoardId,
    ) -> Result<(), StorageError>;

    fn legacy_board_blocks(&self) -> Result<(Vec<Block>, Vec<Block>), StorageError>;

    fn purge_legacy_board_blocks(&mut self) -> Result<usize, StorageError>;
}

pub trait BoardStore {
    fn insert_board(&mut self, board: &Board) -> Result<(), StorageError>;

    fn get_board(&self, board_id: &BoardId) -> Result<Option<Board>, StorageError>;
}

use std::sync::Arc;

use boards_core::{Block, BlockId, Board, BoardId, BoardType, ManualClock, TeamId, UserId};
use boards_engine::Engine;
use boards_storage::{
    BlockStore, BoardStore, SqliteStorage, StorageError, StoreConfig,
};
use rusqlite::Connection;
use serde_json::Value;

/// Start of the fixture clock, an arbitrary fixed instant.
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// A block on `board_id` with the given links. Root defaults to `id` when
/// the block has no parent.
pub fn block(
    board_id: &BoardId,
    id: &str,
    parent_id: &str,
    root_id: &str,
    block_type: &str,
) -> Block {
    let root_id = if root_id.is_empty() { id } else { root_id };
    Block {
        id: id.into(),
        parent_id: parent_id.into(),
        root_id: root_id.into(),
        board_id: board_id.clone(),
        schema: 1,
        block_type: block_type.into(),
        title: format!("{block_type} {id}"),
        ..Default::default()
    }
}

/// An in-memory store with one open board, a fixed user and a hand-driven
/// clock.
pub struct TestBoard {
    pub engine: Engine,
    pub clock: Arc<ManualClock>,
    pub board_id: BoardId,
    pub user_id: UserId,
}

impl TestBoard {
    pub fn new() -> Result<Self, StorageError> {
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let storage = SqliteStorage::open_with(
            Connection::open_in_memory()?,
            &StoreConfig::default(),
            clock.clone(),
        )?;
        let mut fixture = Self {
            engine: Engine::new(storage),
            clock,
            board_id: BoardId::empty(),
            user_id: UserId::from("user-1"),
        };
        fixture.board_id = fixture.create_board("Test board", BoardType::Open)?;
        Ok(fixture)
    }

    pub fn storage(&self) -> &SqliteStorage {
        self.engine.storage()
    }

    pub fn storage_mut(&mut self) -> &mut SqliteStorage {
        self.engine.storage_mut()
    }

    /// Another board in the same store.
    pub fn create_board(
        &mut self,
        title: &str,
        board_type: BoardType,
    ) -> Result<BoardId, StorageError> {
        let board = Board {
            id: BoardId::new(),
            team_id: TeamId::from("team-1"),
            board_type,
            title: title.to_string(),
            created_by: self.user_id.clone(),
            create_at: START_MILLIS,
            update_at: START_MILLIS,
            ..Default::default()
        };
        self.storage_mut().insert_board(&board)?;
        Ok(board.id)
    }

    /// Move the clock forward one millisecond and return the new time.
    pub fn tick(&self) -> i64 {
        self.clock.advance(1)
    }

    /// Insert a top-level card on the fixture board.
    pub fn add_card(&mut self, id: &str) -> Result<Block, StorageError> {
        let card = block(&self.board_id, id, "", "", boards_core::block::TYPE_CARD);
        self.insert(&card)
    }

    /// Insert a block under `parent`, sharing its root.
    pub fn add_child(
        &mut self,
        parent: &Block,
        id: &str,
        block_type: &str,
    ) -> Result<Block, StorageError> {
        let child = block(
            &parent.board_id,
            id,
            parent.id.as_str(),
            parent.root_id.as_str(),
            block_type,
        );
        self.insert(&child)
    }

    pub fn insert(&mut self, block: &Block) -> Result<Block, StorageError> {
        self.tick();
        let user_id = self.user_id.clone();
        self.storage_mut().insert_block(block, &user_id)
    }

    /// Set `fields.contentOrder` of a live card to `children`.
    pub fn set_content_order(
        &mut self,
        card_id: &str,
        children: &[&str],
    ) -> Result<Block, StorageError> {
        let mut card = self
            .storage()
            .get_block(&card_id.into())?
            .ok_or_else(|| StorageError::BlockNotFound(card_id.into()))?;
        let ids: Vec<BlockId> = children.iter().map(|c| BlockId::from(*c)).collect();
        card.set_content_order(&ids);
        self.insert(&card)
    }

    pub fn history_len(&self, block_id: &str) -> Result<usize, StorageError> {
        Ok(self
            .storage()
            .get_block_history(&block_id.into(), Default::default())?
            .len())
    }

    /// Raw text of the `fields` column for every row of `table` with `id`.
    pub fn raw_fields(&self, table: &str, id: &str) -> Result<Vec<Value>, StorageError> {
        let mut stmt = self
            .storage()
            .conn()
            .prepare(&format!("SELECT fields FROM {table} WHERE id = ?1"))?;
        let rows = stmt
            .query_map([id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(StorageError::from))
            .collect()
    }

    /// Count rows in `table` where `column = value`.
    pub fn count_where(&self, table: &str, column: &str, value: &str) -> Result<i64, StorageError> {
        let count = self.storage().conn().query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1"),
            [value],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

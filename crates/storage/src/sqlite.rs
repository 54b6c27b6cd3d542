use std::collections::BTreeMap;
use std::sync::Arc;

use boards_core::{
    Block, BlockId, BlockPatch, BlockPatchBatch, Board, BoardId, Clock, QueryBlockHistoryOptions,
    QuerySubtreeOptions, SystemClock, UserId,
};
use rusqlite::Connection;

use crate::config::StoreConfig;
use crate::dialect::DbType;
use crate::error::StorageError;
use crate::store::SqlStore;
use crate::traits::{BlockStore, BoardStore};

pub struct SqliteStorage {
    conn: Connection,
    store: SqlStore,
}

impl SqliteStorage {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        Self::open_with(
            Connection::open(path)?,
            &StoreConfig::default(),
            Arc::new(SystemClock::new()),
        )
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::open_with(
            Connection::open_in_memory()?,
            &StoreConfig::default(),
            Arc::new(SystemClock::new()),
        )
    }

    pub fn open_with(
        conn: Connection,
        config: &StoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorageError> {
        if config.db_type != DbType::Sqlite {
            return Err(StorageError::UnsupportedDialect(config.db_type.to_string()));
        }
        crate::schema::init_schema(&conn, &config.table_prefix)?;
        Ok(Self {
            conn,
            store: SqlStore::with_clock(config, clock),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn store(&self) -> &SqlStore {
        &self.store
    }

    /// Run `f` in a transaction, committing only if it succeeds.
    pub fn with_transaction<T, E>(
        &mut self,
        f: impl FnOnce(&SqlStore, &Connection) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let tx = self.conn.transaction().map_err(StorageError::from)?;
        let out = f(&self.store, &tx)?;
        tx.commit().map_err(StorageError::from)?;
        Ok(out)
    }
}

impl BlockStore for SqliteStorage {
    fn get_block(&self, block_id: &BlockId) -> Result<Option<Block>, StorageError> {
        self.store.get_block(&self.conn, block_id)
    }

    fn get_blocks_for_board(&self, board_id: &BoardId) -> Result<Vec<Block>, StorageError> {
        self.store.get_blocks_for_board(&self.conn, board_id)
    }

    fn get_blocks_with_parent(
        &self,
        board_id: &BoardId,
        parent_id: &BlockId,
    ) -> Result<Vec<Block>, StorageError> {
        self.store.get_blocks_with_parent(&self.conn, board_id, parent_id)
    }

    fn get_blocks_with_parent_and_type(
        &self,
        board_id: &BoardId,
        parent_id: &BlockId,
        block_type: &str,
    ) -> Result<Vec<Block>, StorageError> {
        self.store
            .get_blocks_with_parent_and_type(&self.conn, board_id, parent_id, block_type)
    }

    fn get_blocks_with_root_id(
        &self,
        board_id: &BoardId,
        root_id: &BlockId,
    ) -> Result<Vec<Block>, StorageError> {
        self.store.get_blocks_with_root_id(&self.conn, board_id, root_id)
    }

    fn get_blocks_with_type(
        &self,
        board_id: &BoardId,
        block_type: &str,
    ) -> Result<Vec<Block>, StorageError> {
        self.store.get_blocks_with_type(&self.conn, board_id, block_type)
    }

    fn get_root_id(&self, block_id: &BlockId) -> Result<BlockId, StorageError> {
        self.store.get_root_id(&self.conn, block_id)
    }

    fn get_parent_id(&self, block_id: &BlockId) -> Result<BlockId, StorageError> {
        self.store.get_parent_id(&self.conn, block_id)
    }

    fn get_subtree2(
        &self,
        board_id: &BoardId,
        block_id: &BlockId,
        opts: QuerySubtreeOptions,
    ) -> Result<Vec<Block>, StorageError> {
        self.store.get_subtree2(&self.conn, board_id, block_id, opts)
    }

    fn get_subtree3(
        &self,
        board_id: &BoardId,
        block_id: &BlockId,
        opts: QuerySubtreeOptions,
    ) -> Result<Vec<Block>, StorageError> {
        self.store.get_subtree3(&self.conn, board_id, block_id, opts)
    }

    fn get_block_history(
        &self,
        block_id: &BlockId,
        opts: QueryBlockHistoryOptions,
    ) -> Result<Vec<Block>, StorageError> {
        self.store.get_block_history(&self.conn, block_id, opts)
    }

    fn insert_block(&mut self, block: &Block, user_id: &UserId) -> Result<Block, StorageError> {
        self.store.insert_block(&self.conn, block, user_id)
    }

    fn insert_blocks(
        &mut self,
        blocks: &[Block],
        user_id: &UserId,
    ) -> Result<Vec<Block>, StorageError> {
        self.store.insert_blocks(&self.conn, blocks, user_id)
    }

    fn patch_block(
        &mut self,
        block_id: &BlockId,
        patch: &BlockPatch,
        user_id: &UserId,
    ) -> Result<Block, StorageError> {
        self.store.patch_block(&self.conn, block_id, patch, user_id)
    }

    fn patch_blocks(
        &mut self,
        batch: &BlockPatchBatch,
        user_id: &UserId,
    ) -> Result<Vec<Block>, StorageError> {
        self.store.patch_blocks(&self.conn, batch, user_id)
    }

    fn delete_block(
        &mut self,
        block_id: &BlockId,
        modified_by: &UserId,
    ) -> Result<(), StorageError> {
        self.store.delete_block(&self.conn, block_id, modified_by)
    }

    fn get_board_and_card(
        &self,
        block: &Block,
    ) -> Result<(Option<Board>, Option<Block>), StorageError> {
        self.store.get_board_and_card(&self.conn, block)
    }

    fn get_board_and_card_by_id(
        &self,
        block_id: &BlockId,
    ) -> Result<(Option<Board>, Option<Block>), StorageError> {
        self.store.get_board_and_card_by_id(&self.conn, block_id)
    }

    fn count_blocks_by_type(&self) -> Result<BTreeMap<String, i64>, StorageError> {
        self.store.count_blocks_by_type(&self.conn)
    }

    /// All four rewrite steps commit together or not at all.
    fn replace_block_id(
        &mut self,
        current_id: &BlockId,
        new_id: &BlockId,
        board_id: &BoardId,
    ) -> Result<(), StorageError> {
        self.with_transaction(|store, tx| store.replace_block_id(tx, current_id, new_id, board_id))
    }

    fn legacy_board_blocks(&self) -> Result<(Vec<Block>, Vec<Block>), StorageError> {
        self.store.legacy_board_blocks(&self.conn)
    }

    fn purge_legacy_board_blocks(&mut self) -> Result<usize, StorageError> {
        self.store.purge_legacy_board_blocks(&self.conn)
    }
}

impl BoardStore for SqliteStorage {
    fn insert_board(&mut self, board: &Board) -> Result<(), StorageError> {
        self.store.insert_board(&self.conn, board)
    }

    fn get_board(&self, board_id: &BoardId) -> Result<Option<Board>, StorageError> {
        self.store.get_board(&self.conn, board_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str) -> Block {
        Block {
            id: id.into(),
            root_id: id.into(),
            board_id: "board-1".into(),
            block_type: "card".into(),
            title: "persisted".into(),
            ..Default::default()
        }
    }

    #[test]
    fn file_backed_store_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("boards.db");
        let path = path.to_str().ok_or("non-utf8 temp path")?;

        {
            let mut storage = SqliteStorage::open(path)?;
            storage.insert_block(&block("c1"), &"u1".into())?;
        }

        let storage = SqliteStorage::open(path)?;
        let stored = storage.get_block(&"c1".into())?.ok_or("block lost on reopen")?;
        assert_eq!(stored.title, "persisted");
        assert_eq!(storage.get_block_history(&"c1".into(), Default::default())?.len(), 1);
        Ok(())
    }

    #[test]
    fn table_prefix_applies_to_every_table() -> Result<(), Box<dyn std::error::Error>> {
        let config = StoreConfig::with_prefix("focal_");
        let mut storage = SqliteStorage::open_with(
            Connection::open_in_memory()?,
            &config,
            Arc::new(SystemClock::new()),
        )?;
        storage.insert_block(&block("c1"), &"u1".into())?;

        let live: i64 =
            storage.conn().query_row("SELECT COUNT(*) FROM focal_blocks", [], |r| r.get(0))?;
        let history: i64 = storage.conn().query_row(
            "SELECT COUNT(*) FROM focal_blocks_history",
            [],
            |r| r.get(0),
        )?;
        assert_eq!((live, history), (1, 1));
        Ok(())
    }

    #[test]
    fn non_sqlite_dialect_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let config = StoreConfig {
            db_type: DbType::Postgres,
            table_prefix: String::new(),
        };
        let result = SqliteStorage::open_with(
            Connection::open_in_memory()?,
            &config,
            Arc::new(SystemClock::new()),
        );
        assert!(matches!(
            result,
            Err(StorageError::UnsupportedDialect(name)) if name == "postgres"
        ));
        Ok(())
    }

    #[test]
    fn failed_transaction_rolls_back() -> Result<(), Box<dyn std::error::Error>> {
        let mut storage = SqliteStorage::open_in_memory()?;
        let result: Result<(), StorageError> = storage.with_transaction(|store, tx| {
            store.insert_block(tx, &block("c1"), &"u1".into())?;
            Err(StorageError::BlockNotFound("c2".into()))
        });
        assert!(result.is_err());
        assert!(storage.get_block(&"c1".into())?.is_none());
        assert!(storage.get_block_history(&"c1".into(), Default::default())?.is_empty());
        Ok(())
    }
}

use std::sync::Arc;

use boards_core::{Block, Clock, SystemClock};
use rusqlite::{Connection, params_from_iter};

use crate::codec::{RawBlockRow, block_columns};
use crate::config::StoreConfig;
use crate::dialect::{self, Dialect};
use crate::error::StorageError;
use crate::query::Select;

/// Statement construction and execution for the block tables, independent
/// of who owns the connection.
///
/// Every method takes the connection (or transaction, which derefs to one)
/// to run against, so callers decide the transactional scope.
pub struct SqlStore {
    dialect: Box<dyn Dialect>,
    table_prefix: String,
    clock: Arc<dyn Clock>,
}

impl SqlStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: &StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            dialect: dialect::for_db_type(config.db_type),
            table_prefix: config.table_prefix.clone(),
            clock,
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub(crate) fn blocks_table(&self) -> String {
        format!("{}blocks", self.table_prefix)
    }

    pub(crate) fn history_table(&self) -> String {
        format!("{}blocks_history", self.table_prefix)
    }

    pub(crate) fn boards_table(&self) -> String {
        format!("{}boards", self.table_prefix)
    }

    pub(crate) fn now(&self) -> Result<i64, StorageError> {
        Ok(self.clock.now_millis()?)
    }

    /// Select of the standard block columns from `table`.
    pub(crate) fn select_blocks(&self, table: &str) -> Select {
        Select::new(block_columns(self.dialect(), None)).from(table)
    }

    /// Run a block select, logging failures under `op`.
    pub(crate) fn query_blocks(
        &self,
        conn: &Connection,
        op: &str,
        select: &Select,
    ) -> Result<Vec<Block>, StorageError> {
        let (sql, params) = select.build(self.dialect());
        let rows = conn.prepare(&sql).and_then(|mut stmt| {
            let rows = stmt
                .query_map(params_from_iter(params.iter()), RawBlockRow::read)?
                .collect::<Result<Vec<_>, _>>();
            rows
        });
        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("{op} ERROR: {e}");
                return Err(e.into());
            }
        };
        rows.into_iter()
            .map(RawBlockRow::into_block)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| log::error!("{op} fields ERROR: {e}"))
    }

    /// Execute a non-query statement, returning the affected row count.
    pub(crate) fn exec(
        &self,
        conn: &Connection,
        sql: &str,
        params: &[rusqlite::types::Value],
    ) -> Result<usize, StorageError> {
        Ok(conn.execute(sql, params_from_iter(params.iter()))?)
    }
}

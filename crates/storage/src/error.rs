use boards_core::BlockId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rootId is nil")]
    RootIdMissing,

    #[error("boardID is nil")]
    BoardIdMissing,

    #[error("block not found (block id: {0})")]
    BlockNotFound(BlockId),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("batch has {ids} ids but {patches} patches")]
    BatchLengthMismatch { ids: usize, patches: usize },

    #[error("unsupported database type: {0}")]
    UnsupportedDialect(String),

    #[error("core error: {0}")]
    Core(#[from] boards_core::CoreError),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BlockNotFound(_) | Self::NotFound(_))
    }
}
